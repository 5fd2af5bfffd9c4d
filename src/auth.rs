// Authentication Service - Local email/password accounts
// Exposes "current signed-in identity or none" to the rest of the app

use crate::db::{self, StoredUser};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use serde_json::json;
use sha2::{Digest, Sha256};

/// Create an account, seed its user document, and sign the session in.
/// Returns the new user id.
pub fn signup(conn: &Connection, email: &str, password: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() {
        bail!("Email is required");
    }
    if password.len() < 6 {
        bail!("Password should be at least 6 characters");
    }
    if db::email_exists(conn, email)? {
        bail!("Email already in use");
    }

    let user_id = uuid::Uuid::new_v4().to_string();
    let salt = uuid::Uuid::new_v4().to_string();
    let created_at = Utc::now().to_rfc3339();

    let user = StoredUser {
        id: user_id.clone(),
        email: email.to_string(),
        password_salt: salt.clone(),
        password_hash: hash_password(&salt, password),
        created_at: created_at.clone(),
    };
    db::insert_user(conn, &user).context("Failed to create account")?;

    // Seed the user document the way the signup screen did
    db::set_document(
        conn,
        &user_id,
        &json!({
            "email": email,
            "createdAt": created_at,
        }),
    )?;

    db::set_session(conn, &user_id)?;

    Ok(user_id)
}

/// Verify credentials and sign the session in. Bad credentials leave the
/// session untouched.
pub fn login(conn: &Connection, email: &str, password: &str) -> Result<String> {
    let user = match db::get_user_by_email(conn, email.trim())? {
        Some(user) => user,
        None => bail!("Invalid email or password"),
    };

    if hash_password(&user.password_salt, password) != user.password_hash {
        bail!("Invalid email or password");
    }

    db::set_session(conn, &user.id)?;

    Ok(user.id)
}

pub fn logout(conn: &Connection) -> Result<()> {
    db::clear_session(conn)
}

/// Current signed-in user id, or None
pub fn current_user(conn: &Connection) -> Result<Option<String>> {
    db::current_session(conn)
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}{}", salt, password));
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================
