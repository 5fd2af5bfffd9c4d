use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

/// Stored user row, including credential material.
/// `id` is the stable user identity; everything else can change.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub id: String,
    pub email: String,
    pub password_salt: String,
    pub password_hash: String,
    pub created_at: String,
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Users Table (authentication service)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_uuid TEXT UNIQUE NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_salt TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Session Table (current signed-in identity or none, single row)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS session (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            user_uuid TEXT NOT NULL,
            signed_in_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Documents Table (one JSON document per user)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            user_uuid TEXT PRIMARY KEY,
            doc TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Usage Log Cache (month-range label -> logged entries)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS usage_log (
            cache_key TEXT PRIMARY KEY,
            entries TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// USERS
// ============================================================================

pub fn insert_user(conn: &Connection, user: &StoredUser) -> Result<()> {
    conn.execute(
        "INSERT INTO users (user_uuid, email, password_salt, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id,
            user.email,
            user.password_salt,
            user.password_hash,
            user.created_at,
        ],
    )
    .context("Failed to insert user")?;

    Ok(())
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<StoredUser>> {
    let user = conn
        .query_row(
            "SELECT user_uuid, email, password_salt, password_hash, created_at
             FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok(StoredUser {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    password_salt: row.get(2)?,
                    password_hash: row.get(3)?,
                    created_at: row.get(4)?,
                })
            },
        )
        .optional()?;

    Ok(user)
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?;

    Ok(count > 0)
}

// ============================================================================
// SESSION
// ============================================================================

pub fn set_session(conn: &Connection, user_id: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO session (id, user_uuid, signed_in_at) VALUES (1, ?1, ?2)
         ON CONFLICT(id) DO UPDATE SET user_uuid = ?1, signed_in_at = ?2",
        params![user_id, Utc::now().to_rfc3339()],
    )?;

    Ok(())
}

pub fn clear_session(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM session", [])?;
    Ok(())
}

/// Current signed-in user id, or None
pub fn current_session(conn: &Connection) -> Result<Option<String>> {
    let user_id = conn
        .query_row("SELECT user_uuid FROM session WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?;

    Ok(user_id)
}

// ============================================================================
// DOCUMENTS
// ============================================================================

pub fn get_document(conn: &Connection, user_id: &str) -> Result<Option<Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT doc FROM documents WHERE user_uuid = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        Some(raw) => {
            let doc = serde_json::from_str(&raw).context("Stored document is not valid JSON")?;
            Ok(Some(doc))
        }
        None => Ok(None),
    }
}

pub fn set_document(conn: &Connection, user_id: &str, document: &Value) -> Result<()> {
    let raw = serde_json::to_string(document)?;

    conn.execute(
        "INSERT INTO documents (user_uuid, doc, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_uuid) DO UPDATE SET doc = ?2, updated_at = ?3",
        params![user_id, raw, Utc::now().to_rfc3339()],
    )?;

    Ok(())
}

/// Overwrite one field of a user's document, addressed by a dot-delimited
/// path ("AppliancesMap.TV.2318695"). Intermediate objects are created as
/// needed; a missing document starts from an empty one. A path segment that
/// lands on a non-object value is an error, nothing is written.
pub fn update_document_field(
    conn: &Connection,
    user_id: &str,
    field_path: &str,
    value: Value,
) -> Result<()> {
    let mut document = get_document(conn, user_id)?.unwrap_or_else(|| Value::Object(Map::new()));

    set_field(&mut document, field_path, value)?;
    set_document(conn, user_id, &document)?;

    Ok(())
}

fn set_field(document: &mut Value, field_path: &str, value: Value) -> Result<()> {
    let segments: Vec<&str> = field_path.split('.').collect();
    if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(anyhow!("Invalid field path: {:?}", field_path));
    }

    let mut current = document;
    for segment in &segments[..segments.len() - 1] {
        let map = current
            .as_object_mut()
            .ok_or_else(|| anyhow!("Field path {:?} crosses a non-object value", field_path))?;

        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let map = current
        .as_object_mut()
        .ok_or_else(|| anyhow!("Field path {:?} crosses a non-object value", field_path))?;
    map.insert(segments[segments.len() - 1].to_string(), value);

    Ok(())
}

// ============================================================================
// USAGE LOG CACHE
// ============================================================================

pub fn get_cache_entry(conn: &Connection, cache_key: &str) -> Result<Option<String>> {
    let raw = conn
        .query_row(
            "SELECT entries FROM usage_log WHERE cache_key = ?1",
            params![cache_key],
            |row| row.get(0),
        )
        .optional()?;

    Ok(raw)
}

pub fn put_cache_entry(conn: &Connection, cache_key: &str, entries: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO usage_log (cache_key, entries, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(cache_key) DO UPDATE SET entries = ?2, updated_at = ?3",
        params![cache_key, entries, Utc::now().to_rfc3339()],
    )?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn test_user(id: &str, email: &str) -> StoredUser {
        StoredUser {
            id: id.to_string(),
            email: email.to_string(),
            password_salt: "salt".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_insert_and_lookup_user() {
        let conn = test_conn();

        insert_user(&conn, &test_user("u1", "a@example.com")).unwrap();

        let found = get_user_by_email(&conn, "a@example.com").unwrap().unwrap();
        assert_eq!(found.id, "u1");
        assert!(get_user_by_email(&conn, "b@example.com").unwrap().is_none());
        assert!(email_exists(&conn, "a@example.com").unwrap());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let conn = test_conn();

        insert_user(&conn, &test_user("u1", "a@example.com")).unwrap();
        assert!(insert_user(&conn, &test_user("u2", "a@example.com")).is_err());
    }

    #[test]
    fn test_session_lifecycle() {
        let conn = test_conn();

        assert!(current_session(&conn).unwrap().is_none());

        set_session(&conn, "u1").unwrap();
        assert_eq!(current_session(&conn).unwrap().as_deref(), Some("u1"));

        // Signing in as someone else replaces the single session row
        set_session(&conn, "u2").unwrap();
        assert_eq!(current_session(&conn).unwrap().as_deref(), Some("u2"));

        clear_session(&conn).unwrap();
        assert!(current_session(&conn).unwrap().is_none());
    }

    #[test]
    fn test_document_set_and_get() {
        let conn = test_conn();

        assert!(get_document(&conn, "u1").unwrap().is_none());

        let doc = json!({ "email": "a@example.com" });
        set_document(&conn, "u1", &doc).unwrap();

        assert_eq!(get_document(&conn, "u1").unwrap().unwrap(), doc);
    }

    #[test]
    fn test_update_field_creates_nested_path() {
        let conn = test_conn();

        update_document_field(
            &conn,
            "u1",
            "AppliancesMap.TV.2318695",
            json!({ "name": "QN55Q60D", "usage": 142.0 }),
        )
        .unwrap();

        let doc = get_document(&conn, "u1").unwrap().unwrap();
        assert_eq!(
            doc["AppliancesMap"]["TV"]["2318695"]["name"],
            json!("QN55Q60D")
        );
    }

    #[test]
    fn test_update_field_overwrites_leaf() {
        let conn = test_conn();

        set_document(&conn, "u1", &json!({ "email": "a@example.com" })).unwrap();
        update_document_field(&conn, "u1", "AppliancesMap.TV.x", json!({ "usage": 1.0 })).unwrap();
        update_document_field(&conn, "u1", "AppliancesMap.TV.x", json!({ "usage": 2.0 })).unwrap();

        let doc = get_document(&conn, "u1").unwrap().unwrap();
        assert_eq!(doc["AppliancesMap"]["TV"]["x"]["usage"], json!(2.0));
        // Untouched fields survive the read-modify-write
        assert_eq!(doc["email"], json!("a@example.com"));
    }

    #[test]
    fn test_update_field_rejects_non_object_segment() {
        let conn = test_conn();

        set_document(&conn, "u1", &json!({ "email": "a@example.com" })).unwrap();
        let result = update_document_field(&conn, "u1", "email.nested", json!(1));
        assert!(result.is_err());

        // Document unchanged after the failed update
        let doc = get_document(&conn, "u1").unwrap().unwrap();
        assert_eq!(doc, json!({ "email": "a@example.com" }));
    }

    #[test]
    fn test_usage_cache_round_trip() {
        let conn = test_conn();

        assert!(get_cache_entry(&conn, "usage_5/1/2025 - 5/31/2025")
            .unwrap()
            .is_none());

        put_cache_entry(&conn, "usage_5/1/2025 - 5/31/2025", "[]").unwrap();
        put_cache_entry(&conn, "usage_5/1/2025 - 5/31/2025", "[{\"name\":\"TV\"}]").unwrap();

        assert_eq!(
            get_cache_entry(&conn, "usage_5/1/2025 - 5/31/2025")
                .unwrap()
                .as_deref(),
            Some("[{\"name\":\"TV\"}]")
        );
    }
}
