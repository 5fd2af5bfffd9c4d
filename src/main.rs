use anyhow::{bail, Result};
use chrono::Local;
use rusqlite::Connection;
use std::env;
use std::path::PathBuf;

use home_energy::{
    aggregate, auth, catalog::ApplianceCategory, current_month_range, default_month_ranges,
    load_registrations, recommend, register, registration::RegistrationError, rooms::Room,
    setup_database, usage_log, CatalogRegistry, SqliteRegistrations, AVERAGE_USAGE_KWH,
    RECOMMENDATION_LIMIT,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    let conn = open_database()?;

    match command {
        "signup" => run_signup(&conn, &args),
        "login" => run_login(&conn, &args),
        "logout" => run_logout(&conn),
        "rooms" => run_rooms(),
        "catalog" => run_catalog(&args),
        "appliances" => run_appliances(&conn, &args),
        "register" => run_register(&conn, &args),
        "recommend" => run_recommend(&conn, &args),
        "summary" => run_summary(&conn),
        "months" => run_months(),
        "log-usage" => run_log_usage(&conn, &args),
        "usage" => run_usage(&conn, &args),
        _ => {
            print_help();
            Ok(())
        }
    }
}

fn open_database() -> Result<Connection> {
    let path = env::var("HOME_ENERGY_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("home-energy.db"));

    let conn = Connection::open(&path)?;
    setup_database(&conn)?;

    Ok(conn)
}

fn print_help() {
    println!("🏠 Home Energy Tracker");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  signup <email> <password>            Create an account and sign in");
    println!("  login <email> <password>             Sign in");
    println!("  logout                               Sign out");
    println!("  rooms                                List rooms and their appliances");
    println!("  catalog <category>                   Browse a bundled catalog");
    println!("  appliances <category>                Your registered appliances");
    println!("  register <category> <unique-id>      Register a catalog entry");
    println!("  recommend <category> <unique-id>     Lower-usage picks for one of yours");
    println!("  summary                              Monthly usage summary per category");
    println!("  months                               Month ranges for usage logging");
    println!("  log-usage <range> <name> <duration>  Log a run time");
    println!("  usage <range>                        Logged entries for a month range");
    println!();
    println!("  Database path comes from HOME_ENERGY_DB (default: home-energy.db)");
}

// ============================================================================
// ACCOUNT COMMANDS
// ============================================================================

fn run_signup(conn: &Connection, args: &[String]) -> Result<()> {
    let (email, password) = two_args(args, "signup <email> <password>")?;

    match auth::signup(conn, email, password) {
        Ok(user_id) => {
            println!("✓ Account created for {}", email);
            println!("✓ Signed in as {}", user_id);
        }
        Err(e) => eprintln!("❌ Signup failed: {}", e),
    }

    Ok(())
}

fn run_login(conn: &Connection, args: &[String]) -> Result<()> {
    let (email, password) = two_args(args, "login <email> <password>")?;

    match auth::login(conn, email, password) {
        Ok(user_id) => println!("✓ Signed in as {}", user_id),
        Err(e) => eprintln!("❌ Login failed: {}", e),
    }

    Ok(())
}

fn run_logout(conn: &Connection) -> Result<()> {
    auth::logout(conn)?;
    println!("✓ Signed out");
    Ok(())
}

// ============================================================================
// CATALOG & REGISTRATION COMMANDS
// ============================================================================

fn run_rooms() -> Result<()> {
    println!("🏠 Rooms");
    for room in Room::all() {
        let appliances: Vec<&str> = room.appliances().iter().map(|a| a.name()).collect();
        println!("  {:<14} {}", room.name(), appliances.join(", "));
    }
    Ok(())
}

fn run_catalog(args: &[String]) -> Result<()> {
    let category = category_arg(args, 2)?;
    let registry = CatalogRegistry::load()?;

    let entries = registry.entries(category);
    if entries.is_empty() {
        println!("No bundled catalog for {}.", category.name());
        return Ok(());
    }

    println!("📋 {} catalog ({} models)", category.name(), entries.len());
    for entry in entries {
        println!(
            "  {:<10} {:<40} {} {}",
            entry.unique_id,
            entry.label(),
            entry.rated_usage,
            category.usage_unit()
        );
    }

    Ok(())
}

fn run_appliances(conn: &Connection, args: &[String]) -> Result<()> {
    let category = category_arg(args, 2)?;
    let user_id = require_user(conn)?;

    let repo = SqliteRegistrations::new(conn);
    let store = load_registrations(&repo, &user_id);
    let saved = store.appliances(category);

    if saved.is_empty() {
        println!("No {} added yet. Register one to see it here.", category.name());
        return Ok(());
    }

    println!("🔌 Your {} appliances", category.name());
    for appliance in saved {
        println!(
            "  {:<10} {:<40} {} {}",
            appliance.aid,
            appliance.display_name(),
            appliance.usage,
            category.usage_unit()
        );
    }

    Ok(())
}

fn run_register(conn: &Connection, args: &[String]) -> Result<()> {
    let category = category_arg(args, 2)?;
    let unique_id = args
        .get(3)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("Usage: register <category> <unique-id>"))?;

    let registry = CatalogRegistry::load()?;
    let selection = registry.find(category, unique_id);

    let repo = SqliteRegistrations::new(conn);
    let current = auth::current_user(conn)?;

    match register(&repo, current.as_deref(), category, selection) {
        Ok(appliance) => {
            println!("✓ {} added successfully!", appliance.display_name());
            println!(
                "  Usage: {} {} (average: {} kWh/year)",
                appliance.usage,
                category.usage_unit(),
                AVERAGE_USAGE_KWH
            );
        }
        Err(RegistrationError::SelectionMissing) => {
            eprintln!("❌ No {} with id {} in the catalog.", category.name(), unique_id);
        }
        Err(e) => eprintln!("❌ {}", e),
    }

    Ok(())
}

fn run_recommend(conn: &Connection, args: &[String]) -> Result<()> {
    let category = category_arg(args, 2)?;
    let unique_id = args
        .get(3)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("Usage: recommend <category> <unique-id>"))?;

    let user_id = require_user(conn)?;
    let repo = SqliteRegistrations::new(conn);
    let store = load_registrations(&repo, &user_id);

    let reference = store
        .appliances(category)
        .iter()
        .find(|a| a.aid == unique_id);
    let reference = match reference {
        Some(reference) => reference,
        None => {
            eprintln!(
                "❌ {} {} is not registered. Register it first.",
                category.name(),
                unique_id
            );
            return Ok(());
        }
    };

    let registry = CatalogRegistry::load()?;
    let picks = recommend(registry.entries(category), reference, RECOMMENDATION_LIMIT);

    println!(
        "💡 Recommendations for {} ({} {})",
        reference.display_name(),
        reference.usage,
        category.usage_unit()
    );
    if picks.is_empty() {
        println!("  Nothing in the catalog beats it.");
    }
    for pick in picks {
        println!(
            "  {:<10} {:<40} {} {}",
            pick.unique_id,
            pick.label(),
            pick.rated_usage,
            category.usage_unit()
        );
    }

    Ok(())
}

fn run_summary(conn: &Connection) -> Result<()> {
    let user_id = require_user(conn)?;

    let repo = SqliteRegistrations::new(conn);
    let store = load_registrations(&repo, &user_id);
    let summary = aggregate(&store);

    if summary.labels.is_empty() {
        println!("No appliances registered yet.");
        return Ok(());
    }

    println!("📊 Usage summary");
    for (label, value) in summary.labels.iter().zip(&summary.values) {
        println!("  {:<16} {}", label, value);
    }

    Ok(())
}

// ============================================================================
// USAGE LOG COMMANDS
// ============================================================================

fn run_months() -> Result<()> {
    let ranges = default_month_ranges();
    let today = Local::now().date_naive();
    let current = current_month_range(&ranges, today);

    println!("🗓  Month ranges");
    for range in &ranges {
        let marker = if Some(range) == current.as_ref() { " (current)" } else { "" };
        println!("  {}{}", range, marker);
    }

    Ok(())
}

fn run_log_usage(conn: &Connection, args: &[String]) -> Result<()> {
    let range = args.get(2).map(String::as_str);
    let name = args.get(3).map(String::as_str);
    let duration = args.get(4).map(String::as_str);

    let (range, name, duration) = match (range, name, duration) {
        (Some(r), Some(n), Some(d)) => (r, n, d),
        _ => bail!("Usage: log-usage <range> <name> <duration>"),
    };

    let entries = usage_log::log_usage(
        conn,
        range,
        usage_log::UsageEntry {
            name: name.to_string(),
            duration: duration.to_string(),
        },
    )?;
    println!("✓ Logged. {} entries for {}", entries.len(), range);

    Ok(())
}

fn run_usage(conn: &Connection, args: &[String]) -> Result<()> {
    let range = args
        .get(2)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("Usage: usage <range>"))?;

    let entries = usage_log::load_usage(conn, range)?;
    if entries.is_empty() {
        println!("Nothing logged for {}.", range);
        return Ok(());
    }

    println!("🗓  {}", range);
    for entry in entries {
        println!("  {:<24} {}", entry.name, entry.duration);
    }

    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

fn require_user(conn: &Connection) -> Result<String> {
    match auth::current_user(conn)? {
        Some(user_id) => Ok(user_id),
        None => bail!("No logged-in user. Run: home-energy login <email> <password>"),
    }
}

fn category_arg(args: &[String], index: usize) -> Result<ApplianceCategory> {
    let raw = args
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("Missing <category> argument"))?;

    ApplianceCategory::from_name(raw).ok_or_else(|| {
        let known: Vec<&str> = ApplianceCategory::all().iter().map(|c| c.code()).collect();
        anyhow::anyhow!("Unknown category {:?}. Known: {}", raw, known.join(", "))
    })
}

fn two_args<'a>(args: &'a [String], usage: &str) -> Result<(&'a str, &'a str)> {
    match (args.get(2), args.get(3)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => bail!("Usage: {}", usage),
    }
}
