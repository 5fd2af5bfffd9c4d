// Usage Log - Manually logged appliance run times, cached per month range

use crate::db;
use anyhow::{bail, Context, Result};
use chrono::{Datelike, Days, Months, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// The picker starts from this month and walks backwards
pub const DEFAULT_START: (i32, u32, u32) = (2025, 5, 1);
pub const DEFAULT_MONTH_COUNT: usize = 7;

/// One logged entry: appliance name and how long it ran.
/// Duration stays a free-form string, exactly as typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub name: String,
    pub duration: String,
}

impl UsageEntry {
    /// Both fields non-blank after trimming; the add action accepts
    /// nothing less
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.duration.trim().is_empty()
    }
}

// ============================================================================
// MONTH RANGES
// ============================================================================

/// Month-range labels like "5/1/2025 - 5/31/2025", one per month, walking
/// backwards from the month containing `start`. No zero padding.
pub fn month_ranges(start: NaiveDate, count: usize) -> Vec<String> {
    let mut ranges = Vec::with_capacity(count);
    let mut first = start.with_day(1).unwrap_or(start);

    for _ in 0..count {
        let last = first + Months::new(1) - Days::new(1);
        ranges.push(format!(
            "{}/{}/{} - {}/{}/{}",
            first.month(),
            first.day(),
            first.year(),
            last.month(),
            last.day(),
            last.year()
        ));
        first = first - Months::new(1);
    }

    ranges
}

/// The ranges the usage screens offer
pub fn default_month_ranges() -> Vec<String> {
    let (year, month, day) = DEFAULT_START;
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(start) => month_ranges(start, DEFAULT_MONTH_COUNT),
        None => Vec::new(),
    }
}

/// Default selection: the label starting with "<month>/1/" for today's
/// month, else the first label. Matches on month number only, like the
/// screen it comes from.
pub fn current_month_range(ranges: &[String], today: NaiveDate) -> Option<String> {
    let prefix = format!("{}/1/", today.month());
    ranges
        .iter()
        .find(|r| r.starts_with(&prefix))
        .or_else(|| ranges.first())
        .cloned()
}

// ============================================================================
// CACHE ACCESS
// ============================================================================

fn cache_key(range: &str) -> String {
    format!("usage_{}", range)
}

/// Entries logged under a month range; nothing cached reads as empty
pub fn load_usage(conn: &Connection, range: &str) -> Result<Vec<UsageEntry>> {
    let entries = match db::get_cache_entry(conn, &cache_key(range))? {
        Some(raw) => {
            serde_json::from_str(&raw).context("Cached usage entries are not valid JSON")?
        }
        None => Vec::new(),
    };

    Ok(entries)
}

pub fn save_usage(conn: &Connection, range: &str, entries: &[UsageEntry]) -> Result<()> {
    let raw = serde_json::to_string(entries)?;
    db::put_cache_entry(conn, &cache_key(range), &raw)
}

/// Append one entry to a month's log. Blank name or duration is refused
/// with nothing written.
pub fn log_usage(conn: &Connection, range: &str, entry: UsageEntry) -> Result<Vec<UsageEntry>> {
    if !entry.is_complete() {
        bail!("Both an appliance name and a duration are required");
    }

    let mut entries = load_usage(conn, range)?;
    entries.push(UsageEntry {
        name: entry.name.trim().to_string(),
        duration: entry.duration.trim().to_string(),
    });
    save_usage(conn, range, &entries)?;

    Ok(entries)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_month_ranges_walk_backwards() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let ranges = month_ranges(start, 7);

        assert_eq!(
            ranges,
            vec![
                "5/1/2025 - 5/31/2025",
                "4/1/2025 - 4/30/2025",
                "3/1/2025 - 3/31/2025",
                "2/1/2025 - 2/28/2025",
                "1/1/2025 - 1/31/2025",
                "12/1/2024 - 12/31/2024",
                "11/1/2024 - 11/30/2024",
            ]
        );
    }

    #[test]
    fn test_month_ranges_from_mid_month_and_leap_year() {
        // Mid-month start snaps to the first of that month
        let start = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let ranges = month_ranges(start, 2);

        assert_eq!(ranges[0], "3/1/2024 - 3/31/2024");
        assert_eq!(ranges[1], "2/1/2024 - 2/29/2024");
    }

    #[test]
    fn test_default_ranges() {
        let ranges = default_month_ranges();
        assert_eq!(ranges.len(), DEFAULT_MONTH_COUNT);
        assert_eq!(ranges[0], "5/1/2025 - 5/31/2025");
    }

    #[test]
    fn test_current_month_range_selection() {
        let ranges = default_month_ranges();

        let in_range = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(
            current_month_range(&ranges, in_range).as_deref(),
            Some("3/1/2025 - 3/31/2025")
        );

        // A month the picker doesn't offer falls back to the first label
        let outside = NaiveDate::from_ymd_opt(2025, 8, 5).unwrap();
        assert_eq!(
            current_month_range(&ranges, outside).as_deref(),
            Some("5/1/2025 - 5/31/2025")
        );

        assert_eq!(current_month_range(&[], in_range), None);
    }

    #[test]
    fn test_usage_round_trip() {
        let conn = test_conn();
        let range = "5/1/2025 - 5/31/2025";

        assert!(load_usage(&conn, range).unwrap().is_empty());

        let entries = log_usage(
            &conn,
            range,
            UsageEntry {
                name: "TV".to_string(),
                duration: "3h".to_string(),
            },
        )
        .unwrap();
        assert_eq!(entries.len(), 1);

        let reloaded = load_usage(&conn, range).unwrap();
        assert_eq!(reloaded, entries);

        // Ranges are independent cache keys
        assert!(load_usage(&conn, "4/1/2025 - 4/30/2025").unwrap().is_empty());
    }

    #[test]
    fn test_log_usage_rejects_blank_fields() {
        let conn = test_conn();
        let range = "5/1/2025 - 5/31/2025";

        let blank_name = UsageEntry {
            name: "   ".to_string(),
            duration: "3h".to_string(),
        };
        assert!(log_usage(&conn, range, blank_name).is_err());

        let blank_duration = UsageEntry {
            name: "TV".to_string(),
            duration: "".to_string(),
        };
        assert!(log_usage(&conn, range, blank_duration).is_err());

        assert!(load_usage(&conn, range).unwrap().is_empty());
    }

    #[test]
    fn test_log_usage_trims_fields() {
        let conn = test_conn();

        let entries = log_usage(
            &conn,
            "5/1/2025 - 5/31/2025",
            UsageEntry {
                name: "  Lamp ".to_string(),
                duration: " 45m ".to_string(),
            },
        )
        .unwrap();

        assert_eq!(entries[0].name, "Lamp");
        assert_eq!(entries[0].duration, "45m");
    }
}
