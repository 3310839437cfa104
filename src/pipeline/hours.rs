//! Opening-hours extraction from the directory feed's HTML table. The
//! upstream emits a fixed two-column template (`<tr><td>day</td><td>time
//! range</td></tr>`), so the walk is regex-based rather than a full HTML
//! parse. Two walks share the table extraction: a strict one producing
//! structured rows, and a loose one producing the human-readable summary
//! used in descriptions.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::normalize::decode_entities;

static TR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").unwrap());
static TD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<td[^>]*>(.*?)</td>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static TIME_12H_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*(am|pm)$").unwrap());

const DAY_NAMES: &[(&str, u8)] = &[
    ("sunday", 0),
    ("monday", 1),
    ("tuesday", 2),
    ("wednesday", 3),
    ("thursday", 4),
    ("friday", 5),
    ("saturday", 6),
];

/// One weekday parsed out of the table, before a `source_id` is attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayHours {
    pub day_of_week: u8,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub is_closed: bool,
}

/// Strict walk: structured per-weekday rows. Rows with an unrecognized day
/// name, a cell count other than two, or a range that does not fully parse
/// are dropped, never half-recorded. At most one row per weekday: a table
/// repeating a day keeps the first parsed row, so the output always fits
/// the one-row-per-day storage constraint.
pub fn parse_hours(html: &str) -> Vec<DayHours> {
    let mut out: Vec<DayHours> = Vec::new();
    for (day_cell, time_cell) in table_cells(html) {
        let Some(day_of_week) = day_index(&day_cell) else {
            continue;
        };
        if out.iter().any(|row| row.day_of_week == day_of_week) {
            continue;
        }
        if time_cell.eq_ignore_ascii_case("closed") {
            out.push(DayHours {
                day_of_week,
                open_time: None,
                close_time: None,
                is_closed: true,
            });
            continue;
        }
        let parts: Vec<&str> = time_cell.split('-').collect();
        if parts.len() != 2 {
            continue;
        }
        // A half-parsed range is unknown, not partially recorded.
        if let (Some(open), Some(close)) = (to_24h(parts[0].trim()), to_24h(parts[1].trim())) {
            out.push(DayHours {
                day_of_week,
                open_time: Some(open),
                close_time: Some(close),
                is_closed: false,
            });
        }
    }
    out
}

/// Loose walk: `(day, time)` text pairs for the description summary.
/// Unknown day names and malformed ranges pass through as cleaned text.
pub fn summarize_hours(html: &str) -> Vec<(String, String)> {
    table_cells(html)
        .into_iter()
        .filter(|(day, time)| !day.is_empty() && !time.is_empty())
        .collect()
}

/// Every `<tr>` with exactly two `<td>` cells, tag-stripped and
/// entity-decoded.
fn table_cells(html: &str) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    for tr in TR_RE.captures_iter(html) {
        let cells: Vec<String> = TD_RE
            .captures_iter(&tr[1])
            .map(|td| clean_cell(&td[1]))
            .collect();
        if let [day, time] = cells.as_slice() {
            rows.push((day.clone(), time.clone()));
        }
    }
    rows
}

fn clean_cell(html: &str) -> String {
    decode_entities(&TAG_RE.replace_all(html, " ")).trim().to_string()
}

fn day_index(day: &str) -> Option<u8> {
    let folded = day.trim().to_lowercase();
    DAY_NAMES
        .iter()
        .find(|(name, _)| *name == folded)
        .map(|(_, idx)| *idx)
}

/// `H:MM AM|PM` (hour 1-12) to zero-padded 24-hour `HH:MM`. 12 AM maps to
/// 00, 12 PM stays 12.
fn to_24h(raw: &str) -> Option<String> {
    let caps = TIME_12H_RE.captures(raw)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }
    let hour = match (hour, caps[3].to_lowercase().as_str()) {
        (12, "am") => 0,
        (12, "pm") => 12,
        (h, "pm") => h + 12,
        (h, _) => h,
    };
    Some(format!("{hour:02}:{minute:02}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: &str, time: &str) -> String {
        format!("<tr><td>{day}</td><td>{time}</td></tr>")
    }

    #[test]
    fn monday_range() {
        let rows = parse_hours(&row("Monday", "9:00 AM - 5:00 PM"));
        assert_eq!(
            rows,
            vec![DayHours {
                day_of_week: 1,
                open_time: Some("09:00".into()),
                close_time: Some("17:00".into()),
                is_closed: false,
            }]
        );
    }

    #[test]
    fn sunday_closed() {
        let rows = parse_hours(&row("Sunday", "Closed"));
        assert_eq!(
            rows,
            vec![DayHours {
                day_of_week: 0,
                open_time: None,
                close_time: None,
                is_closed: true,
            }]
        );
    }

    #[test]
    fn noon_and_midnight_edges() {
        let rows = parse_hours(&row("Friday", "12:00 AM - 12:30 PM"));
        assert_eq!(rows[0].open_time.as_deref(), Some("00:00"));
        assert_eq!(rows[0].close_time.as_deref(), Some("12:30"));
    }

    #[test]
    fn garbled_range_emits_nothing() {
        assert!(parse_hours(&row("Tuesday", "garbled")).is_empty());
    }

    #[test]
    fn half_parsed_range_emits_nothing() {
        assert!(parse_hours(&row("Tuesday", "9:00 AM - whenever")).is_empty());
        assert!(parse_hours(&row("Tuesday", "25:00 AM - 5:00 PM")).is_empty());
    }

    #[test]
    fn unknown_day_skipped() {
        assert!(parse_hours(&row("Moonday", "9:00 AM - 5:00 PM")).is_empty());
    }

    #[test]
    fn wrong_cell_count_skipped() {
        let html = "<tr><td>Monday</td></tr><tr><td>Tuesday</td><td>a</td><td>b</td></tr>";
        assert!(parse_hours(html).is_empty());
    }

    #[test]
    fn nested_markup_and_entities_cleaned() {
        let html = row("<b>Saturday</b>", "10:00&nbsp;");
        // &nbsp; is not in the named set, so this row stays garbled and the
        // strict walk drops it, but the day cell still resolves.
        assert!(parse_hours(&html).is_empty());
        let rows = parse_hours(&row("<b>Saturday</b>", "9:30 am - 7:15 pm"));
        assert_eq!(rows[0].day_of_week, 6);
        assert_eq!(rows[0].open_time.as_deref(), Some("09:30"));
        assert_eq!(rows[0].close_time.as_deref(), Some("19:15"));
    }

    #[test]
    fn full_week_parses() {
        let html = [
            row("Monday", "9:00 AM - 7:00 PM"),
            row("Tuesday", "9:00 AM - 7:00 PM"),
            row("Wednesday", "9:00 AM - 7:00 PM"),
            row("Thursday", "9:00 AM - 7:00 PM"),
            row("Friday", "9:00 AM - 8:00 PM"),
            row("Saturday", "9:00 AM - 8:00 PM"),
            row("Sunday", "Closed"),
        ]
        .join("\n");
        let rows = parse_hours(&html);
        assert_eq!(rows.len(), 7);
        assert_eq!(rows.iter().filter(|r| r.is_closed).count(), 1);
    }

    #[test]
    fn repeated_day_keeps_first_parsed_row() {
        let html = format!(
            "{}{}{}",
            row("Monday", "9:00 AM - 5:00 PM"),
            row("Monday", "10:00 AM - 6:00 PM"),
            row("Tuesday", "9:00 AM - 5:00 PM"),
        );
        let rows = parse_hours(&html);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].day_of_week, 1);
        assert_eq!(rows[0].open_time.as_deref(), Some("09:00"));
        assert_eq!(rows[1].day_of_week, 2);
    }

    #[test]
    fn garbled_row_does_not_claim_its_day() {
        let html = format!(
            "{}{}",
            row("Monday", "garbled"),
            row("Monday", "10:00 AM - 6:00 PM"),
        );
        let rows = parse_hours(&html);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].open_time.as_deref(), Some("10:00"));
    }

    #[test]
    fn summary_tolerates_malformed_rows() {
        let html = format!(
            "{}{}{}",
            row("Monday", "9:00 AM - 5:00 PM"),
            row("Jour f\u{e9}ri\u{e9}", "variable"),
            row("Sunday", "Closed"),
        );
        let summary = summarize_hours(&html);
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[1], ("Jour f\u{e9}ri\u{e9}".to_string(), "variable".to_string()));
        // The strict walk only keeps the two well-formed days.
        assert_eq!(parse_hours(&html).len(), 2);
    }
}
