//! The directory feed embeds a handful of non-store "note" records
//! (administrative notices, a mosque listing). They are dropped before any
//! other validation and counted as `filtered_inclassable`.

use crate::feeds::DirectoryEntry;

// Known note records, by raw directory id.
const EXCLUDED_IDS: &[&str] = &["2083", "2508", "3012"];

const NOTE_PREFIXES: &[&str] = &["note aux", "information"];
const EXCLUDED_SUBSTRINGS: &[&str] = &["mosqu\u{e9}e", "mosquee"];

pub fn is_excluded(entry: &DirectoryEntry) -> bool {
    if EXCLUDED_IDS.contains(&entry.id.as_str()) {
        return true;
    }
    let name = entry.name.to_lowercase();
    NOTE_PREFIXES.iter().any(|p| name.starts_with(p))
        || EXCLUDED_SUBSTRINGS.iter().any(|s| name.contains(s))
}
