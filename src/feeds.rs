//! Raw source schemas as delivered by the two certification bodies, plus
//! loading of a feed directory into a `FeedSet`. The two AVS APIs and the
//! Achahada directory disagree on field names and shapes; the disagreements
//! are kept here, at the edge, and nothing downstream sees them.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// AVS legacy API entry. Abattoirs only. Note the `active` flag: the site
/// API spells the same thing `isActive`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub active: bool,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub agreement_number: Option<String>,
    #[serde(default)]
    pub veterinary_stamp: Option<String>,
    #[serde(default)]
    pub specialties: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

/// AVS site API entry. Butchers, restaurants or wholesalers depending on
/// which collection it was read from. Coordinates arrive duplicated under
/// two field-name conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub is_active: bool,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub specialties: Option<String>,
}

impl SiteEntry {
    /// `lat`/`lng` wins when both conventions are present. A missing pair
    /// falls back to the (0,0) sentinel, which geo validation rejects.
    pub fn coordinates(&self) -> (f64, f64) {
        (
            self.lat.or(self.latitude).unwrap_or(0.0),
            self.lng.or(self.longitude).unwrap_or(0.0),
        )
    }
}

/// Achahada directory entry. Coordinates are numeric strings, hours and
/// thumbnail arrive as HTML fragments, and there is no activity flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    pub latitude: String,
    pub longitude: String,
    #[serde(default)]
    pub hours_html: String,
    #[serde(default)]
    pub image_html: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// The directory feed: entries plus a side map of entry id → category
/// filter ids, and the timestamp the fetch collaborator stamped on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryBundle {
    pub entries: Vec<DirectoryEntry>,
    #[serde(default)]
    pub categories: HashMap<String, Vec<i64>>,
    pub fetched_at: DateTime<Utc>,
}

/// The five input collections plus the logo-URL lookup, fully materialized
/// in memory. This is the whole of the pipeline's input surface.
#[derive(Debug, Clone)]
pub struct FeedSet {
    pub butchers: Vec<SiteEntry>,
    pub restaurants: Vec<SiteEntry>,
    pub wholesalers: Vec<SiteEntry>,
    pub abattoirs: Vec<LegacyEntry>,
    pub directory: DirectoryBundle,
    pub logos: HashMap<String, String>,
}

pub fn load_feeds(dir: &Path) -> Result<FeedSet> {
    let logos = if dir.join("logos.json").exists() {
        read_json(dir, "logos.json")?
    } else {
        HashMap::new()
    };
    Ok(FeedSet {
        butchers: read_json(dir, "butchers.json")?,
        restaurants: read_json(dir, "restaurants.json")?,
        wholesalers: read_json(dir, "wholesalers.json")?,
        abattoirs: read_json(dir, "abattoirs.json")?,
        directory: read_json(dir, "directory.json")?,
        logos,
    })
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T> {
    let path = dir.join(file);
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("decoding {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_entry_prefers_short_coordinate_names() {
        let entry: SiteEntry = serde_json::from_str(
            r#"{"id":1,"name":"B","address":"1 rue X","city":"Paris","postalCode":"75011",
                "lat":48.86,"lng":2.35,"latitude":40.0,"longitude":3.0,"isActive":true}"#,
        )
        .unwrap();
        assert_eq!(entry.coordinates(), (48.86, 2.35));
    }

    #[test]
    fn site_entry_falls_back_to_long_names() {
        let entry: SiteEntry = serde_json::from_str(
            r#"{"id":1,"name":"B","address":"1 rue X","city":"Paris","postalCode":"75011",
                "latitude":48.86,"longitude":2.35,"isActive":true}"#,
        )
        .unwrap();
        assert_eq!(entry.coordinates(), (48.86, 2.35));
    }

    #[test]
    fn site_entry_missing_coordinates_is_sentinel() {
        let entry: SiteEntry = serde_json::from_str(
            r#"{"id":1,"name":"B","address":"1 rue X","city":"Paris","postalCode":"75011","isActive":true}"#,
        )
        .unwrap();
        assert_eq!(entry.coordinates(), (0.0, 0.0));
    }

    #[test]
    fn fixture_feeds_load() {
        let feeds = load_feeds(Path::new("tests/fixtures")).unwrap();
        assert!(!feeds.butchers.is_empty());
        assert!(!feeds.abattoirs.is_empty());
        assert!(!feeds.directory.entries.is_empty());
        assert!(feeds.directory.categories.len() >= 1);
    }
}
