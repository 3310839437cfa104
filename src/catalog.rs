use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const COUNTRY: &str = "France";

// The two certification bodies this catalog integrates.
pub const AVS_CODE: &str = "avs";
pub const AVS_NAME: &str = "AVS";
pub const ACHAHADA_CODE: &str = "achahada";
pub const ACHAHADA_NAME: &str = "Achahada";

/// Fixed closed set of catalog store types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    Butcher,
    Restaurant,
    Wholesaler,
    Abattoir,
    Supermarket,
    Other,
}

impl StoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::Butcher => "butcher",
            StoreType::Restaurant => "restaurant",
            StoreType::Wholesaler => "wholesaler",
            StoreType::Abattoir => "abattoir",
            StoreType::Supermarket => "supermarket",
            StoreType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<StoreType> {
        match s.trim().to_lowercase().as_str() {
            "butcher" => Some(StoreType::Butcher),
            "restaurant" => Some(StoreType::Restaurant),
            "wholesaler" => Some(StoreType::Wholesaler),
            "abattoir" => Some(StoreType::Abattoir),
            "supermarket" => Some(StoreType::Supermarket),
            "other" => Some(StoreType::Other),
            _ => None,
        }
    }
}

/// Canonical store record. `source_id` is globally unique per raw input
/// record and joins a store to its opening-hours rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Store {
    pub name: String,
    pub store_type: StoreType,
    pub address: Option<String>,
    pub city: String,
    pub postal_code: Option<String>,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub halal_certified: bool,
    pub certifier_code: String,
    pub certifier_name: String,
    pub description: Option<String>,
    pub source_id: String,
    pub source_type: String,
    /// Original payload kept for audit.
    pub raw: serde_json::Value,
    pub active: bool,
}

/// One weekday's opening hours for a store. Times are 24-hour `HH:MM`,
/// present iff `is_closed` is false and the conversion succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpeningHours {
    pub source_id: String,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub is_closed: bool,
}

/// Run-level counters for operator visibility. Rejections never raise;
/// they land here instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    pub raw_butchers: usize,
    pub raw_restaurants: usize,
    pub raw_wholesalers: usize,
    pub raw_abattoirs: usize,
    pub raw_directory: usize,
    /// Inactive-flag and out-of-bounds rejections share this counter.
    pub filtered_inactive: usize,
    /// Directory note entries dropped by the exclusion filter.
    pub filtered_inclassable: usize,
    /// Dedup collisions, counted whichever side survived.
    pub deduplicated: usize,
    pub avs: usize,
    pub achahada: usize,
    pub by_type: BTreeMap<String, usize>,
    pub hours: usize,
}

impl PipelineStats {
    pub fn print(&self) {
        println!(
            "Raw:      {} butchers, {} restaurants, {} wholesalers, {} abattoirs, {} directory",
            self.raw_butchers,
            self.raw_restaurants,
            self.raw_wholesalers,
            self.raw_abattoirs,
            self.raw_directory,
        );
        println!(
            "Dropped:  {} inactive/out-of-bounds, {} inclassable, {} duplicates",
            self.filtered_inactive, self.filtered_inclassable, self.deduplicated,
        );
        println!("Kept:     {} avs, {} achahada", self.avs, self.achahada);
        for (store_type, count) in &self.by_type {
            println!("  {:<12} {}", store_type, count);
        }
        println!("Hours:    {} rows", self.hours);
    }
}
