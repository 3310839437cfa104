//! Per-source transformers: one raw entry in, one canonical store (and, for
//! the directory schema, its hours rows) or nothing out. Each transformer
//! reads its schema's activity flag once at the top; the rest of the
//! pipeline only ever sees canonical records.

use std::collections::HashMap;

use serde_json::json;

use crate::catalog::{
    OpeningHours, Store, StoreType, ACHAHADA_CODE, ACHAHADA_NAME, AVS_CODE, AVS_NAME, COUNTRY,
};
use crate::feeds::{DirectoryEntry, LegacyEntry, SiteEntry};

use super::{category, geo, hours, normalize};

/// AVS legacy schema: abattoirs. Rejected when inactive or out of bounds.
pub fn from_legacy(entry: &LegacyEntry) -> Option<Store> {
    let active = entry.active;
    if !active {
        return None;
    }
    if !geo::valid_coordinates(entry.latitude, entry.longitude) {
        return None;
    }
    Some(Store {
        name: entry.name.trim().to_string(),
        store_type: StoreType::Abattoir,
        address: non_empty(entry.address.as_deref()),
        city: normalize::normalize_city(entry.city.as_deref()),
        postal_code: normalize::normalize_postal_code(entry.postal_code.as_deref()),
        country: COUNTRY.to_string(),
        latitude: entry.latitude,
        longitude: entry.longitude,
        phone: None,
        email: None,
        website: None,
        logo_url: None,
        halal_certified: true,
        certifier_code: AVS_CODE.to_string(),
        certifier_name: AVS_NAME.to_string(),
        description: legacy_description(entry),
        source_id: format!("{AVS_CODE}-abattoir-{}", entry.id),
        source_type: format!("{AVS_CODE}-abattoir"),
        raw: serde_json::to_value(entry).unwrap_or(serde_json::Value::Null),
        active: true,
    })
}

/// AVS site schema: butchers, restaurants, wholesalers. The collection the
/// entry was read from decides the store type.
pub fn from_site(entry: &SiteEntry, store_type: StoreType) -> Option<Store> {
    let active = entry.is_active;
    if !active {
        return None;
    }
    let (latitude, longitude) = entry.coordinates();
    if !geo::valid_coordinates(latitude, longitude) {
        return None;
    }
    Some(Store {
        name: entry.name.trim().to_string(),
        store_type,
        address: non_empty(Some(entry.address.as_str())),
        city: normalize::normalize_city(Some(entry.city.as_str())),
        postal_code: normalize::normalize_postal_code(Some(entry.postal_code.as_str())),
        country: COUNTRY.to_string(),
        latitude,
        longitude,
        phone: normalize::normalize_phone(entry.phone.as_deref()),
        email: non_empty(entry.email.as_deref()),
        website: non_empty(entry.website.as_deref()),
        logo_url: None,
        halal_certified: true,
        certifier_code: AVS_CODE.to_string(),
        certifier_name: AVS_NAME.to_string(),
        description: non_empty(entry.specialties.as_deref()),
        source_id: format!("{AVS_CODE}-{}-{}", store_type.as_str(), entry.id),
        source_type: format!("{AVS_CODE}-{}", store_type.as_str()),
        raw: serde_json::to_value(entry).unwrap_or(serde_json::Value::Null),
        active: true,
    })
}

/// Achahada directory schema. Coordinates arrive as strings and there is no
/// activity flag: every geographically valid, non-excluded entry is kept.
pub fn from_directory(
    entry: &DirectoryEntry,
    filters: &[i64],
    logos: &HashMap<String, String>,
) -> Option<(Store, Vec<OpeningHours>)> {
    // Unparseable coordinates land on the rejected (0,0) sentinel.
    let latitude = entry.latitude.trim().parse::<f64>().unwrap_or(0.0);
    let longitude = entry.longitude.trim().parse::<f64>().unwrap_or(0.0);
    if !geo::valid_coordinates(latitude, longitude) {
        return None;
    }

    let source_id = format!("{ACHAHADA_CODE}-{}", entry.id);
    let parsed = hours::parse_hours(&entry.hours_html);
    let rows: Vec<OpeningHours> = parsed
        .iter()
        .map(|h| OpeningHours {
            source_id: source_id.clone(),
            day_of_week: h.day_of_week,
            open_time: h.open_time.clone(),
            close_time: h.close_time.clone(),
            is_closed: h.is_closed,
        })
        .collect();

    let summary = hours::summarize_hours(&entry.hours_html);
    let description = if summary.is_empty() {
        None
    } else {
        let days: Vec<String> = summary
            .iter()
            .map(|(day, time)| format!("{day}: {time}"))
            .collect();
        Some(format!("Horaires: {}", days.join(", ")))
    };

    let address_lines: Vec<String> = [&entry.address1, &entry.address2]
        .iter()
        .map(|line| normalize::decode_entities(line))
        .filter(|line| !line.is_empty())
        .collect();

    let store = Store {
        name: normalize::decode_entities(&entry.name),
        store_type: category::resolve(filters),
        address: if address_lines.is_empty() {
            None
        } else {
            Some(address_lines.join(", "))
        },
        city: normalize::normalize_city(None),
        postal_code: None,
        country: COUNTRY.to_string(),
        latitude,
        longitude,
        phone: normalize::normalize_phone(entry.phone.as_deref()),
        email: non_empty(entry.email.as_deref()),
        website: non_empty(entry.website.as_deref()),
        logo_url: logos.get(&entry.id).cloned(),
        halal_certified: true,
        certifier_code: ACHAHADA_CODE.to_string(),
        certifier_name: ACHAHADA_NAME.to_string(),
        description,
        source_id,
        source_type: ACHAHADA_CODE.to_string(),
        raw: json!({ "entry": entry, "hours": parsed }),
        active: true,
    };
    Some((store, rows))
}

/// Labeled join of the legacy schema's free-text annotations. Empty join
/// yields None rather than an empty string.
fn legacy_description(entry: &LegacyEntry) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(comment) = non_empty(entry.comment.as_deref()) {
        parts.push(comment);
    }
    if let Some(number) = non_empty(entry.agreement_number.as_deref()) {
        parts.push(format!("Agr\u{e9}ment: {number}"));
    }
    if let Some(stamp) = non_empty(entry.veterinary_stamp.as_deref()) {
        parts.push(format!("Estampille: {stamp}"));
    }
    if let Some(specialties) = non_empty(entry.specialties.as_deref()) {
        parts.push(specialties);
    }
    if let Some(company) = non_empty(entry.company_name.as_deref()) {
        if !company.eq_ignore_ascii_case(entry.name.trim()) {
            parts.push(format!("Raison sociale: {company}"));
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
