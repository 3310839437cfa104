//! Cross-source deduplication. Two records naming the same establishment
//! within the same ~100 m grid cell collapse to one; AVS-sourced records
//! win over Achahada duplicates irrespective of arrival order, first-seen
//! wins otherwise.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::{OpeningHours, Store, ACHAHADA_CODE, AVS_CODE};

// Accented-Latin alphanumerics only; everything else is stripped.
static KEY_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-z0-9\u{e0}\u{e2}\u{e4}\u{e7}\u{e9}\u{e8}\u{ea}\u{eb}\u{ee}\u{ef}\u{f4}\u{f6}\u{f9}\u{fb}\u{fc}]").unwrap());

/// Normalized name plus coordinates rounded to 3 decimal places.
pub fn dedup_key(name: &str, latitude: f64, longitude: f64) -> String {
    let lowered = name.to_lowercase();
    let cleaned = KEY_STRIP_RE.replace_all(&lowered, "");
    format!("{cleaned}|{latitude:.3}|{longitude:.3}")
}

pub struct DedupResult {
    pub stores: Vec<Store>,
    pub hours: Vec<OpeningHours>,
    pub collisions: usize,
    /// Source ids seen pre-dedup that did not survive, in input order.
    pub dropped_source_ids: Vec<String>,
}

pub fn dedup(candidates: Vec<Store>, hours: Vec<OpeningHours>) -> DedupResult {
    let all_ids: Vec<String> = candidates.iter().map(|s| s.source_id.clone()).collect();

    // Insertion-ordered vec + key index keeps the output deterministic;
    // a winning replacement happens in place.
    let mut stores: Vec<Store> = Vec::with_capacity(candidates.len());
    let mut by_key: HashMap<String, usize> = HashMap::new();
    let mut collisions = 0;

    for store in candidates {
        let key = dedup_key(&store.name, store.latitude, store.longitude);
        match by_key.get(&key) {
            Some(&idx) => {
                collisions += 1;
                if stores[idx].source_type.starts_with(ACHAHADA_CODE)
                    && store.source_type.starts_with(AVS_CODE)
                {
                    stores[idx] = store;
                }
            }
            None => {
                by_key.insert(key, stores.len());
                stores.push(store);
            }
        }
    }

    let surviving: HashSet<&str> = stores.iter().map(|s| s.source_id.as_str()).collect();
    // Hours belonging to a record that lost the merge must not leak out.
    let hours: Vec<OpeningHours> = hours
        .into_iter()
        .filter(|h| surviving.contains(h.source_id.as_str()))
        .collect();
    let dropped_source_ids: Vec<String> = all_ids
        .into_iter()
        .filter(|id| !surviving.contains(id.as_str()))
        .collect();

    DedupResult {
        stores,
        hours,
        collisions,
        dropped_source_ids,
    }
}
