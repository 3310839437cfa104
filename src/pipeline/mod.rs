//! The ingest pipeline: five raw collections in, canonical catalog out.
//! Pure and single-threaded; rejections become counters, never errors, so
//! the same input always yields the same output.

pub mod category;
pub mod dedup;
pub mod exclusion;
pub mod geo;
pub mod hours;
pub mod normalize;
pub mod transform;

use tracing::{debug, info};

use crate::catalog::{OpeningHours, PipelineStats, Store, StoreType, ACHAHADA_CODE, AVS_CODE};
use crate::feeds::{FeedSet, SiteEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub stores: Vec<Store>,
    pub hours: Vec<OpeningHours>,
    pub stats: PipelineStats,
    /// Source ids that appeared in a transformer output but lost the
    /// merge; the persistence layer retires the matching stale rows.
    pub dropped_source_ids: Vec<String>,
}

/// Run the whole transform. Processing order is fixed (butchers,
/// restaurants, wholesalers, abattoirs, directory) so dedup tie-breaking
/// stays deterministic.
pub fn run(feeds: &FeedSet) -> PipelineOutput {
    let mut stats = PipelineStats {
        raw_butchers: feeds.butchers.len(),
        raw_restaurants: feeds.restaurants.len(),
        raw_wholesalers: feeds.wholesalers.len(),
        raw_abattoirs: feeds.abattoirs.len(),
        raw_directory: feeds.directory.entries.len(),
        ..PipelineStats::default()
    };

    let mut candidates: Vec<Store> = Vec::new();
    let mut hours: Vec<OpeningHours> = Vec::new();

    collect_site(&feeds.butchers, StoreType::Butcher, &mut candidates, &mut stats);
    collect_site(&feeds.restaurants, StoreType::Restaurant, &mut candidates, &mut stats);
    collect_site(&feeds.wholesalers, StoreType::Wholesaler, &mut candidates, &mut stats);

    for entry in &feeds.abattoirs {
        match transform::from_legacy(entry) {
            Some(store) => candidates.push(store),
            None => {
                stats.filtered_inactive += 1;
                debug!(id = entry.id, name = %entry.name, "rejected legacy entry");
            }
        }
    }

    for entry in &feeds.directory.entries {
        if exclusion::is_excluded(entry) {
            stats.filtered_inclassable += 1;
            debug!(id = %entry.id, name = %entry.name, "excluded directory note entry");
            continue;
        }
        let filters = feeds
            .directory
            .categories
            .get(&entry.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        match transform::from_directory(entry, filters, &feeds.logos) {
            Some((store, rows)) => {
                candidates.push(store);
                hours.extend(rows);
            }
            None => {
                stats.filtered_inactive += 1;
                debug!(id = %entry.id, name = %entry.name, "rejected directory entry");
            }
        }
    }

    let result = dedup::dedup(candidates, hours);
    stats.deduplicated = result.collisions;
    for store in &result.stores {
        if store.source_type.starts_with(AVS_CODE) {
            stats.avs += 1;
        } else if store.source_type.starts_with(ACHAHADA_CODE) {
            stats.achahada += 1;
        }
        *stats
            .by_type
            .entry(store.store_type.as_str().to_string())
            .or_insert(0) += 1;
    }
    stats.hours = result.hours.len();

    info!(
        stores = result.stores.len(),
        hours = result.hours.len(),
        dropped = result.dropped_source_ids.len(),
        "pipeline complete"
    );

    PipelineOutput {
        stores: result.stores,
        hours: result.hours,
        stats,
        dropped_source_ids: result.dropped_source_ids,
    }
}

fn collect_site(
    entries: &[SiteEntry],
    store_type: StoreType,
    candidates: &mut Vec<Store>,
    stats: &mut PipelineStats,
) {
    for entry in entries {
        match transform::from_site(entry, store_type) {
            Some(store) => candidates.push(store),
            None => {
                stats.filtered_inactive += 1;
                debug!(id = entry.id, name = %entry.name, kind = store_type.as_str(), "rejected site entry");
            }
        }
    }
}

// ── Tests ──
