//! Maps the directory's category-filter ids onto the catalog's store types.

use crate::catalog::StoreType;

/// Ordered priority table: an entry carrying several filters resolves to
/// the earliest match. The ordering is load-bearing.
const PRIORITY: &[(i64, StoreType)] = &[
    (73, StoreType::Butcher),
    (83, StoreType::Restaurant),
    (79, StoreType::Abattoir),
    (88, StoreType::Supermarket),
    (85, StoreType::Wholesaler),
    (90, StoreType::Other),
    (91, StoreType::Other),
];

/// First table entry whose filter id appears in `filters`; `Other` when the
/// list is empty or nothing matches.
pub fn resolve(filters: &[i64]) -> StoreType {
    PRIORITY
        .iter()
        .find(|(id, _)| filters.contains(id))
        .map(|(_, store_type)| *store_type)
        .unwrap_or(StoreType::Other)
}
