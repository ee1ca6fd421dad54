//! Content fingerprints used as cache keys and index point ids.
//!
//! All fingerprints are BLAKE3 hashes truncated to 64 bits. Fields are
//! separated by a byte that cannot appear inside them unescaped, so adjacent
//! fields cannot alias ("ab"+"c" vs "a"+"bc"). 64 bits is plenty for cache
//! keys: a collision degrades to a stale hit or lost index entry, both of
//! which downstream code already tolerates.

use blake3::Hasher;

use crate::domain::SourceItem;

const FIELD_SEP: &[u8] = b"|";

/// Cache key for a retrieval result: the exact inputs that determine it.
pub fn retrieval_fingerprint(query_text: &str, supercategory: &str, category: &str) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(query_text.as_bytes());
    hasher.update(FIELD_SEP);
    hasher.update(supercategory.as_bytes());
    hasher.update(FIELD_SEP);
    hasher.update(category.as_bytes());
    finish_u64(hasher)
}

/// Cache key for a ranking result.
///
/// Deliberately excludes the price fields: price never affects which
/// substitutes are chosen, only the pricing math computed afterward, so two
/// requests differing only in price share one ranking entry.
pub fn ranking_fingerprint(item: &SourceItem) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(item.name.as_bytes());
    hasher.update(FIELD_SEP);
    hasher.update(item.description.as_bytes());
    hasher.update(FIELD_SEP);
    hasher.update(item.supercategory.as_bytes());
    hasher.update(FIELD_SEP);
    hasher.update(item.category.as_bytes());
    hasher.update(FIELD_SEP);
    hasher.update(&item.quantity.to_bits().to_le_bytes());
    hasher.update(FIELD_SEP);
    hasher.update(item.quantity_unit.as_bytes());
    finish_u64(hasher)
}

/// Stable vector-index point id for a SKU. SKU strings are not valid point
/// ids, so the id is derived and the SKU itself rides in the point payload.
pub fn sku_point_id(sku: &str) -> u64 {
    let hash = blake3::hash(sku.as_bytes());
    finish_bytes(hash.as_bytes())
}

fn finish_u64(hasher: Hasher) -> u64 {
    finish_bytes(hasher.finalize().as_bytes())
}

fn finish_bytes(bytes: &[u8; 32]) -> u64 {
    let mut first = [0u8; 8];
    first.copy_from_slice(&bytes[0..8]);
    u64::from_le_bytes(first)
}
