//! Ordering of element objects by their numeric name suffix.
//!
//! Arrays and matrices are stored as one independent object per element,
//! named `<prefix>_<tag>_<index>`. Lexical order puts `x_10` before `x_2`,
//! so reconstruction sorts on the parsed trailing index instead:
//!
//! - names ending in `_<digits>` sort ascending by that integer
//! - names without a numeric suffix sort after all indexed names, by name
//! - ties on the index fall back to the full name

use std::cmp::Ordering;

use dsm_types::ObjectInfo;

/// Parse the trailing `_`-delimited integer of a name, if any.
///
/// ```
/// use dsm_store::index_suffix;
///
/// assert_eq!(index_suffix("vec_3fa2_12"), Some(12));
/// assert_eq!(index_suffix("counter"), None);
/// assert_eq!(index_suffix("vec_3fa2_"), None);
/// ```
pub fn index_suffix(name: &str) -> Option<u64> {
    let (_, tail) = name.rsplit_once('_')?;
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

fn compare(a: &str, b: &str) -> Ordering {
    match (index_suffix(a), index_suffix(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Sort object listings by trailing index.
pub fn sort_by_index(objects: &mut [ObjectInfo]) {
    objects.sort_by(|a, b| compare(&a.name, &b.name));
}
