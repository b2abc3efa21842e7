//! Tag list normalization.

use std::collections::HashSet;

/// Split a comma-separated tag list, trim each tag, drop empties, and keep
/// only the first occurrence of each tag (case-sensitive), joined by ", ".
pub fn dedup_tags(raw: &str) -> String {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(*tag))
        .collect::<Vec<_>>()
        .join(", ")
}
