//! Slug generation and per-batch deduplication.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::record::Record;

/// Slug used when a name has no ASCII alphanumerics at all.
pub const PLACEHOLDER_SLUG: &str = "unknown";

/// Name assumed for records that carry no string `name`.
pub const PLACEHOLDER_NAME: &str = "Unknown Skill";

pub const LEGACY_ID_KEY: &str = "_legacy_id";

static NON_SLUG_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static slug regex"));

/// Lowercase, collapse every run outside `[a-z0-9]` into one hyphen and
/// trim hyphens from both ends. Never returns an empty string.
pub fn base_slug(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let hyphenated = NON_SLUG_RUN.replace_all(&lowered, "-");
    let slug = hyphenated.trim_matches('-');
    if slug.is_empty() {
        PLACEHOLDER_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Derive a slug for `name` that is not yet in `seen`, then record it.
///
/// Collisions get `-2`, `-3`, ... appended to the base slug until a free
/// value turns up. The returned slug was absent from `seen` on entry.
pub fn normalize(name: &str, seen: &mut HashSet<String>) -> String {
    let base = base_slug(name);
    let mut slug = base.clone();
    let mut counter: u64 = 1;
    while seen.contains(&slug) {
        counter += 1;
        slug = format!("{}-{}", base, counter);
    }
    seen.insert(slug.clone());
    slug
}

/// Assign every record a unique slug id in input order.
///
/// The first record with a given base slug keeps it unsuffixed. A prior
/// `id` that is set and differs from the new slug is kept under
/// `_legacy_id`. Returns the records and every slug handed out.
pub fn apply_to_batch(records: Vec<Record>) -> (Vec<Record>, HashSet<String>) {
    let mut seen = HashSet::with_capacity(records.len());
    let mut updated = Vec::with_capacity(records.len());

    for mut record in records {
        let name = record
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(PLACEHOLDER_NAME);
        let slug = normalize(name, &mut seen);

        let old_id = record.insert("id".to_string(), Value::String(slug.clone()));
        if let Some(old_id) = old_id {
            if is_set(&old_id) && old_id.as_str() != Some(slug.as_str()) {
                record.insert(LEGACY_ID_KEY.to_string(), old_id);
            }
        }
        updated.push(record);
    }

    (updated, seen)
}

/// Whether a prior id counts as present: null, `false`, `0`, empty
/// strings and empty containers do not.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
