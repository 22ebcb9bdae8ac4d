//! Matching free-text location names to polygon feature names.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use overlay_common::{HeatmapError, HeatmapResult};

/// A named value read from tabular input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationValue {
    pub location: String,
    pub value: f64,
}

impl LocationValue {
    pub fn new(location: impl Into<String>, value: f64) -> Self {
        Self {
            location: location.into(),
            value,
        }
    }
}

/// How feature names are compared with location names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NameMatching {
    /// Normalized names must be equal.
    #[default]
    Exact,
    /// One normalized name must contain the other; the candidate with the
    /// smallest edit distance wins.
    Lenient,
}

/// Normalize a name for comparison: ASCII letters and digits are kept and
/// lowercased, runs of whitespace, hyphens and underscores collapse to a
/// single space, everything else is dropped.
///
/// `"St. Louis  - City"` normalizes to `"st louis city"`.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut pending_space = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_space && !normalized.is_empty() {
                normalized.push(' ');
            }
            pending_space = false;
            normalized.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_space = true;
        }
    }

    normalized
}

/// Bind each feature name to a location value.
///
/// Features without a match are collected; unless `skip_missing` is set
/// the whole resolution fails naming every one of them.
pub fn resolve_names(
    feature_names: &[&str],
    locations: &[LocationValue],
    mode: NameMatching,
    skip_missing: bool,
) -> HeatmapResult<HashMap<String, LocationValue>> {
    let normalized_locations: Vec<String> = locations
        .iter()
        .map(|l| normalize_name(&l.location))
        .collect();

    let mut resolved = HashMap::with_capacity(feature_names.len());
    let mut unmatched = Vec::new();

    for &feature_name in feature_names {
        let normalized_feature = normalize_name(feature_name);

        let found = match mode {
            NameMatching::Exact => normalized_locations
                .iter()
                .position(|l| *l == normalized_feature),
            NameMatching::Lenient => closest_containing(&normalized_feature, &normalized_locations),
        };

        match found {
            Some(i) => {
                resolved.insert(feature_name.to_string(), locations[i].clone());
            }
            None => unmatched.push(feature_name.to_string()),
        }
    }

    if !unmatched.is_empty() {
        if !skip_missing {
            return Err(HeatmapError::UnmatchedLocations(unmatched));
        }
        warn!(unmatched = ?unmatched, "Skipping features without a matching location");
    }

    Ok(resolved)
}

/// Among locations where one name contains the other, the index of the one
/// with the smallest Levenshtein distance to `feature`. Ties go to the
/// earlier location.
fn closest_containing(feature: &str, locations: &[String]) -> Option<usize> {
    locations
        .iter()
        .enumerate()
        .filter(|(_, l)| l.contains(feature) || feature.contains(l.as_str()))
        .map(|(i, l)| (i, strsim::levenshtein(l, feature)))
        .fold(None, |best: Option<(usize, usize)>, (i, dist)| match best {
            Some((_, best_dist)) if best_dist <= dist => best,
            _ => Some((i, dist)),
        })
        .map(|(i, _)| i)
}
