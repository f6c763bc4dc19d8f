//! Vendor default parameter tables.
//!
//! Two tables ship with the coordinator: a fixed baseline applied to every
//! freshly opened handle, and a per-symbology enable table embedded as a
//! JSON resource. Parameter ids and values are integer codes defined by
//! the hardware vendor and are treated as opaque here.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use tracing::warn;

/// Embedded default per-symbology parameter table (symbology-id → value).
const DEFAULT_CODES_JSON: &str = include_str!("default_codes.json");

/// Baseline vendor parameters applied right after a handle opens.
///
/// These settle the scanner engine into the decode configuration the
/// coordinator expects before any per-symbology or user settings apply.
pub fn sdk_baseline_params() -> BTreeMap<u32, i32> {
    BTreeMap::from([
        (765, 0),
        (687, 4),
        (588, 2),
        (8610, 1),
        (900, 0),
        (901, 0),
        (905, 1),
    ])
}

/// Default per-symbology parameter map loaded from the embedded table.
///
/// A malformed table falls back to an empty map with a warning rather
/// than failing bring-up; the reader still opens, just without symbology
/// overrides.
pub fn default_code_params() -> BTreeMap<u32, i32> {
    static TABLE: OnceLock<BTreeMap<u32, i32>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            match serde_json::from_str::<BTreeMap<String, i32>>(DEFAULT_CODES_JSON) {
                Ok(raw) => raw
                    .into_iter()
                    .filter_map(|(k, v)| match k.parse::<u32>() {
                        Ok(id) => Some((id, v)),
                        Err(_) => {
                            warn!(key = %k, "skipping non-numeric symbology id in defaults table");
                            None
                        }
                    })
                    .collect(),
                Err(e) => {
                    warn!(error = %e, "default symbology table is malformed, using empty map");
                    BTreeMap::new()
                }
            }
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_params_present() {
        let params = sdk_baseline_params();
        assert_eq!(params.get(&765), Some(&0));
        assert_eq!(params.get(&687), Some(&4));
        assert_eq!(params.get(&905), Some(&1));
        assert_eq!(params.len(), 7);
    }

    #[test]
    fn test_default_code_params_parse() {
        let params = default_code_params();
        assert!(!params.is_empty());
        // Code 128 and QR enabled by default
        assert_eq!(params.get(&8), Some(&1));
        assert_eq!(params.get(&293), Some(&1));
    }

    #[test]
    fn test_default_code_params_stable() {
        // Table is parsed once and cached
        assert_eq!(default_code_params(), default_code_params());
    }
}
