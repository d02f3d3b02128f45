//! Labels carried by every object the operator creates.

use std::collections::BTreeMap;

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY_LABEL_VALUE: &str = "reaper-operator";
pub const REAPER_LABEL: &str = "reaper.cassandra-reaper.io/reaper";

/// Labels for the children of the Reaper named `reaper_name`.
pub fn for_reaper(reaper_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (REAPER_LABEL.to_string(), reaper_name.to_string()),
        (
            MANAGED_BY_LABEL.to_string(),
            MANAGED_BY_LABEL_VALUE.to_string(),
        ),
    ])
}

/// Copy of `base` with `overrides` applied on top.
pub fn merge(
    base: Option<&BTreeMap<String, String>>,
    overrides: Option<&BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
    let mut merged = base.cloned().unwrap_or_default();
    if let Some(overrides) = overrides {
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}
