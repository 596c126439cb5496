//! Index discovery and slice planning
//!
//! An index target may be a single index, an alias, a comma list or a
//! wildcard pattern. `_settings` resolves it to concrete indices along with
//! their primary shard counts, which bound how many slices are useful.

use crate::error::{Error, Result};
use crate::http::Transport;
use crate::scroll::SliceDescriptor;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Deserialize)]
struct IndexEntry {
    settings: Settings,
}

#[derive(Deserialize)]
struct Settings {
    index: IndexSettings,
}

#[derive(Deserialize)]
struct IndexSettings {
    number_of_shards: String,
}

/// Resolve `target` to concrete indices and their primary shard counts
pub async fn discover_indices(
    transport: &dyn Transport,
    target: &str,
) -> Result<BTreeMap<String, usize>> {
    let response = transport
        .get(&format!("{target}/_settings"), None)
        .await
        .map_err(|e| Error::discovery(format!("getting index settings: {e}")))?;

    match response.status {
        200 => {}
        404 => {
            return Err(Error::IndexNotFound {
                target: target.to_string(),
            })
        }
        status => return Err(Error::http_status(status, response.text())),
    }

    let entries: BTreeMap<String, IndexEntry> = response
        .json()
        .map_err(|e| Error::discovery(format!("unmarshaling index settings: {e}")))?;

    let mut indices = BTreeMap::new();
    for (index, entry) in entries {
        let raw = entry.settings.index.number_of_shards;
        let shards = raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                Error::discovery(format!("index {index} has invalid shard count {raw:?}"))
            })?;
        debug!(index = %index, shards, "discovered index");
        indices.insert(index, shards);
    }
    Ok(indices)
}

/// One descriptor per (index, slice), at most `max_slices` per index
pub fn plan_slices(indices: &BTreeMap<String, usize>, max_slices: usize) -> Vec<SliceDescriptor> {
    let mut plan = Vec::new();
    for (index, &shards) in indices {
        let slices = max_slices.min(shards).max(1);
        info!(index = %index, shards, slices, "dumping");
        plan.extend((0..slices).map(|slice| SliceDescriptor::new(index.clone(), slice, slices)));
    }
    plan
}
