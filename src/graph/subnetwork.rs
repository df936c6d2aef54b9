use super::algo::community::Partition;
use super::model::{ModuleInfo, Network};
use crate::error::Result;
use rustc_hash::FxHashSet;

/// Sub-network induced by community `index` of `partition`.
///
/// Keeps the community's nodes and every edge with both ends inside; the
/// parent's provenance is carried over and annotated with the module.
/// An index past the last community is a [`FusionError::Range`](crate::FusionError::Range).
pub fn extract_module(network: &Network, partition: &Partition, index: usize) -> Result<Network> {
    let members = partition.community(index)?;
    let keep: FxHashSet<&str> = members.iter().map(String::as_str).collect();

    let mut meta = network.meta().clone();
    meta.module = Some(ModuleInfo {
        index,
        min_size: partition.min_size,
        size: members.len(),
    });
    Ok(network.induced(|id| keep.contains(id), meta))
}
