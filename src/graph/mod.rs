//! Fused interaction graph
//!
//! `model` holds the immutable [`Network`] value; `fusion` folds evidence
//! records into one; everything else derives new values or read-only
//! summaries from a finished network.

pub mod algo;
pub mod fusion;
pub mod metrics;
pub mod model;
pub mod prune;
pub mod subnetwork;
pub mod view;

pub use algo::community::{partition, CommunityStrategy, Partition};
pub use fusion::{build, BuildRequest, NetworkAccumulator};
pub use metrics::{summarize, MetricsSummary};
pub use model::{
    canonical_id, Counts, Edge, EdgeKey, EdgeKind, ModuleInfo, Network, NetworkMeta, Node,
    NodeKind, PruneInfo,
};
pub use prune::prune;
pub use subnetwork::extract_module;
pub use view::NetworkView;

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::sources::{Endpoint, InteractionRecord, SourceParams};

    pub fn record(
        a: &str,
        b: &str,
        kind: EdgeKind,
        source_db: &str,
        score: Option<f64>,
    ) -> InteractionRecord {
        InteractionRecord {
            node_a: Endpoint::new(a, NodeKind::Protein),
            node_b: Endpoint::new(b, NodeKind::Protein),
            kind,
            source_db: source_db.to_string(),
            score,
            evidence: Default::default(),
        }
    }

    /// STRING-style PPI edge
    pub fn ppi(a: &str, b: &str, score: Option<f64>) -> InteractionRecord {
        record(a, b, EdgeKind::Ppi, "STRING", score)
    }

    pub fn network_from(records: Vec<InteractionRecord>, seeds: &[&str]) -> Network {
        let mut acc = NetworkAccumulator::new();
        acc.merge_all(records);
        acc.finish(NetworkMeta::new(
            seeds.iter().map(|s| canonical_id(s)).collect(),
            Vec::new(),
            SourceParams::default(),
            0,
        ))
    }
}
