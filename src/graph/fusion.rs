//! Graph fusion engine
//!
//! Queries every requested evidence source, then folds the returned records
//! into one node/edge set. Fetching may fan out across threads; folding is
//! done by a single writer in a fixed order, so the result does not depend on
//! which fetch finished first.

use super::model::{canonical_id, Edge, EdgeKey, Network, NetworkMeta, Node, NodeKind};
use super::prune::prune;
use crate::error::{FusionError, Result};
use crate::sources::{
    EvidenceAdapter, EvidenceRegistry, EvidenceSource, FanOut, InteractionRecord, Pass,
    SourceParams,
};
use indexmap::map::Entry;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Node budget used when the caller does not pick one
pub const DEFAULT_NODE_BUDGET: usize = 2000;
/// Largest node budget accepted
pub const MAX_NODE_BUDGET: usize = 20_000;
/// Cap on proteins fed into a second-hop expansion pass
pub const MAX_EXPANSION_SEEDS: usize = 250;

/// Everything needed to build one network
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    pub seeds: Vec<String>,
    pub sources: Vec<EvidenceSource>,
    pub params: SourceParams,
    /// 0 disables pruning
    pub node_budget: usize,
}

impl BuildRequest {
    pub fn new<I, S>(seeds: I, sources: Vec<EvidenceSource>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seeds: seeds.into_iter().map(Into::into).collect(),
            sources,
            params: SourceParams::default(),
            node_budget: DEFAULT_NODE_BUDGET,
        }
    }

    pub fn with_params(mut self, params: SourceParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_node_budget(mut self, node_budget: usize) -> Self {
        self.node_budget = node_budget;
        self
    }

    /// Trimmed seeds, de-duplicated case-insensitively, first spelling kept
    pub fn query_seeds(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.seeds
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(canonical_id(s)))
            .map(str::to_string)
            .collect()
    }

    /// Reject the request before anything touches the network
    pub fn validate(&self) -> Result<()> {
        if self.query_seeds().is_empty() {
            return Err(FusionError::config("at least one seed is required"));
        }
        if self.sources.is_empty() {
            let supported: Vec<&str> = EvidenceSource::ALL.iter().map(|s| s.id()).collect();
            return Err(FusionError::config(format!(
                "no evidence source requested. Supported: {}",
                supported.join(", ")
            )));
        }
        if self.node_budget > MAX_NODE_BUDGET {
            return Err(FusionError::config(format!(
                "node budget must be at most {}, got {}",
                MAX_NODE_BUDGET, self.node_budget
            )));
        }
        self.params.validate()
    }

    /// Requested sources with duplicates removed, order kept
    fn distinct_sources(&self) -> Vec<EvidenceSource> {
        let mut out = Vec::with_capacity(self.sources.len());
        for &source in &self.sources {
            if !out.contains(&source) {
                out.push(source);
            }
        }
        out
    }
}

/// Single-writer fold of interaction records into node and edge maps.
///
/// Applies the merge rules: nodes keyed by canonical id with upgrade-only
/// kinds, edges keyed by `(min, max, kind, source_db)` with support counting
/// and max-score retention.
#[derive(Debug, Default)]
pub struct NetworkAccumulator {
    nodes: IndexMap<String, Node>,
    edges: IndexMap<EdgeKey, Edge>,
}

impl NetworkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Create or update a node; returns its canonical id, or `None` for a blank id.
    pub fn add_node(&mut self, raw_id: &str, kind: NodeKind, source_db: &str) -> Option<String> {
        let id = canonical_id(raw_id);
        if id.is_empty() {
            return None;
        }
        match self.nodes.entry(id.clone()) {
            Entry::Occupied(mut e) => e.get_mut().absorb(kind, source_db),
            Entry::Vacant(e) => {
                e.insert(Node::new(&id, raw_id.trim(), kind, source_db));
            }
        }
        Some(id)
    }

    /// Fold one record. Records with a blank endpoint are dropped (returns false).
    pub fn merge(&mut self, record: InteractionRecord) -> bool {
        if canonical_id(&record.node_a.id).is_empty() || canonical_id(&record.node_b.id).is_empty() {
            debug!("Dropping {} record with a blank endpoint", record.source_db);
            return false;
        }
        let (Some(a), Some(b)) = (
            self.add_node(&record.node_a.id, record.node_a.kind, &record.source_db),
            self.add_node(&record.node_b.id, record.node_b.kind, &record.source_db),
        ) else {
            return false;
        };

        let score = record.score.filter(|s| s.is_finite());
        let key = EdgeKey::new(&a, &b, record.kind, &record.source_db);
        match self.edges.entry(key) {
            Entry::Occupied(mut e) => e.get_mut().absorb(score, record.evidence),
            Entry::Vacant(e) => {
                let edge = Edge {
                    source: e.key().u.clone(),
                    target: e.key().v.clone(),
                    kind: record.kind,
                    source_db: record.source_db,
                    score,
                    support: 1,
                    evidence: record.evidence,
                };
                e.insert(edge);
            }
        }
        true
    }

    /// Fold records in order; returns how many were merged
    pub fn merge_all<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = InteractionRecord>,
    {
        let mut merged = 0;
        for record in records {
            if self.merge(record) {
                merged += 1;
            }
        }
        merged
    }

    /// Protein nodes reported by `source_db`, in discovery order, at most `cap`.
    /// Returned as their display labels, ready to be sent upstream.
    pub fn expansion_seeds(&self, source_db: &str, cap: usize) -> Vec<String> {
        self.nodes
            .values()
            .filter(|n| n.kind == NodeKind::Protein && n.has_source(source_db))
            .take(cap)
            .map(|n| n.label.clone())
            .collect()
    }

    pub fn finish(self, meta: NetworkMeta) -> Network {
        Network::from_parts(self.nodes, self.edges, meta)
    }
}

/// Primary pass for one adapter: one batched call, or one call per seed.
///
/// Per-seed calls run on the rayon pool; the first error wins and the
/// remaining results are discarded. Output keeps seed order.
fn fetch_primary(adapter: &dyn EvidenceAdapter, seeds: &[String]) -> Result<Vec<InteractionRecord>> {
    match adapter.source().fan_out() {
        FanOut::Batched => adapter.fetch(seeds, Pass::Primary),
        FanOut::PerSeed => {
            let per_seed: Vec<Vec<InteractionRecord>> = seeds
                .par_iter()
                .map(|seed| adapter.fetch(std::slice::from_ref(seed), Pass::Primary))
                .collect::<Result<_>>()?;
            Ok(per_seed.into_iter().flatten().collect())
        }
    }
}

/// Build a fused network.
///
/// All-or-nothing: any adapter failure aborts the build and no partial
/// network is returned. When the node count exceeds a non-zero budget the
/// result is pruned.
pub fn build(request: &BuildRequest, registry: &EvidenceRegistry) -> Result<Network> {
    request.validate()?;

    let seeds = request.query_seeds();
    let sources = request.distinct_sources();
    let adapters: Vec<Arc<dyn EvidenceAdapter>> = sources
        .iter()
        .map(|&source| {
            registry.get(source).cloned().ok_or_else(|| {
                FusionError::config(format!("no adapter registered for source '{}'", source))
            })
        })
        .collect::<Result<_>>()?;

    info!(
        "Building network: {} seed(s), sources [{}]",
        seeds.len(),
        sources.iter().map(|s| s.id()).collect::<Vec<_>>().join(", ")
    );

    let mut acc = NetworkAccumulator::new();
    for adapter in &adapters {
        let source = adapter.source();
        let records = fetch_primary(adapter.as_ref(), &seeds)?;
        let fetched = records.len();
        let merged = acc.merge_all(records);
        info!(
            "{}: merged {}/{} records (now {} nodes, {} edges)",
            source,
            merged,
            fetched,
            acc.node_count(),
            acc.edge_count()
        );

        if source.supports_expansion() && request.params.ppi.depth >= 2 {
            let frontier = acc.expansion_seeds(adapter.source_db(), MAX_EXPANSION_SEEDS);
            if frontier.is_empty() {
                continue;
            }
            let records = adapter.fetch(&frontier, Pass::Expansion)?;
            let merged = acc.merge_all(records);
            info!(
                "{} expansion from {} protein(s): merged {} records (now {} nodes, {} edges)",
                source,
                frontier.len(),
                merged,
                acc.node_count(),
                acc.edge_count()
            );
        }
    }

    let meta = NetworkMeta::new(
        seeds.iter().map(|s| canonical_id(s)).collect(),
        sources,
        request.params.clone(),
        request.node_budget,
    );
    let network = acc.finish(meta);

    if request.node_budget > 0 && network.node_count() > request.node_budget {
        return Ok(prune(&network, request.node_budget));
    }
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::ppi;
    use crate::graph::EdgeKind;
    use crate::sources::Endpoint;
    use std::sync::Mutex;

    /// Adapter answering from a fixed record list and logging its calls
    struct Fixed {
        source: EvidenceSource,
        records: Vec<InteractionRecord>,
        calls: Mutex<Vec<(Vec<String>, Pass)>>,
    }

    impl Fixed {
        fn new(source: EvidenceSource, records: Vec<InteractionRecord>) -> Arc<Self> {
            Arc::new(Self {
                source,
                records,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl EvidenceAdapter for Fixed {
        fn source(&self) -> EvidenceSource {
            self.source
        }

        fn source_db(&self) -> &str {
            "STRING"
        }

        fn fetch(&self, identifiers: &[String], pass: Pass) -> Result<Vec<InteractionRecord>> {
            self.calls.lock().unwrap().push((identifiers.to_vec(), pass));
            Ok(match pass {
                Pass::Primary => self.records.clone(),
                Pass::Expansion => vec![ppi("MDM2", "UBE2D1", Some(0.8))],
            })
        }
    }

    #[test]
    fn test_merge_idempotent_except_support() {
        let mut acc = NetworkAccumulator::new();
        for _ in 0..5 {
            acc.merge(ppi("TP53", "MDM2", Some(0.9)));
        }
        assert_eq!(acc.node_count(), 2);
        assert_eq!(acc.edge_count(), 1);
        let net = acc.finish(NetworkMeta::new(vec![], vec![], SourceParams::default(), 0));
        assert_eq!(net.edges().next().unwrap().support, 5);
    }

    #[test]
    fn test_case_insensitive_ids_keep_first_label() {
        let mut acc = NetworkAccumulator::new();
        acc.merge(ppi("Tp53", "MDM2", None));
        acc.merge(ppi("mdm2", " TP53 ", None));
        let net = acc.finish(NetworkMeta::new(vec![], vec![], SourceParams::default(), 0));
        assert_eq!(net.node_count(), 2);
        assert_eq!(net.edge_count(), 1);
        assert_eq!(net.node("TP53").unwrap().label, "Tp53");
    }

    #[test]
    fn test_blank_endpoint_dropped() {
        let mut acc = NetworkAccumulator::new();
        assert!(!acc.merge(ppi("TP53", "  ", None)));
        assert_eq!(acc.node_count(), 0);
    }

    #[test]
    fn test_evidence_follows_last_non_empty_record() {
        let mut acc = NetworkAccumulator::new();
        let mut first = ppi("A", "B", None);
        first.evidence.insert("n".into(), 1.into());
        let mut second = ppi("B", "A", None);
        second.evidence.insert("n".into(), 2.into());
        acc.merge(first);
        acc.merge(second);
        acc.merge(ppi("A", "B", None));
        let net = acc.finish(NetworkMeta::new(vec![], vec![], SourceParams::default(), 0));
        assert_eq!(net.edges().next().unwrap().evidence["n"], 2);
    }

    #[test]
    fn test_kinds_from_records() {
        let mut acc = NetworkAccumulator::new();
        acc.merge(InteractionRecord {
            node_a: Endpoint::new("ELAVL1", NodeKind::Protein),
            node_b: Endpoint::new("MALAT1", NodeKind::Rna),
            kind: EdgeKind::RbpTarget,
            source_db: "ENCORI".into(),
            score: None,
            evidence: Default::default(),
        });
        let net = acc.finish(NetworkMeta::new(vec![], vec![], SourceParams::default(), 0));
        assert_eq!(net.node("MALAT1").unwrap().kind, NodeKind::Rna);
        assert_eq!(net.node("ELAVL1").unwrap().sources, vec!["ENCORI"]);
    }

    #[test]
    fn test_validate_rejects_before_fetch() {
        let adapter = Fixed::new(EvidenceSource::Ppi, vec![]);
        let registry = EvidenceRegistry::new().with(adapter.clone());

        let err = build(&BuildRequest::new(["TP53"], vec![]), &registry).unwrap_err();
        assert!(matches!(err, FusionError::Configuration(_)));

        let err = build(&BuildRequest::new([" ", ""], vec![EvidenceSource::Ppi]), &registry).unwrap_err();
        assert!(matches!(err, FusionError::Configuration(_)));

        let req = BuildRequest::new(["TP53"], vec![EvidenceSource::Ppi]).with_node_budget(MAX_NODE_BUDGET + 1);
        assert!(build(&req, &registry).is_err());

        assert!(adapter.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unregistered_source_is_config_error() {
        let registry = EvidenceRegistry::new();
        let err = build(&BuildRequest::new(["TP53"], vec![EvidenceSource::RnaRna]), &registry).unwrap_err();
        assert!(matches!(err, FusionError::Configuration(_)));
    }

    #[test]
    fn test_batched_source_called_once_with_all_seeds() {
        let adapter = Fixed::new(EvidenceSource::Ppi, vec![ppi("TP53", "MDM2", Some(0.9))]);
        let registry = EvidenceRegistry::new().with(adapter.clone());
        let req = BuildRequest::new(["TP53", "brca1", "tp53"], vec![EvidenceSource::Ppi]);
        let net = build(&req, &registry).unwrap();

        let calls = adapter.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec!["TP53", "brca1"]);
        assert_eq!(net.seeds(), &["TP53".to_string(), "BRCA1".to_string()]);
        assert_eq!(net.meta().counts.edges, 1);
    }

    #[test]
    fn test_expansion_pass_runs_at_depth_two() {
        let adapter = Fixed::new(
            EvidenceSource::Ppi,
            vec![ppi("TP53", "MDM2", Some(0.9)), ppi("TP53", "ATM", Some(0.7))],
        );
        let registry = EvidenceRegistry::new().with(adapter.clone());
        let mut params = SourceParams::default();
        params.ppi.depth = 2;
        let req = BuildRequest::new(["TP53"], vec![EvidenceSource::Ppi]).with_params(params);
        let net = build(&req, &registry).unwrap();

        let calls = adapter.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1, Pass::Expansion);
        assert_eq!(calls[1].0, vec!["TP53", "MDM2", "ATM"]);
        assert!(net.contains_node("UBE2D1"));
    }

    #[test]
    fn test_per_seed_source_fans_out() {
        let adapter = Fixed::new(EvidenceSource::RnaRna, vec![]);
        let registry = EvidenceRegistry::new().with(adapter.clone());
        let req = BuildRequest::new(["A", "B", "C"], vec![EvidenceSource::RnaRna]);
        build(&req, &registry).unwrap();

        let mut seen: Vec<Vec<String>> = adapter.calls.lock().unwrap().iter().map(|c| c.0.clone()).collect();
        seen.sort();
        assert_eq!(seen, vec![vec!["A"], vec!["B"], vec!["C"]]);
    }
}
