//! Metrics summarizer: degree and (bounded) betweenness top lists

use super::algo::centrality::betweenness;
use super::model::{canonical_id, Network};
use super::view::NetworkView;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Betweenness is skipped entirely above this many nodes
pub const BETWEENNESS_MAX_NODES: usize = 1200;
/// Length of each top list
pub const TOP_N: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeEntry {
    pub node: String,
    pub degree: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetweennessEntry {
    pub node: String,
    pub betweenness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub node_count: usize,
    /// Distinct node pairs, so one pair seen by several databases counts once
    pub edge_count: usize,
    pub top_degree: Vec<DegreeEntry>,
    /// `None` means "not computed" (graph too large), never "all zero"
    pub top_betweenness: Option<Vec<BetweennessEntry>>,
}

impl MetricsSummary {
    pub fn betweenness_computed(&self) -> bool {
        self.top_betweenness.is_some()
    }
}

/// Rank `(id, value)` pairs: value descending, then id ascending, top `n`
fn top_by<T: PartialOrd + Copy>(mut scored: Vec<(&str, T)>, n: usize) -> Vec<(String, T)> {
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    scored
        .into_iter()
        .take(n)
        .map(|(id, v)| (id.to_string(), v))
        .collect()
}

/// Summarize `network`.
///
/// Nodes in `ignore` (matched case-insensitively) still take part in the
/// computation but are left out of the top lists. Degree counts distinct
/// neighbours.
pub fn summarize(network: &Network, ignore: &HashSet<String>) -> MetricsSummary {
    let ignore: HashSet<String> = ignore.iter().map(|s| canonical_id(s)).collect();
    let view = NetworkView::new(network);
    let n = view.node_count();

    let degrees = view.degrees();
    let top_degree = top_by(
        (0..n)
            .map(|i| (view.id(i), degrees[i]))
            .filter(|(id, _)| !ignore.contains(*id))
            .collect(),
        TOP_N,
    )
    .into_iter()
    .map(|(node, degree)| DegreeEntry { node, degree })
    .collect();

    let top_betweenness = if n <= BETWEENNESS_MAX_NODES {
        let scores = betweenness(&view.adjacency());
        let ranked = top_by(
            (0..n)
                .map(|i| (view.id(i), scores[i]))
                .filter(|(id, _)| !ignore.contains(*id))
                .collect(),
            TOP_N,
        );
        Some(
            ranked
                .into_iter()
                .map(|(node, betweenness)| BetweennessEntry { node, betweenness })
                .collect(),
        )
    } else {
        debug!(
            "Skipping betweenness: {} nodes exceeds {}",
            n, BETWEENNESS_MAX_NODES
        );
        None
    };

    MetricsSummary {
        node_count: n,
        edge_count: view.edge_count(),
        top_degree,
        top_betweenness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::{network_from, ppi, record};
    use crate::graph::EdgeKind;

    fn star(leaves: usize) -> Network {
        let records = (0..leaves)
            .map(|i| ppi("HUB", &format!("L{:04}", i), None))
            .collect();
        network_from(records, &[])
    }

    #[test]
    fn test_degree_ranking_and_ties() {
        let net = network_from(
            vec![ppi("A", "B", None), ppi("A", "C", None), ppi("D", "E", None)],
            &[],
        );
        let m = summarize(&net, &HashSet::new());
        let names: Vec<&str> = m.top_degree.iter().map(|e| e.node.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(m.top_degree[0].degree, 2);
        assert_eq!((m.node_count, m.edge_count), (5, 3));
    }

    #[test]
    fn test_edge_count_collapses_parallel_evidence() {
        let net = network_from(
            vec![
                ppi("ELAVL1", "MALAT1", None),
                record("ELAVL1", "MALAT1", EdgeKind::RbpTarget, "ENCORI", None),
            ],
            &[],
        );
        assert_eq!(net.edge_count(), 2);
        let m = summarize(&net, &HashSet::new());
        assert_eq!((m.node_count, m.edge_count), (2, 1));
        assert!(m.top_degree.iter().all(|e| e.degree == 1));
    }

    #[test]
    fn test_top_lists_capped() {
        let m = summarize(&star(30), &HashSet::new());
        assert_eq!(m.top_degree.len(), TOP_N);
        let btw = m.top_betweenness.unwrap();
        assert_eq!(btw.len(), TOP_N);
        assert_eq!(btw[0].node, "HUB");
        assert!((btw[0].betweenness - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ignore_hides_but_still_counts() {
        let ignore: HashSet<String> = ["hub".to_string()].into_iter().collect();
        let m = summarize(&star(3), &ignore);
        assert!(m.top_degree.iter().all(|e| e.node != "HUB"));
        assert!(m.top_degree.iter().all(|e| e.degree == 1));
        assert_eq!(m.node_count, 4);
    }

    #[test]
    fn test_betweenness_omitted_above_threshold() {
        let m = summarize(&star(BETWEENNESS_MAX_NODES), &HashSet::new());
        assert!(!m.betweenness_computed());
        assert_eq!(m.top_degree[0].node, "HUB");
        assert_eq!(m.top_degree[0].degree, BETWEENNESS_MAX_NODES);
    }

    #[test]
    fn test_empty_network() {
        let m = summarize(&network_from(vec![], &[]), &HashSet::new());
        assert_eq!(m.node_count, 0);
        assert!(m.top_degree.is_empty());
        assert_eq!(m.top_betweenness, Some(vec![]));
    }
}
