//! Community partitioning
//!
//! Two strategies behind one trait, picked by graph size:
//! - greedy modularity agglomeration (Clauset-Newman-Moore) for graphs up to
//!   [`GREEDY_MAX_NODES`] nodes and [`GREEDY_MAX_EDGES`] edges. Deterministic.
//! - asynchronous label propagation with a fixed RNG seed above that.
//!
//! Both use the view's edge weights (score, or 1.0 when absent).

use crate::error::{FusionError, Result};
use crate::graph::{Network, NetworkView};
use indexmap::IndexMap;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Largest node count still partitioned with greedy modularity
pub const GREEDY_MAX_NODES: usize = 2000;
/// Largest edge count still partitioned with greedy modularity
pub const GREEDY_MAX_EDGES: usize = 20_000;
/// RNG seed for label propagation
pub const LABEL_PROPAGATION_SEED: u64 = 7;
/// Upper bound on label propagation sweeps
const MAX_PROPAGATION_ROUNDS: usize = 100;

/// Groups node positions of a view into disjoint communities.
pub trait CommunityStrategy {
    fn name(&self) -> &'static str;

    /// Every node appears in exactly one returned group. Group order and
    /// member order are not significant.
    fn detect(&self, adj: &[Vec<(usize, f64)>]) -> Vec<Vec<usize>>;
}

/// Size predicate: whether the greedy strategy is affordable
pub fn use_greedy(node_count: usize, edge_count: usize) -> bool {
    node_count <= GREEDY_MAX_NODES && edge_count <= GREEDY_MAX_EDGES
}

pub fn select_strategy(node_count: usize, edge_count: usize) -> Box<dyn CommunityStrategy> {
    if use_greedy(node_count, edge_count) {
        Box::new(GreedyModularity)
    } else {
        Box::new(LabelPropagation::default())
    }
}

// ============================================================================
// GREEDY MODULARITY
// ============================================================================
//
// Start with every node alone. Keep merging the pair of adjacent communities
// whose union raises modularity the most, until no merge raises it:
//
//   dQ(i, j) = 2 * (e_ij - a_i * a_j)
//
// where e_ij is the fraction of edge weight between i and j (counted once
// per direction, so 2m in the denominator) and a_i the fraction of edge
// endpoints in i. Ties go to the lowest (i, j), and the smaller index absorbs
// the larger, so the outcome depends only on the input.
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyModularity;

struct Cluster {
    members: Vec<usize>,
    /// a_i
    share: f64,
    /// Neighbouring cluster -> e_ij
    links: BTreeMap<usize, f64>,
}

impl CommunityStrategy for GreedyModularity {
    fn name(&self) -> &'static str {
        "greedy_modularity"
    }

    fn detect(&self, adj: &[Vec<(usize, f64)>]) -> Vec<Vec<usize>> {
        let n = adj.len();
        let two_m: f64 = adj.iter().flatten().map(|&(_, w)| w).sum();
        if two_m <= 0.0 {
            return (0..n).map(|i| vec![i]).collect();
        }

        let mut clusters: Vec<Option<Cluster>> = adj
            .iter()
            .enumerate()
            .map(|(i, nbrs)| {
                let mut links = BTreeMap::new();
                for &(j, w) in nbrs {
                    *links.entry(j).or_insert(0.0) += w / two_m;
                }
                Some(Cluster {
                    members: vec![i],
                    share: nbrs.iter().map(|&(_, w)| w).sum::<f64>() / two_m,
                    links,
                })
            })
            .collect();

        loop {
            let mut best: Option<(f64, usize, usize)> = None;
            for (i, cluster) in clusters.iter().enumerate() {
                let Some(ci) = cluster else { continue };
                for (&j, &e_ij) in ci.links.range(i + 1..) {
                    let Some(cj) = &clusters[j] else { continue };
                    let dq = 2.0 * (e_ij - ci.share * cj.share);
                    // Strictly greater keeps the first (lowest) pair on ties
                    if best.map_or(true, |(b, _, _)| dq > b) {
                        best = Some((dq, i, j));
                    }
                }
            }

            let Some((dq, i, j)) = best else { break };
            if dq <= 0.0 {
                break;
            }

            let Some(absorbed) = clusters[j].take() else { break };
            for (&k, &e_jk) in &absorbed.links {
                if k == i {
                    continue;
                }
                if let Some(ck) = clusters[k].as_mut() {
                    let moved = ck.links.remove(&j).unwrap_or(0.0);
                    *ck.links.entry(i).or_insert(0.0) += moved;
                }
                if let Some(ci) = clusters[i].as_mut() {
                    *ci.links.entry(k).or_insert(0.0) += e_jk;
                }
            }
            if let Some(ci) = clusters[i].as_mut() {
                ci.links.remove(&j);
                ci.share += absorbed.share;
                ci.members.extend(absorbed.members);
            }
        }

        clusters.into_iter().flatten().map(|c| c.members).collect()
    }
}

// ============================================================================
// LABEL PROPAGATION
// ============================================================================
//
// Every node starts with its own label. Each sweep visits nodes in a
// shuffled order; a node adopts the label with the largest total edge weight
// among its neighbours, keeping its own label whenever that label is among
// the best, otherwise picking one of the best at random. Stops once a full
// sweep changes nothing. With a fixed seed the result is reproducible.
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct LabelPropagation {
    pub seed: u64,
}

impl Default for LabelPropagation {
    fn default() -> Self {
        Self {
            seed: LABEL_PROPAGATION_SEED,
        }
    }
}

impl CommunityStrategy for LabelPropagation {
    fn name(&self) -> &'static str {
        "label_propagation"
    }

    fn detect(&self, adj: &[Vec<(usize, f64)>]) -> Vec<Vec<usize>> {
        let n = adj.len();
        let mut labels: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..n).collect();

        for round in 0..MAX_PROPAGATION_ROUNDS {
            order.shuffle(&mut rng);
            let mut changed = false;

            for &v in &order {
                if adj[v].is_empty() {
                    continue;
                }
                let mut weight_by_label: FxHashMap<usize, f64> = FxHashMap::default();
                for &(u, w) in &adj[v] {
                    *weight_by_label.entry(labels[u]).or_insert(0.0) += w;
                }
                let top = weight_by_label.values().copied().fold(f64::MIN, f64::max);
                let mut best: Vec<usize> = weight_by_label
                    .into_iter()
                    .filter(|&(_, w)| w == top)
                    .map(|(label, _)| label)
                    .collect();
                if best.contains(&labels[v]) {
                    continue;
                }
                // Hash order must not leak into the random pick
                best.sort_unstable();
                if let Some(&label) = best.choose(&mut rng) {
                    labels[v] = label;
                    changed = true;
                }
            }

            if !changed {
                debug!("Label propagation settled after {} round(s)", round + 1);
                break;
            }
        }

        let mut groups: IndexMap<usize, Vec<usize>> = IndexMap::new();
        for (v, label) in labels.into_iter().enumerate() {
            groups.entry(label).or_default().push(v);
        }
        groups.into_values().collect()
    }
}

/// Qualifying communities of a network and the node -> community lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Partition {
    /// Strategy that produced the partition
    pub algorithm: String,
    pub min_size: usize,
    /// Largest first; members sorted by id
    pub communities: Vec<Vec<String>>,
    /// Only nodes inside a qualifying community appear here
    pub index: IndexMap<String, usize>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// Members of community `index`, or a range error
    pub fn community(&self, index: usize) -> Result<&[String]> {
        self.communities
            .get(index)
            .map(Vec::as_slice)
            .ok_or(FusionError::Range {
                what: "community",
                index,
                available: self.communities.len(),
            })
    }

    pub fn community_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Community sizes, in index order
    pub fn sizes(&self) -> Vec<usize> {
        self.communities.iter().map(Vec::len).collect()
    }
}

/// Partition `network` into communities of at least `min_size` nodes.
///
/// Communities are ordered by size, largest first; equal sizes keep the
/// order in which they were discovered (position of their earliest node).
pub fn partition(network: &Network, min_size: usize) -> Partition {
    let min_size = min_size.max(1);
    let view = NetworkView::new(network);
    if view.node_count() == 0 {
        return Partition {
            algorithm: String::new(),
            min_size,
            ..Default::default()
        };
    }

    let strategy = select_strategy(view.node_count(), view.edge_count());
    debug!(
        "Partitioning {} nodes / {} edges with {}",
        view.node_count(),
        view.edge_count(),
        strategy.name()
    );
    let mut groups = strategy.detect(&view.adjacency());

    for group in &mut groups {
        group.sort_unstable();
    }
    groups.retain(|g| g.len() >= min_size);
    groups.sort_by_key(|g| g.first().copied().unwrap_or(usize::MAX));
    groups.sort_by(|a, b| b.len().cmp(&a.len()));

    let communities: Vec<Vec<String>> = groups
        .into_iter()
        .map(|g| {
            let mut ids: Vec<String> = g.into_iter().map(|i| view.id(i).to_string()).collect();
            ids.sort();
            ids
        })
        .collect();

    let mut index = IndexMap::new();
    for (i, members) in communities.iter().enumerate() {
        for id in members {
            index.insert(id.clone(), i);
        }
    }

    Partition {
        algorithm: strategy.name().to_string(),
        min_size,
        communities,
        index,
    }
}
