//! Undirected weighted petgraph view of a [`Network`]
//!
//! Parallel edges (same pair, different kind or database) collapse into one
//! view edge carrying the largest weight. Self-loops are left out. Node
//! indices follow the network's insertion order.

use super::Network;
use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::FxHashMap;

/// Weight of a view edge when the fused edge has no score
pub const DEFAULT_WEIGHT: f64 = 1.0;

pub struct NetworkView {
    graph: UnGraph<String, f64>,
    index: FxHashMap<String, NodeIndex>,
}

impl NetworkView {
    pub fn new(network: &Network) -> Self {
        let mut graph = UnGraph::with_capacity(network.node_count(), network.edge_count());
        let mut index = FxHashMap::default();

        for node in network.nodes() {
            let ix = graph.add_node(node.id.clone());
            index.insert(node.id.clone(), ix);
        }

        for edge in network.edges() {
            let (Some(&a), Some(&b)) = (index.get(&edge.source), index.get(&edge.target)) else {
                continue;
            };
            if a == b {
                continue;
            }
            let weight = edge
                .score
                .filter(|s| s.is_finite())
                .unwrap_or(DEFAULT_WEIGHT)
                .max(0.0);
            match graph.find_edge(a, b) {
                Some(existing) => {
                    if weight > graph[existing] {
                        graph[existing] = weight;
                    }
                }
                None => {
                    graph.add_edge(a, b, weight);
                }
            }
        }

        Self { graph, index }
    }

    pub fn graph(&self) -> &UnGraph<String, f64> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Node id at position `i`
    pub fn id(&self, i: usize) -> &str {
        &self.graph[NodeIndex::new(i)]
    }

    /// Number of distinct neighbours
    pub fn degree(&self, ix: NodeIndex) -> usize {
        self.graph.neighbors(ix).count()
    }

    /// Degree of every node, by position
    pub fn degrees(&self) -> Vec<usize> {
        self.graph.node_indices().map(|ix| self.degree(ix)).collect()
    }

    /// Weighted adjacency lists, by position
    pub fn adjacency(&self) -> Vec<Vec<(usize, f64)>> {
        let mut adj = vec![Vec::new(); self.graph.node_count()];
        for edge in self.graph.raw_edges() {
            let (a, b) = (edge.source().index(), edge.target().index());
            adj[a].push((b, edge.weight));
            adj[b].push((a, edge.weight));
        }
        adj
    }
}
