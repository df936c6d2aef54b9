use crate::sources::{EvidenceSource, SourceParams};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Canonical, case-insensitive key for an entity identifier
pub fn canonical_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Molecule type of a node
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Protein,
    Rna,
    #[default]
    Unknown,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Protein => "protein",
            NodeKind::Rna => "rna",
            NodeKind::Unknown => "unknown",
        }
    }

    pub fn is_concrete(&self) -> bool {
        !matches!(self, NodeKind::Unknown)
    }
}

/// A biological entity in the fused graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Canonical (upper-cased) identifier, unique within a network
    pub id: String,
    /// Spelling from the first sighting
    pub label: String,
    pub kind: NodeKind,
    /// Databases that reported this node, in first-seen order
    pub sources: Vec<String>,
}

impl Node {
    pub fn new(id: &str, label: &str, kind: NodeKind, source_db: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind,
            sources: vec![source_db.to_string()],
        }
    }

    /// Fold another sighting into this node.
    ///
    /// Kind only moves `unknown -> concrete`. A later, different concrete kind
    /// is ignored: the first concrete assignment wins.
    pub fn absorb(&mut self, kind: NodeKind, source_db: &str) {
        if !self.sources.iter().any(|s| s == source_db) {
            self.sources.push(source_db.to_string());
        }
        if self.kind == NodeKind::Unknown && kind.is_concrete() {
            self.kind = kind;
        }
    }

    pub fn has_source(&self, source_db: &str) -> bool {
        self.sources.iter().any(|s| s == source_db)
    }
}

/// Interaction type carried by an edge
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Ppi,
    RbpTarget,
    RnaRna,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Ppi => "ppi",
            EdgeKind::RbpTarget => "rbp_target",
            EdgeKind::RnaRna => "rna_rna",
        }
    }
}

/// Merge key: order-independent node pair plus kind and database.
///
/// Two records between the same nodes but with a different kind or database
/// are separate edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub u: String,
    pub v: String,
    pub kind: EdgeKind,
    pub source_db: String,
}

impl EdgeKey {
    /// Build a key from canonical ids in either order.
    pub fn new(a: &str, b: &str, kind: EdgeKind, source_db: &str) -> Self {
        let (u, v) = if b < a { (b, a) } else { (a, b) };
        Self {
            u: u.to_string(),
            v: v.to_string(),
            kind,
            source_db: source_db.to_string(),
        }
    }
}

/// An interaction in the fused graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    /// Lexicographically smaller endpoint
    pub source: String,
    /// Lexicographically larger endpoint
    pub target: String,
    pub kind: EdgeKind,
    pub source_db: String,
    pub score: Option<f64>,
    /// Number of raw records merged into this edge
    pub support: u32,
    /// Metadata of the most recently merged record
    #[serde(default)]
    pub evidence: serde_json::Map<String, serde_json::Value>,
}

impl Edge {
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(&self.source, &self.target, self.kind, &self.source_db)
    }

    /// Merge one more record with the same key.
    ///
    /// Support counts records; the score only ever rises to the max seen.
    pub fn absorb(
        &mut self,
        score: Option<f64>,
        evidence: serde_json::Map<String, serde_json::Value>,
    ) {
        self.support += 1;
        if let Some(incoming) = score {
            match self.score {
                Some(current) if current >= incoming => {}
                _ => self.score = Some(incoming),
            }
        }
        if !evidence.is_empty() {
            self.evidence = evidence;
        }
    }

    /// The endpoint opposite `id`, if `id` is one of the ends.
    pub fn other(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(&self.target)
        } else if self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Counts {
    pub nodes: usize,
    pub edges: usize,
}

/// Present when a network was reduced to a node budget
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PruneInfo {
    pub node_budget: usize,
    /// Size before pruning
    pub original: Counts,
}

/// Present on a sub-network extracted for one community
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleInfo {
    pub index: usize,
    pub min_size: usize,
    pub size: usize,
}

/// Provenance of a fused network
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkMeta {
    /// Canonical seed ids, first-seen order
    pub seeds: Vec<String>,
    pub sources: Vec<EvidenceSource>,
    pub params: SourceParams,
    /// 0 when pruning is disabled
    pub node_budget: usize,
    pub generated_at: DateTime<Utc>,
    pub counts: Counts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pruned: Option<PruneInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleInfo>,
}

impl NetworkMeta {
    /// Fresh provenance stamped with the current time; counts are filled in
    /// when the network is assembled.
    pub fn new(
        seeds: Vec<String>,
        sources: Vec<EvidenceSource>,
        params: SourceParams,
        node_budget: usize,
    ) -> Self {
        Self {
            seeds,
            sources,
            params,
            node_budget,
            generated_at: Utc::now(),
            counts: Counts::default(),
            pruned: None,
            module: None,
        }
    }
}

/// Fused interaction graph. Immutable once built; pruning and module
/// extraction return new values.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    nodes: IndexMap<String, Node>,
    edges: IndexMap<EdgeKey, Edge>,
    meta: NetworkMeta,
}

impl Network {
    /// Assemble a network; counts in `meta` are recomputed from the maps.
    pub fn from_parts(
        nodes: IndexMap<String, Node>,
        edges: IndexMap<EdgeKey, Edge>,
        mut meta: NetworkMeta,
    ) -> Self {
        meta.counts = Counts {
            nodes: nodes.len(),
            edges: edges.len(),
        };
        Self { nodes, edges, meta }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, key: &EdgeKey) -> Option<&Edge> {
        self.edges.get(key)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn meta(&self) -> &NetworkMeta {
        &self.meta
    }

    pub fn seeds(&self) -> &[String] {
        &self.meta.seeds
    }

    pub fn is_pruned(&self) -> bool {
        self.meta.pruned.is_some()
    }

    /// Sub-network induced by `keep`: those nodes (in original order) and
    /// every edge with both ends kept.
    pub fn induced<F>(&self, keep: F, meta: NetworkMeta) -> Network
    where
        F: Fn(&str) -> bool,
    {
        let nodes: IndexMap<String, Node> = self
            .nodes
            .iter()
            .filter(|(id, _)| keep(id))
            .map(|(id, n)| (id.clone(), n.clone()))
            .collect();
        let edges: IndexMap<EdgeKey, Edge> = self
            .edges
            .iter()
            .filter(|(_, e)| nodes.contains_key(&e.source) && nodes.contains_key(&e.target))
            .map(|(k, e)| (k.clone(), e.clone()))
            .collect();
        Network::from_parts(nodes, edges, meta)
    }
}

/// Wire shape: flat node and edge lists plus meta
#[derive(Serialize)]
struct NetworkDocRef<'a> {
    nodes: Vec<&'a Node>,
    edges: Vec<&'a Edge>,
    meta: &'a NetworkMeta,
}

#[derive(Deserialize)]
struct NetworkDoc {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    meta: NetworkMeta,
}

impl Serialize for Network {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NetworkDocRef {
            nodes: self.nodes.values().collect(),
            edges: self.edges.values().collect(),
            meta: &self.meta,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let doc = NetworkDoc::deserialize(deserializer)?;
        let nodes = doc.nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
        let edges = doc.edges.into_iter().map(|e| (e.key(), e)).collect();
        Ok(Network::from_parts(nodes, edges, doc.meta))
    }
}
