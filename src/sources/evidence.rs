//! Typed evidence variants and the normalized interaction record

use crate::graph::{EdgeKind, NodeKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One end of an interaction as reported by a provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Endpoint {
    /// Identifier as the provider spelled it
    pub id: String,
    pub kind: NodeKind,
}

impl Endpoint {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// Provider-agnostic interaction, the only shape the fusion engine consumes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionRecord {
    pub node_a: Endpoint,
    pub node_b: Endpoint,
    pub kind: EdgeKind,
    pub source_db: String,
    pub score: Option<f64>,
    #[serde(default)]
    pub evidence: Map<String, Value>,
}

/// Evidence as decoded at an adapter boundary, one variant per kind
#[derive(Debug, Clone, PartialEq)]
pub enum Evidence {
    ProteinProtein {
        protein_a: String,
        protein_b: String,
        score: Option<f64>,
        source_db: String,
        depth: u8,
    },
    RbpTarget {
        rbp: String,
        target: String,
        source_db: String,
        row: Map<String, Value>,
    },
    RnaRna {
        rna_a: String,
        rna_b: String,
        source_db: String,
        row: Map<String, Value>,
    },
}

impl From<Evidence> for InteractionRecord {
    fn from(evidence: Evidence) -> Self {
        match evidence {
            Evidence::ProteinProtein {
                protein_a,
                protein_b,
                score,
                source_db,
                depth,
            } => {
                let mut meta = Map::new();
                meta.insert("depth".to_string(), Value::from(depth));
                InteractionRecord {
                    node_a: Endpoint::new(protein_a, NodeKind::Protein),
                    node_b: Endpoint::new(protein_b, NodeKind::Protein),
                    kind: EdgeKind::Ppi,
                    source_db,
                    // NaN would poison max-merging
                    score: score.filter(|s| s.is_finite()),
                    evidence: meta,
                }
            }
            Evidence::RbpTarget {
                rbp,
                target,
                source_db,
                row,
            } => InteractionRecord {
                node_a: Endpoint::new(rbp, NodeKind::Protein),
                node_b: Endpoint::new(target, NodeKind::Rna),
                kind: EdgeKind::RbpTarget,
                source_db,
                score: None,
                evidence: row,
            },
            Evidence::RnaRna {
                rna_a,
                rna_b,
                source_db,
                row,
            } => InteractionRecord {
                node_a: Endpoint::new(rna_a, NodeKind::Rna),
                node_b: Endpoint::new(rna_b, NodeKind::Rna),
                kind: EdgeKind::RnaRna,
                source_db,
                score: None,
                evidence: row,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ppi_record_shape() {
        let rec: InteractionRecord = Evidence::ProteinProtein {
            protein_a: "TP53".into(),
            protein_b: "MDM2".into(),
            score: Some(0.999),
            source_db: "STRING".into(),
            depth: 2,
        }
        .into();
        assert_eq!(rec.kind, EdgeKind::Ppi);
        assert_eq!(rec.node_a.kind, NodeKind::Protein);
        assert_eq!(rec.evidence["depth"], 2);
        assert_eq!(rec.score, Some(0.999));
    }

    #[test]
    fn test_nan_score_dropped() {
        let rec: InteractionRecord = Evidence::ProteinProtein {
            protein_a: "A".into(),
            protein_b: "B".into(),
            score: Some(f64::NAN),
            source_db: "STRING".into(),
            depth: 1,
        }
        .into();
        assert_eq!(rec.score, None);
    }

    #[test]
    fn test_rbp_target_kinds() {
        let rec: InteractionRecord = Evidence::RbpTarget {
            rbp: "ELAVL1".into(),
            target: "TP53".into(),
            source_db: "ENCORI".into(),
            row: Map::new(),
        }
        .into();
        assert_eq!(rec.node_a.kind, NodeKind::Protein);
        assert_eq!(rec.node_b.kind, NodeKind::Rna);
        assert_eq!(rec.kind, EdgeKind::RbpTarget);
        assert_eq!(rec.score, None);
    }
}
