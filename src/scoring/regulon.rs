use crate::graph::{canonical_id, Edge, EdgeKind, Network, NodeKind};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Weight of a protein-protein edge that carries no score
const UNSCORED_PPI_WEIGHT: f64 = 0.6;
/// Keeps specificity finite for degree-0 nodes
const SPECIFICITY_EPSILON: f64 = 1e-9;
/// Evidence rows kept per candidate
const MAX_EVIDENCE: usize = 50;

/// How `min_coverage` is derived when the caller does not give one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageMode {
    /// Every seed (intersection only)
    Strict,
    /// At least half the seeds, rounded up
    #[default]
    Majority,
    /// A single seed is enough
    Any,
}

impl CoverageMode {
    pub fn min_coverage(self, seed_count: usize) -> usize {
        if seed_count <= 1 {
            return 1;
        }
        match self {
            CoverageMode::Strict => seed_count,
            CoverageMode::Majority => seed_count.div_ceil(2),
            CoverageMode::Any => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageMode::Strict => "strict",
            CoverageMode::Majority => "majority",
            CoverageMode::Any => "any",
        }
    }
}

impl fmt::Display for CoverageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoverageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(CoverageMode::Strict),
            "majority" => Ok(CoverageMode::Majority),
            "any" => Ok(CoverageMode::Any),
            other => Err(format!(
                "unknown coverage mode '{}' (expected strict, majority or any)",
                other
            )),
        }
    }
}

/// One seed-to-candidate edge, kept for traceability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedEvidence {
    pub seed: String,
    pub source_db: String,
    pub kind: EdgeKind,
    pub score: Option<f64>,
    pub support: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub node: String,
    pub kind: NodeKind,
    pub coverage: usize,
    pub coverage_ratio: f64,
    pub confidence_sum: f64,
    pub confidence_mean: f64,
    /// Distinct databases among the seed edges
    pub db_support: usize,
    /// Edge count over the whole network
    pub degree: usize,
    pub specificity: f64,
    pub hit_seeds: Vec<String>,
    /// Best edge weight per seed
    pub seed_best: BTreeMap<String, f64>,
    pub evidence: Vec<SeedEvidence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulonReport {
    pub seed_count: usize,
    pub seeds: Vec<String>,
    pub min_coverage: usize,
    pub total_candidates: usize,
    pub intersection_count: usize,
    pub top_interactors: Vec<Candidate>,
    /// Candidates connected to every seed
    pub intersection_top: Vec<Candidate>,
}

/// Per-seed confidence of one edge, in [0, 1]
pub fn edge_weight(edge: &Edge) -> f64 {
    let db = edge.source_db.to_lowercase();
    if edge.kind == EdgeKind::Ppi || db.contains("string") || db.contains("ppi") {
        return match edge.score {
            Some(s) if s.is_finite() => {
                let s = if s > 1.0 { s / 1000.0 } else { s };
                s.clamp(0.0, 1.0)
            }
            _ => UNSCORED_PPI_WEIGHT,
        };
    }
    let support = edge.support.max(1) as f64;
    (0.3 + 0.25 * support.ln_1p()).clamp(0.3, 1.0)
}

fn round6(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

/// Trimmed, canonical, de-duplicated seeds in first-seen order
fn normalize_seeds(seeds: &[String]) -> Vec<String> {
    let mut seen = FxHashSet::default();
    seeds
        .iter()
        .map(|s| canonical_id(s))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

#[derive(Default)]
struct Tally {
    hit_seeds: BTreeSet<String>,
    seed_best: BTreeMap<String, f64>,
    dbs: BTreeSet<String>,
    evidence: Vec<SeedEvidence>,
}

/// Rank candidate co-regulators of `seeds`.
///
/// Neighbours reached by fewer than `min_coverage` distinct seeds are
/// dropped. With `exclude_seed_nodes`, seeds never appear as candidates of
/// one another. Output order is a total order, so identical inputs give
/// identical reports.
pub fn score(
    network: &Network,
    seeds: &[String],
    min_coverage: usize,
    top_n: usize,
    exclude_seed_nodes: bool,
) -> RegulonReport {
    let seeds = normalize_seeds(seeds);
    let seed_count = seeds.len();
    if seed_count == 0 {
        return RegulonReport {
            seed_count: 0,
            seeds,
            min_coverage,
            total_candidates: 0,
            intersection_count: 0,
            top_interactors: Vec::new(),
            intersection_top: Vec::new(),
        };
    }

    let mut degree: FxHashMap<&str, usize> = FxHashMap::default();
    let mut adjacency: FxHashMap<&str, Vec<(&str, &Edge)>> = FxHashMap::default();
    for edge in network.edges() {
        let (a, b) = (edge.source.as_str(), edge.target.as_str());
        *degree.entry(a).or_default() += 1;
        *degree.entry(b).or_default() += 1;
        adjacency.entry(a).or_default().push((b, edge));
        adjacency.entry(b).or_default().push((a, edge));
    }

    let seed_set: FxHashSet<&str> = seeds.iter().map(String::as_str).collect();
    let mut tallies: IndexMap<&str, Tally> = IndexMap::new();

    for seed in &seeds {
        let Some(neighbours) = adjacency.get(seed.as_str()) else {
            continue;
        };
        for &(nbr, edge) in neighbours {
            if exclude_seed_nodes && seed_set.contains(nbr) {
                continue;
            }
            let tally = tallies.entry(nbr).or_default();
            tally.hit_seeds.insert(seed.clone());

            let w = edge_weight(edge);
            let best = tally.seed_best.entry(seed.clone()).or_insert(0.0);
            if w > *best {
                *best = w;
            }
            tally.dbs.insert(edge.source_db.clone());
            tally.evidence.push(SeedEvidence {
                seed: seed.clone(),
                source_db: edge.source_db.clone(),
                kind: edge.kind,
                score: edge.score,
                support: edge.support,
            });
        }
    }

    let mut candidates: Vec<Candidate> = tallies
        .into_iter()
        .filter(|(_, t)| t.hit_seeds.len() >= min_coverage)
        .map(|(node, mut t)| {
            let coverage = t.hit_seeds.len();
            let confidence_sum: f64 = t.seed_best.values().sum();
            let node_degree = degree.get(node).copied().unwrap_or(0);
            let specificity =
                confidence_sum / ((node_degree as f64).ln_1p() + SPECIFICITY_EPSILON);
            t.evidence.truncate(MAX_EVIDENCE);
            Candidate {
                node: node.to_string(),
                kind: network.node(node).map(|n| n.kind).unwrap_or_default(),
                coverage,
                coverage_ratio: coverage as f64 / seed_count as f64,
                confidence_sum: round6(confidence_sum),
                confidence_mean: round6(confidence_sum / coverage as f64),
                db_support: t.dbs.len(),
                degree: node_degree,
                specificity: round6(specificity),
                hit_seeds: t.hit_seeds.into_iter().collect(),
                seed_best: t.seed_best,
                evidence: t.evidence,
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.coverage
            .cmp(&a.coverage)
            .then_with(|| b.specificity.total_cmp(&a.specificity))
            .then_with(|| b.confidence_sum.total_cmp(&a.confidence_sum))
            .then_with(|| b.db_support.cmp(&a.db_support))
            .then_with(|| a.node.cmp(&b.node))
    });

    let intersection: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.coverage == seed_count)
        .collect();
    let intersection_count = intersection.len();
    let intersection_top = intersection.into_iter().take(top_n).cloned().collect();
    let total_candidates = candidates.len();
    candidates.truncate(top_n);

    RegulonReport {
        seed_count,
        seeds,
        min_coverage,
        total_candidates,
        intersection_count,
        top_interactors: candidates,
        intersection_top,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::{network_from, ppi, record};

    fn seeds(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_coverage_modes() {
        assert_eq!(CoverageMode::Majority.min_coverage(4), 2);
        assert_eq!(CoverageMode::Strict.min_coverage(4), 4);
        assert_eq!(CoverageMode::Any.min_coverage(4), 1);
        assert_eq!(CoverageMode::Majority.min_coverage(5), 3);
        assert_eq!(CoverageMode::Strict.min_coverage(1), 1);
        assert_eq!(CoverageMode::Majority.min_coverage(0), 1);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("STRICT".parse::<CoverageMode>(), Ok(CoverageMode::Strict));
        assert_eq!(" any".parse::<CoverageMode>(), Ok(CoverageMode::Any));
        assert!("most".parse::<CoverageMode>().is_err());
        assert_eq!(CoverageMode::default(), CoverageMode::Majority);
    }

    #[test]
    fn test_edge_weights() {
        let net = network_from(
            vec![
                ppi("A", "B", Some(900.0)),
                ppi("A", "C", Some(0.42)),
                ppi("A", "D", None),
                record("A", "E", EdgeKind::RbpTarget, "ENCORI", None),
                record("A", "E", EdgeKind::RbpTarget, "ENCORI", None),
            ],
            &[],
        );
        let w: Vec<f64> = net.edges().map(edge_weight).collect();
        assert!((w[0] - 0.9).abs() < 1e-12);
        assert!((w[1] - 0.42).abs() < 1e-12);
        assert_eq!(w[2], 0.6);
        assert!((w[3] - (0.3 + 0.25 * 3f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_saturating_weight_bounds() {
        let net = network_from(
            vec![record("A", "B", EdgeKind::RnaRna, "ENCORI", None)],
            &[],
        );
        let mut edge = net.edges().next().unwrap().clone();
        edge.support = 1_000_000;
        assert_eq!(edge_weight(&edge), 1.0);
        edge.support = 0;
        assert!(edge_weight(&edge) >= 0.3);
    }

    #[test]
    fn test_scoring_and_intersection() {
        let net = network_from(
            vec![
                ppi("S1", "X", Some(0.9)),
                ppi("S2", "X", Some(0.5)),
                ppi("S1", "Y", Some(0.8)),
                ppi("S1", "S2", Some(0.99)),
            ],
            &["S1", "S2"],
        );
        let report = score(&net, &seeds(&["s1", "S2", "S1"]), 1, 10, true);
        assert_eq!(report.seeds, vec!["S1", "S2"]);
        assert_eq!(report.total_candidates, 2);
        assert_eq!(report.top_interactors[0].node, "X");
        assert_eq!(report.top_interactors[0].coverage, 2);
        assert_eq!(report.top_interactors[0].hit_seeds, vec!["S1", "S2"]);
        assert!((report.top_interactors[0].confidence_sum - 1.4).abs() < 1e-9);
        assert_eq!(report.intersection_count, 1);
        assert_eq!(report.intersection_top[0].node, "X");

        // Seeds become candidates of each other when not excluded
        let report = score(&net, &seeds(&["S1", "S2"]), 1, 10, false);
        assert!(report.top_interactors.iter().any(|c| c.node == "S2"));
    }

    #[test]
    fn test_specificity_penalizes_hubs() {
        let mut records = vec![ppi("S1", "HUB", Some(0.9)), ppi("S1", "NICHE", Some(0.9))];
        for i in 0..20 {
            records.push(ppi("HUB", &format!("P{}", i), Some(0.9)));
        }
        let net = network_from(records, &["S1"]);
        let report = score(&net, &seeds(&["S1"]), 1, 10, true);
        let names: Vec<&str> = report.top_interactors.iter().map(|c| c.node.as_str()).collect();
        assert_eq!(names, vec!["NICHE", "HUB"]);
    }

    #[test]
    fn test_top_n_and_empty_seeds() {
        let net = network_from(
            vec![ppi("S", "A", None), ppi("S", "B", None), ppi("S", "C", None)],
            &["S"],
        );
        let report = score(&net, &seeds(&["S"]), 1, 2, true);
        assert_eq!(report.top_interactors.len(), 2);
        assert_eq!(report.total_candidates, 3);
        // Equal scores fall back to node id
        assert_eq!(report.top_interactors[0].node, "A");

        let empty = score(&net, &[], 1, 10, true);
        assert_eq!(empty.seed_count, 0);
        assert!(empty.top_interactors.is_empty());
    }

    #[test]
    fn test_evidence_capped() {
        let mut records = Vec::new();
        for i in 0..60 {
            records.push(record("S", "T", EdgeKind::Ppi, &format!("DB{}", i), None));
        }
        let net = network_from(records, &["S"]);
        let report = score(&net, &seeds(&["S"]), 1, 10, true);
        let t = &report.top_interactors[0];
        assert_eq!(t.evidence.len(), MAX_EVIDENCE);
        assert_eq!(t.db_support, 60);
        assert_eq!(t.degree, 60);
    }
}
