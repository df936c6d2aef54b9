use crate::graph::Network;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

pub const UNCATEGORIZED: &str = "Uncategorized";

const HUB_WEIGHT: usize = 3;
const GENE_WEIGHT: usize = 1;
const MAX_HUB_HITS: usize = 30;
const MAX_GENE_HITS: usize = 80;

/// Category name and the gene-symbol prefixes that vote for it
pub const LABEL_RULES: &[(&str, &str)] = &[
    (
        "Cell cycle / mitosis",
        r"^(CDK|CCN|CDC|MCM|AURK|PLK|BUB|MAD|E2F|SKP|GADD45|TOP2A|UBE2C|CDC20)",
    ),
    (
        "DNA damage / repair",
        r"^(BRCA|RAD|ATM|ATR|CHEK|TP53BP|PARP|FANCD|FANCI|XRCC|MRE11|NBN|MSH|MLH|RRM2B)",
    ),
    (
        "Apoptosis / cell death",
        r"^(BCL|CASP|FAS|TNFR|BAX|BAK|BBC3|BIRC|XIAP)",
    ),
    (
        "Chromatin / transcription regulation",
        r"^(HDAC|KAT|EP300|CREBBP|SMARC|ARID|EZH|KDM|BRD|MED|POLR|SP1|MYC|JUN|FOS)",
    ),
    (
        "Ubiquitin / proteasome",
        r"^(UBE|UBC|USP|PSM|PSMA|PSMB|CUL|RBX|FBX|TRIM)",
    ),
    (
        "RNA processing / splicing",
        r"^(HNRNP|SRSF|SF3|PRPF|DDX|DHX|RBM|ELAVL|U2AF|FUS|TARDBP)",
    ),
    ("Translation / ribosome", r"^(RPL|RPS|EIF|EEF)"),
    (
        "Signaling (MAPK/PI3K/AKT)",
        r"^(MAPK|MAP2K|PIK3|AKT|MTOR|RAS|RAF|STAT)",
    ),
];

fn compiled_rules() -> &'static [(&'static str, Regex)] {
    static RULES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    RULES.get_or_init(|| {
        LABEL_RULES
            .iter()
            .map(|&(label, pattern)| (label, Regex::new(pattern).expect("valid regex")))
            .collect()
    })
}

/// Rule-based annotation of one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleLabel {
    pub label: String,
    /// 3 per matching hub plus 1 per matching member
    pub score: usize,
    pub hub_hits: Vec<String>,
    pub gene_hits: Vec<String>,
    /// Pattern of the winning rule, empty when uncategorized
    pub rule: String,
    pub top_hubs: Vec<String>,
}

/// The `n` nodes with the most incident edges, ties by id ascending.
///
/// Counts fused edges, so two databases reporting the same pair count twice.
pub fn top_hubs(network: &Network, n: usize) -> Vec<String> {
    let mut degree: FxHashMap<&str, usize> = FxHashMap::default();
    for edge in network.edges() {
        *degree.entry(edge.source.as_str()).or_default() += 1;
        *degree.entry(edge.target.as_str()).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = degree.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(n).map(|(id, _)| id.to_string()).collect()
}

fn hits(ids: &BTreeSet<String>, rule: &Regex) -> Vec<String> {
    ids.iter().filter(|id| rule.is_match(id)).cloned().collect()
}

/// Label a module network from its member ids and its top `hub_count` hubs.
///
/// Each category scores `3 × hub hits + member hits`; the first category
/// with the strictly highest positive score wins.
pub fn label_module(module: &Network, hub_count: usize) -> ModuleLabel {
    let hubs = top_hubs(module, hub_count);
    let hub_set: BTreeSet<String> = hubs.iter().map(|h| h.trim().to_uppercase()).collect();
    let gene_set: BTreeSet<String> = module
        .nodes()
        .map(|n| n.id.trim().to_uppercase())
        .filter(|id| !id.is_empty())
        .collect();

    let mut best = ModuleLabel {
        label: UNCATEGORIZED.to_string(),
        score: 0,
        hub_hits: Vec::new(),
        gene_hits: Vec::new(),
        rule: String::new(),
        top_hubs: Vec::new(),
    };

    for (label, rule) in compiled_rules() {
        let hub_hits = hits(&hub_set, rule);
        let gene_hits = hits(&gene_set, rule);
        let score = HUB_WEIGHT * hub_hits.len() + GENE_WEIGHT * gene_hits.len();
        if score > best.score {
            best = ModuleLabel {
                label: label.to_string(),
                score,
                hub_hits: hub_hits.into_iter().take(MAX_HUB_HITS).collect(),
                gene_hits: gene_hits.into_iter().take(MAX_GENE_HITS).collect(),
                rule: rule.as_str().to_string(),
                top_hubs: Vec::new(),
            };
        }
    }

    best.top_hubs = hubs;
    best
}
