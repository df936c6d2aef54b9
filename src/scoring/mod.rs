//! Regulon overlap scoring and module labelling
//!
//! # Regulon formula
//!
//! ```text
//! For every non-seed neighbour v of at least one seed:
//!   coverage(v)    = |seeds adjacent to v|
//!   best_s(v)      = max edge weight between v and seed s
//!   conf_sum(v)    = Σ_s best_s(v)
//!   conf_mean(v)   = conf_sum(v) / coverage(v)
//!   specificity(v) = conf_sum(v) / (ln(1 + degree(v)) + ε)
//!
//! Edge weight:
//!   protein-protein    score (÷1000 when > 1), clamped to [0, 1]; 0.6 when unscored
//!   everything else    clamp(0.3 + 0.25 · ln(1 + support), 0.3, 1.0)
//! ```
//!
//! Candidates rank by coverage, specificity, conf_sum and database count
//! (all descending), then node id.

mod labels;
mod regulon;

pub use labels::{label_module, top_hubs, ModuleLabel, LABEL_RULES, UNCATEGORIZED};
pub use regulon::{
    edge_weight, score, Candidate, CoverageMode, RegulonReport, SeedEvidence,
};
