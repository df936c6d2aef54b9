//! Evidence adapters
//!
//! Each adapter turns typed query parameters into upstream requests (through
//! the response cache) and decodes the payload into provider-agnostic
//! [`InteractionRecord`]s. The fusion engine only ever sees records.

pub mod encori;
pub mod evidence;
pub mod string_db;
pub mod tsv;

pub use encori::{RbpTargetAdapter, RnaRnaAdapter};
pub use evidence::{Endpoint, Evidence, InteractionRecord};
pub use string_db::StringPpiAdapter;

use crate::cache::ResponseCache;
use crate::config::Settings;
use crate::error::{FusionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Evidence sources the engine knows how to query
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EvidenceSource {
    /// STRING protein-protein interaction partners
    #[serde(rename = "string_ppi")]
    Ppi,
    /// ENCORI RBPs binding a target RNA
    #[serde(rename = "encori_rbp_by_target")]
    RbpTarget,
    /// ENCORI RNA-RNA interactions
    #[serde(rename = "encori_rna_rna")]
    RnaRna,
}

/// How a source spreads the seed list over queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
    /// One query covers every seed
    Batched,
    /// One query per seed
    PerSeed,
}

/// Which pass of a build a query belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Primary,
    /// Second hop, seeded from nodes found in the primary pass
    Expansion,
}

impl Pass {
    pub fn depth(&self) -> u8 {
        match self {
            Pass::Primary => 1,
            Pass::Expansion => 2,
        }
    }
}

impl EvidenceSource {
    pub const ALL: [EvidenceSource; 3] = [
        EvidenceSource::Ppi,
        EvidenceSource::RbpTarget,
        EvidenceSource::RnaRna,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            EvidenceSource::Ppi => "string_ppi",
            EvidenceSource::RbpTarget => "encori_rbp_by_target",
            EvidenceSource::RnaRna => "encori_rna_rna",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EvidenceSource::Ppi => "STRING protein-protein interaction partners",
            EvidenceSource::RbpTarget => {
                "ENCORI RBP-RNA interactions (RBPs binding a target RNA/gene)"
            }
            EvidenceSource::RnaRna => "ENCORI RNA-RNA interaction network",
        }
    }

    /// Alternative names accepted by [`EvidenceSource::parse`]
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            EvidenceSource::Ppi => &["string", "ppi"],
            EvidenceSource::RbpTarget => &["encori_rbp", "rbp_target"],
            EvidenceSource::RnaRna => &["encori_rna", "rna_rna"],
        }
    }

    pub fn fan_out(&self) -> FanOut {
        match self {
            EvidenceSource::Ppi => FanOut::Batched,
            EvidenceSource::RbpTarget | EvidenceSource::RnaRna => FanOut::PerSeed,
        }
    }

    /// Whether a second hop from discovered nodes is meaningful
    pub fn supports_expansion(&self) -> bool {
        matches!(self, EvidenceSource::Ppi)
    }

    /// Parse a source id or alias (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "string_ppi" | "string" | "ppi" => Some(EvidenceSource::Ppi),
            "encori_rbp_by_target" | "encori_rbp" | "rbp_target" => Some(EvidenceSource::RbpTarget),
            "encori_rna_rna" | "encori_rna" | "rna_rna" => Some(EvidenceSource::RnaRna),
            _ => None,
        }
    }
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Parse a comma-separated source list.
///
/// Unknown names are dropped with a warning and duplicates collapse; if
/// nothing valid remains the request is a configuration error.
pub fn parse_sources(csv: &str) -> Result<Vec<EvidenceSource>> {
    let mut out: Vec<EvidenceSource> = Vec::new();
    for name in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match EvidenceSource::parse(name) {
            Some(src) if !out.contains(&src) => out.push(src),
            Some(_) => {}
            None => tracing::warn!("Ignoring unknown evidence source '{}'", name),
        }
    }
    if out.is_empty() {
        let supported: Vec<&str> = EvidenceSource::ALL.iter().map(|s| s.id()).collect();
        return Err(FusionError::config(format!(
            "no valid evidence sources in '{}'. Supported: {}",
            csv,
            supported.join(", ")
        )));
    }
    Ok(out)
}

/// STRING query parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PpiParams {
    /// Minimum combined score, 0-1000
    pub required_score: u32,
    /// Partners per identifier in the primary pass, 1-500
    pub limit: u32,
    /// 1 = direct partners only, 2 = also expand from discovered proteins
    pub depth: u8,
    /// Partners per identifier in the expansion pass, 1-100
    pub depth2_limit: u32,
}

impl Default for PpiParams {
    fn default() -> Self {
        Self {
            required_score: 700,
            limit: 50,
            depth: 1,
            depth2_limit: 10,
        }
    }
}

/// ENCORI RBP-target query parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RbpTargetParams {
    pub assembly: String,
    pub gene_type: String,
    pub cell_type: String,
    pub clip_exp_num: u32,
    /// 0-32
    pub pancancer_num: u32,
}

impl Default for RbpTargetParams {
    fn default() -> Self {
        Self {
            assembly: "hg38".to_string(),
            gene_type: "mRNA".to_string(),
            cell_type: "all".to_string(),
            clip_exp_num: 5,
            pancancer_num: 0,
        }
    }
}

/// ENCORI RNA-RNA query parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RnaRnaParams {
    pub assembly: String,
    pub gene_type: String,
    pub cell_type: String,
    pub inter_num: u32,
    pub exp_num: u32,
}

impl Default for RnaRnaParams {
    fn default() -> Self {
        Self {
            assembly: "hg38".to_string(),
            gene_type: "mRNA".to_string(),
            cell_type: "all".to_string(),
            inter_num: 1,
            exp_num: 1,
        }
    }
}

/// Per-source parameters for one build
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceParams {
    /// NCBI taxonomy id
    pub species_taxon: u32,
    pub ppi: PpiParams,
    pub rbp_target: RbpTargetParams,
    pub rna_rna: RnaRnaParams,
}

impl Default for SourceParams {
    fn default() -> Self {
        Self {
            species_taxon: 9606,
            ppi: PpiParams::default(),
            rbp_target: RbpTargetParams::default(),
            rna_rna: RnaRnaParams::default(),
        }
    }
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min || value > max {
        return Err(FusionError::config(format!(
            "{} must be in {}..={}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

impl SourceParams {
    /// Reject out-of-range values before anything is fetched
    pub fn validate(&self) -> Result<()> {
        check_range("string_required_score", self.ppi.required_score, 0, 1000)?;
        check_range("string_limit", self.ppi.limit, 1, 500)?;
        check_range("string_depth", self.ppi.depth as u32, 1, 2)?;
        check_range("string_depth2_limit", self.ppi.depth2_limit, 1, 100)?;
        check_range("pancancer_num", self.rbp_target.pancancer_num, 0, 32)?;
        check_range("inter_num", self.rna_rna.inter_num, 1, u32::MAX)?;
        check_range("exp_num", self.rna_rna.exp_num, 1, u32::MAX)?;
        Ok(())
    }
}

/// A provider of interaction evidence for one [`EvidenceSource`]
pub trait EvidenceAdapter: Send + Sync {
    fn source(&self) -> EvidenceSource;

    /// Database tag stamped on nodes and edges from this adapter
    fn source_db(&self) -> &str;

    /// Query the provider for `identifiers`.
    ///
    /// Called once with every seed for [`FanOut::Batched`] sources and once
    /// per seed otherwise. Any failure aborts the whole build.
    fn fetch(&self, identifiers: &[String], pass: Pass) -> Result<Vec<InteractionRecord>>;
}

/// Adapters available to a build, keyed by source
#[derive(Default, Clone)]
pub struct EvidenceRegistry {
    adapters: HashMap<EvidenceSource, Arc<dyn EvidenceAdapter>>,
}

impl EvidenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any previous one for the same source
    pub fn register(&mut self, adapter: Arc<dyn EvidenceAdapter>) {
        tracing::debug!("Registered evidence adapter: {}", adapter.source());
        self.adapters.insert(adapter.source(), adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn EvidenceAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, source: EvidenceSource) -> Option<&Arc<dyn EvidenceAdapter>> {
        self.adapters.get(&source)
    }

    /// HTTP-backed STRING and ENCORI adapters sharing one cache
    pub fn http(cache: Arc<ResponseCache>, settings: &Settings, params: &SourceParams) -> Self {
        Self::new()
            .with(Arc::new(StringPpiAdapter::new(
                Arc::clone(&cache),
                settings,
                params.species_taxon,
                params.ppi.clone(),
            )))
            .with(Arc::new(RbpTargetAdapter::new(
                Arc::clone(&cache),
                settings,
                params.rbp_target.clone(),
            )))
            .with(Arc::new(RnaRnaAdapter::new(
                cache,
                settings,
                params.rna_rna.clone(),
            )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(EvidenceSource::parse("STRING"), Some(EvidenceSource::Ppi));
        assert_eq!(EvidenceSource::parse(" ppi "), Some(EvidenceSource::Ppi));
        assert_eq!(EvidenceSource::parse("encori_rbp"), Some(EvidenceSource::RbpTarget));
        assert_eq!(EvidenceSource::parse("rna_rna"), Some(EvidenceSource::RnaRna));
        assert_eq!(EvidenceSource::parse("biogrid"), None);

        for source in EvidenceSource::ALL {
            for alias in source.aliases() {
                assert_eq!(EvidenceSource::parse(alias), Some(source));
            }
        }
    }

    #[test]
    fn test_parse_sources_dedups_and_drops_unknown() {
        let s = parse_sources("string, ppi,,biogrid,encori_rna").unwrap();
        assert_eq!(s, vec![EvidenceSource::Ppi, EvidenceSource::RnaRna]);
    }

    #[test]
    fn test_parse_sources_all_unknown_is_config_error() {
        let err = parse_sources("biogrid, intact").unwrap_err();
        assert!(matches!(err, FusionError::Configuration(_)));
        assert!(parse_sources("").is_err());
    }

    #[test]
    fn test_serde_ids() {
        let json = serde_json::to_string(&EvidenceSource::RbpTarget).unwrap();
        assert_eq!(json, "\"encori_rbp_by_target\"");
    }

    #[test]
    fn test_params_validate() {
        assert!(SourceParams::default().validate().is_ok());
        let mut p = SourceParams::default();
        p.ppi.depth = 3;
        assert!(p.validate().is_err());
        let mut p = SourceParams::default();
        p.ppi.required_score = 1001;
        assert!(p.validate().is_err());
        let mut p = SourceParams::default();
        p.rna_rna.exp_num = 0;
        assert!(p.validate().is_err());
    }
}
