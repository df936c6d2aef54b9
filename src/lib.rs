//! Interactome - multi-source interaction network fusion
//!
//! Pulls protein-protein (STRING), RBP-target and RNA-RNA (ENCORI) evidence
//! through a content-addressed response cache, fuses it into one
//! deduplicated graph, and ranks regulon candidates around a seed set.
//!
//! ```no_run
//! use interactome::graph::{build, BuildRequest};
//! use interactome::sources::{parse_sources, EvidenceRegistry};
//! use interactome::{config::Settings, cache::ResponseCache, scoring};
//! use std::sync::Arc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let settings = Settings::load(None)?;
//! let cache = Arc::new(ResponseCache::from_settings(&settings));
//! let request = BuildRequest::new(["TP53", "BRCA1"], parse_sources("string,encori_rbp")?);
//! let registry = EvidenceRegistry::http(cache, &settings, &request.params);
//! let network = build(&request, &registry)?;
//! let report = scoring::score(&network, network.seeds(), 2, 50, true);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod scoring;
pub mod sources;

pub use error::{FusionError, Result};
pub use graph::{Network, NetworkMeta};
