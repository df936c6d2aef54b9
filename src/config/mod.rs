//! Configuration module for interactome
//!
//! This module handles:
//! - Cache location, TTL and request timeout
//! - Per-host politeness delay
//! - Upstream service endpoints (STRING, ENCORI)

mod settings;

pub use settings::{EncoriSection, Settings, SettingsFile, StringSection};
