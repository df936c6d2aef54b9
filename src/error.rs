//! Error types shared by the fusion pipeline

use thiserror::Error;

/// Errors that can occur while building or analysing an interaction network
#[derive(Error, Debug)]
pub enum FusionError {
    /// Nothing valid to do: no seeds, no recognised evidence source, or a
    /// parameter outside its allowed range. Raised before any network access.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Transport failure, non-success status or undecodable payload from an
    /// evidence provider. A build that sees one of these produces no graph.
    #[error("{provider} fetch failed: {message}")]
    UpstreamFetch { provider: String, message: String },

    #[error("{what} index {index} out of range ({available} available)")]
    Range {
        what: &'static str,
        index: usize,
        available: usize,
    },

    #[error("Response cache I/O error: {0}")]
    Cache(#[from] std::io::Error),
}

impl FusionError {
    pub fn config(message: impl Into<String>) -> Self {
        FusionError::Configuration(message.into())
    }

    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        FusionError::UpstreamFetch {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Re-tag an upstream failure with the provider that issued the request.
    ///
    /// The cache layer only knows hosts; adapters know which database they
    /// were talking to.
    pub fn with_provider(self, provider: &str) -> Self {
        match self {
            FusionError::UpstreamFetch { message, .. } => FusionError::UpstreamFetch {
                provider: provider.to_string(),
                message,
            },
            other => other,
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, FusionError::UpstreamFetch { .. })
    }
}

pub type Result<T> = std::result::Result<T, FusionError>;
