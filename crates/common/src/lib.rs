//! CiteScout Common Library
//!
//! Shared code for the citation pipeline crates:
//! - Core data model (sentences, claims, queries, papers, events)
//! - Error types and handling
//! - Configuration management
//! - Metrics names and registration

pub mod config;
pub mod errors;
pub mod metrics;
pub mod model;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use errors::{FormatError, PipelineError, ProviderError, Result};
pub use model::{
    CitationResult, CitationStyle, ClaimCandidate, ClaimType, EventStatus, FilterSet,
    FormattedCitation, PaperCandidate, PipelineEvent, Query, QueryKind, RankedResult, RunState,
    Sentence,
};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
