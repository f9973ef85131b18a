//! ClaimForge Common Library
//!
//! Shared code for the ClaimForge engine including:
//! - Error types and handling
//! - Configuration management
//! - Logging bootstrap
//! - Metrics and observability
//! - The answer data model and wire record
//! - Text analysis (terms, sentences, numerals, entities, similarity)

pub mod config;
pub mod constants;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod text;

// Re-export commonly used types
pub use config::EngineConfig;
pub use errors::{EngineError, ErrorCode, Result};
pub use text::{EntityExtractor, LexicalEntityExtractor, LexicalSimilarity, SimilarityProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
