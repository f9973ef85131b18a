//! ClaimForge Engine
//!
//! Answers a question against an ordered slice of document pages and emits
//! a structured, self-audited answer record:
//! - Question classification into a processing mode
//! - Concurrent relevance scoring and evidence gathering
//! - Streaming contradiction, cross-reference and ambiguity detection
//! - Mode-specific reasoning into a draft answer
//! - Completeness and certainty scoring
//! - Verification against eleven checks, with bounded refinement

pub mod classifier;
pub mod context;
pub mod gatherer;
pub mod orchestrator;
pub mod reasoner;
pub mod record_log;
pub mod refinement;
pub mod relevance;
pub mod scope;
pub mod scorer;
pub mod verifier;

pub use classifier::QuestionClassifier;
pub use context::QuestionContext;
pub use gatherer::{Detections, GatherOutcome, StreamingDetector};
pub use orchestrator::Orchestrator;
pub use record_log::{LoggedRecord, RecordLog};
pub use refinement::{RefinementLoop, RefinementOutcome};
pub use verifier::{CheckId, CheckOutcome, VerificationReport};
