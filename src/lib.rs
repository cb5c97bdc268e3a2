//! doxa - Auditing bias in language-model decision responses with a
//! Rasch (one-parameter logistic IRT) model.
//!
//! ## Architecture
//!
//! The pipeline turns a scenario catalog into a labeled binary response
//! matrix for an external fitting service:
//!
//! - **Prompt Generator**: demographic × item × perspective × style cross
//!   product; prompts and metadata records stay index-aligned
//! - **Response Collector**: live backend queries or a seeded
//!   income-driven simulator, one binary outcome per prompt
//! - **Binarizer**: keyword classifier mapping free text to favorable /
//!   unfavorable
//! - **Matrix Assembler**: reshapes outcomes into demographic rows
//! - **Fitting Service**: external Rasch fit consumed over HTTP; theta is
//!   latent per-demographic bias, b is per-column difficulty

pub mod client;
pub mod collect;
pub mod fit;
pub mod models;
pub mod pipeline;
pub mod prompt;

// Re-exports for convenience
pub use client::LlmClient;
pub use collect::{
    Classifier, KeywordClassifier, LiveCollector, ResponseCollector, SimulatedCollector,
};
pub use fit::{FittingService, HttpFittingService, MatrixPayload};
pub use models::{
    AuditConfig, Catalog, Demographic, DoxaError, Perspective, PosteriorSummary, PromptRecord,
    ResponseMatrix, ResponseRecord, Result, RunStats, Style,
};
pub use pipeline::AuditPipeline;
