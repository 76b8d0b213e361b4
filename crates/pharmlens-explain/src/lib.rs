//! pharmlens-explain — clinical explanations for pharmacogenomic risk records.
//!
//! `Explainer::explain` asks the configured LLM backend for a two-field JSON
//! explanation and falls back to deterministic templates when that fails.
//! The caller always receives a complete `Explanation`.

pub mod config;
pub mod prompt;
pub mod requester;
pub mod fallback;
pub mod explainer;

pub use config::Config;
pub use explainer::Explainer;
pub use fallback::synthesize;
pub use requester::{ExplanationRequester, RequestError};

pub use pharmlens_common::{DetectedVariant, Explanation, RiskAssessment, RiskLabel};
