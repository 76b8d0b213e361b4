//! pharmlens-common — Shared record types and errors used across all PharmLens crates.

pub mod error;
pub mod entities;

// Re-export commonly used types
pub use entities::{DetectedVariant, Explanation, RiskAssessment, RiskLabel};
pub use error::{PharmlensError, Result};
