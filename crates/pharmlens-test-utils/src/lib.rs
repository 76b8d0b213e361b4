//! pharmlens-test-utils — stub backends and fixture records shared by tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use pharmlens_common::{DetectedVariant, RiskAssessment};
use pharmlens_llm::{LlmBackend, LlmError, LlmRequest, LlmResponse};
use tracing_subscriber::EnvFilter;

// ── Stub backend ───────────────────────────────────────────────────────────

/// Failure a `StubBackend` raises on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubFailure {
    /// Stands in for a network failure.
    Unavailable,
    /// Non-success status from the service.
    Status(u16),
    /// Service answered with no text.
    Empty,
}

impl StubFailure {
    fn to_error(self) -> LlmError {
        match self {
            StubFailure::Unavailable => LlmError::Unavailable("stub backend offline".to_string()),
            StubFailure::Status(status) => LlmError::ApiError {
                status,
                message: "stubbed API failure".to_string(),
            },
            StubFailure::Empty => LlmError::EmptyCompletion,
        }
    }
}

enum StubReply {
    Text(String),
    Fail(StubFailure),
}

/// `LlmBackend` returning a canned completion or a canned failure.
/// Records every request it receives.
pub struct StubBackend {
    reply: StubReply,
    calls: AtomicUsize,
    requests: Mutex<Vec<LlmRequest>>,
}

impl StubBackend {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_reply(StubReply::Text(text.into()))
    }

    pub fn failing(failure: StubFailure) -> Self {
        Self::with_reply(StubReply::Fail(failure))
    }

    fn with_reply(reply: StubReply) -> Self {
        Self { reply, calls: AtomicUsize::new(0), requests: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmBackend for StubBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.requests.lock() {
            log.push(req);
        }
        match &self.reply {
            StubReply::Text(text) => Ok(LlmResponse {
                content: text.clone(),
                model: "stub".to_string(),
                prompt_tokens: 0,
                completion_tokens: 0,
            }),
            StubReply::Fail(failure) => Err(failure.to_error()),
        }
    }

    fn model_id(&self) -> &str { "stub" }
    fn is_local(&self) -> bool { true }
}

// ── Fixtures ───────────────────────────────────────────────────────────────

pub mod fixtures {
    use super::*;

    pub fn codeine_safe() -> RiskAssessment {
        RiskAssessment::new("Codeine", "CYP2D6", "Normal Metabolizer", "Safe")
            .with_diplotype("*1/*1")
            .with_recommendation("Use label-recommended dosing.")
            .with_variants(vec![DetectedVariant::star("*1"), DetectedVariant::star("*1")])
    }

    pub fn codeine_toxic() -> RiskAssessment {
        RiskAssessment::new("Codeine", "CYP2D6", "Ultrarapid Metabolizer", "Toxic")
            .with_diplotype("*1/*1xN")
            .with_recommendation("Avoid use.")
            .with_variants(vec![
                DetectedVariant::star("*1").with_field("rsid", serde_json::json!("rs1065852")),
                DetectedVariant::star("*1xN"),
            ])
    }

    pub fn clopidogrel_ineffective() -> RiskAssessment {
        RiskAssessment::new("Clopidogrel", "CYP2C19", "Poor Metabolizer", "Ineffective")
            .with_diplotype("*2/*2")
            .with_recommendation("Use an alternative antiplatelet agent.")
            .with_variants(vec![DetectedVariant::star("*2"), DetectedVariant::star("*2")])
    }

    /// Unknown label, no variant list.
    pub fn warfarin_adjust() -> RiskAssessment {
        RiskAssessment::new("Warfarin", "CYP2C9", "Intermediate Metabolizer", "Adjust Dosage")
            .with_diplotype("*1/*3")
            .with_recommendation("Reduce starting dose.")
    }

    /// Variant list present but empty.
    pub fn simvastatin_no_variants() -> RiskAssessment {
        RiskAssessment::new("Simvastatin", "SLCO1B1", "Decreased Function", "Toxic")
            .with_recommendation("Prescribe a lower dose or alternative statin.")
            .with_variants(Vec::new())
    }

    pub fn all() -> Vec<RiskAssessment> {
        vec![
            codeine_safe(),
            codeine_toxic(),
            clopidogrel_ineffective(),
            warfarin_adjust(),
            simvastatin_no_variants(),
        ]
    }
}

// ── Logging ────────────────────────────────────────────────────────────────

/// Install a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pharmlens=debug,info")),
        )
        .with_test_writer()
        .try_init();
}
