//! Orchestrator: model explanation first, deterministic fallback on any failure.

use std::sync::Arc;
use std::time::Duration;

use pharmlens_common::{Explanation, RiskAssessment};
use pharmlens_llm::{GeminiBackend, LlmBackend};
use secrecy::ExposeSecret;

use crate::config::Config;
use crate::fallback::synthesize;
use crate::requester::ExplanationRequester;

/// Produces explanations for risk records. Cheap to share behind `Arc`;
/// holds no per-call state.
pub struct Explainer {
    requester: ExplanationRequester,
}

impl Explainer {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { requester: ExplanationRequester::new(backend) }
    }

    /// Build an explainer backed by Gemini from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let backend = GeminiBackend::new(config.api_key.expose_secret(), config.llm.model.clone())
            .with_base_url(config.llm.base_url.clone())
            .with_timeout(Duration::from_secs(config.llm.timeout_secs));

        tracing::info!(
            model = %config.llm.model,
            credential_present = config.has_api_key(),
            "Explainer ready"
        );
        Self::new(Arc::new(backend))
    }

    /// Always returns a complete explanation. Requester failures are logged
    /// and replaced by the template output; the two are never merged.
    pub async fn explain(&self, risk: &RiskAssessment) -> Explanation {
        match self.requester.request(risk).await {
            Ok(explanation) => explanation,
            Err(e) => {
                tracing::warn!(
                    drug = %risk.drug,
                    gene = %risk.gene,
                    model = self.requester.model_id(),
                    kind = e.kind(),
                    error = %e,
                    "LLM generation failed, using fallback"
                );
                synthesize(risk)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmlens_test_utils::{fixtures, StubBackend, StubFailure};
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_fallback_emits_warning() {
        let explainer = Explainer::new(Arc::new(StubBackend::replying("not json")));
        let risk = fixtures::codeine_toxic();

        let e = explainer.explain(&risk).await;

        assert_eq!(e, synthesize(&risk));
        assert!(logs_contain("LLM generation failed, using fallback"));
        assert!(logs_contain("malformed"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_model_success_emits_no_warning() {
        let explainer = Explainer::new(Arc::new(StubBackend::replying(
            r#"{"summary":"S","mechanism":"M"}"#,
        )));

        let e = explainer.explain(&fixtures::codeine_safe()).await;

        assert_eq!(e, Explanation::new("S", "M"));
        assert!(!logs_contain("using fallback"));
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back() {
        let stub = Arc::new(StubBackend::failing(StubFailure::Status(500)));
        let explainer = Explainer::new(stub.clone());
        let risk = fixtures::clopidogrel_ineffective();

        assert_eq!(explainer.explain(&risk).await, synthesize(&risk));
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_explain_does_not_mutate_input() {
        let explainer = Explainer::new(Arc::new(StubBackend::failing(StubFailure::Empty)));
        let risk = fixtures::codeine_toxic();
        let before = risk.clone();

        let _ = explainer.explain(&risk).await;
        assert_eq!(risk, before);
    }
}
