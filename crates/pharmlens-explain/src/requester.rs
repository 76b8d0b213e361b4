//! Explanation Requester — one model call, parsed into an `Explanation`.

use std::sync::Arc;

use pharmlens_common::{Explanation, RiskAssessment};
use pharmlens_llm::{LlmBackend, LlmError, LlmRequest};
use serde::{de, Deserialize};
use thiserror::Error;

use crate::prompt::build_prompt;

/// Why a model explanation could not be used.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The call did not complete (network, timeout, non-success status).
    #[error("transport failure: {0}")]
    Transport(#[from] LlmError),
    /// The completion text is not the expected JSON object.
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Valid JSON, but a required field is missing or blank.
    #[error("incomplete response: missing `{0}`")]
    Incomplete(&'static str),
}

impl RequestError {
    pub fn kind(&self) -> &'static str {
        match self {
            RequestError::Transport(_)  => "transport",
            RequestError::Malformed(_)  => "malformed",
            RequestError::Incomplete(_) => "incomplete",
        }
    }
}

/// Shape the model is asked to return. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct ModelExplanation {
    summary: Option<String>,
    mechanism: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, RequestError> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(RequestError::Incomplete(field))
}

/// Parse completion text into an `Explanation`, trimming both fields.
/// Only a JSON object is accepted; arrays and scalars are malformed even though
/// serde would map a two-element array onto the struct positionally.
pub fn parse_explanation(text: &str) -> Result<Explanation, RequestError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(RequestError::Malformed(de::Error::custom(
            "expected a JSON object with `summary` and `mechanism`",
        )));
    }
    let parsed: ModelExplanation = serde_json::from_value(value)?;
    let summary = required(parsed.summary, "summary")?;
    let mechanism = required(parsed.mechanism, "mechanism")?;
    Ok(Explanation { summary, mechanism })
}

pub struct ExplanationRequester {
    backend: Arc<dyn LlmBackend>,
}

impl ExplanationRequester {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }

    /// Single attempt; no retries.
    pub async fn request(&self, risk: &RiskAssessment) -> Result<Explanation, RequestError> {
        let req = LlmRequest::prompt(build_prompt(risk)).json();

        tracing::debug!(
            model = self.backend.model_id(),
            drug = %risk.drug,
            gene = %risk.gene,
            "Requesting LLM explanation"
        );

        let resp = self.backend.complete(req).await?;
        parse_explanation(&resp.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmlens_llm::ResponseFormat;
    use pharmlens_test_utils::{fixtures, StubBackend, StubFailure};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_trims_fields() {
        let e = parse_explanation(r#"{"summary":"  S \n","mechanism":"\tM"}"#).unwrap();
        assert_eq!(e, Explanation::new("S", "M"));
    }

    #[test]
    fn test_parse_ignores_extra_keys() {
        let e = parse_explanation(r#"{"summary":"S","mechanism":"M","confidence":0.9}"#).unwrap();
        assert_eq!(e, Explanation::new("S", "M"));
    }

    #[test]
    fn test_parse_missing_mechanism_is_incomplete() {
        let err = parse_explanation(r#"{"summary":"S"}"#).unwrap_err();
        assert!(matches!(err, RequestError::Incomplete("mechanism")));
        assert_eq!(err.kind(), "incomplete");
    }

    #[test]
    fn test_parse_blank_summary_is_incomplete() {
        let err = parse_explanation(r#"{"summary":"   ","mechanism":"M"}"#).unwrap_err();
        assert!(matches!(err, RequestError::Incomplete("summary")));
    }

    #[test]
    fn test_parse_null_field_is_incomplete() {
        let err = parse_explanation(r#"{"summary":null,"mechanism":"M"}"#).unwrap_err();
        assert!(matches!(err, RequestError::Incomplete("summary")));
    }

    #[test]
    fn test_parse_non_json_is_malformed() {
        let err = parse_explanation("Sure! Here is the explanation you asked for.").unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn test_parse_markdown_fenced_json_is_malformed() {
        let err = parse_explanation("```json\n{\"summary\":\"S\",\"mechanism\":\"M\"}\n```").unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));
    }

    #[test]
    fn test_parse_wrong_type_is_malformed() {
        let err = parse_explanation(r#"{"summary":42,"mechanism":"M"}"#).unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));
        let err = parse_explanation("null").unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));
    }

    #[test]
    fn test_parse_non_object_json_is_malformed() {
        for text in [r#"["S","M"]"#, r#"[{"summary":"S","mechanism":"M"}]"#, "42", r#""S""#, "true"] {
            let err = parse_explanation(text).unwrap_err();
            assert!(matches!(err, RequestError::Malformed(_)), "accepted {text}");
        }
    }

    #[tokio::test]
    async fn test_request_sends_one_json_prompt() {
        let stub = Arc::new(StubBackend::replying(r#"{"summary":"S","mechanism":"M"}"#));
        let requester = ExplanationRequester::new(stub.clone());

        let e = requester.request(&fixtures::codeine_toxic()).await.unwrap();

        assert_eq!(e, Explanation::new("S", "M"));
        assert_eq!(stub.calls(), 1);
        let sent = &stub.requests()[0];
        assert_eq!(sent.response_format, ResponseFormat::Json);
        assert_eq!(sent.messages.len(), 1);
        assert_eq!(sent.messages[0].role, "user");
        assert!(sent.messages[0].content.contains("Drug: Codeine"));
    }

    #[tokio::test]
    async fn test_request_backend_failure_is_transport() {
        let stub = Arc::new(StubBackend::failing(StubFailure::Unavailable));
        let requester = ExplanationRequester::new(stub.clone());

        let err = requester.request(&fixtures::codeine_safe()).await.unwrap_err();

        assert_eq!(err.kind(), "transport");
        assert_eq!(stub.calls(), 1);
    }
}
