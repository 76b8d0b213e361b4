//! pharmlens-llm — LLM backend abstraction layer.
//! Defines the LlmBackend trait and the Gemini implementation used for explanations.

pub mod backend;
pub mod gemini;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message, ResponseFormat};
pub use gemini::GeminiBackend;
