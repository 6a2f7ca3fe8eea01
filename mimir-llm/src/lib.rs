//! # mimir-llm: LLM Abstraction Layer for MIMIR
//!
//! One prompt in, raw text out. Backends:
//!   - **OpenAI Responses API** (default, `POST /v1/responses`)
//!   - **OpenAI-compatible chat completions** (also Together, vLLM, etc.)
//!   - **Ollama** (local)
//!
//! Every call is a single attempt with a hard timeout. Callers that want to
//! substitute a scripted model (tests, replays) depend on the
//! [`CompletionModel`] trait rather than on [`LlmClient`] directly.
//!
//! The [`prompt`] module owns the prompt template and its three markers.

pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

pub use client::{CompletionModel, LlmClient, LlmProvider};
pub use error::LlmError;
pub use prompt::PromptTemplate;
pub use types::{LlmRequest, LlmResponse};
