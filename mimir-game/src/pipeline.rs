//! The per-message pipeline: prompt → model → parse → gate → remember → execute.
//!
//! One player message goes through [`Pipeline::handle_message`] exactly once.
//! Nothing is retried; the first failure ends the message and is returned as
//! a [`PipelineError`] for the event loop to report.

use mimir_core::config::BotConfig;
use mimir_core::memory::MemoryStore;
use mimir_core::profile::CharacterProfile;
use mimir_core::response::{ActionResponse, ResponseError};
use mimir_core::safety::{self, SafetyVerdict};
use mimir_llm::prompt::{PromptTemplate, truncate_chars};
use mimir_llm::{CompletionModel, LlmError, LlmRequest};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bridge::{self, ExecutionError};
use crate::control::AgentControl;

/// Longest prompt excerpt written to the log.
pub const LOG_PROMPT_CHARS: usize = 5000;
/// Longest model output or script excerpt written to the log.
pub const LOG_RESPONSE_CHARS: usize = 2000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything that can end a single message's processing.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required setting (the API key) is missing.
    #[error("{0} is not set")]
    ConfigMissing(&'static str),

    /// The model call failed.
    #[error("language model error: {0}")]
    Model(LlmError),

    /// The model output held no usable JSON object.
    #[error("model reply is not valid JSON")]
    MalformedResponse(String),

    /// The model output had no `code` field.
    #[error("model reply has no code")]
    MissingCode,

    /// The safety gate refused the code.
    #[error("unsafe code refused: {reason}")]
    UnsafeCode {
        /// Which rule fired.
        reason: String,
    },

    /// The script failed to run.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl From<LlmError> for PipelineError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::ConfigMissing(name) => Self::ConfigMissing(name),
            other => Self::Model(other),
        }
    }
}

impl From<ResponseError> for PipelineError {
    fn from(err: ResponseError) -> Self {
        match err {
            ResponseError::MalformedResponse(detail) => Self::MalformedResponse(detail),
            ResponseError::MissingCode => Self::MissingCode,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// What a successfully handled message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Actions performed.
    pub steps: usize,
    /// Fact added to memory, if any.
    pub remembered: Option<String>,
    /// Model latency in milliseconds.
    pub model_latency_ms: u64,
}

/// Wires profile, memory, template and model together.
pub struct Pipeline<M> {
    template: PromptTemplate,
    profile: CharacterProfile,
    memory: MemoryStore,
    model: M,
    request_timeout_ms: u64,
}

impl<M: CompletionModel> Pipeline<M> {
    /// Create a pipeline with the default request timeout.
    pub fn new(
        template: PromptTemplate,
        profile: CharacterProfile,
        memory: MemoryStore,
        model: M,
    ) -> Self {
        Self {
            template,
            profile,
            memory,
            model,
            request_timeout_ms: LlmRequest::new("").timeout_ms,
        }
    }

    /// Create a pipeline from the bot configuration.
    pub fn from_config(config: &BotConfig, template: PromptTemplate, model: M) -> Self {
        Self::new(
            template,
            CharacterProfile::new(&config.files.character_path),
            MemoryStore::with_capacity(&config.files.memory_path, config.memory.max_entries),
            model,
        )
        .with_timeout(config.llm.request_timeout_ms)
    }

    /// Override the model request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// The memory store this pipeline appends to.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Process one player message end to end.
    ///
    /// The memory fact is stored once the gate approves the code, before the
    /// script runs, so it is kept even when execution fails.
    ///
    /// # Errors
    ///
    /// Any [`PipelineError`]; the message is then finished.
    pub async fn handle_message<A: AgentControl>(
        &self,
        message: &str,
        agent: &A,
    ) -> Result<Outcome, PipelineError> {
        let character = self.profile.describe();
        let memory = self.memory.as_joined_string();
        let prompt = self.template.build(&character, &memory, message);
        debug!(prompt = truncate_chars(&prompt, LOG_PROMPT_CHARS), "Prompt built");

        let request = LlmRequest::new(prompt).with_timeout(self.request_timeout_ms);
        let response = self.model.complete(&request).await?;
        debug!(
            model = %response.model,
            latency_ms = response.latency_ms,
            raw = truncate_chars(&response.text, LOG_RESPONSE_CHARS),
            "Model replied"
        );

        let parsed = ActionResponse::parse(&response.text)?;

        if let SafetyVerdict::Rejected { reason } = safety::check(&parsed.code) {
            warn!(
                reason = %reason,
                code = truncate_chars(&parsed.code, LOG_RESPONSE_CHARS),
                "Refusing unsafe code"
            );
            return Err(PipelineError::UnsafeCode { reason });
        }

        if let Some(fact) = &parsed.memory {
            self.memory.append(fact);
        }

        info!(code = truncate_chars(&parsed.code, LOG_RESPONSE_CHARS), "Executing action script");
        let report = bridge::execute(&parsed.code, agent).await?;

        Ok(Outcome {
            steps: report.steps,
            remembered: parsed.memory,
            model_latency_ms: response.latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir_core::script::ScriptError;

    #[test]
    fn llm_config_missing_is_lifted() {
        let err = PipelineError::from(LlmError::ConfigMissing("OPENAI_API_KEY"));
        assert!(matches!(err, PipelineError::ConfigMissing("OPENAI_API_KEY")));
        assert_eq!(err.to_string(), "OPENAI_API_KEY is not set");

        let err = PipelineError::from(LlmError::Timeout(500));
        assert!(matches!(err, PipelineError::Model(LlmError::Timeout(500))));
    }

    #[test]
    fn response_errors_map_one_to_one() {
        assert!(matches!(
            PipelineError::from(ResponseError::MissingCode),
            PipelineError::MissingCode
        ));
        assert!(matches!(
            PipelineError::from(ResponseError::MalformedResponse("eof".into())),
            PipelineError::MalformedResponse(_)
        ));
    }

    #[test]
    fn execution_error_display_is_passed_through() {
        let err = PipelineError::from(ExecutionError::Script(ScriptError::Empty));
        assert_eq!(err.to_string(), "invalid action script: action script is empty");
    }
}
