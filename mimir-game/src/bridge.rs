//! Execution bridge: runs a vetted action script against the agent.
//!
//! The script is parsed and validated in full before the first action runs,
//! so a typo in statement five never leaves the bot half way through
//! statements one to four. Actions then run strictly in order and the first
//! failure stops the rest.

use std::time::{Duration, Instant};

use mimir_core::script::{Action, Script, ScriptError};
use thiserror::Error;
use tracing::{debug, info};

use crate::control::{AgentControl, ControlError, ControlResult};

/// Why a script did not run to completion.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The script is not valid in the action vocabulary. Nothing ran.
    #[error("invalid action script: {0}")]
    Script(#[from] ScriptError),

    /// An action failed at run time. Earlier actions already happened.
    #[error("step {step} (bot.{verb}) failed: {source}")]
    Control {
        /// 1-based index of the failing action.
        step: usize,
        /// Verb of the failing action.
        verb: &'static str,
        /// Underlying failure.
        #[source]
        source: ControlError,
    },
}

/// Summary of a completed script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Number of actions performed.
    pub steps: usize,
    /// Wall-clock time spent, in milliseconds.
    pub elapsed_ms: u64,
}

/// Parse `code` and perform every action on `agent`.
///
/// # Errors
///
/// [`ExecutionError::Script`] when the script does not parse,
/// [`ExecutionError::Control`] for the first action the agent fails.
pub async fn execute<A: AgentControl>(
    code: &str,
    agent: &A,
) -> Result<ExecutionReport, ExecutionError> {
    let script = Script::parse(code)?;
    run_script(&script, agent).await
}

/// Perform an already parsed script.
///
/// # Errors
///
/// [`ExecutionError::Control`] for the first action the agent fails.
pub async fn run_script<A: AgentControl>(
    script: &Script,
    agent: &A,
) -> Result<ExecutionReport, ExecutionError> {
    let start = Instant::now();
    for (idx, action) in script.actions.iter().enumerate() {
        debug!(step = idx + 1, action = %action, "Performing action");
        dispatch(action, agent)
            .await
            .map_err(|source| ExecutionError::Control {
                step: idx + 1,
                verb: action.verb(),
                source,
            })?;
    }

    #[allow(clippy::cast_possible_truncation)]
    let elapsed_ms = start.elapsed().as_millis() as u64;
    info!(steps = script.len(), elapsed_ms, "Action script completed");
    Ok(ExecutionReport {
        steps: script.len(),
        elapsed_ms,
    })
}

/// One arm per verb. `wait` is handled here rather than by the agent.
async fn dispatch<A: AgentControl>(action: &Action, agent: &A) -> ControlResult {
    match action {
        Action::Chat { message } => agent.chat(message).await,
        Action::Dig { target } => agent.dig(target).await,
        Action::Place { block } => agent.place(block).await,
        Action::Goto { x, y, z } => agent.goto(*x, *y, *z).await,
        Action::Follow { player } => agent.follow(player).await,
        Action::Attack { target } => agent.attack(target).await,
        Action::Equip { item } => agent.equip(item).await,
        Action::Jump => agent.jump().await,
        Action::Stop => agent.stop().await,
        Action::Wait { ms } => {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            Ok(())
        }
    }
}
