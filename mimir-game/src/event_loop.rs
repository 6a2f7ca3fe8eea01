//! Event loop glue.
//!
//! ```text
//!  Idle ──chat──▶ Filtering ──sender is player──▶ Dispatching ──done/failed──▶ Idle
//!                     │
//!                     └──own line / anyone else──▶ Idle
//! ```
//!
//! Events are handled one at a time; the next event is not looked at until
//! the current message's pipeline has finished. A failed message is reported
//! in chat and the loop carries on.

use mimir_llm::CompletionModel;
use mimir_llm::prompt::truncate_chars;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::control::AgentControl;
use crate::events::{GameEvent, Sender, classify_sender};
use crate::pipeline::{Outcome, Pipeline, PipelineError};

/// Prefix of chat lines that report a failed message.
pub const ERROR_PREFIX: &str = "Error: ";

/// Where the loop is in handling the current event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the next event.
    Idle,
    /// Deciding whether a chat line is addressed to the bot.
    Filtering,
    /// Running the pipeline for a player message.
    Dispatching,
}

/// What happened to one event.
#[derive(Debug)]
pub enum Disposition {
    /// Not a chat event; nothing to dispatch.
    Observed,
    /// Chat line dropped at filtering.
    Dropped(Sender),
    /// Player message handled successfully.
    Handled(Outcome),
    /// Player message failed; the error was reported in chat.
    Failed(PipelineError),
    /// The game connection ended.
    Finished,
}

/// Names that decide which chat lines are dispatched.
#[derive(Debug, Clone)]
pub struct Identity {
    /// The bot's own name. Its lines are never dispatched.
    pub own_name: String,
    /// The only player the bot takes orders from.
    pub player_name: String,
}

/// Drives the pipeline from a stream of game events.
pub struct EventLoop<M, A> {
    pipeline: Pipeline<M>,
    agent: A,
    identity: Identity,
    max_chat_len: usize,
    state: LoopState,
}

impl<M: CompletionModel, A: AgentControl> EventLoop<M, A> {
    /// Create an idle loop.
    pub fn new(pipeline: Pipeline<M>, agent: A, identity: Identity, max_chat_len: usize) -> Self {
        Self {
            pipeline,
            agent,
            identity,
            max_chat_len,
            state: LoopState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The control surface actions go to.
    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// The pipeline messages go through.
    pub fn pipeline(&self) -> &Pipeline<M> {
        &self.pipeline
    }

    /// Current identity, updated by spawn events.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Handle one event to completion.
    pub async fn handle_event(&mut self, event: GameEvent) -> Disposition {
        match event {
            GameEvent::Spawn { username } => {
                if let Some(name) = username.filter(|n| !n.trim().is_empty()) {
                    self.identity.own_name = name;
                }
                info!(
                    username = %self.identity.own_name,
                    player = %self.identity.player_name,
                    "Bot spawned"
                );
                Disposition::Observed
            }
            GameEvent::End { reason } => {
                info!(reason = %reason, "Game connection ended");
                Disposition::Finished
            }
            GameEvent::Chat { username, message } => self.handle_chat(&username, &message).await,
        }
    }

    /// Handle events until the game ends or the channel closes.
    pub async fn run(mut self, mut events: mpsc::Receiver<GameEvent>) {
        info!(player = %self.identity.player_name, "Event loop started");
        while let Some(event) = events.recv().await {
            if matches!(self.handle_event(event).await, Disposition::Finished) {
                break;
            }
        }
        info!("Event loop stopped");
    }

    async fn handle_chat(&mut self, username: &str, message: &str) -> Disposition {
        self.transition(LoopState::Filtering);
        let sender = classify_sender(username, &self.identity.own_name, &self.identity.player_name);
        if sender != Sender::Player {
            debug!(username, ?sender, "Chat line dropped");
            self.transition(LoopState::Idle);
            return Disposition::Dropped(sender);
        }

        self.transition(LoopState::Dispatching);
        info!(player = username, text = message, "Player message received");
        let disposition = match self.pipeline.handle_message(message, &self.agent).await {
            Ok(outcome) => {
                info!(
                    steps = outcome.steps,
                    remembered = outcome.remembered.is_some(),
                    "Player message handled"
                );
                Disposition::Handled(outcome)
            }
            Err(err) => {
                warn!(error = %err, "Player message failed");
                self.report(&err).await;
                Disposition::Failed(err)
            }
        };
        self.transition(LoopState::Idle);
        disposition
    }

    /// Tell the player what went wrong. A failure to do so is only logged.
    async fn report(&self, err: &PipelineError) {
        let line = format!("{ERROR_PREFIX}{err}");
        let line = truncate_chars(&line, self.max_chat_len);
        if let Err(chat_err) = self.agent.chat(line).await {
            warn!(error = %chat_err, "Could not report failure in chat");
        }
    }

    fn transition(&mut self, next: LoopState) {
        trace!(from = ?self.state, to = ?next, "Loop state");
        self.state = next;
    }
}
