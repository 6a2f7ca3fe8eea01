//! The agent's control surface.
//!
//! [`AgentControl`] is the only way actions reach the game world. Each verb
//! of the action vocabulary has exactly one method here. There is no
//! "run arbitrary code" method.

use std::future::Future;

use mimir_core::script::Action;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;

/// Failure reported by the control surface.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The connection to the game is gone.
    #[error("game connection closed")]
    Disconnected,

    /// The game refused or failed the action.
    #[error("action failed: {0}")]
    Rejected(String),

    /// Writing to or reading from the game connection failed.
    #[error("control I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An outbound message could not be encoded.
    #[error("control encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result alias for control calls.
pub type ControlResult = Result<(), ControlError>;

/// Side-effecting handle on the in-game bot.
pub trait AgentControl {
    /// Say a line in game chat.
    fn chat(&self, message: &str) -> impl Future<Output = ControlResult> + Send;
    /// Dig the nearest block of a type.
    fn dig(&self, target: &str) -> impl Future<Output = ControlResult> + Send;
    /// Place a block from the inventory.
    fn place(&self, block: &str) -> impl Future<Output = ControlResult> + Send;
    /// Path to a position.
    fn goto(&self, x: f64, y: f64, z: f64) -> impl Future<Output = ControlResult> + Send;
    /// Follow a player.
    fn follow(&self, player: &str) -> impl Future<Output = ControlResult> + Send;
    /// Attack the nearest entity of a type.
    fn attack(&self, target: &str) -> impl Future<Output = ControlResult> + Send;
    /// Hold an item.
    fn equip(&self, item: &str) -> impl Future<Output = ControlResult> + Send;
    /// Jump once.
    fn jump(&self) -> impl Future<Output = ControlResult> + Send;
    /// Stop all movement.
    fn stop(&self) -> impl Future<Output = ControlResult> + Send;
}

/// Control surface that performs nothing and records what it was asked to do.
///
/// Backs the binary's `--dry-run` console mode. A verb can be marked as
/// failing to rehearse error reporting.
#[derive(Debug, Default)]
pub struct DryRunAgent {
    performed: Mutex<Vec<Action>>,
    failing_verb: Option<&'static str>,
}

impl DryRunAgent {
    /// Agent on which every action succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Agent on which `verb` always fails with [`ControlError::Rejected`].
    #[must_use]
    pub fn failing_on(verb: &'static str) -> Self {
        Self {
            performed: Mutex::new(Vec::new()),
            failing_verb: Some(verb),
        }
    }

    /// Everything performed so far, in order.
    #[must_use]
    pub fn performed(&self) -> Vec<Action> {
        self.performed.lock().clone()
    }

    /// Chat lines sent so far.
    #[must_use]
    pub fn chat_lines(&self) -> Vec<String> {
        self.performed
            .lock()
            .iter()
            .filter_map(|a| match a {
                Action::Chat { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, action: Action) -> ControlResult {
        if self.failing_verb == Some(action.verb()) {
            return Err(ControlError::Rejected(format!("{} is not possible here", action.verb())));
        }
        info!(action = %action, "dry run");
        self.performed.lock().push(action);
        Ok(())
    }
}

impl AgentControl for DryRunAgent {
    async fn chat(&self, message: &str) -> ControlResult {
        self.record(Action::Chat { message: message.to_string() })
    }

    async fn dig(&self, target: &str) -> ControlResult {
        self.record(Action::Dig { target: target.to_string() })
    }

    async fn place(&self, block: &str) -> ControlResult {
        self.record(Action::Place { block: block.to_string() })
    }

    async fn goto(&self, x: f64, y: f64, z: f64) -> ControlResult {
        self.record(Action::Goto { x, y, z })
    }

    async fn follow(&self, player: &str) -> ControlResult {
        self.record(Action::Follow { player: player.to_string() })
    }

    async fn attack(&self, target: &str) -> ControlResult {
        self.record(Action::Attack { target: target.to_string() })
    }

    async fn equip(&self, item: &str) -> ControlResult {
        self.record(Action::Equip { item: item.to_string() })
    }

    async fn jump(&self) -> ControlResult {
        self.record(Action::Jump)
    }

    async fn stop(&self) -> ControlResult {
        self.record(Action::Stop)
    }
}
