//! Game events the bot reacts to.
//!
//! Events arrive from the game side one per line as tagged JSON:
//!
//! ```json
//! {"event": "spawn", "username": "Bot"}
//! {"event": "chat", "username": "Steve", "message": "mine some stone"}
//! {"event": "end", "reason": "kicked"}
//! ```

use serde::{Deserialize, Serialize};

/// A game event observed by the event loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// The bot entered the world.
    Spawn {
        /// Name the server assigned to the bot, when reported.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
    },

    /// Someone said something in chat.
    Chat {
        /// Sender.
        username: String,
        /// Chat line.
        message: String,
    },

    /// The connection to the world ended.
    End {
        /// Reason given by the game side.
        #[serde(default)]
        reason: String,
    },
}

impl GameEvent {
    /// Decode one wire line. `None` for blank lines and unknown events.
    #[must_use]
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        serde_json::from_str(line).ok()
    }
}

/// Who a chat line came from, relative to the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    /// The bot's own line echoed back.
    Own,
    /// The configured player.
    Player,
    /// Anyone else.
    Other,
}

/// Classify a chat sender. Names compare exactly.
#[must_use]
pub fn classify_sender(username: &str, own_name: &str, player_name: &str) -> Sender {
    if username == own_name {
        Sender::Own
    } else if username == player_name {
        Sender::Player
    } else {
        Sender::Other
    }
}
