//! # MIMIR Core Library
//!
//! Game-agnostic building blocks for a bot that takes natural-language
//! commands from a player, asks a language model for an action script, and
//! remembers what it was told.
//!
//! - **Memory**: rolling, file-backed list of short facts ([`MemoryStore`])
//! - **Profile**: the bot's character description ([`CharacterProfile`])
//! - **Response**: parsing raw model output into an [`ActionResponse`]
//! - **Safety**: denylist pre-filter over generated action code
//! - **Script**: the closed action vocabulary and its parser ([`Action`])
//!
//! Nothing in this crate talks to the network or the game. The `mimir-llm`
//! and `mimir-game` crates wire these pieces to the outside world.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod memory;
pub mod profile;
pub mod response;
pub mod safety;
pub mod script;

pub use config::BotConfig;
pub use error::MimirError;
pub use memory::MemoryStore;
pub use profile::CharacterProfile;
pub use response::{ActionResponse, ResponseError};
pub use script::{Action, Script, ScriptError};
