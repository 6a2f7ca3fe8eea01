//! # mimir-game: Game-World Integration for MIMIR
//!
//! This crate connects the game-agnostic `mimir-core` pieces and the
//! `mimir-llm` client to a running game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             game sidecar (TCP)              │
//! └──────────┬──────────────────────▲───────────┘
//!            │ events               │ actions
//! ┌──────────▼──────────────────────┴───────────┐
//! │               mimir-game                    │
//! │  ┌────────────┐       ┌──────────────┐      │
//! │  │ event_loop │──────▶│   pipeline   │      │
//! │  └────────────┘       └──────┬───────┘      │
//! │                              ▼              │
//! │      prompt ─▶ model ─▶ parse ─▶ gate       │
//! │                              │              │
//! │                       ┌──────▼───────┐      │
//! │                       │    bridge    │      │
//! │                       └──────────────┘      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `control`: the [`AgentControl`] trait, one method per action verb
//! - `bridge`: runs a vetted action script against an agent
//! - `pipeline`: one player message from prompt to memory
//! - `event_loop`: sender filtering and error reporting
//! - `events`: inbound game events
//! - `remote`: newline-delimited JSON connection to the game sidecar

pub mod bridge;
pub mod control;
pub mod event_loop;
pub mod events;
pub mod pipeline;
pub mod remote;

pub use bridge::{ExecutionError, ExecutionReport, execute};
pub use control::{AgentControl, ControlError, DryRunAgent};
pub use event_loop::{Disposition, EventLoop, Identity, LoopState};
pub use events::GameEvent;
pub use pipeline::{Outcome, Pipeline, PipelineError};
pub use remote::RemoteAgent;
