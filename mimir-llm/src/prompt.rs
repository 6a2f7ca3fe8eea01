//! The prompt template and its three markers.
//!
//! A template is plain text containing, once each:
//!
//! | marker            | replaced with                               |
//! |-------------------|---------------------------------------------|
//! | `{{CHARACTER}}`   | the character profile                       |
//! | `{{MEMORY}}`      | remembered facts, or [`MEMORY_EMPTY`]       |
//! | `@@@`             | the player's chat message                   |
//!
//! Only the first occurrence of each marker is replaced, in that order, and
//! nothing is escaped. A missing marker is skipped without error.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Marker for the character profile.
pub const CHARACTER_MARKER: &str = "{{CHARACTER}}";
/// Marker for the memory text.
pub const MEMORY_MARKER: &str = "{{MEMORY}}";
/// Marker for the player's message.
pub const MESSAGE_MARKER: &str = "@@@";

/// Substituted for blank memory text.
pub const MEMORY_EMPTY: &str = "Memory is empty.";

/// Built-in template used when no template file is available.
pub const DEFAULT_TEMPLATE: &str = r#"You control a bot in a block-building survival game.

Your character:
{{CHARACTER}}

What you remember:
{{MEMORY}}

The player says:
@@@

Decide what the bot should do and answer with a single JSON object and
nothing else:
{"code": "<action script>", "memory": "<optional short fact worth remembering>"}

The action script is one or more calls separated by ';'. Only these calls exist:
- bot.chat(message) — say something in chat
- bot.dig(block) — dig the nearest block of that type
- bot.place(block) — place a block from the inventory
- bot.goto(x, y, z) — walk to coordinates
- bot.follow(player) — follow a player
- bot.attack(target) — attack the nearest entity of that type
- bot.equip(item) — hold an item from the inventory
- bot.jump() — jump once
- bot.stop() — stop moving and cancel the current activity
- bot.wait(ms) — pause before the next step (max 10000)

Quote free text, e.g. bot.chat("on my way"). Leave "memory" out when there is
nothing new to remember. Always reply in character through bot.chat."#;

/// Fill `template` with the three values.
#[must_use]
pub fn build_prompt(template: &str, character: &str, memory: &str, message: &str) -> String {
    let memory = if memory.trim().is_empty() { MEMORY_EMPTY } else { memory };
    template
        .replacen(CHARACTER_MARKER, character, 1)
        .replacen(MEMORY_MARKER, memory, 1)
        .replacen(MESSAGE_MARKER, message, 1)
}

/// Cut `text` to at most `max_chars` characters, for log output.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// A loaded prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    source: Option<PathBuf>,
}

impl PromptTemplate {
    /// Use `text` directly as the template.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    /// The built-in template.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_text(DEFAULT_TEMPLATE)
    }

    /// Read the template from a file.
    ///
    /// # Errors
    /// Returns the I/O error if the file cannot be read.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let template = Self {
            text,
            source: Some(path.to_path_buf()),
        };
        for marker in template.missing_markers() {
            warn!(
                path = %path.display(),
                marker,
                "Prompt template has no marker, it will be skipped"
            );
        }
        debug!(path = %path.display(), chars = template.text.len(), "Prompt template loaded");
        Ok(template)
    }

    /// Read the template from a file, falling back to [`DEFAULT_TEMPLATE`].
    #[must_use]
    pub fn load_or_builtin(path: &Path) -> Self {
        match Self::load(path) {
            Ok(template) => template,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Prompt template unavailable, using built-in template"
                );
                Self::builtin()
            }
        }
    }

    /// Raw template text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// File the template came from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Markers that do not appear in the template.
    #[must_use]
    pub fn missing_markers(&self) -> Vec<&'static str> {
        [CHARACTER_MARKER, MEMORY_MARKER, MESSAGE_MARKER]
            .into_iter()
            .filter(|m| !self.text.contains(m))
            .collect()
    }

    /// Fill the template. See [`build_prompt`].
    #[must_use]
    pub fn build(&self, character: &str, memory: &str, message: &str) -> String {
        build_prompt(&self.text, character, memory, message)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}
