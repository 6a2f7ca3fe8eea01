//! Configuration for the MIMIR bot.
//!
//! Maps directly to `mimir.toml`. Every field has a default, so an empty
//! file (or no file at all) yields a runnable configuration. Environment
//! variables are layered on top with [`BotConfig::apply_env`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MimirError, Result};

/// Environment variable carrying the model service API key.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable naming the player the bot listens to.
pub const ENV_PLAYER_NAME: &str = "PLAYERNAME";
/// Environment variable overriding the model identifier.
pub const ENV_MODEL: &str = "MIMIR_MODEL";
/// Environment variable overriding the game control address.
pub const ENV_CONTROL_ADDR: &str = "MIMIR_CONTROL_ADDR";
/// Environment variable overriding the memory file path.
pub const ENV_MEMORY_FILE: &str = "MIMIR_MEMORY_FILE";
/// Environment variable overriding the character file path.
pub const ENV_CHARACTER_FILE: &str = "MIMIR_CHARACTER_FILE";
/// Environment variable overriding the prompt template path.
pub const ENV_PROMPT_FILE: &str = "MIMIR_PROMPT_FILE";

/// Top-level MIMIR configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BotConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Bot identity and game connection.
    #[serde(default)]
    pub bot: BotIdentityConfig,
    /// Locations of the memory, character and prompt files.
    #[serde(default)]
    pub files: FilesConfig,
    /// Memory store limits.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Language-model settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl BotConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `MimirError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| MimirError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.llm.api_key = Some(key);
        }
        if let Some(player) = get(ENV_PLAYER_NAME) {
            self.bot.player_name = player;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.llm.model = model;
        }
        if let Some(addr) = get(ENV_CONTROL_ADDR) {
            self.bot.control_addr = addr;
        }
        if let Some(path) = get(ENV_MEMORY_FILE) {
            self.files.memory_path = PathBuf::from(path);
        }
        if let Some(path) = get(ENV_CHARACTER_FILE) {
            self.files.character_path = PathBuf::from(path);
        }
        if let Some(path) = get(ENV_PROMPT_FILE) {
            self.files.prompt_path = PathBuf::from(path);
        }
    }

    /// Check cross-field consistency.
    ///
    /// The API key is deliberately not checked here: its absence only fails
    /// the first model call.
    ///
    /// # Errors
    /// Returns `MimirError::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.bot.player_name.trim().is_empty() {
            return Err(MimirError::Config("bot.player_name must not be empty".into()));
        }
        if self.bot.player_name == self.bot.username {
            return Err(MimirError::Config(
                "bot.player_name must differ from bot.username".into(),
            ));
        }
        if self.memory.max_entries == 0 {
            return Err(MimirError::Config("memory.max_entries must be at least 1".into()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(MimirError::Config("llm.model must not be empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub log_json: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Bot identity and connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotIdentityConfig {
    /// The bot's own in-game name. Chat from this name is ignored.
    #[serde(default = "default_username")]
    pub username: String,
    /// The only player whose chat is turned into actions.
    #[serde(default = "default_player_name")]
    pub player_name: String,
    /// Address of the game-side control sidecar.
    #[serde(default = "default_control_addr")]
    pub control_addr: String,
    /// Longest chat line the bot will send.
    #[serde(default = "default_max_chat_len")]
    pub max_chat_len: usize,
}

impl Default for BotIdentityConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            player_name: default_player_name(),
            control_addr: default_control_addr(),
            max_chat_len: default_max_chat_len(),
        }
    }
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// JSON array of remembered facts.
    #[serde(default = "default_memory_path")]
    pub memory_path: PathBuf,
    /// Plain-text character description.
    #[serde(default = "default_character_path")]
    pub character_path: PathBuf,
    /// Prompt template with `{{CHARACTER}}`, `{{MEMORY}}` and `@@@` markers.
    #[serde(default = "default_prompt_path")]
    pub prompt_path: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            memory_path: default_memory_path(),
            character_path: default_character_path(),
            prompt_path: default_prompt_path(),
        }
    }
}

/// Memory store limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Most recent entries kept; older ones are dropped first.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

/// Language-model integration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "openai", "`openai_chat`", "ollama", "none".
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL for the model API. Unset means the provider's usual
    /// endpoint, see [`LlmConfig::resolved_base_url`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Hard timeout for a model call in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    /// API key. Never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
            model: default_model(),
            request_timeout_ms: default_timeout_ms(),
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// The configured base URL, or the default endpoint for `provider`.
    pub fn resolved_base_url(&self) -> &str {
        match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ if self.provider == "ollama" => DEFAULT_OLLAMA_URL,
            _ => DEFAULT_OPENAI_URL,
        }
    }
}

/// Default endpoint for the `openai` and `openai_chat` providers.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
/// Default endpoint for a local Ollama server.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_username() -> String { "Bot".to_string() }
fn default_player_name() -> String { "Player".to_string() }
fn default_control_addr() -> String { "127.0.0.1:25580".to_string() }
fn default_max_chat_len() -> usize { 240 }
fn default_memory_path() -> PathBuf { PathBuf::from("botMemory.json") }
fn default_character_path() -> PathBuf { PathBuf::from("character.txt") }
fn default_prompt_path() -> PathBuf { PathBuf::from("prompt.txt") }
fn default_max_entries() -> usize { crate::memory::DEFAULT_MAX_ENTRIES }
fn default_provider() -> String { "openai".to_string() }
fn default_model() -> String { "gpt-5".to_string() }
fn default_timeout_ms() -> u64 { 60_000 }

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = BotConfig::from_toml("").expect("ok");
        assert_eq!(config.bot.player_name, "Player");
        assert_eq!(config.memory.max_entries, 200);
        assert_eq!(config.llm.model, "gpt-5");
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = BotConfig::from_toml(
            r#"
            [bot]
            player_name = "Steve"

            [files]
            memory_path = "/tmp/mem.json"
            "#,
        )
        .expect("ok");
        assert_eq!(config.bot.player_name, "Steve");
        assert_eq!(config.bot.username, "Bot");
        assert_eq!(config.files.memory_path, PathBuf::from("/tmp/mem.json"));
        assert_eq!(config.files.prompt_path, PathBuf::from("prompt.txt"));
    }

    #[test]
    fn base_url_defaults_per_provider() {
        let config = BotConfig::from_toml("[llm]\nprovider = \"ollama\"").expect("ok");
        assert!(config.llm.base_url.is_none());
        assert_eq!(config.llm.resolved_base_url(), "http://localhost:11434");

        let config = BotConfig::from_toml("").expect("ok");
        assert_eq!(config.llm.resolved_base_url(), "https://api.openai.com");

        let config = BotConfig::from_toml("[llm]\nprovider = \"openai_chat\"").expect("ok");
        assert_eq!(config.llm.resolved_base_url(), "https://api.openai.com");
    }

    #[test]
    fn explicit_base_url_wins_over_provider_default() {
        let config = BotConfig::from_toml(
            r#"
            [llm]
            provider = "ollama"
            base_url = "http://gpu-box:11434"
            "#,
        )
        .expect("ok");
        assert_eq!(config.llm.resolved_base_url(), "http://gpu-box:11434");

        let mut config = BotConfig::default();
        config.llm.base_url = Some("  ".into());
        config.llm.provider = "ollama".into();
        assert_eq!(config.llm.resolved_base_url(), "http://localhost:11434");
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = BotConfig::from_toml("[bot\nplayer_name =").unwrap_err();
        assert!(matches!(err, MimirError::Config(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = BotConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, MimirError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn env_overrides_apply_and_skip_blanks() {
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "sk-test"),
            (ENV_PLAYER_NAME, "Alex"),
            (ENV_MODEL, "   "),
        ]
        .into_iter()
        .collect();

        let mut config = BotConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.bot.player_name, "Alex");
        assert_eq!(config.llm.model, "gpt-5");
    }

    #[test]
    fn api_key_is_never_serialized() {
        let mut config = BotConfig::default();
        config.llm.api_key = Some("sk-secret".into());
        let text = toml::to_string(&config).expect("ok");
        assert!(!text.contains("sk-secret"));
    }

    #[test]
    fn validate_rejects_bot_listening_to_itself() {
        let mut config = BotConfig::default();
        config.bot.player_name = config.bot.username.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_validates() {
        assert!(BotConfig::default().validate().is_ok());
    }
}
