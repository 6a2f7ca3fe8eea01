//! The bot's character description.

use std::path::PathBuf;

use tracing::warn;

/// Returned when the character file does not exist.
pub const PROFILE_MISSING: &str = "Character description is missing.";
/// Returned when the character file exists but holds only whitespace.
pub const PROFILE_EMPTY: &str = "Character description is empty.";

/// Read-only character profile, re-read on every call so edits take effect
/// without a restart.
#[derive(Debug, Clone)]
pub struct CharacterProfile {
    path: PathBuf,
}

impl CharacterProfile {
    /// Profile backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Trimmed profile text, or one of the sentinels. Never fails.
    #[must_use]
    pub fn describe(&self) -> String {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let text = raw.trim();
                if text.is_empty() {
                    PROFILE_EMPTY.to_string()
                } else {
                    text.to_string()
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => PROFILE_MISSING.to_string(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Failed to read character file");
                PROFILE_MISSING.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_sentinel() {
        let dir = tempfile::tempdir().expect("tempdir");
        let profile = CharacterProfile::new(dir.path().join("character.txt"));
        assert_eq!(profile.describe(), PROFILE_MISSING);
    }

    #[test]
    fn blank_file_gives_empty_sentinel() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("character.txt");
        std::fs::write(&path, "\n   \n").expect("write");
        assert_eq!(CharacterProfile::new(path).describe(), PROFILE_EMPTY);
    }

    #[test]
    fn content_is_trimmed_and_reread() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("character.txt");
        std::fs::write(&path, "  A grumpy dwarf miner.\n").expect("write");
        let profile = CharacterProfile::new(&path);
        assert_eq!(profile.describe(), "A grumpy dwarf miner.");

        std::fs::write(&path, "A cheerful builder.").expect("write");
        assert_eq!(profile.describe(), "A cheerful builder.");
    }
}
