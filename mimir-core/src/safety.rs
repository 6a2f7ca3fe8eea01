//! Denylist pre-filter over generated action code.
//!
//! This is a best-effort static check, not a sandbox. String concatenation,
//! alternate spellings or indirect references slip straight past it. The
//! real containment is the closed action vocabulary in [`crate::script`]:
//! anything that is not a known `bot.<verb>(...)` call is refused there.
//! The gate exists to reject obviously hostile output early and to make
//! such rejections visible in logs and chat.
//!
//! The gate is a pure predicate. Turning a rejection into an error is the
//! caller's job.

/// Case-insensitive substrings that mark code as unsafe.
///
/// Covers filesystem access, process control, dynamic evaluation, network
/// access and process spawning.
pub const DENYLIST: &[&str] = &[
    // filesystem
    "fs.",
    "path.",
    "writefile",
    "readfile",
    "unlink",
    "rmdir",
    "mkdir",
    // process control
    "process.exit",
    "process.env",
    "process.",
    // dynamic evaluation and module loading
    "eval(",
    "require(",
    "import(",
    "await import",
    "new function",
    // network
    "http.",
    "https.",
    "fetch(",
    // process spawning
    "child_process",
    "spawn(",
    "exec(",
];

/// Result of running the gate over a piece of code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyVerdict {
    /// No denylisted pattern found.
    Approved,
    /// Code was refused.
    Rejected {
        /// Why the code was refused.
        reason: String,
    },
}

impl SafetyVerdict {
    /// Whether the code may run.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// `true` when `code` is non-blank and contains no denylisted substring in
/// any letter case.
#[must_use]
pub fn is_safe(code: &str) -> bool {
    check(code).is_approved()
}

/// Like [`is_safe`], but says which rule fired.
#[must_use]
pub fn check(code: &str) -> SafetyVerdict {
    if code.trim().is_empty() {
        return SafetyVerdict::Rejected {
            reason: "code is empty".to_string(),
        };
    }

    match first_match(code) {
        Some(pattern) => SafetyVerdict::Rejected {
            reason: format!("code contains forbidden construct '{pattern}'"),
        },
        None => SafetyVerdict::Approved,
    }
}

/// First denylist entry found in `code`, ignoring case.
#[must_use]
pub fn first_match(code: &str) -> Option<&'static str> {
    let lowered = code.to_lowercase();
    DENYLIST
        .iter()
        .copied()
        .find(|pattern| lowered.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approves_plain_actions() {
        assert!(is_safe("bot.dig(block)"));
        assert!(is_safe("bot.chat('hello there'); bot.jump()"));
        assert!(is_safe("bot.goto(10, 64, -3)"));
    }

    #[test]
    fn rejects_blank() {
        assert!(!is_safe(""));
        assert!(!is_safe("   \n"));
    }

    #[test]
    fn rejects_fs_access() {
        assert!(!is_safe("require('fs').unlinkSync('x')"));
        assert_eq!(first_match("require('fs').unlinkSync('x')"), Some("unlink"));
    }

    #[test]
    fn rejection_ignores_case() {
        assert!(!is_safe("EVAL(\"1+1\")"));
        assert!(!is_safe("Process.Exit(0)"));
        assert!(!is_safe("CHILD_PROCESS"));
    }

    #[test]
    fn every_entry_is_rejected() {
        for pattern in DENYLIST {
            let code = format!("bot.chat(1); {}", pattern.to_uppercase());
            assert!(!is_safe(&code), "pattern {pattern} should be rejected");
        }
    }

    #[test]
    fn verdict_names_the_rule() {
        let verdict = check("bot.chat(1); fetch('http://x')");
        match verdict {
            SafetyVerdict::Rejected { reason } => {
                assert!(reason.contains("http.") || reason.contains("fetch("));
            }
            SafetyVerdict::Approved => panic!("expected rejection"),
        }
    }
}
