//! Action scripts: the closed vocabulary the model may use.
//!
//! Generated `code` is never evaluated. It is parsed as a short script of
//! calls on a single receiver, `bot`:
//!
//! ```text
//! bot.chat("on my way"); bot.goto(12, 64, -30)
//! bot.dig(stone)
//! ```
//!
//! Statements are separated by `;` or newlines. `//` starts a comment and a
//! leading `await` is accepted and ignored. Arguments are string literals
//! (`'..'`, `".."` or `` `..` ``), numbers, `true`/`false`, or bare names such
//! as `stone` or `minecraft:oak_log`. Each call is checked against
//! [`VOCABULARY`] and turned into an [`Action`]. The whole script is
//! validated before anything runs, so a typo in the third statement means no
//! statement runs.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Maximum statements in one script.
pub const MAX_STATEMENTS: usize = 16;
/// Upper bound for `bot.wait(ms)`.
pub const MAX_WAIT_MS: u64 = 10_000;

/// Description of one verb in the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbSpec {
    /// Verb name as written after `bot.`.
    pub name: &'static str,
    /// Argument names, in order.
    pub params: &'static [&'static str],
    /// One-line description for prompts.
    pub summary: &'static str,
}

/// Every verb the interpreter understands.
pub const VOCABULARY: &[VerbSpec] = &[
    VerbSpec { name: "chat", params: &["message"], summary: "say something in chat" },
    VerbSpec { name: "dig", params: &["block"], summary: "dig the nearest block of that type" },
    VerbSpec { name: "place", params: &["block"], summary: "place a block from the inventory" },
    VerbSpec { name: "goto", params: &["x", "y", "z"], summary: "walk to coordinates" },
    VerbSpec { name: "follow", params: &["player"], summary: "follow a player" },
    VerbSpec {
        name: "attack",
        params: &["target"],
        summary: "attack the nearest entity of that type",
    },
    VerbSpec { name: "equip", params: &["item"], summary: "hold an item from the inventory" },
    VerbSpec { name: "jump", params: &[], summary: "jump once" },
    VerbSpec { name: "stop", params: &[], summary: "stop moving and cancel the current activity" },
    VerbSpec { name: "wait", params: &["ms"], summary: "pause before the next step (max 10000)" },
];

/// Look up a verb by name.
#[must_use]
pub fn verb_spec(name: &str) -> Option<&'static VerbSpec> {
    VOCABULARY.iter().find(|spec| spec.name == name)
}

/// A single vetted action for the agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    /// Say a line in game chat.
    Chat {
        /// Text to say.
        message: String,
    },
    /// Dig the nearest block of a type.
    Dig {
        /// Block name.
        target: String,
    },
    /// Place a block from the inventory.
    Place {
        /// Block name.
        block: String,
    },
    /// Path to a position.
    Goto {
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
        /// Z coordinate.
        z: f64,
    },
    /// Follow a player.
    Follow {
        /// Player name.
        player: String,
    },
    /// Attack the nearest entity of a type.
    Attack {
        /// Entity or player name.
        target: String,
    },
    /// Hold an item.
    Equip {
        /// Item name.
        item: String,
    },
    /// Jump once.
    Jump,
    /// Stop all movement.
    Stop,
    /// Pause between steps.
    Wait {
        /// Milliseconds, at most [`MAX_WAIT_MS`].
        ms: u64,
    },
}

impl Action {
    /// The verb this action was written as.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "chat",
            Self::Dig { .. } => "dig",
            Self::Place { .. } => "place",
            Self::Goto { .. } => "goto",
            Self::Follow { .. } => "follow",
            Self::Attack { .. } => "attack",
            Self::Equip { .. } => "equip",
            Self::Jump => "jump",
            Self::Stop => "stop",
            Self::Wait { .. } => "wait",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat { message } => write!(f, "bot.chat({message:?})"),
            Self::Dig { target } => write!(f, "bot.dig({target})"),
            Self::Place { block } => write!(f, "bot.place({block})"),
            Self::Goto { x, y, z } => write!(f, "bot.goto({x}, {y}, {z})"),
            Self::Follow { player } => write!(f, "bot.follow({player})"),
            Self::Attack { target } => write!(f, "bot.attack({target})"),
            Self::Equip { item } => write!(f, "bot.equip({item})"),
            Self::Jump => write!(f, "bot.jump()"),
            Self::Stop => write!(f, "bot.stop()"),
            Self::Wait { ms } => write!(f, "bot.wait({ms})"),
        }
    }
}

/// Why a script was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// No statements at all.
    #[error("action script is empty")]
    Empty,

    /// More than [`MAX_STATEMENTS`] statements.
    #[error("action script has {0} statements (max {MAX_STATEMENTS})")]
    TooLong(usize),

    /// The text does not follow `bot.<verb>(<args>)`.
    #[error("syntax error in statement {statement}: {message}")]
    Syntax {
        /// 1-based statement index.
        statement: usize,
        /// What went wrong.
        message: String,
    },

    /// The verb is not in [`VOCABULARY`].
    #[error("unknown action 'bot.{0}'")]
    UnknownVerb(String),

    /// Wrong number of arguments.
    #[error("bot.{verb} takes {expected} argument(s), got {got}")]
    Arity {
        /// Verb name.
        verb: &'static str,
        /// Expected argument count.
        expected: usize,
        /// Supplied argument count.
        got: usize,
    },

    /// An argument has the wrong type.
    #[error("bot.{verb}: {message}")]
    InvalidArgument {
        /// Verb name.
        verb: &'static str,
        /// What went wrong.
        message: String,
    },
}

/// A parsed, fully validated script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    /// Actions in execution order.
    pub actions: Vec<Action>,
}

impl Script {
    /// Parse and validate an action script.
    ///
    /// # Errors
    ///
    /// Returns a [`ScriptError`] for empty or oversized scripts, syntax
    /// errors, unknown verbs and bad arguments.
    pub fn parse(code: &str) -> Result<Self, ScriptError> {
        let tokens = lex(code)?;

        let mut actions = Vec::new();
        for (index, statement) in tokens
            .split(|t| *t == Token::Sep)
            .filter(|s| !s.is_empty())
            .enumerate()
        {
            if actions.len() == MAX_STATEMENTS {
                let total = tokens
                    .split(|t| *t == Token::Sep)
                    .filter(|s| !s.is_empty())
                    .count();
                return Err(ScriptError::TooLong(total));
            }
            actions.push(parse_statement(index + 1, statement)?);
        }

        if actions.is_empty() {
            return Err(ScriptError::Empty);
        }
        Ok(Self { actions })
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the script has no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Text(String),
    Number(f64),
    Dot,
    Open,
    Close,
    Comma,
    Sep,
}

fn lex(code: &str) -> Result<Vec<Token>, ScriptError> {
    let mut tokens = Vec::new();
    let mut chars = code.chars().peekable();
    let statement = |tokens: &[Token]| tokens.iter().filter(|t| **t == Token::Sep).count() + 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' | ';' => {
                chars.next();
                tokens.push(Token::Sep);
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '/' => {
                chars.next();
                if chars.peek() != Some(&'/') {
                    return Err(ScriptError::Syntax {
                        statement: statement(&tokens),
                        message: "unexpected '/'".to_string(),
                    });
                }
                while chars.peek().is_some_and(|c| *c != '\n') {
                    chars.next();
                }
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '"' | '\'' | '`' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some(ch) = chars.next() {
                    match ch {
                        '\\' => match chars.next() {
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some(other) => text.push(other),
                            None => break,
                        },
                        ch if ch == c => {
                            closed = true;
                            break;
                        }
                        ch => text.push(ch),
                    }
                }
                if !closed {
                    return Err(ScriptError::Syntax {
                        statement: statement(&tokens),
                        message: "unterminated string".to_string(),
                    });
                }
                tokens.push(Token::Text(text));
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' => {
                let mut raw = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E') {
                        raw.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = raw.parse::<f64>().map_err(|_| ScriptError::Syntax {
                    statement: statement(&tokens),
                    message: format!("invalid number '{raw}'"),
                })?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' || ch == ':' {
                        name.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(name));
            }
            other => {
                return Err(ScriptError::Syntax {
                    statement: statement(&tokens),
                    message: format!("unexpected character '{other}'"),
                });
            }
        }
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Text(String),
    Name(String),
    Number(f64),
    Bool(bool),
}

fn parse_statement(statement: usize, tokens: &[Token]) -> Result<Action, ScriptError> {
    let syntax = |message: &str| ScriptError::Syntax {
        statement,
        message: message.to_string(),
    };

    let mut rest = tokens;
    if let [Token::Name(kw), tail @ ..] = rest {
        if kw == "await" {
            rest = tail;
        }
    }

    let (verb, mut rest) = match rest {
        [Token::Name(receiver), Token::Dot, Token::Name(verb), Token::Open, tail @ ..] => {
            if receiver != "bot" {
                return Err(syntax(&format!("unknown receiver '{receiver}', expected 'bot'")));
            }
            (verb.as_str(), tail)
        }
        _ => return Err(syntax("expected bot.<action>(...)")),
    };

    let mut args = Vec::new();
    loop {
        match rest {
            [Token::Close] => break,
            [Token::Close, ..] => return Err(syntax("unexpected tokens after ')'")),
            [] => return Err(syntax("missing ')'")),
            [token, tail @ ..] => {
                let arg = match token {
                    Token::Text(s) => Arg::Text(s.clone()),
                    Token::Number(n) => Arg::Number(*n),
                    Token::Name(n) if n == "true" => Arg::Bool(true),
                    Token::Name(n) if n == "false" => Arg::Bool(false),
                    Token::Name(n) => Arg::Name(n.clone()),
                    _ => return Err(syntax("expected an argument")),
                };
                args.push(arg);
                rest = match tail {
                    [Token::Comma, after @ ..] => after,
                    [Token::Close, ..] => tail,
                    _ => return Err(syntax("expected ',' or ')'")),
                };
            }
        }
    }

    build_action(verb, args)
}

fn build_action(verb: &str, args: Vec<Arg>) -> Result<Action, ScriptError> {
    let spec = verb_spec(verb).ok_or_else(|| ScriptError::UnknownVerb(verb.to_string()))?;
    if args.len() != spec.params.len() {
        return Err(ScriptError::Arity {
            verb: spec.name,
            expected: spec.params.len(),
            got: args.len(),
        });
    }

    let mut args = args.into_iter();
    let mut next = || args.next().ok_or(ScriptError::Arity {
        verb: spec.name,
        expected: spec.params.len(),
        got: 0,
    });

    let action = match spec.name {
        "chat" => Action::Chat { message: scalar_text(next()?) },
        "dig" => Action::Dig { target: name_arg(spec, next()?)? },
        "place" => Action::Place { block: name_arg(spec, next()?)? },
        "goto" => Action::Goto {
            x: number_arg(spec, next()?)?,
            y: number_arg(spec, next()?)?,
            z: number_arg(spec, next()?)?,
        },
        "follow" => Action::Follow { player: name_arg(spec, next()?)? },
        "attack" => Action::Attack { target: name_arg(spec, next()?)? },
        "equip" => Action::Equip { item: name_arg(spec, next()?)? },
        "jump" => Action::Jump,
        "stop" => Action::Stop,
        "wait" => {
            let ms = number_arg(spec, next()?)?;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let ms = ms.clamp(0.0, MAX_WAIT_MS as f64) as u64;
            Action::Wait { ms }
        }
        other => return Err(ScriptError::UnknownVerb(other.to_string())),
    };
    Ok(action)
}

fn scalar_text(arg: Arg) -> String {
    match arg {
        Arg::Text(s) | Arg::Name(s) => s,
        Arg::Number(n) => n.to_string(),
        Arg::Bool(b) => b.to_string(),
    }
}

fn name_arg(spec: &VerbSpec, arg: Arg) -> Result<String, ScriptError> {
    match arg {
        Arg::Text(s) | Arg::Name(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(ScriptError::InvalidArgument {
            verb: spec.name,
            message: format!(
                "expected a name for '{}'",
                spec.params.first().copied().unwrap_or("arg")
            ),
        }),
    }
}

fn number_arg(spec: &VerbSpec, arg: Arg) -> Result<f64, ScriptError> {
    match arg {
        Arg::Number(n) if n.is_finite() => Ok(n),
        _ => Err(ScriptError::InvalidArgument {
            verb: spec.name,
            message: "expected a number".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_call_with_bare_name() {
        let script = Script::parse("bot.dig(block)").expect("parse");
        assert_eq!(script.actions, vec![Action::Dig { target: "block".into() }]);
    }

    #[test]
    fn chat_accepts_any_scalar() {
        let script = Script::parse("bot.chat(1)").expect("parse");
        assert_eq!(script.actions, vec![Action::Chat { message: "1".into() }]);

        let script = Script::parse(r#"bot.chat("it's \"fine\"")"#).expect("parse");
        assert_eq!(script.actions, vec![Action::Chat { message: "it's \"fine\"".into() }]);
    }

    #[test]
    fn multiple_statements_and_separators() {
        let code = "await bot.chat('on my way');\nbot.goto(12, 64.5, -30)\n\
                    // then dig\nbot.dig(minecraft:stone);";
        let script = Script::parse(code).expect("parse");
        assert_eq!(
            script.actions,
            vec![
                Action::Chat { message: "on my way".into() },
                Action::Goto { x: 12.0, y: 64.5, z: -30.0 },
                Action::Dig { target: "minecraft:stone".into() },
            ]
        );
    }

    #[test]
    fn no_arg_verbs() {
        let script = Script::parse("bot.jump(); bot.stop()").expect("ok");
        assert_eq!(script.actions, vec![Action::Jump, Action::Stop]);
    }

    #[test]
    fn wait_is_clamped() {
        let script = Script::parse("bot.wait(99999); bot.wait(-5)").expect("ok");
        assert_eq!(
            script.actions,
            vec![Action::Wait { ms: MAX_WAIT_MS }, Action::Wait { ms: 0 }]
        );
    }

    #[test]
    fn unknown_verb_is_refused() {
        assert_eq!(
            Script::parse("bot.teleport(0, 0, 0)"),
            Err(ScriptError::UnknownVerb("teleport".into()))
        );
    }

    #[test]
    fn other_receivers_are_refused() {
        assert!(matches!(
            Script::parse("process.kill(1)"),
            Err(ScriptError::Syntax { statement: 1, .. })
        ));
        assert!(matches!(
            Script::parse("while (true) {}"),
            Err(ScriptError::Syntax { .. })
        ));
    }

    #[test]
    fn arity_and_types_are_checked() {
        assert_eq!(
            Script::parse("bot.goto(1, 2)"),
            Err(ScriptError::Arity { verb: "goto", expected: 3, got: 2 })
        );
        assert!(matches!(
            Script::parse("bot.goto(a, 2, 3)"),
            Err(ScriptError::InvalidArgument { verb: "goto", .. })
        ));
        assert!(matches!(
            Script::parse("bot.dig(5)"),
            Err(ScriptError::InvalidArgument { verb: "dig", .. })
        ));
    }

    #[test]
    fn later_error_rejects_whole_script() {
        let err = Script::parse("bot.jump()\nbot.jump()\nbot.fly()").unwrap_err();
        assert_eq!(err, ScriptError::UnknownVerb("fly".into()));
    }

    #[test]
    fn syntax_errors_report_statement() {
        let err = Script::parse("bot.jump(); bot.chat('oops)").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { statement: 2, .. }));

        let err = Script::parse("bot.jump(); bot.jump() bot.jump()").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { statement: 2, .. }));
    }

    #[test]
    fn empty_and_oversized_scripts() {
        assert_eq!(Script::parse(" ;\n; "), Err(ScriptError::Empty));
        let long = "bot.jump();".repeat(MAX_STATEMENTS + 2);
        assert_eq!(Script::parse(&long), Err(ScriptError::TooLong(MAX_STATEMENTS + 2)));
        let exact = "bot.jump();".repeat(MAX_STATEMENTS);
        assert_eq!(Script::parse(&exact).expect("parse").len(), MAX_STATEMENTS);
    }

    #[test]
    fn actions_serialize_with_op_tag() {
        let json = serde_json::to_value(Action::Dig { target: "stone".into() }).expect("ok");
        assert_eq!(json, serde_json::json!({"op": "dig", "target": "stone"}));
        let json = serde_json::to_value(Action::Jump).expect("ok");
        assert_eq!(json, serde_json::json!({"op": "jump"}));
    }

    #[test]
    fn vocabulary_matches_action_verbs() {
        for spec in VOCABULARY {
            assert!(verb_spec(spec.name).is_some());
        }
        assert_eq!(Action::Wait { ms: 1 }.verb(), "wait");
        assert_eq!(Action::Jump.to_string(), "bot.jump()");
    }
}
