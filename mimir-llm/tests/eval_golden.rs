//! Prompt Quality Evaluation: Golden Test Set.
//!
//! Curated template/value pairs checking that rendered prompts carry the
//! character, the memory and the player's words, and that no marker leaks
//! through.
//!
//! Run with `cargo test -p mimir-llm --test eval_golden`. These checks are
//! offline; nothing here calls a model.

use mimir_llm::prompt::{self, PromptTemplate};

/// A golden test case for prompt rendering.
struct GoldenCase {
    /// Human-readable name for the test case.
    name: &'static str,
    /// Template text.
    template: &'static str,
    character: &'static str,
    memory: &'static str,
    message: &'static str,
    /// Strings that MUST appear in the rendered prompt.
    prompt_must_contain: Vec<&'static str>,
    /// Strings that MUST NOT appear in the rendered prompt.
    prompt_must_not_contain: Vec<&'static str>,
}

fn golden_cases() -> Vec<GoldenCase> {
    vec![
        // ---------------------------------------------------------------
        // 1. Built-in template, first conversation
        // ---------------------------------------------------------------
        GoldenCase {
            name: "builtin_first_contact",
            template: prompt::DEFAULT_TEMPLATE,
            character: "Grumli, a gruff dwarf who loves mining and hates water.",
            memory: "",
            message: "hey, can you mine some stone for me?",
            prompt_must_contain: vec![
                "Grumli",
                "hates water",
                prompt::MEMORY_EMPTY,
                "mine some stone",
                "\"code\"",
                "bot.dig(block)",
            ],
            prompt_must_not_contain: vec![
                prompt::CHARACTER_MARKER,
                prompt::MEMORY_MARKER,
                prompt::MESSAGE_MARKER,
            ],
        },
        // ---------------------------------------------------------------
        // 2. Built-in template with accumulated memory
        // ---------------------------------------------------------------
        GoldenCase {
            name: "builtin_with_memory",
            template: prompt::DEFAULT_TEMPLATE,
            character: "Pip, an eager apprentice builder.",
            memory: "player's base is at 120 64 -40\nplayer likes diamonds",
            message: "go back to my base",
            prompt_must_contain: vec![
                "Pip",
                "120 64 -40",
                "player likes diamonds",
                "go back to my base",
            ],
            prompt_must_not_contain: vec![
                prompt::MEMORY_EMPTY,
                prompt::MEMORY_MARKER,
            ],
        },
        // ---------------------------------------------------------------
        // 3. Custom operator template in another language
        // ---------------------------------------------------------------
        GoldenCase {
            name: "custom_template_non_english",
            template: "Характер: {{CHARACTER}}\nПамять: {{MEMORY}}\nИгрок: @@@\nОтветь JSON.",
            character: "Весёлый шахтёр",
            memory: "",
            message: "принеси дерево",
            prompt_must_contain: vec![
                "Весёлый шахтёр",
                "принеси дерево",
                prompt::MEMORY_EMPTY,
            ],
            prompt_must_not_contain: vec!["@@@", "{{"],
        },
        // ---------------------------------------------------------------
        // 4. Values are inserted verbatim, no escaping
        // ---------------------------------------------------------------
        GoldenCase {
            name: "no_escaping",
            template: "{{CHARACTER}} | {{MEMORY}} | @@@",
            character: "\"quoted\" <tag>",
            memory: "{json: true}",
            message: "say \"hi\"",
            prompt_must_contain: vec!["\"quoted\" <tag>", "{json: true}", "say \"hi\""],
            prompt_must_not_contain: vec!["\\\""],
        },
    ]
}

#[test]
fn golden_prompts_render_correctly() {
    for case in golden_cases() {
        let rendered = PromptTemplate::from_text(case.template).build(
            case.character,
            case.memory,
            case.message,
        );

        for needle in &case.prompt_must_contain {
            assert!(
                rendered.contains(needle),
                "[{}] rendered prompt is missing {needle:?}",
                case.name
            );
        }
        for needle in &case.prompt_must_not_contain {
            assert!(
                !rendered.contains(needle),
                "[{}] rendered prompt unexpectedly contains {needle:?}",
                case.name
            );
        }
    }
}

#[test]
fn template_file_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prompt.txt");
    std::fs::write(&path, "[{{CHARACTER}}] [{{MEMORY}}] [@@@]").expect("write template");

    let template = PromptTemplate::load(&path).expect("load template");
    assert_eq!(template.source(), Some(path.as_path()));
    assert_eq!(template.build("a", "b", "c"), "[a] [b] [c]");
}
