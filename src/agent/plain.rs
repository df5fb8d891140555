//! Plain-language post-filter for assistant replies
//!
//! The system instruction asks the model to avoid engine jargon; this makes it
//! hold for every returned reply by swapping each listed term for its plain
//! synonym.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Forbidden term (lowercase, any inflection listed) → plain replacement.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("nodes", "steps"),
    ("node", "step"),
    ("webhooks", "connections"),
    ("webhook", "connection"),
    ("apis", "connections"),
    ("api", "connection"),
    ("json", "data"),
    ("triggered", "started"),
    ("triggering", "starting"),
    ("triggers", "starts"),
    ("trigger", "start"),
    ("instances", "copies"),
    ("instance", "copy"),
    ("executions", "runs"),
    ("execution", "run"),
    ("executed", "ran"),
    ("executing", "running"),
    ("executes", "runs"),
    ("execute", "run"),
    ("payloads", "data"),
    ("payload", "data"),
    ("schemas", "layouts"),
    ("schema", "layout"),
];

static FORBIDDEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation: Vec<&str> = REPLACEMENTS.iter().map(|(term, _)| *term).collect();
    Regex::new(&format!(r"(?i)\b({})\b", alternation.join("|"))).expect("valid vocabulary regex")
});

/// True when `text` still contains any forbidden term.
pub fn contains_jargon(text: &str) -> bool {
    FORBIDDEN_RE.is_match(text)
}

fn starts_sentence(text: &str, at: usize) -> bool {
    text[..at]
        .trim_end()
        .chars()
        .last()
        .is_none_or(|c| matches!(c, '.' | '!' | '?' | '\n'))
}

/// True when the word ending just before `at` is "for" ("for instance").
fn after_for(text: &str, at: usize) -> bool {
    let before = text[..at].trim_end();
    before.len() >= 3
        && before.is_char_boundary(before.len() - 3)
        && before[before.len() - 3..].eq_ignore_ascii_case("for")
        && before[..before.len() - 3]
            .chars()
            .last()
            .is_none_or(|c| !c.is_alphanumeric())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replace every forbidden term in `text` with its plain synonym.
///
/// Capitalized words keep a capital; all-caps acronyms only keep one at the
/// start of a sentence.
pub fn plain_language(text: &str) -> String {
    FORBIDDEN_RE
        .replace_all(text, |caps: &Captures| {
            let Some(m) = caps.get(0) else {
                return String::new();
            };
            let word = m.as_str();
            let lower = word.to_lowercase();
            let replacement = if lower == "instance" && after_for(text, m.start()) {
                "example"
            } else {
                REPLACEMENTS
                    .iter()
                    .find(|(term, _)| *term == lower)
                    .map(|(_, plain)| *plain)
                    .unwrap_or("")
            };

            let first_upper = word.chars().next().is_some_and(char::is_uppercase);
            let all_upper = word.chars().all(|c| !c.is_lowercase());
            if first_upper && (!all_upper || word.len() == 1 || starts_sentence(text, m.start())) {
                capitalize(replacement)
            } else {
                replacement.to_string()
            }
        })
        .into_owned()
}
