//! Keyword intent classifier.
//!
//! Rules are checked in a fixed priority order so that overlapping keywords
//! always resolve the same way:
//!
//! | Priority | Kind | Rule (case-insensitive) |
//! |---|---|---|
//! | 1 | `HELP` | contains `help` |
//! | 2 | `LIST_RESOURCES` | contains `list` and `resource` |
//! | 3 | `DELETE_RESOURCE` | a word in `delete`, `remove`, `destroy`, `drop` |
//! | 4 | `CREATE_RESOURCE` | a word in `create`, `provision`, `deploy`, `add` |
//! | 5 | `UNKNOWN` | anything else |
//!
//! So "help me list resources" is `HELP`, not `LIST_RESOURCES`.

use crate::extract::extract_slots;
use azcopilot_core::{Intent, IntentKind, Slots};

const DELETE_WORDS: &[&str] = &["delete", "remove", "destroy", "drop"];
const CREATE_WORDS: &[&str] = &["create", "provision", "deploy", "add"];

/// Maps operator text to an [`Intent`]. Must never fail.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Intent;
}

/// Baseline classifier driven by fixed keyword sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Intent {
        let kind = classify_kind(text);
        tracing::debug!(%kind, "classified command");

        match kind {
            IntentKind::Unknown => Intent::unknown(text),
            IntentKind::Help => Intent::new(kind, text, Slots::new()),
            _ => Intent::new(kind, text, extract_slots(kind, text)),
        }
    }
}

/// Classify with the default [`KeywordClassifier`].
pub fn classify(text: &str) -> Intent {
    KeywordClassifier.classify(text)
}

/// Pick the intent kind only, without extracting slots.
pub fn classify_kind(text: &str) -> IntentKind {
    let lower = text.to_lowercase();

    if lower.contains("help") {
        return IntentKind::Help;
    }
    if lower.contains("list") && lower.contains("resource") {
        return IntentKind::ListResources;
    }

    let has_word = |set: &[&str]| {
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| set.contains(&word))
    };
    if has_word(DELETE_WORDS) {
        return IntentKind::DeleteResource;
    }
    if has_word(CREATE_WORDS) {
        return IntentKind::CreateResource;
    }

    IntentKind::Unknown
}
