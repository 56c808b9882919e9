//! Error types for slot resolution.

use azcopilot_core::IntentKind;
use std::collections::BTreeSet;

/// Required slots could not be filled from the text or from configuration.
///
/// Recoverable: the caller may prompt for `missing` and resolve again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required slot(s) for {kind}: {}", join_names(.missing))]
pub struct UnresolvedSlotError {
    pub kind: IntentKind,
    pub missing: BTreeSet<String>,
}

impl UnresolvedSlotError {
    pub fn new(kind: IntentKind, missing: BTreeSet<String>) -> Self {
        Self { kind, missing }
    }
}

fn join_names(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
