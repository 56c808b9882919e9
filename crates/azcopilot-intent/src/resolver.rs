//! Slot resolution.
//!
//! Each required slot is filled from, in order:
//! 1. the value extracted from the command text (or supplied by the operator),
//! 2. the configuration default,
//!
//! and otherwise reported as missing. The resolver never guesses and never
//! prompts; prompting is up to the caller.

use crate::error::UnresolvedSlotError;
use azcopilot_core::{Configuration, Intent, ResolvedIntent, Slots, slot};

/// Resolve the required slots of `intent`.
pub fn resolve(intent: &Intent, config: &Configuration) -> Result<ResolvedIntent, UnresolvedSlotError> {
    resolve_with_answers(intent, config, &Slots::new())
}

/// Like [`resolve`], with extra operator-supplied values (e.g. answers to a
/// prompt for previously missing slots). Answers only fill slots the text
/// left empty.
pub fn resolve_with_answers(
    intent: &Intent,
    config: &Configuration,
    answers: &Slots,
) -> Result<ResolvedIntent, UnresolvedSlotError> {
    let kind = intent.kind();
    let mut slots = intent.slots().clone();

    for (name, value) in answers {
        if is_blank(slots.get(name)) && !value.trim().is_empty() {
            slots.insert(name.clone(), value.trim().to_string());
        }
    }

    let mut defaulted = Vec::new();
    for name in kind.required_slots() {
        if !is_blank(slots.get(*name)) {
            continue;
        }
        if let Some(value) = config_default(name, config) {
            slots.insert(name.to_string(), value.to_string());
            defaulted.push(*name);
        }
    }

    // Mutations land in the default group; listing is only filtered when asked.
    if kind.is_mutating() && is_blank(slots.get(slot::RESOURCE_GROUP)) {
        if let Some(group) = config_default(slot::RESOURCE_GROUP, config) {
            slots.insert(slot::RESOURCE_GROUP.to_string(), group.to_string());
            defaulted.push(slot::RESOURCE_GROUP);
        }
    }

    match ResolvedIntent::new(intent.clone(), slots) {
        Ok(resolved) => {
            tracing::debug!(%kind, ?defaulted, "resolved intent");
            Ok(resolved)
        }
        Err(missing) => {
            tracing::debug!(%kind, ?missing, "unresolved slots");
            Err(UnresolvedSlotError::new(kind, missing))
        }
    }
}

/// Human-readable prompt label for a slot.
pub fn describe_slot(name: &str) -> &'static str {
    match name {
        slot::RESOURCE_TYPE => "resource type (e.g. storage account, vm, key vault)",
        slot::NAME => "resource name",
        slot::LOCATION => "location (e.g. eastus, westeurope)",
        slot::RESOURCE_GROUP => "resource group",
        slot::RESOURCE_ID => "resource id (/subscriptions/...)",
        _ => "value",
    }
}

fn config_default<'a>(name: &str, config: &'a Configuration) -> Option<&'a str> {
    let value = match name {
        slot::LOCATION => config.default_location.as_str(),
        slot::RESOURCE_GROUP => config.default_resource_group.as_str(),
        _ => return None,
    };
    (!value.trim().is_empty()).then_some(value)
}

fn is_blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
