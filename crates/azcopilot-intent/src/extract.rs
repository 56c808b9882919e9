//! Slot extraction from free text.
//!
//! Pulls resource type, name, location, resource group and ARM id out of a
//! command. Extraction is best-effort: anything it cannot find is simply
//! absent, and the resolver decides whether that matters.

use azcopilot_core::{IntentKind, RESOURCE_GROUP_TYPE, Slots, slot};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Spoken phrase to ARM resource type. Longer phrases come first.
pub const RESOURCE_TYPES: &[(&str, &str)] = &[
    ("storage account", "Microsoft.Storage/storageAccounts"),
    ("virtual machine", "Microsoft.Compute/virtualMachines"),
    ("virtual network", "Microsoft.Network/virtualNetworks"),
    ("resource group", RESOURCE_GROUP_TYPE),
    ("app service", "Microsoft.Web/sites"),
    ("key vault", "Microsoft.KeyVault/vaults"),
    ("web app", "Microsoft.Web/sites"),
    ("storage", "Microsoft.Storage/storageAccounts"),
    ("vnet", "Microsoft.Network/virtualNetworks"),
    ("vm", "Microsoft.Compute/virtualMachines"),
];

/// Region names as the ARM API spells them.
pub const KNOWN_REGIONS: &[&str] = &[
    "eastus",
    "eastus2",
    "westus",
    "westus2",
    "westus3",
    "centralus",
    "northcentralus",
    "southcentralus",
    "westcentralus",
    "canadacentral",
    "canadaeast",
    "brazilsouth",
    "northeurope",
    "westeurope",
    "uksouth",
    "ukwest",
    "francecentral",
    "germanywestcentral",
    "switzerlandnorth",
    "norwayeast",
    "swedencentral",
    "italynorth",
    "polandcentral",
    "uaenorth",
    "southafricanorth",
    "centralindia",
    "southindia",
    "westindia",
    "eastasia",
    "southeastasia",
    "japaneast",
    "japanwest",
    "koreacentral",
    "australiaeast",
    "australiasoutheast",
];

/// Words that can follow a keyword without being its value.
const CONNECTIVES: &[&str] = &[
    "a", "an", "the", "named", "called", "in", "at", "on", "to", "for", "with", "and", "location",
    "region", "please",
];

const MAX_REGION_WORDS: usize = 3;

static RESOURCE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"/subscriptions/[^\s'"`]+"#).expect("valid resource id regex"));

static GROUP_IN_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/resourceGroups/([^/]+)").expect("valid group regex"));

static NAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:named|called)\s+['"`]?([A-Za-z0-9][A-Za-z0-9._-]*)"#)
        .expect("valid name regex")
});

static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"`]([A-Za-z0-9][A-Za-z0-9._-]*)['"`]"#).expect("valid quoted regex")
});

static RESOURCE_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:resource[\s-]*groups?|rg|group)\s+['"`]?([A-Za-z0-9][A-Za-z0-9._()-]*)"#)
        .expect("valid resource group regex")
});

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:location|region)\s+['"`]?([A-Za-z0-9]+)"#).expect("valid location regex")
});

static TYPE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    RESOURCE_TYPES
        .iter()
        .map(|(phrase, arm_type)| {
            let words = phrase.split(' ').map(regex::escape).collect::<Vec<_>>();
            let pattern = format!(r"(?i)\b{}s?\b", words.join(r"\s+"));
            (Regex::new(&pattern).expect("valid resource type regex"), *arm_type)
        })
        .collect()
});

/// Extract every slot that can be found in `text`.
pub fn extract_slots(kind: IntentKind, text: &str) -> Slots {
    let mut slots = Slots::new();

    // Pull the ARM id out first so its path segments are not mistaken for words.
    let mut remaining = text.to_string();
    let mut id_name = None;
    if let Some(found) = RESOURCE_ID.find(text) {
        let id = found.as_str().trim_end_matches(['.', ',']).to_string();
        if let Some(caps) = GROUP_IN_ID.captures(&id) {
            slots.insert(slot::RESOURCE_GROUP.to_string(), caps[1].to_string());
        }
        id_name = id.rsplit('/').find(|s| !s.is_empty()).map(str::to_string);
        slots.insert(slot::RESOURCE_ID.to_string(), id);
        remaining.replace_range(found.range(), " ");
    }
    let text = remaining.as_str();

    let group_span = extract_resource_group(text, &mut slots);

    if let Some(resource_type) = find_resource_type(text, group_span.as_ref()) {
        slots.insert(slot::RESOURCE_TYPE.to_string(), resource_type.to_string());
    }

    if let Some(name) = find_name(text).or(id_name) {
        slots.insert(slot::NAME.to_string(), name);
    }

    if let Some(location) = find_location(text) {
        slots.insert(slot::LOCATION.to_string(), location);
    }

    // "create resource group rg1": the group being named is the resource itself.
    if matches!(kind, IntentKind::CreateResource | IntentKind::DeleteResource)
        && !slots.contains_key(slot::RESOURCE_TYPE)
        && !slots.contains_key(slot::NAME)
    {
        if let Some(group) = slots.remove(slot::RESOURCE_GROUP) {
            slots.insert(slot::RESOURCE_TYPE.to_string(), RESOURCE_GROUP_TYPE.to_string());
            slots.insert(slot::NAME.to_string(), group);
        }
    }

    slots
}

/// Records the resource group, returning the span of text it consumed.
fn extract_resource_group(text: &str, slots: &mut Slots) -> Option<Range<usize>> {
    for caps in RESOURCE_GROUP.captures_iter(text) {
        let value = clean_value(&caps[1]);
        if is_connective(&value) {
            continue;
        }
        slots
            .entry(slot::RESOURCE_GROUP.to_string())
            .or_insert(value);
        return caps.get(0).map(|whole| whole.range());
    }
    None
}

/// Earliest resource type mention outside the resource group phrase.
fn find_resource_type(text: &str, group_span: Option<&Range<usize>>) -> Option<&'static str> {
    let mut best: Option<(usize, &'static str)> = None;
    for (pattern, arm_type) in TYPE_PATTERNS.iter() {
        let hit = pattern
            .find_iter(text)
            .find(|m| !group_span.is_some_and(|span| span.contains(&m.start())));
        if let Some(m) = hit {
            if best.is_none_or(|(start, _)| m.start() < start) {
                best = Some((m.start(), arm_type));
            }
        }
    }
    best.map(|(_, arm_type)| arm_type)
}

fn find_name(text: &str) -> Option<String> {
    NAMED
        .captures_iter(text)
        .map(|caps| clean_value(&caps[1]))
        .find(|value| !is_connective(value))
        .or_else(|| QUOTED.captures(text).map(|caps| clean_value(&caps[1])))
}

fn find_location(text: &str) -> Option<String> {
    LOCATION
        .captures_iter(text)
        .map(|caps| caps[1].to_ascii_lowercase())
        .find(|value| !is_connective(value))
        .or_else(|| find_region(text))
}

/// A known region written as one to three words ("east us 2" is `eastus2`).
fn find_region(text: &str) -> Option<String> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();

    for start in 0..words.len() {
        for width in (1..=MAX_REGION_WORDS).rev() {
            let Some(run) = words.get(start..start + width) else {
                continue;
            };
            let joined = run.concat();
            if KNOWN_REGIONS.contains(&joined.as_str()) {
                return Some(joined);
            }
        }
    }
    None
}

fn clean_value(raw: &str) -> String {
    raw.trim_end_matches('.').to_string()
}

fn is_connective(value: &str) -> bool {
    CONNECTIVES.contains(&value.to_ascii_lowercase().as_str())
}
