use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// Environment-backed configuration snapshot shared by every pipeline stage
pub mod config;

pub use config::{
    AuthMethod, ConfigError, ConfigValidationError, Configuration, LogLevel, OpenAiConfig,
};

/// Named parameters extracted from, or resolved for, a command.
///
/// Ordered so that planned actions and their printed form are deterministic.
pub type Slots = BTreeMap<String, String>;

/// Slot names understood by the classifier, resolver and planner.
pub mod slot {
    /// The unrecognized input, preserved verbatim.
    pub const RAW: &str = "raw";
    pub const RESOURCE_TYPE: &str = "resource_type";
    pub const NAME: &str = "name";
    pub const LOCATION: &str = "location";
    pub const RESOURCE_GROUP: &str = "resource_group";
    /// Fully qualified ARM id (`/subscriptions/...`).
    pub const RESOURCE_ID: &str = "resource_id";
}

/// What the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    ListResources,
    CreateResource,
    DeleteResource,
    Help,
    Unknown,
}

impl IntentKind {
    /// Slots that must be non-empty before an intent of this kind can be planned.
    pub fn required_slots(self) -> &'static [&'static str] {
        match self {
            IntentKind::CreateResource => &[slot::RESOURCE_TYPE, slot::NAME, slot::LOCATION],
            IntentKind::DeleteResource => &[slot::NAME],
            IntentKind::ListResources | IntentKind::Help | IntentKind::Unknown => &[],
        }
    }

    /// The backend operation this intent maps to, if any.
    pub fn operation(self) -> Option<Operation> {
        match self {
            IntentKind::ListResources => Some(Operation::ListResources),
            IntentKind::CreateResource => Some(Operation::CreateResource),
            IntentKind::DeleteResource => Some(Operation::DeleteResource),
            IntentKind::Help | IntentKind::Unknown => None,
        }
    }

    pub fn is_mutating(self) -> bool {
        self.operation().is_some_and(|op| !op.is_read_only())
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentKind::ListResources => write!(f, "LIST_RESOURCES"),
            IntentKind::CreateResource => write!(f, "CREATE_RESOURCE"),
            IntentKind::DeleteResource => write!(f, "DELETE_RESOURCE"),
            IntentKind::Help => write!(f, "HELP"),
            IntentKind::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Structured interpretation of one operator command.
///
/// Produced once per input line by the classifier and never modified
/// afterwards; fields are only readable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    kind: IntentKind,
    raw_text: String,
    slots: Slots,
}

impl Intent {
    pub fn new(kind: IntentKind, raw_text: impl Into<String>, slots: Slots) -> Self {
        Self {
            kind,
            raw_text: raw_text.into(),
            slots,
        }
    }

    /// An unrecognized command; the full text is kept in the `raw` slot.
    pub fn unknown(raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let mut slots = Slots::new();
        slots.insert(slot::RAW.to_string(), raw_text.clone());
        Self::new(IntentKind::Unknown, raw_text, slots)
    }

    pub fn kind(&self) -> IntentKind {
        self.kind
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(String::as_str)
    }
}

/// An intent whose required slots are all filled.
///
/// The only way to build one is [`ResolvedIntent::new`], which checks
/// every slot in [`IntentKind::required_slots`] is present and non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedIntent {
    intent: Intent,
    slots: Slots,
}

impl ResolvedIntent {
    /// Pair an intent with its resolved slots, or return the missing slot names.
    pub fn new(intent: Intent, slots: Slots) -> Result<Self, BTreeSet<String>> {
        let missing = missing_slots(intent.kind(), &slots);
        if missing.is_empty() {
            Ok(Self { intent, slots })
        } else {
            Err(missing)
        }
    }

    pub fn intent(&self) -> &Intent {
        &self.intent
    }

    pub fn kind(&self) -> IntentKind {
        self.intent.kind()
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(String::as_str)
    }
}

/// Required slots of `kind` that are absent or blank in `slots`.
pub fn missing_slots(kind: IntentKind, slots: &Slots) -> BTreeSet<String> {
    kind.required_slots()
        .iter()
        .filter(|name| slots.get(**name).is_none_or(|v| v.trim().is_empty()))
        .map(|name| name.to_string())
        .collect()
}

/// A backend operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    ListResources,
    CreateResource,
    DeleteResource,
}

impl Operation {
    pub fn is_read_only(self) -> bool {
        matches!(self, Operation::ListResources)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ListResources => write!(f, "LIST_RESOURCES"),
            Operation::CreateResource => write!(f, "CREATE_RESOURCE"),
            Operation::DeleteResource => write!(f, "DELETE_RESOURCE"),
        }
    }
}

/// A fully specified, not-yet-executed unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub operation: Operation,
    pub parameters: Slots,
    /// False only for read-only operations or when confirmations are skipped globally.
    pub requires_confirmation: bool,
    pub is_dry_run: bool,
}

impl PlannedAction {
    /// Build an action, deriving `requires_confirmation` from the operation
    /// and the global skip-confirmations setting.
    pub fn new(
        operation: Operation,
        parameters: Slots,
        skip_confirmations: bool,
        is_dry_run: bool,
    ) -> Self {
        Self {
            operation,
            parameters,
            requires_confirmation: !operation.is_read_only() && !skip_confirmations,
            is_dry_run,
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// Terminal state of a planned action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Success,
    Failed,
    Skipped,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Success => write!(f, "SUCCESS"),
            ExecutionStatus::Failed => write!(f, "FAILED"),
            ExecutionStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub action: PlannedAction,
    pub status: ExecutionStatus,
    pub detail: String,
    /// Descriptors returned by the backend (list and create only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceDescriptor>,
}

impl ExecutionResult {
    pub fn success(action: PlannedAction, detail: impl Into<String>) -> Self {
        Self::with_status(action, ExecutionStatus::Success, detail)
    }

    pub fn failed(action: PlannedAction, detail: impl Into<String>) -> Self {
        Self::with_status(action, ExecutionStatus::Failed, detail)
    }

    pub fn skipped(action: PlannedAction, detail: impl Into<String>) -> Self {
        Self::with_status(action, ExecutionStatus::Skipped, detail)
    }

    pub fn with_resources(mut self, resources: Vec<ResourceDescriptor>) -> Self {
        self.resources = resources;
        self
    }

    fn with_status(action: PlannedAction, status: ExecutionStatus, detail: impl Into<String>) -> Self {
        Self {
            action,
            status,
            detail: detail.into(),
            resources: Vec::new(),
        }
    }
}

/// An Azure resource as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub id: String,
    pub name: String,
    /// ARM provider type, e.g. `Microsoft.Storage/storageAccounts`.
    pub resource_type: String,
    pub location: String,
    #[serde(default)]
    pub resource_group: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

pub const RESOURCE_GROUP_TYPE: &str = "Microsoft.Resources/resourceGroups";

/// Azure Resource Manager id for a resource.
///
/// Resource groups live directly under the subscription; everything else
/// under `providers/` inside its group.
pub fn arm_resource_id(
    subscription_id: &str,
    resource_group: &str,
    resource_type: &str,
    name: &str,
) -> String {
    if resource_type.eq_ignore_ascii_case(RESOURCE_GROUP_TYPE) {
        format!("/subscriptions/{subscription_id}/resourceGroups/{name}")
    } else {
        format!(
            "/subscriptions/{subscription_id}/resourceGroups/{resource_group}/providers/{resource_type}/{name}"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_ids_nest_under_group_and_provider() {
        assert_eq!(
            arm_resource_id("sub", "prod", "Microsoft.Web/sites", "shop"),
            "/subscriptions/sub/resourceGroups/prod/providers/Microsoft.Web/sites/shop"
        );
        assert_eq!(
            arm_resource_id("sub", "", RESOURCE_GROUP_TYPE, "prod"),
            "/subscriptions/sub/resourceGroups/prod"
        );
    }

    fn slots(pairs: &[(&str, &str)]) -> Slots {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn unknown_intent_keeps_raw_text() {
        let intent = Intent::unknown("make me a sandwich");
        assert_eq!(intent.kind(), IntentKind::Unknown);
        assert_eq!(intent.slot(slot::RAW), Some("make me a sandwich"));
        assert_eq!(intent.raw_text(), "make me a sandwich");
    }

    #[test]
    fn resolved_intent_rejects_blank_required_slots() {
        let intent = Intent::new(IntentKind::CreateResource, "create", Slots::new());
        let missing = ResolvedIntent::new(
            intent,
            slots(&[("resource_type", "Microsoft.Web/sites"), ("name", "  ")]),
        )
        .unwrap_err();

        assert_eq!(
            missing.into_iter().collect::<Vec<_>>(),
            vec!["location".to_string(), "name".to_string()]
        );
    }

    #[test]
    fn list_intent_has_no_required_slots() {
        let intent = Intent::new(IntentKind::ListResources, "list resources", Slots::new());
        assert!(ResolvedIntent::new(intent, Slots::new()).is_ok());
    }

    #[test]
    fn read_only_actions_never_require_confirmation() {
        let list = PlannedAction::new(Operation::ListResources, Slots::new(), false, false);
        assert!(!list.requires_confirmation);

        let delete = PlannedAction::new(Operation::DeleteResource, Slots::new(), false, false);
        assert!(delete.requires_confirmation);

        let skipped = PlannedAction::new(Operation::DeleteResource, Slots::new(), true, false);
        assert!(!skipped.requires_confirmation);
    }

    #[test]
    fn kinds_serialize_in_screaming_snake_case() {
        let json = serde_json::to_string(&IntentKind::ListResources).unwrap();
        assert_eq!(json, "\"LIST_RESOURCES\"");
        assert_eq!(IntentKind::DeleteResource.to_string(), "DELETE_RESOURCE");
    }

    #[test]
    fn empty_resources_are_omitted_from_json() {
        let action = PlannedAction::new(Operation::ListResources, Slots::new(), false, false);
        let result = ExecutionResult::success(action, "0 resources found");
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("resources").is_none());
        assert_eq!(value["status"], "SUCCESS");
    }
}
