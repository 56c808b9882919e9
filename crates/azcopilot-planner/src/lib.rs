use azcopilot_core::{
    Configuration, Operation, PlannedAction, ResolvedIntent, Slots, arm_resource_id, slot,
};

/// Per-call adjustments to the configured policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOverrides {
    /// Replaces `default_dry_run` for mutating actions when set.
    pub dry_run: Option<bool>,
}

/// Turns a resolved intent into executable actions.
///
/// Implementations must be pure: no I/O, same output for the same input.
pub trait Planner: Send + Sync {
    fn plan(
        &self,
        resolved: &ResolvedIntent,
        config: &Configuration,
        overrides: PlanOverrides,
    ) -> Vec<PlannedAction>;
}

/// Planner applying the configured confirmation and dry-run policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPlanner;

impl Planner for DefaultPlanner {
    fn plan(
        &self,
        resolved: &ResolvedIntent,
        config: &Configuration,
        overrides: PlanOverrides,
    ) -> Vec<PlannedAction> {
        plan(resolved, config, overrides)
    }
}

const LIST_PARAMETERS: &[&str] = &[slot::RESOURCE_GROUP, slot::RESOURCE_TYPE];
const CREATE_PARAMETERS: &[&str] = &[
    slot::RESOURCE_TYPE,
    slot::NAME,
    slot::LOCATION,
    slot::RESOURCE_GROUP,
];
const DELETE_PARAMETERS: &[&str] = &[
    slot::NAME,
    slot::RESOURCE_GROUP,
    slot::RESOURCE_TYPE,
    slot::RESOURCE_ID,
];

/// Plan a resolved intent.
///
/// - list: one action, never confirmed, never a dry run
/// - create/delete: one action, confirmed unless `skip_confirmations`,
///   dry run per override or `default_dry_run`
/// - help/unknown: nothing to do
pub fn plan(
    resolved: &ResolvedIntent,
    config: &Configuration,
    overrides: PlanOverrides,
) -> Vec<PlannedAction> {
    let Some(operation) = resolved.kind().operation() else {
        return Vec::new();
    };

    let mut parameters = parameters_for(operation, resolved.slots());
    if operation == Operation::DeleteResource && !parameters.contains_key(slot::RESOURCE_ID) {
        if let Some(id) = derive_resource_id(&parameters, config) {
            parameters.insert(slot::RESOURCE_ID.to_string(), id);
        }
    }

    let is_dry_run = if operation.is_read_only() {
        false
    } else {
        overrides.dry_run.unwrap_or(config.default_dry_run)
    };

    let action = PlannedAction::new(operation, parameters, config.skip_confirmations, is_dry_run);
    tracing::debug!(
        %operation,
        requires_confirmation = action.requires_confirmation,
        is_dry_run = action.is_dry_run,
        "planned action"
    );
    vec![action]
}

fn parameters_for(operation: Operation, slots: &Slots) -> Slots {
    let keys = match operation {
        Operation::ListResources => LIST_PARAMETERS,
        Operation::CreateResource => CREATE_PARAMETERS,
        Operation::DeleteResource => DELETE_PARAMETERS,
    };
    keys.iter()
        .filter_map(|key| {
            slots
                .get(*key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| (key.to_string(), v.clone()))
        })
        .collect()
}

/// A delete target can be addressed directly once its group and type are known.
fn derive_resource_id(parameters: &Slots, config: &Configuration) -> Option<String> {
    let name = parameters.get(slot::NAME)?;
    let resource_type = parameters.get(slot::RESOURCE_TYPE)?;
    let group = parameters.get(slot::RESOURCE_GROUP).map(String::as_str);

    let is_group = resource_type.eq_ignore_ascii_case(azcopilot_core::RESOURCE_GROUP_TYPE);
    if !is_group && group.is_none() {
        return None;
    }
    Some(arm_resource_id(
        &config.subscription_id,
        group.unwrap_or_default(),
        resource_type,
        name,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use azcopilot_core::config::vars;
    use azcopilot_intent::{classify, resolve};

    fn config(pairs: &[(&str, &str)]) -> Configuration {
        let mut all = vec![(vars::SUBSCRIPTION_ID, "sub-0001")];
        all.extend_from_slice(pairs);
        Configuration::from_lookup(|key| {
            all.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    fn plan_text(text: &str, config: &Configuration, overrides: PlanOverrides) -> Vec<PlannedAction> {
        let resolved = resolve(&classify(text), config).unwrap();
        DefaultPlanner.plan(&resolved, config, overrides)
    }

    #[test]
    fn list_yields_one_unconfirmed_action() {
        let cfg = config(&[(vars::DEFAULT_DRY_RUN, "true")]);
        let actions = plan_text("Please list my resources", &cfg, PlanOverrides::default());

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].operation, Operation::ListResources);
        assert!(!actions[0].requires_confirmation);
        assert!(!actions[0].is_dry_run);
    }

    #[test]
    fn list_carries_group_filter() {
        let actions = plan_text(
            "list resources in resource group prod",
            &config(&[]),
            PlanOverrides::default(),
        );
        assert_eq!(actions[0].param(slot::RESOURCE_GROUP), Some("prod"));
    }

    #[test]
    fn mutations_require_confirmation_by_default() {
        let actions = plan_text(
            "create a storage account named data01",
            &config(&[]),
            PlanOverrides::default(),
        );
        assert_eq!(actions.len(), 1);
        assert!(actions[0].requires_confirmation);
        assert!(!actions[0].is_dry_run);
        assert_eq!(actions[0].param(slot::LOCATION), Some("eastus"));
    }

    #[test]
    fn skip_confirmations_applies_to_mutations() {
        let cfg = config(&[(vars::SKIP_CONFIRMATIONS, "true")]);
        let actions = plan_text("delete the vm named old-box", &cfg, PlanOverrides::default());
        assert!(!actions[0].requires_confirmation);
    }

    #[test]
    fn dry_run_override_beats_default() {
        let cfg = config(&[(vars::DEFAULT_DRY_RUN, "true")]);
        let defaulted = plan_text("create a vm named a1", &cfg, PlanOverrides::default());
        assert!(defaulted[0].is_dry_run);

        let overridden = plan_text(
            "create a vm named a1",
            &cfg,
            PlanOverrides { dry_run: Some(false) },
        );
        assert!(!overridden[0].is_dry_run);
    }

    #[test]
    fn help_and_unknown_plan_nothing() {
        let cfg = config(&[]);
        assert!(plan_text("HELP", &cfg, PlanOverrides::default()).is_empty());
        assert!(plan_text("order a pizza", &cfg, PlanOverrides::default()).is_empty());
    }

    #[test]
    fn delete_derives_resource_id_when_addressable() {
        let cfg = config(&[(vars::DEFAULT_RESOURCE_GROUP, "ops")]);
        let actions = plan_text("delete the vm named old-box", &cfg, PlanOverrides::default());
        assert_eq!(
            actions[0].param(slot::RESOURCE_ID),
            Some("/subscriptions/sub-0001/resourceGroups/ops/providers/Microsoft.Compute/virtualMachines/old-box")
        );

        let no_type = plan_text("delete old-box named old-box", &cfg, PlanOverrides::default());
        assert_eq!(no_type[0].param(slot::RESOURCE_ID), None);
    }

    #[test]
    fn deleting_a_group_targets_the_group_id() {
        let cfg = config(&[(vars::DEFAULT_RESOURCE_GROUP, "ops")]);
        let actions = plan_text("delete resource group rg1", &cfg, PlanOverrides::default());

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].operation, Operation::DeleteResource);
        assert_eq!(actions[0].param(slot::NAME), Some("rg1"));
        assert_eq!(
            actions[0].param(slot::RESOURCE_ID),
            Some("/subscriptions/sub-0001/resourceGroups/rg1")
        );
    }

    #[test]
    fn planning_is_deterministic() {
        let cfg = config(&[]);
        let resolved = resolve(&classify("create a key vault named kv1 in uksouth"), &cfg).unwrap();
        let first = plan(&resolved, &cfg, PlanOverrides::default());
        let second = plan(&resolved, &cfg, PlanOverrides::default());
        assert_eq!(first, second);
    }
}
