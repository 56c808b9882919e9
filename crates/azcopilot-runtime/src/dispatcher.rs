//! Execution dispatcher.
//!
//! Runs a batch of planned actions strictly in order. Each action moves
//! from planned to exactly one of `SKIPPED`, `SUCCESS` or `FAILED`:
//!
//! 1. needs confirmation and was not confirmed: `SKIPPED` ("confirmation required")
//! 2. dry run: `SUCCESS` ("dry run: no changes made"), backend untouched
//! 3. otherwise the backend is called; its errors become `FAILED` with the
//!    backend message as the detail
//!
//! Batches are best-effort: a failed action does not stop the ones after
//! it. Nothing is retried here.

use crate::audit::{AuditEvent, AuditSink, TracingAuditSink};
use crate::port::{AzureOperationsPort, CreateResourceParams, ResourceFilter};
use azcopilot_core::{ExecutionResult, Operation, PlannedAction, slot};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const CONFIRMATION_REQUIRED: &str = "confirmation required";
pub const DRY_RUN_DETAIL: &str = "dry run: no changes made";
pub const CANCELLED_DETAIL: &str = "cancelled";

/// Which actions of a batch the operator has confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Confirmations {
    #[default]
    None,
    All,
    /// Indices into the action batch.
    Only(BTreeSet<usize>),
}

impl Confirmations {
    pub fn is_confirmed(&self, index: usize) -> bool {
        match self {
            Confirmations::None => false,
            Confirmations::All => true,
            Confirmations::Only(indices) => indices.contains(&index),
        }
    }
}

/// Signals that no further actions should be started.
///
/// Checked between actions only; a backend call already in flight runs to
/// completion.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Dispatcher<B: AzureOperationsPort, S: AuditSink = TracingAuditSink> {
    backend: B,
    audit: S,
}

impl<B: AzureOperationsPort, S: AuditSink> Dispatcher<B, S> {
    pub fn new(backend: B, audit: S) -> Self {
        Self { backend, audit }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn audit(&self) -> &S {
        &self.audit
    }

    /// Execute every action in order and report one result per action.
    pub async fn execute(
        &self,
        actions: &[PlannedAction],
        confirmations: &Confirmations,
    ) -> Vec<ExecutionResult> {
        self.execute_until_cancelled(actions, confirmations, &CancelFlag::new())
            .await
    }

    /// Like [`Dispatcher::execute`], but once `cancel` is set every action not
    /// yet started is `SKIPPED` with detail "cancelled".
    pub async fn execute_until_cancelled(
        &self,
        actions: &[PlannedAction],
        confirmations: &Confirmations,
        cancel: &CancelFlag,
    ) -> Vec<ExecutionResult> {
        let mut results = Vec::with_capacity(actions.len());

        for (index, action) in actions.iter().enumerate() {
            let result = if cancel.is_cancelled() {
                ExecutionResult::skipped(action.clone(), CANCELLED_DETAIL)
            } else {
                self.execute_one(index, action, confirmations).await
            };

            self.audit.record(AuditEvent::from_result(index, &result));
            results.push(result);
        }

        results
    }

    async fn execute_one(
        &self,
        index: usize,
        action: &PlannedAction,
        confirmations: &Confirmations,
    ) -> ExecutionResult {
        if action.requires_confirmation && !confirmations.is_confirmed(index) {
            return ExecutionResult::skipped(action.clone(), CONFIRMATION_REQUIRED);
        }
        if action.is_dry_run {
            return ExecutionResult::success(action.clone(), DRY_RUN_DETAIL);
        }

        match action.operation {
            Operation::ListResources => self.list(action).await,
            Operation::CreateResource => self.create(action).await,
            Operation::DeleteResource => self.delete(action).await,
        }
    }

    async fn list(&self, action: &PlannedAction) -> ExecutionResult {
        let filter = ResourceFilter::from_parameters(&action.parameters);
        match self.backend.list_resources(&filter).await {
            Ok(resources) => {
                ExecutionResult::success(action.clone(), found_detail(resources.len()))
                    .with_resources(resources)
            }
            Err(err) => ExecutionResult::failed(action.clone(), err.message),
        }
    }

    async fn create(&self, action: &PlannedAction) -> ExecutionResult {
        let params = match CreateResourceParams::from_parameters(&action.parameters) {
            Ok(params) => params,
            Err(missing) => {
                return ExecutionResult::failed(
                    action.clone(),
                    format!("missing parameter '{missing}'"),
                );
            }
        };

        match self.backend.create_resource(&params).await {
            Ok(created) => ExecutionResult::success(
                action.clone(),
                format!(
                    "created {} '{}' ({})",
                    created.resource_type, created.name, created.id
                ),
            )
            .with_resources(vec![created]),
            Err(err) => ExecutionResult::failed(action.clone(), err.message),
        }
    }

    async fn delete(&self, action: &PlannedAction) -> ExecutionResult {
        let id = match self.delete_target(action).await {
            Ok(id) => id,
            Err(detail) => return ExecutionResult::failed(action.clone(), detail),
        };

        match self.backend.delete_resource(&id).await {
            Ok(()) => ExecutionResult::success(action.clone(), format!("deleted {id}")),
            Err(err) => ExecutionResult::failed(action.clone(), err.message),
        }
    }

    /// The id to delete: given directly, or the single resource matching the
    /// name (narrowed by group and type when known).
    async fn delete_target(&self, action: &PlannedAction) -> Result<String, String> {
        if let Some(id) = action.param(slot::RESOURCE_ID) {
            return Ok(id.to_string());
        }
        let name = action
            .param(slot::NAME)
            .ok_or_else(|| format!("missing parameter '{}'", slot::NAME))?;

        let filter = ResourceFilter::from_parameters(&action.parameters);
        let candidates: Vec<_> = self
            .backend
            .list_resources(&filter)
            .await
            .map_err(|err| err.message)?
            .into_iter()
            .filter(|r| r.name.eq_ignore_ascii_case(name))
            .collect();

        match candidates.as_slice() {
            [] => Err(format!("no resource named '{name}' found")),
            [only] => Ok(only.id.clone()),
            many => Err(format!(
                "'{name}' is ambiguous: {} resources match ({}); name a resource group or type",
                many.len(),
                many.iter()
                    .map(|r| r.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

fn found_detail(count: usize) -> String {
    if count == 1 {
        "1 resource found".to_string()
    } else {
        format!("{count} resources found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RecordingAuditSink;
    use crate::memory::InMemoryBackend;
    use azcopilot_core::{ExecutionStatus, ResourceDescriptor, Slots};

    fn resource(group: &str, resource_type: &str, name: &str) -> ResourceDescriptor {
        ResourceDescriptor {
            id: azcopilot_core::arm_resource_id("sub", group, resource_type, name),
            name: name.into(),
            resource_type: resource_type.into(),
            location: "eastus".into(),
            resource_group: group.into(),
            tags: Default::default(),
        }
    }

    fn delete_action(pairs: &[(&str, &str)]) -> PlannedAction {
        let parameters: Slots = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PlannedAction::new(Operation::DeleteResource, parameters, true, false)
    }

    #[tokio::test]
    async fn list_reports_count_and_resources() {
        let backend = InMemoryBackend::with_resources(
            "sub",
            vec![
                resource("prod", "Microsoft.Web/sites", "shop"),
                resource("prod", "Microsoft.Sql/servers", "db"),
            ],
        );
        let dispatcher = Dispatcher::new(backend, RecordingAuditSink::new());
        let action = PlannedAction::new(Operation::ListResources, Slots::new(), false, false);

        let results = dispatcher.execute(&[action], &Confirmations::None).await;

        assert_eq!(results[0].status, ExecutionStatus::Success);
        assert_eq!(results[0].detail, "2 resources found");
        assert_eq!(results[0].resources.len(), 2);
        assert_eq!(dispatcher.audit().events().len(), 1);
    }

    #[tokio::test]
    async fn dry_run_leaves_backend_untouched() {
        let dispatcher = Dispatcher::new(InMemoryBackend::new("sub"), RecordingAuditSink::new());
        let mut parameters = Slots::new();
        parameters.insert(slot::RESOURCE_TYPE.into(), "Microsoft.Web/sites".into());
        parameters.insert(slot::NAME.into(), "shop".into());
        parameters.insert(slot::LOCATION.into(), "eastus".into());
        parameters.insert(slot::RESOURCE_GROUP.into(), "prod".into());
        let action = PlannedAction::new(Operation::CreateResource, parameters, false, true);

        let results = dispatcher.execute(&[action], &Confirmations::All).await;

        assert_eq!(results[0].status, ExecutionStatus::Success);
        assert_eq!(results[0].detail, DRY_RUN_DETAIL);
        assert!(dispatcher.backend().is_empty());
    }

    #[tokio::test]
    async fn unconfirmed_dry_run_is_still_skipped() {
        let dispatcher = Dispatcher::new(InMemoryBackend::new("sub"), RecordingAuditSink::new());
        let action = PlannedAction::new(Operation::DeleteResource, Slots::new(), false, true);

        let results = dispatcher.execute(&[action], &Confirmations::None).await;
        assert_eq!(results[0].status, ExecutionStatus::Skipped);
        assert_eq!(results[0].detail, CONFIRMATION_REQUIRED);
    }

    #[tokio::test]
    async fn confirmations_can_target_single_actions() {
        let dispatcher = Dispatcher::new(
            InMemoryBackend::with_resources("sub", vec![resource("prod", "Microsoft.Web/sites", "a")]),
            RecordingAuditSink::new(),
        );
        let mut first = delete_action(&[(slot::NAME, "a")]);
        first.requires_confirmation = true;
        let mut second = delete_action(&[(slot::NAME, "b")]);
        second.requires_confirmation = true;

        let confirmations = Confirmations::Only(BTreeSet::from([0]));
        let results = dispatcher.execute(&[first, second], &confirmations).await;

        assert_eq!(results[0].status, ExecutionStatus::Success);
        assert_eq!(results[1].status, ExecutionStatus::Skipped);
    }

    #[tokio::test]
    async fn delete_by_name_resolves_single_match() {
        let dispatcher = Dispatcher::new(
            InMemoryBackend::with_resources(
                "sub",
                vec![
                    resource("prod", "Microsoft.Web/sites", "shop"),
                    resource("prod", "Microsoft.Sql/servers", "db"),
                ],
            ),
            RecordingAuditSink::new(),
        );

        let results = dispatcher
            .execute(&[delete_action(&[(slot::NAME, "SHOP")])], &Confirmations::None)
            .await;

        assert_eq!(results[0].status, ExecutionStatus::Success);
        assert_eq!(
            results[0].detail,
            "deleted /subscriptions/sub/resourceGroups/prod/providers/Microsoft.Web/sites/shop"
        );
        assert_eq!(dispatcher.backend().len(), 1);
    }

    #[tokio::test]
    async fn delete_by_ambiguous_name_fails() {
        let dispatcher = Dispatcher::new(
            InMemoryBackend::with_resources(
                "sub",
                vec![
                    resource("prod", "Microsoft.Web/sites", "shop"),
                    resource("dev", "Microsoft.Web/sites", "shop"),
                ],
            ),
            RecordingAuditSink::new(),
        );

        let results = dispatcher
            .execute(&[delete_action(&[(slot::NAME, "shop")])], &Confirmations::None)
            .await;
        assert_eq!(results[0].status, ExecutionStatus::Failed);
        assert!(results[0].detail.starts_with("'shop' is ambiguous: 2 resources match"));

        let narrowed = dispatcher
            .execute(
                &[delete_action(&[(slot::NAME, "shop"), (slot::RESOURCE_GROUP, "dev")])],
                &Confirmations::None,
            )
            .await;
        assert_eq!(narrowed[0].status, ExecutionStatus::Success);
    }

    #[tokio::test]
    async fn create_without_required_parameter_fails() {
        let dispatcher = Dispatcher::new(InMemoryBackend::new("sub"), RecordingAuditSink::new());
        let action = PlannedAction::new(Operation::CreateResource, Slots::new(), true, false);

        let results = dispatcher.execute(&[action], &Confirmations::None).await;
        assert_eq!(results[0].status, ExecutionStatus::Failed);
        assert_eq!(results[0].detail, "missing parameter 'resource_type'");
    }

    #[tokio::test]
    async fn cancellation_skips_remaining_actions() {
        let dispatcher = Dispatcher::new(InMemoryBackend::new("sub"), RecordingAuditSink::new());
        let list = PlannedAction::new(Operation::ListResources, Slots::new(), false, false);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let results = dispatcher
            .execute_until_cancelled(&[list.clone(), list], &Confirmations::None, &cancel)
            .await;

        assert!(results.iter().all(|r| r.status == ExecutionStatus::Skipped));
        assert!(results.iter().all(|r| r.detail == CANCELLED_DETAIL));
    }

    #[test]
    fn found_detail_is_singular_for_one() {
        assert_eq!(found_detail(1), "1 resource found");
        assert_eq!(found_detail(0), "0 resources found");
    }
}
