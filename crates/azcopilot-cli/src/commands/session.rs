//! One interpreter session: classifier, planner and dispatcher sharing a
//! configuration snapshot.

use azcopilot_core::{Configuration, ExecutionResult, Intent, IntentKind, PlannedAction, Slots};
use azcopilot_intent::{IntentClassifier, KeywordClassifier, UnresolvedSlotError, resolve_with_answers};
use azcopilot_planner::{DefaultPlanner, PlanOverrides, Planner};
use azcopilot_runtime::{
    AuditSink, AzureOperationsPort, CancelFlag, Confirmations, Dispatcher, TracingAuditSink,
};

/// What a command turned into before anything was executed.
#[derive(Debug)]
pub enum Prepared {
    Help,
    NotRecognized,
    Unresolved(UnresolvedSlotError),
    Planned(Vec<PlannedAction>),
}

/// Final outcome of one command, ready to render.
#[derive(Debug)]
pub enum Report {
    Help,
    NotRecognized,
    Unresolved(UnresolvedSlotError),
    Executed(Vec<ExecutionResult>),
}

pub struct Session<B: AzureOperationsPort, S: AuditSink = TracingAuditSink> {
    config: Configuration,
    classifier: KeywordClassifier,
    planner: DefaultPlanner,
    dispatcher: Dispatcher<B, S>,
    overrides: PlanOverrides,
}

impl<B: AzureOperationsPort> Session<B, TracingAuditSink> {
    pub fn new(config: Configuration, backend: B, overrides: PlanOverrides) -> Self {
        Self::with_audit(config, backend, TracingAuditSink, overrides)
    }
}

impl<B: AzureOperationsPort, S: AuditSink> Session<B, S> {
    pub fn with_audit(config: Configuration, backend: B, audit: S, overrides: PlanOverrides) -> Self {
        Self {
            config,
            classifier: KeywordClassifier,
            planner: DefaultPlanner,
            dispatcher: Dispatcher::new(backend, audit),
            overrides,
        }
    }

    pub fn backend(&self) -> &B {
        self.dispatcher.backend()
    }

    pub fn interpret(&self, text: &str) -> Intent {
        self.classifier.classify(text)
    }

    /// Resolve and plan, with `answers` filling slots the text left empty.
    pub fn prepare(&self, intent: &Intent, answers: &Slots) -> Prepared {
        match intent.kind() {
            IntentKind::Help => return Prepared::Help,
            IntentKind::Unknown => return Prepared::NotRecognized,
            _ => {}
        }

        match resolve_with_answers(intent, &self.config, answers) {
            Ok(resolved) => {
                Prepared::Planned(self.planner.plan(&resolved, &self.config, self.overrides))
            }
            Err(err) => Prepared::Unresolved(err),
        }
    }

    pub async fn execute(
        &self,
        actions: &[PlannedAction],
        confirmations: &Confirmations,
        cancel: &CancelFlag,
    ) -> Vec<ExecutionResult> {
        self.dispatcher
            .execute_until_cancelled(actions, confirmations, cancel)
            .await
    }

    /// Run a command end to end without prompting.
    pub async fn run(
        &self,
        text: &str,
        confirmations: &Confirmations,
        cancel: &CancelFlag,
    ) -> Report {
        let intent = self.interpret(text);
        match self.prepare(&intent, &Slots::new()) {
            Prepared::Help => Report::Help,
            Prepared::NotRecognized => Report::NotRecognized,
            Prepared::Unresolved(err) => Report::Unresolved(err),
            Prepared::Planned(actions) => {
                Report::Executed(self.execute(&actions, confirmations, cancel).await)
            }
        }
    }
}
