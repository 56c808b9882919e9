//! Text and JSON rendering of command outcomes.

use super::session::Report;
use azcopilot_core::{ExecutionResult, ExecutionStatus, PlannedAction, ResourceDescriptor};
use azcopilot_intent::{UnresolvedSlotError, describe_slot};
use serde::Serialize;
use std::io::{self, Write};

pub const HELP_TEXT: &str = "\
Available commands: list resources, create, delete, help

Examples:
  list resources
  list resources in resource group prod
  list resources of type storage account
  create a storage account named data01 in westeurope
  create a resource group named prod
  delete the vm named old-box in resource group prod
  delete /subscriptions/<sub>/resourceGroups/<rg>/providers/<type>/<name>";

pub const NOT_RECOGNIZED: &str = "Command not recognized";

pub fn write_report(out: &mut impl Write, report: &Report, json: bool) -> io::Result<()> {
    if json {
        return write_json(out, report);
    }
    match report {
        Report::Help => writeln!(out, "{HELP_TEXT}"),
        Report::NotRecognized => {
            writeln!(out, "{NOT_RECOGNIZED}")?;
            writeln!(out, "Type 'help' to see available commands.")
        }
        Report::Unresolved(err) => write_unresolved(out, err),
        Report::Executed(results) => write_results(out, results),
    }
}

pub fn write_unresolved(out: &mut impl Write, err: &UnresolvedSlotError) -> io::Result<()> {
    writeln!(out, "Missing required information for {}:", err.kind)?;
    for name in &err.missing {
        writeln!(out, "  - {name}: {}", describe_slot(name))?;
    }
    Ok(())
}

fn write_results(out: &mut impl Write, results: &[ExecutionResult]) -> io::Result<()> {
    if results.is_empty() {
        return writeln!(out, "Nothing to do.");
    }
    for result in results {
        let mark = match result.status {
            ExecutionStatus::Success => "✅",
            ExecutionStatus::Failed => "❌",
            ExecutionStatus::Skipped => "⏭️ ",
        };
        writeln!(
            out,
            "{mark} [{}] {}: {}",
            result.status, result.action.operation, result.detail
        )?;
        if result.action.operation.is_read_only() {
            write_resources(out, &result.resources)?;
        }
    }

    let unconfirmed = results
        .iter()
        .filter(|r| r.detail == azcopilot_runtime::dispatcher::CONFIRMATION_REQUIRED)
        .count();
    if unconfirmed > 0 {
        writeln!(out, "Nothing was changed. Confirm with --yes, or answer 'y' when prompted.")?;
    }
    Ok(())
}

fn write_resources(out: &mut impl Write, resources: &[ResourceDescriptor]) -> io::Result<()> {
    let name_width = resources.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let type_width = resources
        .iter()
        .map(|r| r.resource_type.len())
        .max()
        .unwrap_or(0);

    for r in resources {
        writeln!(
            out,
            "    {:<name_width$}  {:<type_width$}  {:<14}  {}",
            r.name, r.resource_type, r.location, r.resource_group
        )?;
    }
    Ok(())
}

/// One-line description of an action for confirmation prompts.
pub fn describe_action(action: &PlannedAction) -> String {
    let params = action
        .parameters
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mode = if action.is_dry_run { " (dry run)" } else { "" };
    format!("{} [{params}]{mode}", action.operation)
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum JsonReport<'a> {
    Help { text: &'static str },
    NotRecognized,
    Unresolved { intent: String, missing: Vec<&'a str> },
    Executed { results: &'a [ExecutionResult] },
}

fn write_json(out: &mut impl Write, report: &Report) -> io::Result<()> {
    let body = match report {
        Report::Help => JsonReport::Help { text: HELP_TEXT },
        Report::NotRecognized => JsonReport::NotRecognized,
        Report::Unresolved(err) => JsonReport::Unresolved {
            intent: err.kind.to_string(),
            missing: err.missing.iter().map(String::as_str).collect(),
        },
        Report::Executed(results) => JsonReport::Executed { results },
    };
    serde_json::to_writer_pretty(&mut *out, &body).map_err(io::Error::other)?;
    writeln!(out)
}
