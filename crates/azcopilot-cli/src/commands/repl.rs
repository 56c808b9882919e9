//! Interactive mode: `azcopilot --interactive`.
//!
//! Reads one command per line. Missing slots are asked for one at a time and
//! every action that needs confirmation gets a `[y/N]` prompt. `exit`, `quit`
//! or end of input leave the loop.

use super::render::{describe_action, write_report, write_unresolved};
use super::session::{Prepared, Report, Session};
use anyhow::Result;
use azcopilot_core::{PlannedAction, Slots};
use azcopilot_intent::describe_slot;
use azcopilot_runtime::{AzureOperationsPort, CancelFlag, Confirmations};
use std::collections::BTreeSet;
use std::io::{BufRead, Write};

const PROMPT: &str = "azcopilot> ";

pub async fn run_repl<B: AzureOperationsPort>(
    session: &Session<B>,
    confirm_all: bool,
    json: bool,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "Azure Copilot interactive mode. Type 'help' for commands, 'exit' to quit.")?;

    loop {
        let Some(line) = prompt(input, out, PROMPT)? else {
            break;
        };
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if command.eq_ignore_ascii_case("exit") || command.eq_ignore_ascii_case("quit") {
            break;
        }

        writeln!(out, "You said: {command}")?;
        let report = match prepare_interactively(session, command, input, out)? {
            Step::Done(report) => report,
            Step::Abandoned => continue,
            Step::Eof => break,
            Step::Planned(actions) => {
                let confirmations = if confirm_all {
                    Confirmations::All
                } else {
                    let Some(confirmed) = ask_confirmations(&actions, input, out)? else {
                        break;
                    };
                    Confirmations::Only(confirmed)
                };
                let results = session
                    .execute(&actions, &confirmations, &CancelFlag::new())
                    .await;
                Report::Executed(results)
            }
        };
        write_report(out, &report, json)?;
    }

    writeln!(out, "Goodbye.")?;
    Ok(())
}

enum Step {
    Done(Report),
    Planned(Vec<PlannedAction>),
    /// The operator left a required slot blank.
    Abandoned,
    Eof,
}

fn prepare_interactively<B: AzureOperationsPort>(
    session: &Session<B>,
    command: &str,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Step> {
    let intent = session.interpret(command);
    let mut answers = Slots::new();

    loop {
        match session.prepare(&intent, &answers) {
            Prepared::Help => return Ok(Step::Done(Report::Help)),
            Prepared::NotRecognized => return Ok(Step::Done(Report::NotRecognized)),
            Prepared::Planned(actions) => return Ok(Step::Planned(actions)),
            Prepared::Unresolved(err) => {
                for name in &err.missing {
                    let Some(answer) = prompt(input, out, &format!("{}: ", describe_slot(name)))?
                    else {
                        return Ok(Step::Eof);
                    };
                    let answer = answer.trim();
                    if answer.is_empty() {
                        write_unresolved(out, &err)?;
                        return Ok(Step::Abandoned);
                    }
                    answers.insert(name.clone(), answer.to_string());
                }
            }
        }
    }
}

/// Indices of the actions the operator confirmed, or `None` on end of input.
fn ask_confirmations(
    actions: &[PlannedAction],
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Option<BTreeSet<usize>>> {
    let mut confirmed = BTreeSet::new();
    for (index, action) in actions.iter().enumerate() {
        if !action.requires_confirmation {
            continue;
        }
        let question = format!("Proceed with {}? [y/N] ", describe_action(action));
        let Some(answer) = prompt(input, out, &question)? else {
            return Ok(None);
        };
        if matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            confirmed.insert(index);
        }
    }
    Ok(Some(confirmed))
}

/// Print `text` and read one line. `None` at end of input.
fn prompt(input: &mut impl BufRead, out: &mut impl Write, text: &str) -> Result<Option<String>> {
    write!(out, "{text}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}
