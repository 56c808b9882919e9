//! One-shot mode: `azcopilot "<command>"`.

use super::render::write_report;
use super::session::Session;
use anyhow::{Context, Result};
use azcopilot_runtime::{AzureOperationsPort, CancelFlag, Confirmations};
use std::io::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Confirm every mutating action up front.
    pub yes: bool,
    pub json: bool,
}

/// Interpret one command, execute it and print the outcome.
pub async fn run_once<B: AzureOperationsPort>(
    session: &Session<B>,
    command: &str,
    options: RunOptions,
    out: &mut impl Write,
) -> Result<()> {
    if !options.json {
        writeln!(out, "You said: {command}")?;
    }

    let confirmations = if options.yes {
        Confirmations::All
    } else {
        Confirmations::None
    };
    let cancel = cancel_on_ctrl_c().await;

    let report = session.run(command, &confirmations, &cancel).await;
    write_report(out, &report, options.json).context("Failed to write output")?;
    Ok(())
}

/// A cancel flag that is set on the first Ctrl-C.
async fn cancel_on_ctrl_c() -> CancelFlag {
    cancel_when(tokio::signal::ctrl_c()).await
}

/// Spawn a watcher that sets the returned flag once `signal` completes.
///
/// Returns only after the watcher has been polled once, so the signal
/// handler is installed before any action runs on a current-thread runtime.
async fn cancel_when<F>(signal: F) -> CancelFlag
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if signal.await.is_ok() {
            tracing::warn!("interrupted; remaining actions will be skipped");
            flag.cancel();
        }
    });
    tokio::task::yield_now().await;
    cancel
}
