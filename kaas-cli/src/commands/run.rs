//! Run and resume command handlers
//!
//! Both commands stream results through the terminal reporter until every
//! job is terminal. Ctrl-C cancels: unsubmitted tests are skipped and running
//! jobs stop being polled (they keep running on KaaS and can be resumed).

use std::sync::Arc;

use anyhow::{Result, bail};
use colored::*;
use kaas_client::KaasClient;
use kaas_core::domain::test::TestCase;
use kaas_runner::discovery::discover_workspace;
use kaas_runner::git::GitCli;
use kaas_runner::service::{RunHandle, RunOptions, RunSummary, TestRunService};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::Config;
use crate::reporter::ConsoleReporter;

pub async fn handle_run_command(
    ids: Vec<String>,
    allow_dirty: bool,
    combine: bool,
    config: &Config,
) -> Result<()> {
    let discovery = discover_workspace(&config.workspaces);
    let (leaves, unknown) = discovery.select(&ids);
    if !unknown.is_empty() {
        bail!("Unknown test id(s): {}", unknown.join(", "));
    }
    if leaves.is_empty() {
        println!("{}", "No runnable tests selected.".yellow());
        return Ok(());
    }
    let tests: Vec<TestCase> = leaves.into_iter().map(TestCase::from).collect();

    let service = service(config)?;
    println!("{}", format!("Running {} test(s) on KaaS", tests.len()).bold());

    let cancel = CancellationToken::new();
    let ctrl_c = cancel_on_ctrl_c(cancel.clone());
    let options = RunOptions {
        allow_dirty,
        combine_kontrol: combine,
    };
    let handle = service
        .run_tests(
            config.workspace(),
            tests,
            Arc::new(ConsoleReporter),
            cancel,
            options,
        )
        .await;

    finish(handle, ctrl_c).await
}

pub async fn handle_resume_command(config: &Config) -> Result<()> {
    let discovery = discover_workspace(&config.workspaces);
    let tests: Vec<TestCase> = discovery.leaves().into_iter().map(TestCase::from).collect();

    let service = service(config)?;
    let cancel = CancellationToken::new();
    let ctrl_c = cancel_on_ctrl_c(cancel.clone());
    let handle = service
        .resume(tests, Arc::new(ConsoleReporter), cancel)
        .await;

    if handle.pending_jobs() == 0 {
        ctrl_c.abort();
        println!("{}", "No jobs in flight.".yellow());
        return Ok(());
    }
    finish(handle, ctrl_c).await
}

fn service(config: &Config) -> Result<TestRunService<KaasClient>> {
    let client = Arc::new(config.client()?);
    Ok(TestRunService::new(
        client,
        Arc::new(GitCli::new()),
        config.open_store()?,
        config.runner.clone(),
    ))
}

fn cancel_on_ctrl_c(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            cancel.cancel();
        }
    })
}

async fn finish(handle: RunHandle, ctrl_c: JoinHandle<()>) -> Result<()> {
    let summary = handle.wait().await;
    ctrl_c.abort();
    print_summary(&summary);

    if !summary.is_success() {
        bail!(
            "{} of {} test(s) did not pass",
            summary.failed + summary.errored,
            summary.total()
        );
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{} passed, {} failed, {} errored, {} skipped",
        summary.passed.to_string().green(),
        summary.failed.to_string().red(),
        summary.errored.to_string().yellow(),
        summary.skipped.to_string().dimmed()
    );
}
