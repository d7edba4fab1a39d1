//! Job command handlers
//!
//! Handles job inspection: status details, the JSON report and web links.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use kaas_client::KaasClient;
use kaas_core::domain::job::{JobRecord, JobStatus};

use crate::config::Config;
use crate::reporter::format_duration;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Get job details
    Get {
        /// Job ID
        id: String,
    },
    /// Print the JSON report of a job
    Report {
        /// Job ID
        id: String,
    },
    /// Print links to a job in the KaaS app
    Url {
        /// Job ID
        id: String,
    },
}

/// Handle job commands
///
/// Routes job subcommands to their respective handlers.
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        JobCommands::Get { id } => get_job(&client, &id).await,
        JobCommands::Report { id } => get_job_report(&client, &id).await,
        JobCommands::Url { id } => get_job_urls(&client, &id).await,
    }
}

/// Get and display a single job
async fn get_job(client: &KaasClient, id: &str) -> Result<()> {
    let job = client
        .get_job(id)
        .await
        .with_context(|| format!("Failed to fetch job {}", id))?;

    print_job_details(client, &job);

    Ok(())
}

async fn get_job_report(client: &KaasClient, id: &str) -> Result<()> {
    let report = client
        .get_job_report(id)
        .await
        .with_context(|| format!("Failed to fetch report of job {}", id))?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

async fn get_job_urls(client: &KaasClient, id: &str) -> Result<()> {
    let job = client
        .get_job(id)
        .await
        .with_context(|| format!("Failed to fetch job {}", id))?;

    println!("Job:    {}", client.job_url(&job));
    println!("Report: {}", client.job_report_url(&job));
    if let Some(cache) = client.job_cache_url(&job) {
        println!("Cache:  {}", cache);
    }

    Ok(())
}

/// Print detailed job information
fn print_job_details(client: &KaasClient, job: &JobRecord) {
    println!("{}", "Job Details:".bold());
    println!("  ID:       {}", job.id.cyan());
    println!("  Kind:     {}", job.kind);
    println!("  Status:   {}", colorize_status(job.status));
    println!("  Vault:    {}/{}", job.organization_name, job.vault_name);
    println!("  Duration: {}", format_duration(job.elapsed()));
    if let Some(profile) = &job.profile_name {
        println!("  Profile:  {}", profile);
    }
    if let Some(args) = &job.extra_prove_args {
        println!("  Args:     {}", args.dimmed());
    }
    println!("  Link:     {}", client.job_url(job).dimmed());

    if !job.children.is_empty() {
        println!("\n{}", "Children:".bold());
        for child in &job.children {
            println!(
                "  {} {} {} {}",
                "▸".cyan(),
                child.short_id().dimmed(),
                child.profile_name.as_deref().unwrap_or("-"),
                colorize_status(child.status)
            );
        }
    }
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Pending => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Success => status_str.green(),
        JobStatus::Failure | JobStatus::ProcessingFailed => status_str.red(),
        JobStatus::Cancelled => status_str.dimmed(),
    }
}
