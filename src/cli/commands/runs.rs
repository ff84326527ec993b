//! Run log listing.

use anyhow::Context;
use console::style;

use crate::cli::helpers::open_database;
use crate::config::Settings;
use crate::models::RunStatus;
use crate::repository::{DieselRunLogRepository, RunLogStore};

/// Show the most recent runs, newest first.
pub async fn cmd_runs(settings: &Settings, limit: usize) -> anyhow::Result<()> {
    let repo = DieselRunLogRepository::new(open_database(settings).await?);
    let runs = repo.recent(limit).await.context("Failed to load run logs")?;

    if runs.is_empty() {
        println!("{} No fetch runs recorded yet", style("!").yellow());
        return Ok(());
    }

    println!("\n{}", style("Recent Runs").bold());
    println!("{}", "-".repeat(80));
    println!(
        "{:<17} {:<22} {:>7} {:>7} {:>7} {:>7}",
        "Started", "Status", "Sources", "Failed", "Added", "Skipped"
    );
    println!("{}", "-".repeat(80));

    for run in runs {
        let status = match run.status {
            RunStatus::Completed => style(run.status.as_str()).green(),
            RunStatus::CompletedWithErrors => style(run.status.as_str()).yellow(),
            RunStatus::InProgress => style(run.status.as_str()).cyan(),
            RunStatus::Failed => style(run.status.as_str()).red(),
        };
        println!(
            "{:<17} {:<22} {:>7} {:>7} {:>7} {:>7}",
            run.started_at.format("%Y-%m-%d %H:%M"),
            status,
            run.sources_total,
            run.sources_failed,
            run.items_added,
            run.items_skipped
        );
        for error in &run.orchestration_errors {
            println!("    {}", style(error).red());
        }
    }

    Ok(())
}
