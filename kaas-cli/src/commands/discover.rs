//! Discover command handler
//!
//! Prints the test tree of the workspace with the job id stored for each
//! runnable test.

use anyhow::Result;
use colored::*;
use kaas_core::domain::test::TestNode;
use kaas_runner::discovery::discover_workspace;
use kaas_runner::state::JobStateStore;

use crate::config::Config;

pub fn handle_discover_command(config: &Config) -> Result<()> {
    let discovery = discover_workspace(&config.workspaces);
    let store = config.open_store()?;

    for warning in &discovery.warnings {
        println!("{} {}", "⚠".yellow(), warning.to_string().yellow());
    }

    if discovery.roots.is_empty() {
        println!("{}", "No tests found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} runnable test(s):", discovery.leaves().len()).bold()
    );
    println!();
    for root in &discovery.roots {
        print_node(root, 0, &store);
    }

    Ok(())
}

fn print_node(node: &TestNode, depth: usize, store: &JobStateStore) {
    let indent = "  ".repeat(depth + 1);

    if node.is_leaf() {
        let job = store
            .get_job_id(&node.identity())
            .map(|id| format!("job {}", id).cyan().to_string())
            .unwrap_or_default();
        println!("{}{} {} {}", indent, "▸".green(), node.id, job);
        return;
    }

    let header = if node.label == node.id {
        node.id.bold().to_string()
    } else {
        format!("{} {}", node.label.bold(), format!("[{}]", node.id).dimmed())
    };
    match &node.description {
        Some(description) => println!("{}{} {}", indent, header, description.dimmed()),
        None => println!("{}{}", indent, header),
    }
    for child in &node.children {
        print_node(child, depth + 1, store);
    }
}
