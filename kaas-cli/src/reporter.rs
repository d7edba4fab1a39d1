//! Terminal reporter
//!
//! Prints test results of a run as they arrive.

use std::time::Duration;

use colored::*;
use kaas_core::domain::test::TestCase;
use kaas_runner::reporter::ResultReporter;

/// [`ResultReporter`] writing one line per event to stdout
pub struct ConsoleReporter;

impl ResultReporter for ConsoleReporter {
    fn enqueued(&self, test: &TestCase) {
        println!("  {} {}", "queued ".dimmed(), test.id());
    }

    fn started(&self, test: &TestCase) {
        println!("  {} {}", "running".cyan(), test.id());
    }

    fn passed(&self, test: &TestCase, duration: Duration) {
        println!(
            "  {} {} {}",
            "✓".green(),
            test.id().bold(),
            format_duration(duration).dimmed()
        );
    }

    fn failed(&self, test: &TestCase, message: &str, duration: Duration) {
        println!(
            "  {} {} {}",
            "✗".red(),
            test.id().bold(),
            format_duration(duration).dimmed()
        );
        println!("      {}", message.red());
    }

    fn errored(&self, test: &TestCase, message: &str, duration: Option<Duration>) {
        let duration = duration.map(format_duration).unwrap_or_default();
        println!("  {} {} {}", "!".yellow(), test.id().bold(), duration.dimmed());
        println!("      {}", message.yellow());
    }

    fn skipped(&self, test: &TestCase) {
        println!("  {} {} {}", "-".dimmed(), test.id(), "(skipped)".dimmed());
    }

    fn append_output(&self, test: Option<&TestCase>, output: &str) {
        match test {
            Some(test) => println!("      {} {}", format!("[{}]", test.id()).dimmed(), output),
            None => println!("  {}", output),
        }
    }

    fn end(&self) {
        println!("{}", "─".repeat(60).dimmed());
    }
}

/// Renders a job duration as `(12.3s)` or `(4m 05s)`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("({:.1}s)", duration.as_secs_f64())
    } else {
        format!("({}m {:02}s)", secs / 60, secs % 60)
    }
}
