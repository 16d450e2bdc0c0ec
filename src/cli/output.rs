/// Console formatting shared by the commands
use colored::*;

use crate::jobs::status::{JobState, JobStatus};

pub fn section_header_with_line(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn info(message: &str) {
    println!("{} {}", "●".blue(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

pub fn action(message: &str) {
    println!("{} {}", "▶".cyan(), message);
}

pub fn tree_item(is_last: bool, label: &str, value: Option<&str>) {
    let prefix = if is_last { "└─" } else { "├─" };
    if let Some(val) = value {
        println!("{} {}: {}", prefix.dimmed(), label, val);
    } else {
        println!("{} {}", prefix.dimmed(), label);
    }
}

/// Print a job status as a tree; the trace only when `show_trace` is set
pub fn print_job_status(status: &JobStatus, show_trace: bool) {
    section_header_with_line(&format!("Job {}", status.job_id));

    let state = match (status.state, status.error.is_some()) {
        (JobState::Done, true) => "done (failed)".red().to_string(),
        (JobState::Done, false) => "done".green().to_string(),
        (JobState::Running, _) => "running".yellow().to_string(),
        (JobState::Queued, _) => "queued".to_string(),
    };
    tree_item(false, "State", Some(&state));
    for (key, value) in &status.description {
        tree_item(false, key, Some(value));
    }
    tree_item(
        false,
        "Created",
        Some(&status.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
    );
    if let Some(results) = &status.results {
        tree_item(false, "Store", Some(&results.store_location));
        tree_item(false, "Outputs", Some(&results.output_refs.join(", ")));
    }
    if let Some(error) = &status.error {
        tree_item(false, "Error", Some(error));
    }
    tree_item(
        true,
        "Updated",
        Some(&status.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()),
    );

    if show_trace {
        if let Some(trace) = &status.trace {
            println!("\n{}", trace.dimmed());
        }
    }
}
