//! Terminal output formatting.

use colored::{ColoredString, Colorize};

use cobie_core::ItemState;
use cobie_graph::{JobReport, SyncResult};

pub fn state_colored(state: ItemState) -> ColoredString {
    match state {
        ItemState::New => "new".green(),
        ItemState::Changed => "changed".yellow(),
        ItemState::Unchanged => "unchanged".dimmed(),
    }
}

/// Print what a connector job did.
pub fn print_job_report(report: &JobReport, dry_run: bool) {
    if report.skipped {
        println!("{} Source unchanged since the last run, nothing to do.", "✓".green().bold());
        println!("  {}", "Use --force to run anyway.".dimmed());
        return;
    }

    let title = if dry_run { "Dry run complete:" } else { "Sync complete:" };
    println!("\n{}", title.green().bold());
    println!("  Source:        {}", state_colored(report.source_state));
    if let (Some(state), Some(version)) = (report.schema_state, report.schema_version) {
        println!("  Schema:        {} ({})", state_colored(state), version.to_string().cyan());
    }
    print_sync_result(&report.sync);
    if let Some(run_id) = &report.run_id {
        println!("  Run:           {}", run_id.dimmed());
    }
}

pub fn print_sync_result(result: &SyncResult) {
    println!("  Models:        {} created", result.models_created);
    println!("  Categories:    {} created", result.categories_created);
    println!(
        "  Elements:      {} inserted, {} updated, {} unchanged",
        result.elements_inserted.to_string().green(),
        result.elements_updated.to_string().yellow(),
        result.elements_unchanged.to_string().dimmed()
    );
    println!(
        "  Relationships: {} created, {} updated",
        result.relationships_created.to_string().green(),
        result.relationships_updated.to_string().yellow()
    );
    if result.rows_skipped > 0 {
        println!("  Skipped rows:  {}", result.rows_skipped.to_string().red());
    }
    if result.stale_elements > 0 {
        println!(
            "  Stale:         {} {}",
            result.stale_elements.to_string().red(),
            "(no longer in source, kept in graph)".dimmed()
        );
    }
}

/// Truncate a string to a max width with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
