//! Generate command presentation.

use super::shared::{format_section_heading, problem_count, to_json};
use crate::error::PipelineError;
use crate::pipeline::RunSummary;
use comfy_table::{presets::UTF8_BORDERS_ONLY, Table};
use owo_colors::OwoColorize;

pub fn format_run_summary(summary: &RunSummary, format: &str) -> Result<String, PipelineError> {
    match format {
        "json" => to_json(summary),
        _ => Ok(format_run_summary_text(summary)),
    }
}

pub fn format_run_summary_text(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Generation run")));
    out.push_str(&format!("  Processed: {}\n", summary.processed.green()));
    out.push_str(&format!("  Already completed: {}\n", summary.already_completed));
    out.push_str(&format!("  Keys allocated: {}\n", summary.keys_allocated));
    out.push_str(&format!("  Skipped: {}\n", problem_count(summary.skipped_count())));
    out.push_str(&format!(
        "  Diagram failures: {}\n",
        problem_count(summary.diagram_failures.len())
    ));
    out.push_str(&format!(
        "  Collection failures: {}\n",
        problem_count(summary.collection_failures.len())
    ));

    if !summary.skipped.is_empty() {
        out.push_str(&format!("\n{}\n\n", format_section_heading("Skipped descriptors")));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Kind", "#", "Descriptor", "Category", "Reason"]);
        for row in &summary.skipped {
            table.add_row(vec![
                row.kind.to_string(),
                row.index.to_string(),
                row.descriptor.clone(),
                row.category.to_string(),
                row.reason.clone(),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }

    if !summary.diagram_failures.is_empty() {
        out.push_str(&format!("\n{}\n\n", format_section_heading("Diagrams not attached")));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Kind", "Descriptor", "Key", "Reason"]);
        for row in &summary.diagram_failures {
            table.add_row(vec![
                row.kind.to_string(),
                row.descriptor.clone(),
                row.key.clone(),
                row.reason.clone(),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }

    if !summary.collection_failures.is_empty() {
        out.push_str(&format!("\n{}\n\n", format_section_heading("Collection failures")));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Kind", "Path", "Reason"]);
        for row in &summary.collection_failures {
            table.add_row(vec![
                row.kind.to_string(),
                row.path.display().to_string(),
                row.reason.clone(),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }

    if summary.is_clean() && summary.processed == 0 {
        out.push_str("\nNothing to do; every descriptor is already generated.\n");
    }
    out
}
