//! Author command presentation.

use super::shared::{format_section_heading, problem_count, to_json};
use crate::authoring::AuthoringSummary;
use crate::error::PipelineError;
use comfy_table::{presets::UTF8_BORDERS_ONLY, Table};

pub fn format_authoring_summary(
    summary: &AuthoringSummary,
    format: &str,
) -> Result<String, PipelineError> {
    if format == "json" {
        return to_json(summary);
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Descriptor authoring")));
    out.push_str(&format!("  Scripts scanned: {}\n", summary.scanned));
    out.push_str(&format!("  Already represented: {}\n", summary.already_represented));
    out.push_str(&format!("  Authored: {}\n", summary.authored.len()));
    out.push_str(&format!("  Failed: {}\n", problem_count(summary.failures.len())));
    if let Some(path) = &summary.collection_written {
        out.push_str(&format!("  Collection written: {}\n", path.display()));
    }

    if !summary.authored.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["File", "Key", "Diagram key", "Labels"]);
        for row in &summary.authored {
            table.add_row(vec![
                row.file_name.clone(),
                row.key.clone(),
                row.diagram_key.clone(),
                row.labels.join(" "),
            ]);
        }
        out.push_str(&format!("\n{}\n", table));
    }

    if !summary.failures.is_empty() {
        out.push_str(&format!("\n{}\n\n", format_section_heading("Failures")));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["File", "Category", "Reason"]);
        for row in &summary.failures {
            table.add_row(vec![
                row.file_name.clone(),
                row.category.to_string(),
                row.reason.clone(),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }
    Ok(out)
}
