//! Keys command presentation.

use super::shared::to_json;
use crate::error::PipelineError;
use crate::keypool::PoolStats;
use comfy_table::{presets::UTF8_BORDERS_ONLY, Table};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct KeysOutput<'a> {
    path: &'a Path,
    #[serde(flatten)]
    stats: PoolStats,
}

pub fn format_key_pool_stats(
    path: &Path,
    stats: PoolStats,
    format: &str,
) -> Result<String, PipelineError> {
    if format == "json" {
        return to_json(&KeysOutput { path, stats });
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Total", "Available", "Used", "Malformed"]);
    table.add_row(vec![
        stats.total.to_string(),
        stats.available.to_string(),
        stats.used.to_string(),
        stats.malformed.to_string(),
    ]);

    let mut out = format!("Key pool: {}\n\n{}\n", path.display(), table);
    if stats.available == 0 {
        out.push_str(&format!(
            "\n{}\n",
            "Pool exhausted; add unused entries before the next run.".red()
        ));
    }
    Ok(out)
}
