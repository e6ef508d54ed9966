//! CLI domain: parse, route, output, and presentation only.
//! No pipeline logic; the route table hands off to the library modules.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_authoring_summary, format_init_result, format_key_pool_stats, format_run_summary,
    format_run_summary_text, format_section_heading, to_json,
};
pub use route::RunContext;
