//! CLI presentation: text and json formatters per command.

mod authoring;
mod init;
mod keys;
mod run;
mod shared;

pub use authoring::format_authoring_summary;
pub use init::format_init_result;
pub use keys::format_key_pool_stats;
pub use run::{format_run_summary, format_run_summary_text};
pub use shared::{format_section_heading, to_json};
