//! Merge rules: defaults first, later sources override earlier ones key by key.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with the store and authoring defaults applied.
///
/// Sections without defaults here fall back to their serde defaults.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("store.descriptor_dir", "source_files/yaml")?
        .set_default("store.key_pool", "src/templates/pk.yaml")?
        .set_default("store.labels", "src/templates/labels.yaml")?
        .set_default("authoring.scripts_dir", "source_files/scripts")?
        .set_default("authoring.default_label", "#script")
}
