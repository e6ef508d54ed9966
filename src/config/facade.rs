//! Config loading entry point.

use super::merge::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::ScrivenerConfig;
use config::{ConfigError, File};
use std::path::Path;
use tracing::debug;

/// Loads [`ScrivenerConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, workspace files, then environment overrides.
    pub fn load(workspace_root: &Path) -> Result<ScrivenerConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: ScrivenerConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load a single file on top of the defaults, skipping the other layers.
    pub fn load_from_file(path: &Path) -> Result<ScrivenerConfig, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        builder_with_defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()
    }
}
