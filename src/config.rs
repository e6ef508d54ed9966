//! Configuration System
//!
//! Layered configuration for a scrivener workspace: built-in defaults, the
//! global user file, the workspace `config/` files and `SCRIVENER_*`
//! environment variables, in increasing precedence.

use crate::authoring::AuthoringOptions;
use crate::logging::LoggingConfig;
use crate::persist::atomic_write;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use crate::provider::{DiagramConfig, ProviderConfig, ProviderType};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Environment variable selecting `config/{env}.toml`.
pub const ENV_SELECTOR: &str = "SCRIVENER_ENV";
/// Prefix of per-key environment overrides (`SCRIVENER_TEXT__MODEL`).
pub const ENV_PREFIX: &str = "SCRIVENER";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrivenerConfig {
    #[serde(default)]
    pub store: StoreConfig,

    /// Text generation provider
    #[serde(default)]
    pub text: ProviderConfig,

    /// Diagram rendering backend
    #[serde(default)]
    pub diagram: DiagramConfig,

    #[serde(default)]
    pub authoring: AuthoringConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Locations of the descriptor store, key pool and label vocabulary,
/// relative to the workspace root unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_descriptor_dir")]
    pub descriptor_dir: PathBuf,

    #[serde(default = "default_key_pool")]
    pub key_pool: PathBuf,

    #[serde(default = "default_labels")]
    pub labels: PathBuf,
}

fn default_descriptor_dir() -> PathBuf {
    PathBuf::from("source_files/yaml")
}

fn default_key_pool() -> PathBuf {
    PathBuf::from("src/templates/pk.yaml")
}

fn default_labels() -> PathBuf {
    PathBuf::from("src/templates/labels.yaml")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            descriptor_dir: default_descriptor_dir(),
            key_pool: default_key_pool(),
            labels: default_labels(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, path) in [
            ("descriptor_dir", &self.descriptor_dir),
            ("key_pool", &self.key_pool),
            ("labels", &self.labels),
        ] {
            if path.as_os_str().is_empty() {
                return Err(format!("{} cannot be empty", name));
            }
        }
        Ok(())
    }
}

/// Fixed fields for descriptors produced by `author`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoringConfig {
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,

    /// `new_filepath` / `old_filepath` written on authored records
    #[serde(default = "default_scripts_filepath")]
    pub output_filepath: String,

    #[serde(default)]
    pub author: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default = "default_one")]
    pub tagline_required: String,

    #[serde(default = "default_one")]
    pub version: String,

    #[serde(default = "default_label")]
    pub default_label: String,
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("source_files/scripts")
}

fn default_scripts_filepath() -> String {
    "source_files/scripts".to_string()
}

fn default_language() -> String {
    "python".to_string()
}

fn default_extension() -> String {
    "py".to_string()
}

fn default_one() -> String {
    "1".to_string()
}

fn default_label() -> String {
    "#script".to_string()
}

impl Default for AuthoringConfig {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
            output_filepath: default_scripts_filepath(),
            author: String::new(),
            language: default_language(),
            extension: default_extension(),
            tagline_required: default_one(),
            version: default_one(),
            default_label: default_label(),
        }
    }
}

impl AuthoringConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.default_label.starts_with(crate::labels::LABEL_MARKER) {
            return Err(format!(
                "default_label '{}' must start with '{}'",
                self.default_label,
                crate::labels::LABEL_MARKER
            ));
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return Err("extension cannot be empty".to_string());
        }
        if self.output_filepath.trim().is_empty() {
            return Err("output_filepath cannot be empty".to_string());
        }
        Ok(())
    }

    /// Routine options with `scripts_dir` resolved against the workspace.
    pub fn to_options(&self, workspace_root: &Path) -> AuthoringOptions {
        AuthoringOptions {
            scripts_dir: resolve(workspace_root, &self.scripts_dir),
            extension: self.extension.trim_start_matches('.').to_string(),
            output_filepath: self.output_filepath.clone(),
            author: self.author.clone(),
            tagline_required: self.tagline_required.clone(),
            version: self.version.clone(),
            language: self.language.clone(),
            default_label: self.default_label.clone(),
            date: None,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Store(String),
    Text(String),
    Diagram(String),
    Authoring(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Store(msg) => write!(f, "store: {}", msg),
            ValidationError::Text(msg) => write!(f, "text: {}", msg),
            ValidationError::Diagram(msg) => write!(f, "diagram: {}", msg),
            ValidationError::Authoring(msg) => write!(f, "authoring: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ScrivenerConfig {
    /// Validate every section, collecting all problems.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if let Err(e) = self.store.validate() {
            errors.push(ValidationError::Store(e));
        }
        if let Err(e) = self.text.validate() {
            errors.push(ValidationError::Text(e));
        }
        if let Err(e) = self.diagram.validate() {
            errors.push(ValidationError::Diagram(e));
        }
        if let Err(e) = self.authoring.validate() {
            errors.push(ValidationError::Authoring(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// `validate` folded into a single pipeline error.
    pub fn ensure_valid(&self) -> Result<(), PipelineError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PipelineError::Config(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })
    }

    pub fn descriptor_dir(&self, workspace_root: &Path) -> PathBuf {
        resolve(workspace_root, &self.store.descriptor_dir)
    }

    pub fn key_pool_path(&self, workspace_root: &Path) -> PathBuf {
        resolve(workspace_root, &self.store.key_pool)
    }

    pub fn labels_path(&self, workspace_root: &Path) -> PathBuf {
        resolve(workspace_root, &self.store.labels)
    }

    /// Render as a TOML document.
    pub fn to_toml(&self) -> Result<String, PipelineError> {
        toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to render config: {}", e)))
    }
}

fn resolve(workspace_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace_root.join(path)
    }
}

/// Workspace config file written by `init`.
pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join("config").join("config.toml")
}

/// Outcome of writing the default workspace config
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitResult {
    pub path: PathBuf,
    pub created: bool,
}

/// Write the default configuration to `config/config.toml`. An existing file
/// is left alone unless `force` is set.
pub fn write_default_config(workspace_root: &Path, force: bool) -> Result<InitResult, PipelineError> {
    let path = workspace_config_path(workspace_root);
    if path.exists() && !force {
        return Ok(InitResult {
            path,
            created: false,
        });
    }
    let content = ScrivenerConfig::default().to_toml()?;
    atomic_write(&path, content.as_bytes())?;
    Ok(InitResult {
        path,
        created: true,
    })
}
