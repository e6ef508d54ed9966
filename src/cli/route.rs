//! CLI route: single route table and run context. Builds the pipeline pieces
//! from configuration and dispatches to the driver, authoring and key pool.

use crate::artifact::ArtifactWriter;
use crate::authoring::author_descriptors;
use crate::backend::ProviderBackend;
use crate::config::{write_default_config, ConfigLoader, ScrivenerConfig};
use crate::descriptor::{DescriptorKind, DescriptorStore};
use crate::error::PipelineError;
use crate::keypool::KeyPool;
use crate::labels::LabelVocabulary;
use crate::pipeline::PipelineDriver;
use crate::provider::ProviderFactory;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_authoring_summary, format_init_result, format_key_pool_stats, format_run_summary,
};

/// Runtime context for CLI execution: workspace root and loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ScrivenerConfig,
}

impl RunContext {
    /// Load configuration from `config_path` when given, otherwise layered
    /// from the workspace.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, PipelineError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: ScrivenerConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &ScrivenerConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub async fn execute(&self, command: &Commands) -> Result<String, PipelineError> {
        debug!(command = command.name(), workspace = %self.workspace_root.display(), "Executing command");
        match command {
            Commands::Generate { kinds, format } => self.handle_generate(kinds, format).await,
            Commands::Author {
                scripts_dir,
                format,
            } => self.handle_author(scripts_dir.as_deref(), format).await,
            Commands::Keys { format } => self.handle_keys(format),
            Commands::Init { force } => self.handle_init(*force),
        }
    }

    async fn handle_generate(&self, kinds: &[String], format: &str) -> Result<String, PipelineError> {
        let kinds = parse_kinds(kinds)?;
        self.config.ensure_valid()?;
        let backend = self.build_backend()?;
        let keys = self.open_key_pool_if_present()?;

        let mut driver = PipelineDriver::new(
            DescriptorStore::new(self.config.descriptor_dir(&self.workspace_root)),
            keys,
            Arc::new(backend),
            ArtifactWriter::new(&self.workspace_root, &self.config.diagram.image_extension),
        );
        let summary = driver.run(&kinds).await;
        format_run_summary(&summary, format)
    }

    async fn handle_author(
        &self,
        scripts_dir: Option<&Path>,
        format: &str,
    ) -> Result<String, PipelineError> {
        self.config.ensure_valid()?;
        let backend = self.build_backend()?;
        let mut pool = KeyPool::load(self.config.key_pool_path(&self.workspace_root))?;
        let vocabulary = LabelVocabulary::load(self.config.labels_path(&self.workspace_root))?;

        let mut options = self.config.authoring.to_options(&self.workspace_root);
        if let Some(dir) = scripts_dir {
            options.scripts_dir = dir.to_path_buf();
        }

        let store = DescriptorStore::new(self.config.descriptor_dir(&self.workspace_root));
        let summary = author_descriptors(&store, &mut pool, &vocabulary, &backend, &options).await?;
        format_authoring_summary(&summary, format)
    }

    fn handle_keys(&self, format: &str) -> Result<String, PipelineError> {
        let pool = KeyPool::load(self.config.key_pool_path(&self.workspace_root))?;
        format_key_pool_stats(pool.path(), pool.stats(), format)
    }

    fn handle_init(&self, force: bool) -> Result<String, PipelineError> {
        let result = write_default_config(&self.workspace_root, force)?;
        info!(path = %result.path.display(), created = result.created, "Workspace config initialized");
        Ok(format_init_result(&result, force))
    }

    /// Text client from `[text]`; the diagram client only when its API key
    /// resolves, so text-only workspaces still run.
    fn build_backend(&self) -> Result<ProviderBackend, PipelineError> {
        let provider = self
            .config
            .text
            .to_model_provider()
            .map_err(PipelineError::Config)?;
        let client = ProviderFactory::create_client(
            &provider,
            Duration::from_secs(self.config.text.request_timeout_secs),
        )?;
        let backend = ProviderBackend::new(client, self.config.text.default_options.clone());

        match ProviderFactory::create_diagram_client(&self.config.diagram) {
            Ok(diagram) => Ok(backend.with_diagram_client(diagram)),
            Err(e) => {
                warn!(error = %e, "Diagram backend unavailable; diagram requests will fail");
                Ok(backend)
            }
        }
    }

    /// A missing pool file is not an error until a descriptor needs a key.
    fn open_key_pool_if_present(&self) -> Result<Option<KeyPool>, PipelineError> {
        let path = self.config.key_pool_path(&self.workspace_root);
        if !path.exists() {
            warn!(path = %path.display(), "Key pool not found; diagram requests will fail");
            return Ok(None);
        }
        Ok(Some(KeyPool::load(path)?))
    }
}

fn parse_kinds(kinds: &[String]) -> Result<Vec<DescriptorKind>, PipelineError> {
    kinds
        .iter()
        .map(|kind| {
            kind.parse::<DescriptorKind>()
                .map_err(|e| PipelineError::Config(format!("--kind: {}", e)))
        })
        .collect()
}
