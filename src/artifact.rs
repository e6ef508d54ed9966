//! Artifact writer: generated content onto the file tree.
//!
//! Primary artifacts are whole-file overwrites. When a descriptor asks for a
//! diagram, the image is rendered after the primary file is on disk and a
//! back-reference line is appended only once the image has been written.

use crate::backend::GenerationBackend;
use crate::descriptor::DescriptorKind;
use crate::error::StoreError;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Diagram request attached to a markdown or script artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramRequest {
    pub key: String,
    pub prompt: String,
}

/// What happened to the diagram of a written artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramOutcome {
    NotRequested,
    Attached { key: String, image: PathBuf },
    Failed { key: String, reason: String },
}

/// Comment prefix for the back-reference line of an artifact.
pub fn comment_prefix(kind: DescriptorKind, language: Option<&str>) -> &'static str {
    if kind != DescriptorKind::Script {
        return "#";
    }
    let language = language.map(|l| l.trim().to_ascii_lowercase()).unwrap_or_default();
    match language.as_str() {
        "javascript" | "js" | "typescript" | "ts" | "rust" | "go" | "java" | "c" | "cpp"
        | "c++" | "csharp" | "c#" | "kotlin" | "swift" | "scala" => "//",
        "sql" | "lua" => "--",
        _ => "#",
    }
}

pub fn back_reference_line(prefix: &str, key: &str) -> String {
    format!("\n{} diagram_pk: {}", prefix, key)
}

#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
    diagram_extension: String,
}

impl ArtifactWriter {
    pub fn new<P: AsRef<Path>>(root: P, diagram_extension: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            diagram_extension: diagram_extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a descriptor path against the workspace root.
    pub fn resolve(&self, target: &Path) -> PathBuf {
        if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.root.join(target)
        }
    }

    /// Where the diagram image for `key` lands inside `dir`.
    pub fn diagram_image_path(&self, dir: &Path, key: &str) -> PathBuf {
        self.resolve(dir)
            .join(format!("{}.{}", key, self.diagram_extension))
    }

    pub async fn write(&self, target: &Path, content: &str) -> Result<PathBuf, StoreError> {
        self.write_bytes(target, content.as_bytes()).await
    }

    pub async fn write_bytes(&self, target: &Path, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.resolve(target);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "Artifact written");
        Ok(path)
    }

    pub async fn append(&self, target: &Path, suffix: &str) -> Result<(), StoreError> {
        let path = self.resolve(target);
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        file.write_all(suffix.as_bytes())
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        file.flush().await.map_err(|e| StoreError::io(&path, e))?;
        Ok(())
    }

    /// Write the primary artifact, then render and attach its diagram.
    ///
    /// Only a failure to write the primary content is an error. Diagram
    /// failures are reported in the outcome and leave the primary file as
    /// written, without a back-reference.
    pub async fn write_with_diagram(
        &self,
        target: &Path,
        content: &str,
        diagram: Option<&DiagramRequest>,
        prefix: &str,
        backend: &dyn GenerationBackend,
    ) -> Result<DiagramOutcome, StoreError> {
        let path = self.write(target, content).await?;
        let Some(request) = diagram else {
            return Ok(DiagramOutcome::NotRequested);
        };

        let failed = |reason: String| {
            warn!(path = %path.display(), key = %request.key, reason = %reason, "Diagram not attached");
            DiagramOutcome::Failed {
                key: request.key.clone(),
                reason,
            }
        };

        let bytes = match backend.generate_diagram(&request.prompt).await {
            Ok(bytes) => bytes,
            Err(e) => return Ok(failed(e.to_string())),
        };

        let dir = target.parent().unwrap_or_else(|| Path::new(""));
        let image = self.diagram_image_path(dir, &request.key);
        if let Err(e) = self.write_bytes(&image, &bytes).await {
            return Ok(failed(e.to_string()));
        }
        if let Err(e) = self
            .append(target, &back_reference_line(prefix, &request.key))
            .await
        {
            return Ok(failed(e.to_string()));
        }

        Ok(DiagramOutcome::Attached {
            key: request.key.clone(),
            image,
        })
    }
}
