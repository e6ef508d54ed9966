//! Analysis-assisted descriptor authoring.
//!
//! Scans a directory of existing scripts, asks the backend to classify each
//! one, and appends a pending script descriptor per file. Each authored
//! descriptor consumes two pool keys: one for the script, one for its diagram.

mod analysis;

pub use analysis::{analysis_prompt, parse_analysis, ScriptAnalysis, ANALYSIS_FIELDS};

use crate::backend::GenerationBackend;
use crate::descriptor::{
    Descriptor, DescriptorKind, DescriptorStore, COMPLETION_FIELD, DIAGRAM_KEY_FIELD,
    DIAGRAM_PROMPT_FIELD, SOURCE_DIR_FIELD, SOURCE_FILENAME_FIELD, TARGET_DIR_FIELD,
    TARGET_FILENAME_FIELD,
};
use crate::error::{PipelineError, StoreError};
use crate::keypool::KeyPool;
use crate::labels::LabelVocabulary;
use chrono::NaiveDate;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Script key plus diagram key.
const KEYS_PER_DESCRIPTOR: usize = 2;

/// Fixed values written onto every authored descriptor.
#[derive(Debug, Clone)]
pub struct AuthoringOptions {
    pub scripts_dir: PathBuf,
    /// Extension of source files to pick up, without the dot.
    pub extension: String,
    /// Value for both `new_filepath` and `old_filepath`.
    pub output_filepath: String,
    pub author: String,
    pub tagline_required: String,
    pub version: String,
    pub language: String,
    pub default_label: String,
    /// Date stamped as `update_date`; today when unset.
    pub date: Option<NaiveDate>,
}

impl Default for AuthoringOptions {
    fn default() -> Self {
        Self {
            scripts_dir: PathBuf::from("source_files/scripts"),
            extension: "py".to_string(),
            output_filepath: "source_files/scripts".to_string(),
            author: String::new(),
            tagline_required: "1".to_string(),
            version: "1".to_string(),
            language: "python".to_string(),
            default_label: "#script".to_string(),
            date: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthoredDescriptor {
    pub file_name: String,
    pub key: String,
    pub diagram_key: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthoringFailure {
    pub file_name: String,
    pub category: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuthoringSummary {
    pub scanned: usize,
    pub already_represented: usize,
    pub authored: Vec<AuthoredDescriptor>,
    pub failures: Vec<AuthoringFailure>,
    pub collection_written: Option<PathBuf>,
}

/// Author descriptors for every script not yet in the script collection.
///
/// Store failures (collection unreadable, scripts directory missing, final
/// save) abort the routine. Per-file failures are collected in the summary.
pub async fn author_descriptors(
    store: &DescriptorStore,
    pool: &mut KeyPool,
    vocabulary: &LabelVocabulary,
    backend: &dyn GenerationBackend,
    options: &AuthoringOptions,
) -> Result<AuthoringSummary, PipelineError> {
    let mut collection = store.load(DescriptorKind::Script)?;
    let mut represented: HashSet<String> = collection
        .descriptors()
        .filter_map(|d| d.param(SOURCE_FILENAME_FIELD))
        .collect();

    let sources = list_sources(&options.scripts_dir, &options.extension)?;
    let mut summary = AuthoringSummary {
        scanned: sources.len(),
        ..AuthoringSummary::default()
    };
    let update_date = options
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive())
        .format("%-m/%-d/%Y")
        .to_string();

    let mut pending = sources.into_iter();
    while let Some((file_name, path)) = pending.next() {
        if represented.contains(&file_name) {
            summary.already_represented += 1;
            continue;
        }

        match author_one(&file_name, &path, pool, vocabulary, backend, options, &update_date).await {
            Ok((descriptor, authored)) => {
                info!(file = %file_name, key = %authored.key, "Descriptor authored");
                collection.push(descriptor);
                represented.insert(file_name);
                summary.authored.push(authored);
            }
            Err(e) => {
                warn!(file = %file_name, error = %e, "Authoring failed");
                let exhausted = matches!(e, PipelineError::PoolExhausted(_));
                summary.failures.push(AuthoringFailure {
                    file_name,
                    category: e.category(),
                    reason: e.to_string(),
                });
                if exhausted {
                    // Every remaining file would fail the same way.
                    for (file_name, _) in pending.by_ref() {
                        if !represented.contains(&file_name) {
                            summary.failures.push(AuthoringFailure {
                                file_name,
                                category: e.category(),
                                reason: e.to_string(),
                            });
                        }
                    }
                }
            }
        }
    }

    if !summary.authored.is_empty() {
        store.save(&collection)?;
        summary.collection_written = Some(collection.path().to_path_buf());
    }
    info!(
        scanned = summary.scanned,
        authored = summary.authored.len(),
        failed = summary.failures.len(),
        "Authoring finished"
    );
    Ok(summary)
}

async fn author_one(
    file_name: &str,
    path: &Path,
    pool: &mut KeyPool,
    vocabulary: &LabelVocabulary,
    backend: &dyn GenerationBackend,
    options: &AuthoringOptions,
    update_date: &str,
) -> Result<(Descriptor, AuthoredDescriptor), PipelineError> {
    // A descriptor takes both of its keys or neither.
    if pool.available() < KEYS_PER_DESCRIPTOR {
        return Err(PipelineError::PoolExhausted(pool.path().to_path_buf()));
    }

    let script = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StoreError::io(path, e))?;

    let reply = backend
        .generate_text(&analysis_prompt(&options.language, &script, vocabulary))
        .await?;
    let analysis = parse_analysis(&reply)?;
    let labels = vocabulary.filter_proposed(&analysis.proposed_labels, &options.default_label);

    let key = pool.allocate_next()?;
    let diagram_key = pool.allocate_next()?;

    let mut fields = Mapping::new();
    let mut put = |field: &str, value: Value| {
        fields.insert(Value::String(field.to_string()), value);
    };
    fn text(s: &str) -> Value {
        Value::String(s.to_string())
    }

    put("author", text(&options.author));
    put("tagline_required", text(&options.tagline_required));
    put("update_date", text(update_date));
    put("version", text(&options.version));
    put(SOURCE_FILENAME_FIELD, text(file_name));
    put(TARGET_FILENAME_FIELD, text(file_name));
    put(TARGET_DIR_FIELD, text(&options.output_filepath));
    put(SOURCE_DIR_FIELD, text(&options.output_filepath));
    put(COMPLETION_FIELD, Value::Bool(false));
    put("type", text(DescriptorKind::Script.as_str()));
    put("pk", text(&key));
    put("number_of_diagrams", text("1"));
    put(DIAGRAM_KEY_FIELD, text(&diagram_key));
    put("language", text(&options.language));
    for (name, value) in &analysis.fields {
        put(name.as_str(), text(value));
    }
    put(
        "labels",
        Value::Sequence(labels.iter().map(|l| text(l)).collect()),
    );
    if let Some(prompt) = &analysis.diagram_prompt {
        put(DIAGRAM_PROMPT_FIELD, text(prompt));
    }

    Ok((
        Descriptor::new(DescriptorKind::Script, fields),
        AuthoredDescriptor {
            file_name: file_name.to_string(),
            key,
            diagram_key,
            labels,
        },
    ))
}

/// Regular files directly in `dir` with `extension`, sorted by file name.
fn list_sources(dir: &Path, extension: &str) -> Result<Vec<(String, PathBuf)>, StoreError> {
    if !dir.is_dir() {
        return Err(StoreError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "scripts directory not found"),
        ));
    }
    let extension = extension.trim_start_matches('.');

    let mut sources = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            StoreError::io(
                dir,
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            sources.push((name.to_string(), path.to_path_buf()));
        }
    }
    Ok(sources)
}
