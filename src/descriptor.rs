//! Descriptor model
//!
//! A descriptor is one unit of generation work read from the descriptor store.
//! Records keep their original field order; the few fields the pipeline
//! interprets (target, source reference, completion flag) are read through
//! accessors and everything else is carried as generation parameters.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

mod flag;
pub mod store;

pub use flag::parse_flag;
pub use store::{CollectionShape, DescriptorCollection, DescriptorStore, Record};

/// Field holding the completion flag.
pub const COMPLETION_FIELD: &str = "generated";
pub const TARGET_FILENAME_FIELD: &str = "new_filename";
pub const TARGET_DIR_FIELD: &str = "new_filepath";
pub const SOURCE_FILENAME_FIELD: &str = "existing_filename";
pub const SOURCE_DIR_FIELD: &str = "old_filepath";
pub const DIAGRAM_KEY_FIELD: &str = "diagram_1_pk";
pub const DIAGRAM_PROMPT_FIELD: &str = "diagram_prompt_1";

/// Artifact kind; one descriptor collection file per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorKind {
    Markdown,
    Script,
    Diagram,
}

impl DescriptorKind {
    /// Processing order for a full run.
    pub const ALL: [DescriptorKind; 3] = [
        DescriptorKind::Markdown,
        DescriptorKind::Script,
        DescriptorKind::Diagram,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DescriptorKind::Markdown => "markdown",
            DescriptorKind::Script => "script",
            DescriptorKind::Diagram => "diagram",
        }
    }

    /// Collection file name inside the descriptor directory.
    pub fn file_name(self) -> &'static str {
        match self {
            DescriptorKind::Markdown => "markdown.yaml",
            DescriptorKind::Script => "script.yaml",
            DescriptorKind::Diagram => "diagram.yaml",
        }
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DescriptorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(DescriptorKind::Markdown),
            "script" => Ok(DescriptorKind::Script),
            "diagram" => Ok(DescriptorKind::Diagram),
            other => Err(format!(
                "Invalid descriptor kind: {}. Must be markdown, script, or diagram",
                other
            )),
        }
    }
}

/// One unit of generation work.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    kind: DescriptorKind,
    completed: bool,
    fields: Mapping,
}

impl Descriptor {
    /// Build a pending descriptor from authored fields. Any completion flag in
    /// `fields` is ignored; new descriptors always start pending.
    pub fn new(kind: DescriptorKind, fields: Mapping) -> Self {
        Self {
            kind,
            completed: false,
            fields,
        }
    }

    /// Read a stored record. Returns the reason when the record is not usable.
    pub fn from_value(kind: DescriptorKind, value: Value) -> Result<Self, String> {
        let fields = match value {
            Value::Mapping(map) => map,
            Value::Null => return Err("record is empty".to_string()),
            other => {
                return Err(format!(
                    "record must be a mapping, got {}",
                    value_kind_name(&other)
                ))
            }
        };
        let completed = parse_flag(fields.get(COMPLETION_FIELD))
            .map_err(|e| format!("invalid '{}' field: {}", COMPLETION_FIELD, e))?;
        Ok(Self {
            kind,
            completed,
            fields,
        })
    }

    /// Serialize back to a record, with the flag written as a YAML boolean in
    /// its original position.
    pub fn to_value(&self) -> Value {
        let mut fields = self.fields.clone();
        fields.insert(
            Value::String(COMPLETION_FIELD.to_string()),
            Value::Bool(self.completed),
        );
        Value::Mapping(fields)
    }

    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Flip the completion flag. There is no way back to pending.
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    /// Destination of the generated artifact, relative to the workspace root
    /// unless absolute.
    pub fn target_path(&self) -> Option<PathBuf> {
        join_dir_and_name(self.param(TARGET_DIR_FIELD), self.param(TARGET_FILENAME_FIELD))
    }

    /// Directory the artifact is written into.
    pub fn target_dir(&self) -> Option<PathBuf> {
        self.param(TARGET_DIR_FIELD).map(PathBuf::from)
    }

    /// Previous version of the artifact, used as prompt context.
    pub fn source_reference(&self) -> Option<PathBuf> {
        join_dir_and_name(self.param(SOURCE_DIR_FIELD), self.param(SOURCE_FILENAME_FIELD))
    }

    /// Scalar parameter rendered as text. Empty strings read as absent.
    pub fn param(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .and_then(scalar_text)
            .filter(|s| !s.trim().is_empty())
    }

    /// Parameter rendered for a prompt: scalars as text, sequences one item
    /// per line.
    pub fn param_text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::Sequence(items) => {
                let lines: Vec<String> = items.iter().filter_map(scalar_text).collect();
                if lines.is_empty() {
                    None
                } else {
                    Some(lines.join("\n"))
                }
            }
            other => scalar_text(other).filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn param_value(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set_param(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(Value::String(key.to_string()), value.into());
    }

    pub fn parameters(&self) -> &Mapping {
        &self.fields
    }

    /// Key allocated for this descriptor's diagram, if any.
    pub fn diagram_key(&self) -> Option<String> {
        self.param(DIAGRAM_KEY_FIELD)
    }

    /// Prompt for this descriptor's diagram, if one is requested.
    pub fn diagram_prompt(&self) -> Option<String> {
        self.param(DIAGRAM_PROMPT_FIELD)
    }

    /// Short label for logs and summaries.
    pub fn display_name(&self) -> String {
        self.target_path()
            .map(|p| p.display().to_string())
            .or_else(|| self.param(TARGET_FILENAME_FIELD))
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

fn join_dir_and_name(dir: Option<String>, name: Option<String>) -> Option<PathBuf> {
    let name = name?;
    Some(match dir {
        Some(dir) => PathBuf::from(dir).join(name),
        None => PathBuf::from(name),
    })
}

/// Text of a scalar YAML value; `None` for nulls and collections.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn value_kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
