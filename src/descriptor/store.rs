//! Descriptor store: one YAML collection file per descriptor kind.
//!
//! Collections are read as whole files and written back as whole files. The
//! layout the file was found in (a sequence, a single record, or a mapping
//! wrapping one sequence such as `diagrams:`) is kept so rewrites diff cleanly.

use super::{Descriptor, DescriptorKind};
use crate::error::StoreError;
use crate::persist::atomic_write;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Layout of a collection file.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionShape {
    /// Top-level sequence of records.
    Sequence,
    /// A single record as the whole document.
    Single,
    /// A mapping with one key whose value is the record sequence.
    Keyed(Value),
}

/// A stored record: either a usable descriptor or the raw value kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Descriptor(Descriptor),
    Malformed { raw: Value, reason: String },
}

impl Record {
    fn to_value(&self) -> Value {
        match self {
            Record::Descriptor(descriptor) => descriptor.to_value(),
            Record::Malformed { raw, .. } => raw.clone(),
        }
    }
}

/// All records of one kind, in stored order.
#[derive(Debug, Clone)]
pub struct DescriptorCollection {
    kind: DescriptorKind,
    path: PathBuf,
    shape: CollectionShape,
    exists: bool,
    pub records: Vec<Record>,
}

impl DescriptorCollection {
    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn shape(&self) -> &CollectionShape {
        &self.shape
    }

    /// Whether the collection was read from an existing file.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a new descriptor at the end of the collection.
    pub fn push(&mut self, descriptor: Descriptor) {
        self.records.push(Record::Descriptor(descriptor));
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.records.iter().filter_map(|record| match record {
            Record::Descriptor(descriptor) => Some(descriptor),
            Record::Malformed { .. } => None,
        })
    }

    pub fn pending_count(&self) -> usize {
        self.descriptors().filter(|d| !d.is_completed()).count()
    }

    fn to_document(&self) -> Value {
        let records: Vec<Value> = self.records.iter().map(Record::to_value).collect();
        match &self.shape {
            CollectionShape::Single if records.len() == 1 => {
                records.into_iter().next().unwrap_or(Value::Null)
            }
            CollectionShape::Single | CollectionShape::Sequence => Value::Sequence(records),
            CollectionShape::Keyed(key) => {
                let mut wrapper = Mapping::new();
                wrapper.insert(key.clone(), Value::Sequence(records));
                Value::Mapping(wrapper)
            }
        }
    }
}

/// Directory of collection files.
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    dir: PathBuf,
}

impl DescriptorStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: DescriptorKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Load the collection for `kind`. A missing file is an empty collection.
    pub fn load(&self, kind: DescriptorKind) -> Result<DescriptorCollection, StoreError> {
        let path = self.path_for(kind);
        if !path.exists() {
            debug!(path = %path.display(), kind = %kind, "Collection file not found");
            return Ok(DescriptorCollection {
                kind,
                path,
                shape: CollectionShape::Sequence,
                exists: false,
                records: Vec::new(),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let (shape, values) = parse_document(&path, &content)?;
        let records = values
            .into_iter()
            .map(|value| match Descriptor::from_value(kind, value.clone()) {
                Ok(descriptor) => Record::Descriptor(descriptor),
                Err(reason) => Record::Malformed { raw: value, reason },
            })
            .collect();

        Ok(DescriptorCollection {
            kind,
            path,
            shape,
            exists: true,
            records,
        })
    }

    /// Rewrite the whole collection file.
    pub fn save(&self, collection: &DescriptorCollection) -> Result<(), StoreError> {
        let yaml = serde_yaml::to_string(&collection.to_document()).map_err(|e| {
            StoreError::Serialize {
                path: collection.path.clone(),
                message: e.to_string(),
            }
        })?;
        atomic_write(&collection.path, yaml.as_bytes())?;
        debug!(
            path = %collection.path.display(),
            records = collection.records.len(),
            "Collection persisted"
        );
        Ok(())
    }
}

fn parse_document(path: &Path, content: &str) -> Result<(CollectionShape, Vec<Value>), StoreError> {
    if content.trim().is_empty() {
        return Ok((CollectionShape::Sequence, Vec::new()));
    }
    let document: Value =
        serde_yaml::from_str(content).map_err(|e| StoreError::parse(path, e))?;

    match document {
        Value::Null => Ok((CollectionShape::Sequence, Vec::new())),
        Value::Sequence(items) => Ok((CollectionShape::Sequence, items)),
        Value::Mapping(map) => {
            if map.len() == 1 {
                if let Some((key, Value::Sequence(items))) = map.iter().next() {
                    return Ok((CollectionShape::Keyed(key.clone()), items.clone()));
                }
            }
            Ok((CollectionShape::Single, vec![Value::Mapping(map)]))
        }
        other => Err(StoreError::parse(
            path,
            format!(
                "collection must be a sequence or mapping, got {}",
                super::value_kind_name(&other)
            ),
        )),
    }
}
