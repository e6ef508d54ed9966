//! Key pool: monotone allocation of primary keys.
//!
//! The pool file is a YAML sequence of `{pk, used}` records maintained outside
//! the pipeline. Allocation is first-fit in stored order, the pool is persisted
//! before a key is handed out, and keys are never released. An exhausted pool
//! has to be replenished by whoever maintains the file.

use crate::descriptor::{parse_flag, scalar_text};
use crate::error::{PipelineError, StoreError};
use crate::persist::atomic_write;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Header written when the pool file had none.
pub const DEFAULT_HEADER: &str = "# Available pk's\n";

const KEY_FIELD: &str = "pk";
const KEY_ALIAS: &str = "key";
const USED_FIELD: &str = "used";

/// One pool item. Items that are not `{pk, used}` mappings are preserved and
/// never allocated.
#[derive(Debug, Clone, PartialEq)]
enum PoolRecord {
    Entry(PoolEntry),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq)]
struct PoolEntry {
    used: bool,
    fields: Mapping,
}

impl PoolEntry {
    fn key_value(&self) -> Option<&Value> {
        self.fields
            .get(KEY_FIELD)
            .or_else(|| self.fields.get(KEY_ALIAS))
    }

    /// The key, if it is a non-empty scalar. Nested or composite keys are
    /// structurally malformed and yield `None`.
    fn scalar_key(&self) -> Option<String> {
        self.key_value()
            .and_then(scalar_text)
            .map(|k| k.trim().trim_matches('"').to_string())
            .filter(|k| !k.is_empty())
    }

    fn is_allocatable(&self) -> bool {
        !self.used && self.scalar_key().is_some()
    }

    fn to_value(&self) -> Value {
        let mut fields = self.fields.clone();
        fields.insert(Value::String(USED_FIELD.to_string()), Value::Bool(self.used));
        Value::Mapping(fields)
    }
}

/// Counts reported by `keys`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub total: usize,
    pub available: usize,
    pub used: usize,
    pub malformed: usize,
}

/// Loaded key pool bound to its file.
#[derive(Debug)]
pub struct KeyPool {
    path: PathBuf,
    header: String,
    records: Vec<PoolRecord>,
}

impl KeyPool {
    /// Load the pool from `path`, capturing its leading comment header.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        Self::parse(path, &content)
    }

    fn parse(path: PathBuf, content: &str) -> Result<Self, StoreError> {
        let header = leading_comment_block(content);
        let document: Value = if content.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(content).map_err(|e| StoreError::parse(&path, e))?
        };

        let items = match document {
            Value::Null => Vec::new(),
            Value::Sequence(items) => items,
            _ => {
                return Err(StoreError::parse(
                    &path,
                    "key pool must be a sequence of {pk, used} records",
                ))
            }
        };

        let records = items
            .into_iter()
            .map(|item| match item {
                Value::Mapping(fields) => match parse_flag(fields.get(USED_FIELD)) {
                    Ok(used) => PoolRecord::Entry(PoolEntry { used, fields }),
                    Err(reason) => {
                        warn!(path = %path.display(), reason = %reason, "Skipping pool entry with unreadable used flag");
                        PoolRecord::Other(Value::Mapping(fields))
                    }
                },
                other => {
                    warn!(path = %path.display(), "Skipping non-mapping pool item");
                    PoolRecord::Other(other)
                }
            })
            .collect();

        Ok(Self {
            path,
            header,
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries `allocate_next` can still hand out.
    pub fn available(&self) -> usize {
        self.entries().filter(|e| e.is_allocatable()).count()
    }

    pub fn stats(&self) -> PoolStats {
        let total = self.records.len();
        let used = self.entries().filter(|e| e.used).count();
        let available = self.available();
        PoolStats {
            total,
            available,
            used,
            malformed: total - used - available,
        }
    }

    /// Take the first unused key, persist the pool, then return the key.
    ///
    /// If the pool cannot be persisted the entry is put back to unused and the
    /// store error is returned, so a key is never handed out without being
    /// recorded as used on disk.
    pub fn allocate_next(&mut self) -> Result<String, PipelineError> {
        let (index, key) = self
            .records
            .iter()
            .enumerate()
            .find_map(|(index, record)| match record {
                PoolRecord::Entry(entry) if !entry.used => {
                    let key = entry.scalar_key();
                    if key.is_none() {
                        debug!(index, "Skipping malformed pool key");
                    }
                    key.map(|key| (index, key))
                }
                PoolRecord::Entry(_) | PoolRecord::Other(_) => None,
            })
            .ok_or_else(|| PipelineError::PoolExhausted(self.path.clone()))?;

        self.set_used(index, true);
        if let Err(e) = self.save() {
            self.set_used(index, false);
            return Err(PipelineError::Store(e));
        }

        info!(key = %key, remaining = self.available(), "Allocated key");
        Ok(key)
    }

    /// Rewrite the pool file, header first, records in original order.
    pub fn save(&self) -> Result<(), StoreError> {
        let items: Vec<Value> = self
            .records
            .iter()
            .map(|record| match record {
                PoolRecord::Entry(entry) => entry.to_value(),
                PoolRecord::Other(value) => value.clone(),
            })
            .collect();
        let body = serde_yaml::to_string(&Value::Sequence(items)).map_err(|e| {
            StoreError::Serialize {
                path: self.path.clone(),
                message: e.to_string(),
            }
        })?;

        let header = if self.header.is_empty() {
            DEFAULT_HEADER
        } else {
            self.header.as_str()
        };
        let mut content = String::with_capacity(header.len() + body.len());
        content.push_str(header);
        content.push_str(&body);
        atomic_write(&self.path, content.as_bytes())
    }

    fn entries(&self) -> impl Iterator<Item = &PoolEntry> {
        self.records.iter().filter_map(|record| match record {
            PoolRecord::Entry(entry) => Some(entry),
            PoolRecord::Other(_) => None,
        })
    }

    fn set_used(&mut self, index: usize, used: bool) {
        if let Some(PoolRecord::Entry(entry)) = self.records.get_mut(index) {
            entry.used = used;
        }
    }
}

/// Comment and blank lines before the first YAML content line.
fn leading_comment_block(content: &str) -> String {
    let mut header = String::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') || (trimmed.is_empty() && !header.is_empty()) {
            header.push_str(line);
            header.push('\n');
        } else {
            break;
        }
    }
    header
}
