//! Shared test utilities for integration tests
//!
//! A scripted in-process backend, temporary workspaces, and serialized
//! access to the environment variables the config loader reads.

use async_trait::async_trait;
use parking_lot::Mutex;
use scrivener::backend::GenerationBackend;
use scrivener::error::GenerationError;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Serializes environment mutation across tests in this binary.
static ENV_MUTEX: Mutex<()> = parking_lot::const_mutex(());

const ISOLATED_VARS: [&str; 4] = [
    "HOME",
    "XDG_CONFIG_HOME",
    "SCRIVENER_ENV",
    "SCRIVENER_TEXT__MODEL",
];

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir` and the
/// scrivener overrides cleared; the previous environment is restored after.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock();
    let saved: Vec<(&str, Option<String>)> = ISOLATED_VARS
        .iter()
        .map(|name| (*name, std::env::var(name).ok()))
        .collect();

    let home = test_dir.path().join("home");
    let config_home = test_dir.path().join("xdg");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::create_dir_all(&config_home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);
    std::env::remove_var("SCRIVENER_ENV");
    std::env::remove_var("SCRIVENER_TEXT__MODEL");

    let result = f();

    for (name, value) in saved {
        match value {
            Some(value) => std::env::set_var(name, value),
            None => std::env::remove_var(name),
        }
    }
    result
}

/// Scripted reply for one backend call.
pub enum Reply {
    Text(String),
    Image(Vec<u8>),
    Fail(GenerationError),
}

pub const DEFAULT_TEXT: &str = "generated content\n";
pub const DEFAULT_IMAGE: &[u8] = b"\x89PNG\r\n";

/// In-process backend. Replies are consumed in call order; once the script
/// runs out, text calls return [`DEFAULT_TEXT`] and diagram calls
/// [`DEFAULT_IMAGE`]. Every prompt is recorded.
#[derive(Default)]
pub struct ScriptedBackend {
    text_replies: Mutex<VecDeque<Reply>>,
    diagram_replies: Mutex<VecDeque<Reply>>,
    text_prompts: Mutex<Vec<String>>,
    diagram_prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, reply: Reply) -> &Self {
        self.text_replies.lock().push_back(reply);
        self
    }

    pub fn push_diagram(&self, reply: Reply) -> &Self {
        self.diagram_replies.lock().push_back(reply);
        self
    }

    pub fn text_prompts(&self) -> Vec<String> {
        self.text_prompts.lock().clone()
    }

    pub fn diagram_prompts(&self) -> Vec<String> {
        self.diagram_prompts.lock().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.text_prompts.lock().len() + self.diagram_prompts.lock().len()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        self.text_prompts.lock().push(prompt.to_string());
        let reply = self.text_replies.lock().pop_front();
        match reply {
            None => Ok(DEFAULT_TEXT.to_string()),
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Image(_)) => Err(GenerationError::UnusableResponse(
                "scripted image reply for a text call".to_string(),
            )),
            Some(Reply::Fail(e)) => Err(e),
        }
    }

    async fn generate_diagram(&self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        self.diagram_prompts.lock().push(prompt.to_string());
        let reply = self.diagram_replies.lock().pop_front();
        match reply {
            None => Ok(DEFAULT_IMAGE.to_vec()),
            Some(Reply::Image(bytes)) => Ok(bytes),
            Some(Reply::Text(_)) => Err(GenerationError::UnusableResponse(
                "scripted text reply for a diagram call".to_string(),
            )),
            Some(Reply::Fail(e)) => Err(e),
        }
    }
}

/// Temporary workspace with the default store layout.
pub struct TestWorkspace {
    pub dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("source_files/yaml")).unwrap();
        std::fs::create_dir_all(dir.path().join("src/templates")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn yaml_dir(&self) -> PathBuf {
        self.root().join("source_files/yaml")
    }

    pub fn key_pool_path(&self) -> PathBuf {
        self.root().join("src/templates/pk.yaml")
    }

    pub fn labels_path(&self) -> PathBuf {
        self.root().join("src/templates/labels.yaml")
    }

    pub fn write_collection(&self, file_name: &str, content: &str) -> PathBuf {
        let path = self.yaml_dir().join(file_name);
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn write_key_pool(&self, content: &str) {
        std::fs::write(self.key_pool_path(), content).unwrap();
    }

    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.root().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.root().join(relative)).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.root().join(relative).exists()
    }

    pub fn hash(&self, relative: &str) -> blake3::Hash {
        blake3::hash(&std::fs::read(self.root().join(relative)).unwrap())
    }
}
