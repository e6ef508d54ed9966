//! Integration tests for the layered configuration system

use super::test_utils::with_isolated_env;
use scrivener::config::{global_config_path, write_default_config, ConfigLoader, ScrivenerConfig};
use scrivener::provider::ProviderType;
use std::path::PathBuf;
use tempfile::TempDir;

fn write(path: PathBuf, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn empty_workspace_loads_defaults() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let config = with_isolated_env(&test_dir, || ConfigLoader::load(workspace.path())).unwrap();
    assert_eq!(config, ScrivenerConfig::default());
}

#[test]
fn layers_apply_in_precedence_order() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let config = with_isolated_env(&test_dir, || {
        write(
            global_config_path().unwrap(),
            "[text]\nprovider_type = \"openai\"\nmodel = \"global-model\"\n\n[authoring]\nauthor = \"Global Author\"\n",
        );
        write(
            workspace.path().join("config/config.toml"),
            "[text]\nmodel = \"workspace-model\"\n\n[store]\nkey_pool = \"keys/pool.yaml\"\n",
        );
        write(
            workspace.path().join("config/production.toml"),
            "[store]\ndescriptor_dir = \"prod/yaml\"\n",
        );
        std::env::set_var("SCRIVENER_ENV", "production");
        std::env::set_var("SCRIVENER_TEXT__MODEL", "env-model");
        ConfigLoader::load(workspace.path())
    })
    .unwrap();

    assert_eq!(config.text.provider_type, ProviderType::OpenAI);
    assert_eq!(config.text.model, "env-model");
    assert_eq!(config.authoring.author, "Global Author");
    assert_eq!(config.store.key_pool, PathBuf::from("keys/pool.yaml"));
    assert_eq!(config.store.descriptor_dir, PathBuf::from("prod/yaml"));
    assert_eq!(config.store.labels, PathBuf::from("src/templates/labels.yaml"));
}

#[test]
fn development_file_is_the_default_environment() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let config = with_isolated_env(&test_dir, || {
        write(
            workspace.path().join("config/development.toml"),
            "[diagram]\nimage_extension = \"svg\"\n",
        );
        ConfigLoader::load(workspace.path())
    })
    .unwrap();
    assert_eq!(config.diagram.image_extension, "svg");
}

#[test]
fn init_output_loads_back_through_the_workspace_layer() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let result = write_default_config(workspace.path(), false).unwrap();
    assert!(result.created);
    assert_eq!(result.path, workspace.path().join("config/config.toml"));

    let config = with_isolated_env(&test_dir, || ConfigLoader::load(workspace.path())).unwrap();
    assert_eq!(config, ScrivenerConfig::default());
}

#[test]
fn invalid_values_are_reported_by_validation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        "[text]\nprovider_type = \"lmstudio\"\nmodel = \"\"\n\n[logging]\nformat = \"xml\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    let errors = config.validate().unwrap_err();
    let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    assert!(rendered.iter().any(|e| e.starts_with("text:")));
    assert!(rendered.iter().any(|e| e.starts_with("logging:")));
    assert!(config.ensure_valid().is_err());
}

#[test]
fn unknown_provider_type_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[text]\nprovider_type = \"ollama\"\n").unwrap();
    assert!(ConfigLoader::load_from_file(&path).is_err());
}
