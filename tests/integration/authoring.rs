//! Integration tests for analysis-assisted descriptor authoring

use super::test_utils::{Reply, ScriptedBackend, TestWorkspace};
use chrono::NaiveDate;
use scrivener::authoring::{author_descriptors, AuthoringOptions};
use scrivener::descriptor::{DescriptorKind, DescriptorStore};
use scrivener::error::GenerationError;
use scrivener::keypool::KeyPool;
use scrivener::labels::LabelVocabulary;
use serde_yaml::Value;

const REPLY: &str = "---\ndescription: Exports dashboards\nobjective: Back up reports\ninput: API credentials\noutput: JSON files\nlabels:\n  - '#a'\n  - '#z'\n  -\n  - '#b'\ndiagram_prompt: Credentials flow into the export loop\n";

fn options(ws: &TestWorkspace) -> AuthoringOptions {
    AuthoringOptions {
        scripts_dir: ws.root().join("source_files/scripts"),
        author: "Docs Team".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 3, 5),
        ..AuthoringOptions::default()
    }
}

fn setup(ws: &TestWorkspace, pool: &str, scripts: &[&str]) {
    ws.write_key_pool(pool);
    std::fs::write(ws.labels_path(), "- '#a'\n- '#b'\n- '#c'\n").unwrap();
    for name in scripts {
        ws.write_file(&format!("source_files/scripts/{}", name), "print('hello')\n");
    }
}

async fn author(ws: &TestWorkspace, backend: &ScriptedBackend) -> scrivener::authoring::AuthoringSummary {
    let mut pool = KeyPool::load(ws.key_pool_path()).unwrap();
    let vocabulary = LabelVocabulary::load(ws.labels_path()).unwrap();
    author_descriptors(
        &DescriptorStore::new(ws.yaml_dir()),
        &mut pool,
        &vocabulary,
        backend,
        &options(ws),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn authors_pending_descriptor_with_two_keys_and_filtered_labels() {
    let ws = TestWorkspace::new();
    setup(&ws, "- pk: k1\n  used: false\n- pk: k2\n  used: false\n", &["export.py"]);

    let backend = ScriptedBackend::new();
    backend.push_text(Reply::Text(REPLY.to_string()));
    let summary = author(&ws, &backend).await;

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.authored.len(), 1);
    let authored = &summary.authored[0];
    assert_eq!(authored.key, "k1");
    assert_eq!(authored.diagram_key, "k2");
    assert_eq!(authored.labels, vec!["#a".to_string(), "#b".to_string()]);
    assert!(backend.text_prompts()[0].contains("print('hello')"));

    let collection = DescriptorStore::new(ws.yaml_dir())
        .load(DescriptorKind::Script)
        .unwrap();
    let descriptor = collection.descriptors().next().unwrap();
    assert!(!descriptor.is_completed());
    assert_eq!(descriptor.param("pk").as_deref(), Some("k1"));
    assert_eq!(descriptor.diagram_key().as_deref(), Some("k2"));
    assert_eq!(descriptor.param("update_date").as_deref(), Some("3/5/2024"));
    assert_eq!(descriptor.param("description").as_deref(), Some("Exports dashboards"));
    assert_eq!(
        descriptor.diagram_prompt().as_deref(),
        Some("Credentials flow into the export loop")
    );
    assert_eq!(
        descriptor.param_value("labels"),
        Some(&Value::Sequence(vec![
            Value::String("#a".to_string()),
            Value::String("#b".to_string())
        ]))
    );
    assert_eq!(KeyPool::load(ws.key_pool_path()).unwrap().available(), 0);
}

#[tokio::test]
async fn rerun_leaves_represented_scripts_alone() {
    let ws = TestWorkspace::new();
    setup(&ws, "- pk: k1\n  used: false\n- pk: k2\n  used: false\n", &["export.py"]);

    let backend = ScriptedBackend::new();
    backend.push_text(Reply::Text(REPLY.to_string()));
    author(&ws, &backend).await;
    let collection_hash = ws.hash("source_files/yaml/script.yaml");

    let backend = ScriptedBackend::new();
    let summary = author(&ws, &backend).await;
    assert_eq!(summary.already_represented, 1);
    assert!(summary.authored.is_empty());
    assert!(summary.collection_written.is_none());
    assert_eq!(backend.total_calls(), 0);
    assert_eq!(ws.hash("source_files/yaml/script.yaml"), collection_hash);
}

#[tokio::test]
async fn unusable_analysis_consumes_no_keys() {
    let ws = TestWorkspace::new();
    setup(&ws, "- pk: k1\n  used: false\n- pk: k2\n  used: false\n", &["a.py", "b.py"]);

    let backend = ScriptedBackend::new();
    backend.push_text(Reply::Text("I would rather not.".to_string()));
    backend.push_text(Reply::Fail(GenerationError::RateLimit("429".to_string())));
    let summary = author(&ws, &backend).await;

    assert!(summary.authored.is_empty());
    assert_eq!(summary.failures.len(), 2);
    assert!(summary.failures.iter().all(|f| f.category == "generation"));
    assert_eq!(KeyPool::load(ws.key_pool_path()).unwrap().available(), 2);
    assert!(!ws.exists("source_files/yaml/script.yaml"));
}

#[tokio::test]
async fn pool_exhaustion_stops_further_analysis() {
    let ws = TestWorkspace::new();
    setup(
        &ws,
        "- pk: k1\n  used: false\n- pk: k2\n  used: false\n",
        &["a.py", "b.py", "c.py"],
    );

    let backend = ScriptedBackend::new();
    backend.push_text(Reply::Text(REPLY.to_string()));
    backend.push_text(Reply::Text(REPLY.to_string()));
    let summary = author(&ws, &backend).await;

    assert_eq!(summary.authored.len(), 1);
    assert_eq!(summary.authored[0].file_name, "a.py");
    assert_eq!(summary.failures.len(), 2);
    assert!(summary.failures.iter().all(|f| f.category == "pool_exhausted"));
    assert_eq!(backend.text_prompts().len(), 1);
    assert!(summary.collection_written.is_some());
}

#[tokio::test]
async fn single_remaining_key_is_not_consumed() {
    let ws = TestWorkspace::new();
    setup(&ws, "- pk: k1\n  used: false\n", &["a.py"]);

    let backend = ScriptedBackend::new();
    backend.push_text(Reply::Text(REPLY.to_string()));
    let summary = author(&ws, &backend).await;

    assert!(summary.authored.is_empty());
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].category, "pool_exhausted");
    assert_eq!(backend.total_calls(), 0);
    assert!(summary.collection_written.is_none());

    let pool = KeyPool::load(ws.key_pool_path()).unwrap();
    assert_eq!(pool.available(), 1);
    assert_eq!(pool.stats().used, 0);
}
