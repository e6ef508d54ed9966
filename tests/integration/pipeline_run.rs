//! Integration tests for full generation runs

use super::test_utils::{Reply, ScriptedBackend, TestWorkspace, DEFAULT_IMAGE, DEFAULT_TEXT};
use scrivener::artifact::ArtifactWriter;
use scrivener::backend::GenerationBackend;
use scrivener::descriptor::{DescriptorKind, DescriptorStore};
use scrivener::error::GenerationError;
use scrivener::keypool::KeyPool;
use scrivener::pipeline::{PipelineDriver, RunSummary};
use std::sync::Arc;

async fn run(ws: &TestWorkspace, backend: &Arc<ScriptedBackend>, kinds: &[DescriptorKind]) -> RunSummary {
    let keys = if ws.key_pool_path().exists() {
        Some(KeyPool::load(ws.key_pool_path()).unwrap())
    } else {
        None
    };
    let backend: Arc<dyn GenerationBackend> = backend.clone();
    let mut driver = PipelineDriver::new(
        DescriptorStore::new(ws.yaml_dir()),
        keys,
        backend,
        ArtifactWriter::new(ws.root(), "png"),
    );
    driver.run(kinds).await
}

fn flags(ws: &TestWorkspace, kind: DescriptorKind) -> Vec<bool> {
    DescriptorStore::new(ws.yaml_dir())
        .load(kind)
        .unwrap()
        .descriptors()
        .map(|d| d.is_completed())
        .collect()
}

#[tokio::test]
async fn second_run_makes_no_calls_and_no_writes() {
    let ws = TestWorkspace::new();
    ws.write_collection(
        "markdown.yaml",
        "- new_filename: intro.md\n  new_filepath: docs\n  title: Intro\n  generated: false\n",
    );
    ws.write_collection(
        "diagram.yaml",
        "- new_filename: flow.png\n  new_filepath: docs/img\n  text: A to B\n  generated: 'False'\n",
    );

    let backend = Arc::new(ScriptedBackend::new());
    let first = run(&ws, &backend, &[]).await;
    assert_eq!(first.processed, 2);
    assert!(first.is_clean());
    assert_eq!(first.collections_written.len(), 2);
    assert_eq!(ws.read("docs/intro.md"), DEFAULT_TEXT);
    assert_eq!(std::fs::read(ws.root().join("docs/img/flow.png")).unwrap(), DEFAULT_IMAGE);

    let markdown_hash = ws.hash("source_files/yaml/markdown.yaml");
    let diagram_hash = ws.hash("source_files/yaml/diagram.yaml");
    let artifact_hash = ws.hash("docs/intro.md");

    let backend = Arc::new(ScriptedBackend::new());
    let second = run(&ws, &backend, &[]).await;
    assert_eq!(backend.total_calls(), 0);
    assert_eq!(second.processed, 0);
    assert_eq!(second.already_completed, 2);
    assert!(second.collections_written.is_empty());
    assert_eq!(ws.hash("source_files/yaml/markdown.yaml"), markdown_hash);
    assert_eq!(ws.hash("source_files/yaml/diagram.yaml"), diagram_hash);
    assert_eq!(ws.hash("docs/intro.md"), artifact_hash);
}

#[tokio::test]
async fn diagram_failure_keeps_primary_artifact_without_back_reference() {
    let ws = TestWorkspace::new();
    ws.write_key_pool("- pk: k1\n  used: false\n");
    ws.write_collection(
        "markdown.yaml",
        "- new_filename: guide.md\n  new_filepath: docs\n  diagram_prompt_1: Request lifecycle\n  generated: false\n",
    );

    let backend = Arc::new(ScriptedBackend::new());
    backend.push_diagram(Reply::Fail(GenerationError::RateLimit("slow down".to_string())));
    let summary = run(&ws, &backend, &[]).await;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.keys_allocated, 1);
    assert_eq!(summary.diagram_failures.len(), 1);
    assert_eq!(summary.diagram_failures[0].key, "k1");
    assert_eq!(ws.read("docs/guide.md"), DEFAULT_TEXT);
    assert!(!ws.exists("docs/k1.png"));
    assert_eq!(flags(&ws, DescriptorKind::Markdown), vec![true]);

    let collection = DescriptorStore::new(ws.yaml_dir())
        .load(DescriptorKind::Markdown)
        .unwrap();
    let descriptor = collection.descriptors().next().unwrap();
    assert_eq!(descriptor.diagram_key().as_deref(), Some("k1"));
    assert_eq!(KeyPool::load(ws.key_pool_path()).unwrap().available(), 0);
}

#[tokio::test]
async fn attached_diagram_appends_back_reference_in_script_language() {
    let ws = TestWorkspace::new();
    ws.write_key_pool("# Available pk's\n- pk: k1\n  used: true\n- pk: k2\n  used: false\n");
    ws.write_collection(
        "script.yaml",
        "- new_filename: sync.js\n  new_filepath: scripts\n  language: javascript\n  diagram_prompt_1: Sync loop\n  generated: false\n",
    );

    let backend = Arc::new(ScriptedBackend::new());
    let summary = run(&ws, &backend, &[DescriptorKind::Script]).await;

    assert!(summary.is_clean());
    assert_eq!(
        ws.read("scripts/sync.js"),
        format!("{}\n// diagram_pk: k2", DEFAULT_TEXT)
    );
    assert_eq!(std::fs::read(ws.root().join("scripts/k2.png")).unwrap(), DEFAULT_IMAGE);
    assert_eq!(backend.diagram_prompts(), vec!["Sync loop".to_string()]);
    assert!(ws.read("src/templates/pk.yaml").starts_with("# Available pk's\n"));
}

#[tokio::test]
async fn resume_processes_only_pending_descriptors() {
    let ws = TestWorkspace::new();
    ws.write_file("docs/one.md", "first version\n");
    ws.write_collection(
        "markdown.yaml",
        "- new_filename: one.md\n  new_filepath: docs\n  generated: true\n- new_filename: two.md\n  new_filepath: docs\n  generated: false\n",
    );
    let before = ws.hash("docs/one.md");

    let backend = Arc::new(ScriptedBackend::new());
    let summary = run(&ws, &backend, &[]).await;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.already_completed, 1);
    assert_eq!(backend.text_prompts().len(), 1);
    assert_eq!(ws.hash("docs/one.md"), before);
    assert_eq!(ws.read("docs/two.md"), DEFAULT_TEXT);
    assert_eq!(flags(&ws, DescriptorKind::Markdown), vec![true, true]);
}

#[tokio::test]
async fn malformed_records_are_skipped_and_preserved() {
    let ws = TestWorkspace::new();
    ws.write_collection(
        "markdown.yaml",
        "- just a string\n- new_filepath: docs\n  generated: false\n- new_filename: ok.md\n  new_filepath: docs\n  generated: false\n",
    );

    let backend = Arc::new(ScriptedBackend::new());
    let summary = run(&ws, &backend, &[]).await;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped_count(), 2);
    assert!(summary
        .skipped
        .iter()
        .all(|s| s.category == "malformed_descriptor"));
    assert_eq!(summary.skipped[0].index, 0);
    assert_eq!(summary.skipped[1].index, 1);
    assert!(ws.exists("docs/ok.md"));

    let written = ws.read("source_files/yaml/markdown.yaml");
    assert!(written.contains("just a string"));
    let collection = DescriptorStore::new(ws.yaml_dir())
        .load(DescriptorKind::Markdown)
        .unwrap();
    assert_eq!(collection.len(), 3);
}

#[tokio::test]
async fn unreadable_collection_does_not_stop_the_others() {
    let ws = TestWorkspace::new();
    ws.write_collection(
        "markdown.yaml",
        "- new_filename: a.md\n  new_filepath: docs\n  generated: false\n",
    );
    ws.write_collection("script.yaml", "- [unclosed\n  : broken\n");
    ws.write_collection(
        "diagram.yaml",
        "- new_filename: d.png\n  new_filepath: img\n  text: boxes\n  generated: false\n",
    );

    let backend = Arc::new(ScriptedBackend::new());
    let summary = run(&ws, &backend, &[]).await;

    assert_eq!(summary.collection_failures.len(), 1);
    assert_eq!(summary.collection_failures[0].kind, DescriptorKind::Script);
    assert_eq!(summary.processed, 2);
    assert!(ws.exists("docs/a.md"));
    assert!(ws.exists("img/d.png"));
    assert_eq!(ws.read("source_files/yaml/script.yaml"), "- [unclosed\n  : broken\n");
}

#[tokio::test]
async fn generation_failure_keeps_allocated_key_for_retry() {
    let ws = TestWorkspace::new();
    ws.write_key_pool("- pk: k1\n  used: false\n- pk: k2\n  used: false\n");
    ws.write_collection(
        "markdown.yaml",
        "- new_filename: a.md\n  new_filepath: docs\n  diagram_prompt_1: flow\n  generated: false\n",
    );

    let backend = Arc::new(ScriptedBackend::new());
    backend.push_text(Reply::Fail(GenerationError::Timeout("deadline".to_string())));
    let first = run(&ws, &backend, &[]).await;
    assert_eq!(first.processed, 0);
    assert_eq!(first.skipped[0].category, "generation");
    assert_eq!(first.keys_allocated, 1);
    assert_eq!(flags(&ws, DescriptorKind::Markdown), vec![false]);
    assert!(!ws.exists("docs/a.md"));

    let backend = Arc::new(ScriptedBackend::new());
    let second = run(&ws, &backend, &[]).await;
    assert_eq!(second.processed, 1);
    assert_eq!(second.keys_allocated, 0);
    assert!(ws.read("docs/a.md").ends_with("# diagram_pk: k1"));
    assert_eq!(KeyPool::load(ws.key_pool_path()).unwrap().available(), 1);
}

#[tokio::test]
async fn exhausted_pool_skips_descriptor_before_generation() {
    let ws = TestWorkspace::new();
    ws.write_key_pool("- pk: k1\n  used: false\n");
    ws.write_collection(
        "markdown.yaml",
        "- new_filename: a.md\n  new_filepath: docs\n  diagram_prompt_1: one\n  generated: false\n- new_filename: b.md\n  new_filepath: docs\n  diagram_prompt_1: two\n  generated: false\n",
    );

    let backend = Arc::new(ScriptedBackend::new());
    let summary = run(&ws, &backend, &[]).await;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].category, "pool_exhausted");
    assert_eq!(backend.text_prompts().len(), 1);
    assert!(!ws.exists("docs/b.md"));
    assert_eq!(flags(&ws, DescriptorKind::Markdown), vec![true, false]);
}

#[tokio::test]
async fn previous_version_is_offered_as_context() {
    let ws = TestWorkspace::new();
    ws.write_file("old/notes.md", "Legacy paragraph about caching.\n");
    ws.write_collection(
        "markdown.yaml",
        "- new_filename: notes.md\n  new_filepath: docs\n  existing_filename: notes.md\n  old_filepath: old\n  generated: false\n",
    );

    let backend = Arc::new(ScriptedBackend::new());
    run(&ws, &backend, &[]).await;

    let prompts = backend.text_prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Legacy paragraph about caching."));
}
