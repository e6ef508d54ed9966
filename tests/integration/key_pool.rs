//! Integration tests for key pool allocation and persistence

use scrivener::error::PipelineError;
use scrivener::keypool::KeyPool;
use tempfile::TempDir;

fn pool_file(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("pk.yaml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn allocations_skip_used_entries_and_persist_each_step() {
    let dir = TempDir::new().unwrap();
    let path = pool_file(
        &dir,
        "- pk: k1\n  used: false\n- pk: k2\n  used: true\n- pk: k3\n  used: false\n",
    );

    let mut pool = KeyPool::load(&path).unwrap();
    assert_eq!(pool.allocate_next().unwrap(), "k1");

    // A second process sees the first allocation before the next one happens.
    let observer = KeyPool::load(&path).unwrap();
    assert_eq!(observer.available(), 1);

    assert_eq!(pool.allocate_next().unwrap(), "k3");
    let reloaded = KeyPool::load(&path).unwrap();
    let stats = reloaded.stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.used, 3);
    assert_eq!(stats.available, 0);
}

#[test]
fn exhausted_pool_names_its_file() {
    let dir = TempDir::new().unwrap();
    let path = pool_file(&dir, "- pk: only\n  used: true\n");
    let mut pool = KeyPool::load(&path).unwrap();

    match pool.allocate_next() {
        Err(PipelineError::PoolExhausted(reported)) => assert_eq!(reported, path),
        other => panic!("expected PoolExhausted, got {:?}", other),
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "- pk: only\n  used: true\n");
}

#[test]
fn string_flags_are_normalized_on_write() {
    let dir = TempDir::new().unwrap();
    let path = pool_file(&dir, "- pk: a\n  used: 'False'\n- pk: b\n  used: 'no'\n");
    let mut pool = KeyPool::load(&path).unwrap();
    assert_eq!(pool.available(), 2);

    pool.allocate_next().unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("used: true"));
    assert!(written.contains("used: false"));
    assert!(!written.contains("'no'"));
}

#[test]
fn missing_pool_file_is_store_error() {
    let dir = TempDir::new().unwrap();
    assert!(KeyPool::load(dir.path().join("absent.yaml")).is_err());
}
