//! Integration tests for the memory stores.
//!
//! These tests go through `build_store`, the same path the service uses, so
//! both backends are exercised behind the `MemoryStore` trait object.

use relay_memory::{
    MemoryBackend, MemoryConfig, MemoryExtractor, MemoryStore, build_store, format_memory_block,
};
use std::sync::Arc;
use tempfile::TempDir;

fn jsonl_config(dir: &TempDir) -> MemoryConfig {
    MemoryConfig {
        backend: MemoryBackend::Jsonl {
            path: dir.path().join("memories.jsonl"),
        },
        max_results: 10,
    }
}

#[tokio::test]
async fn test_jsonl_store_persists_across_instances() {
    let dir = TempDir::new().unwrap();

    let first = build_store(&jsonl_config(&dir)).unwrap();
    let saved = first
        .save("alice", "Rust is my favorite language", "semantic", 0.8)
        .await
        .unwrap();
    drop(first);

    let second = build_store(&jsonl_config(&dir)).unwrap();
    let results = second.fetch("alice", Some("which language")).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, saved.id);
    assert_eq!(results[0].memory_type, "semantic");
    assert_eq!(results[0].importance, 0.8);
}

#[tokio::test]
async fn test_in_memory_store_via_config() {
    let store = build_store(&MemoryConfig::default()).unwrap();
    store.save("bob", "Lives in Lisbon", "semantic", 0.5).await.unwrap();

    assert_eq!(store.fetch("bob", None).await.unwrap().len(), 1);
    assert!(store.fetch("alice", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_saves_are_all_kept() {
    let dir = TempDir::new().unwrap();
    let store = build_store(&MemoryConfig {
        max_results: 100,
        ..jsonl_config(&dir)
    })
    .unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .save("u", &format!("fact number {i}"), "semantic", 0.5)
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.fetch("u", None).await.unwrap().len(), 20);
}

#[tokio::test]
async fn test_extracted_fact_feeds_next_prompt() {
    let store = build_store(&MemoryConfig::default()).unwrap();
    let extractor = MemoryExtractor::new().unwrap();

    let extraction = extractor.extract("Remember that my favorite color is blue");
    assert!(extraction.should_remember);
    store
        .save("carol", &extraction.fact_text, "semantic", 0.8)
        .await
        .unwrap();

    let recalled = store
        .fetch("carol", Some("What is my favorite color?"))
        .await
        .unwrap();
    let block = format_memory_block(&recalled).unwrap();
    assert!(block.ends_with("- my favorite color is blue"));
}
