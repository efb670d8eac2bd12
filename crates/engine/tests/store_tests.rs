//! Integration tests for ArtifactStore save/read/query
//!
//! These tests verify:
//! - Existence semantics around create
//! - Index merging across repeated saves
//! - Encoded reads round-trip arbitrary bytes
//! - Concurrent saves to one version serialize cleanly

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use modelstore_core::{
    BufferEntry, CollectFormat, CollectedModels, ComponentModel, JsonCodec, ModelIdentity,
    OutputFormat, StoreError,
};
use modelstore_engine::{ArtifactStore, StoreConfig};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn open(dir: &TempDir, version: &str) -> ArtifactStore {
    let identity = ModelIdentity::parse("guest#9999#model_1", version).unwrap();
    ArtifactStore::open(StoreConfig::with_base(dir.path()), identity).unwrap()
}

fn lr_model(param: &[u8]) -> ComponentModel {
    ComponentModel::new("hetero_lr_0", "HeteroLR", "model")
        .with_buffer("param", BufferEntry::new("LRModelParam", param.to_vec()))
        .with_buffer("meta", BufferEntry::new("LRModelMeta", vec![0xAA]))
}

#[test]
fn test_exists_tracks_lifecycle() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, "v1");
    assert!(!store.exists().unwrap());

    // Lock marker alone does not count as content
    drop(store.lock().acquire().unwrap());
    assert!(store.model_path().join(".lock").exists());
    assert!(!store.exists().unwrap());

    store.create().unwrap();
    assert!(store.exists().unwrap());
}

#[test]
fn test_resave_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, "v1");
    store.create().unwrap();

    store.save_component_model(lr_model(&[1, 2, 3])).unwrap();
    let first = std::fs::read(store.paths().define_meta()).unwrap();

    store.save_component_model(lr_model(&[1, 2, 3])).unwrap();
    let second = std::fs::read(store.paths().define_meta()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_resave_upserts_buffers() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, "v1");
    store.create().unwrap();

    store.save_component_model(lr_model(&[1])).unwrap();
    store
        .save_component_model(
            ComponentModel::new("hetero_lr_0", "HeteroLR", "model")
                .with_buffer("param", BufferEntry::new("LRModelParamV2", vec![9]))
                .with_buffer("summary", BufferEntry::new("Summary", vec![7])),
        )
        .unwrap();

    let index = store.model_proto_index("hetero_lr_0", "model").unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(index["param"], "LRModelParamV2");
    assert_eq!(index["meta"], "LRModelMeta");

    let buffers = store
        .read_component_model("hetero_lr_0", "model", OutputFormat::Parsed)
        .unwrap();
    assert_eq!(buffers["param"].clone().into_parsed(), Some(vec![9]));
}

#[test]
fn test_stale_json_mirror_removed_on_resave() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, "v1");
    store.create().unwrap();

    store
        .save_component_model(
            ComponentModel::new("hetero_lr_0", "HeteroLR", "model").with_buffer(
                "param",
                BufferEntry::new("LRModelParam", vec![1]).with_json(json!({"w": [1]})),
            ),
        )
        .unwrap();
    store.save_component_model(lr_model(&[2])).unwrap();

    let buffers = store
        .read_component_model("hetero_lr_0", "model", OutputFormat::Json)
        .unwrap();
    assert_eq!(buffers["param"].as_json(), Some(&serde_json::Value::Null));
}

#[test]
fn test_json_codec_parsed_reads() {
    let dir = TempDir::new().unwrap();
    let identity = ModelIdentity::parse("host#10000#model_1", "v1").unwrap();
    let store = ArtifactStore::with_codec(
        StoreConfig::with_base(dir.path()),
        identity,
        JsonCodec::new("Summary"),
    )
    .unwrap();
    store.create().unwrap();

    let summary = json!({"auc": 0.93, "iters": 30});
    let codec = store.codec().clone();
    let entry = BufferEntry::new(
        "Summary",
        modelstore_core::BufferCodec::serialize(&codec, &summary).unwrap(),
    );
    store
        .save_component_model(
            ComponentModel::new("evaluation_0", "Evaluation", "train").with_buffer("summary", entry),
        )
        .unwrap();

    let CollectedModels::Parsed(parsed) = store.collect_models(CollectFormat::Parsed).unwrap()
    else {
        panic!("expected parsed collection");
    };
    assert_eq!(parsed["summary"], summary);
}

#[test]
fn test_alias_resolution_errors() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, "v1");
    store.create().unwrap();
    store.save_component_model(lr_model(&[1])).unwrap();
    assert_eq!(store.get_model_alias("hetero_lr_0").unwrap(), "model");

    store
        .save_component_model(
            ComponentModel::new("hetero_lr_0", "HeteroLR", "train")
                .with_buffer("loss", BufferEntry::new("Loss", vec![1])),
        )
        .unwrap();
    let err = store.get_model_alias("hetero_lr_0").unwrap_err();
    assert!(matches!(err, StoreError::AmbiguousAlias { count: 2, .. }));
    assert!(err.to_string().contains("hetero_lr_0"));
}

#[test]
fn test_concurrent_saves_merge_every_component() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(open(&dir, "v1"));
    store.create().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let model = ComponentModel::new(format!("component_{}", i), "Module", "model")
                    .with_buffer("param", BufferEntry::new("Param", vec![i as u8]));
                store.save_component_model(model).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.model_proto().unwrap().len(), 8);
    assert!(!store.lock().is_held());
}

#[test]
fn test_separate_handles_share_lock() {
    let dir = TempDir::new().unwrap();
    let a = open(&dir, "v1");
    let b = open(&dir, "v1");
    a.create().unwrap();

    let _guard = a.lock().acquire().unwrap();
    assert!(b.lock().is_held());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Encoded reads return exactly the bytes that were saved.
    #[test]
    fn encoded_read_returns_saved_bytes(data in prop::collection::vec(any::<u8>(), 0..2048)) {
        let dir = TempDir::new().unwrap();
        let store = open(&dir, "v1");
        store.create().unwrap();
        store.save_component_model(lr_model(&data)).unwrap();

        let buffers = store
            .read_component_model("hetero_lr_0", "model", OutputFormat::Encoded)
            .unwrap();
        let (type_name, encoded) = buffers["param"].as_encoded().unwrap();
        prop_assert_eq!(type_name, "LRModelParam");
        prop_assert_eq!(BASE64.decode(encoded).unwrap(), data);
    }
}
