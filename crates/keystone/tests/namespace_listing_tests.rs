// SPDX-License-Identifier: LGPL-2.1-or-later
// Copyright (C) 2025 Shahzad A. Bhatti <bhatti@plexobject.com>
//
// Integration tests for namespace scoping and metadata-backed listing

use plexspaces_keystone::backend::MemoryBackend;
use plexspaces_keystone::{
    Connection, ConnectionConfig, Driver, NativeConnection, Scope, Selection, Value,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

fn create_test_store() -> (NativeConnection, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = ConnectionConfig {
        driver: Driver::Memory,
        path: Some(temp_dir.path().to_path_buf()),
        max_redis_size: 64,
        ..Default::default()
    };
    let store = NativeConnection::with_backend(&config, Arc::new(MemoryBackend::new())).unwrap();
    (store, temp_dir)
}

async fn seed_clients(store: &NativeConnection) {
    let iam = Scope::ns("iam");
    store
        .put(&iam, "client:1", Value::from([("name", "Acme"), ("active", "yes")]), false)
        .await
        .unwrap();
    store
        .put(&iam, "client:2", Value::from([("name", "Globex"), ("active", "no")]), false)
        .await
        .unwrap();
    store
        .put(&iam, "settings", Value::from("strict"), false)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_scoped_put_is_isolated_from_root() {
    let (store, _temp_dir) = create_test_store();

    store.put(&Scope::ns("a"), "k", Value::from("v"), false).await.unwrap();

    assert_eq!(store.get(&Scope::ns("a"), "k", None).await.unwrap(), Some(Value::from("v")));
    assert_eq!(store.get(&Scope::root(), "a::k", None).await.unwrap(), Some(Value::from("v")));
    assert_eq!(store.get(&Scope::root(), "k", None).await.unwrap(), None);
    assert_eq!(store.get(&Scope::ns("b"), "k", None).await.unwrap(), None);
}

#[tokio::test]
async fn test_scope_does_not_leak_into_next_call() {
    let (store, _temp_dir) = create_test_store();

    store.put(&Scope::ns("a"), "k", Value::from("scoped"), false).await.unwrap();
    store.put(&Scope::root(), "k", Value::from("root"), false).await.unwrap();

    assert_eq!(store.get(&Scope::ns("a"), "k", None).await.unwrap(), Some(Value::from("scoped")));
    assert_eq!(store.get(&Scope::root(), "k", None).await.unwrap(), Some(Value::from("root")));
    assert_eq!(
        store.keys(&Scope::root(), "*").await.unwrap(),
        vec!["keystone:app/foundation::k".to_string()]
    );
}

#[tokio::test]
async fn test_nested_namespace_files_land_in_nested_directories() {
    let (store, temp_dir) = create_test_store();
    let scope = Scope::ns("billing/invoices");

    store.put(&scope, "2024", Value::from("z".repeat(100)), false).await.unwrap();

    let record = store.file_info(&scope, "2024").await.unwrap().unwrap();
    assert!(temp_dir.path().join("billing").join("invoices").join(&record.file).exists());
}

#[tokio::test]
async fn test_keys_are_filtered_and_sorted() {
    let (store, _temp_dir) = create_test_store();
    seed_clients(&store).await;
    store.put(&Scope::root(), "client:9", Value::from("elsewhere"), false).await.unwrap();

    let iam = Scope::ns("iam");
    assert_eq!(
        store.keys(&iam, "client:*").await.unwrap(),
        vec![
            "keystone:iam::client:1".to_string(),
            "keystone:iam::client:2".to_string()
        ]
    );
    assert_eq!(store.keys(&iam, "*").await.unwrap().len(), 3);

    // A filter naming a namespace ignores the scope
    assert_eq!(store.keys(&Scope::root(), "iam::client:*").await.unwrap().len(), 2);
    assert_eq!(
        store.keys(&Scope::root(), "client:*").await.unwrap(),
        vec!["keystone:app/foundation::client:9".to_string()]
    );
}

#[tokio::test]
async fn test_wildcard_namespace_filter_spans_namespaces() {
    let (store, _temp_dir) = create_test_store();
    seed_clients(&store).await;
    store.put(&Scope::root(), "client:9", Value::from("elsewhere"), false).await.unwrap();

    assert_eq!(
        store.keys(&Scope::root(), "*::client:*").await.unwrap(),
        vec![
            "keystone:app/foundation::client:9".to_string(),
            "keystone:iam::client:1".to_string(),
            "keystone:iam::client:2".to_string()
        ]
    );
    assert!(store.keys(&Scope::ns("missing"), "*").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_glob_matches_regex_metacharacters_literally() {
    let (store, _temp_dir) = create_test_store();
    let root = Scope::root();

    store.put(&root, "a.b", Value::from("dot"), false).await.unwrap();
    store.put(&root, "aXb", Value::from("x"), false).await.unwrap();

    assert_eq!(
        store.keys(&root, "a.b").await.unwrap(),
        vec!["keystone:app/foundation::a.b".to_string()]
    );
}

#[tokio::test]
async fn test_namespaces_are_sorted() {
    let (store, _temp_dir) = create_test_store();
    seed_clients(&store).await;
    store.put(&Scope::ns("zeta"), "k", Value::from("v"), false).await.unwrap();
    store.put(&Scope::root(), "k", Value::from("v"), false).await.unwrap();

    assert_eq!(
        store.namespaces().await.unwrap(),
        vec!["app/foundation".to_string(), "iam".to_string(), "zeta".to_string()]
    );
}

#[tokio::test]
async fn test_keys_vanish_after_forget() {
    let (store, _temp_dir) = create_test_store();
    seed_clients(&store).await;
    let iam = Scope::ns("iam");

    store.forget(&iam, "client:1", None).await.unwrap();

    assert_eq!(
        store.keys(&iam, "client:*").await.unwrap(),
        vec!["keystone:iam::client:2".to_string()]
    );
    assert_eq!(store.stats().await.unwrap().total_keys, 2);
}

#[tokio::test]
async fn test_values_whole_records_keyed_by_capture() {
    let (store, _temp_dir) = create_test_store();
    seed_clients(&store).await;

    let selection = store.values(&Scope::ns("iam"), "client:*", None, None).await.unwrap();
    let mut expected = BTreeMap::new();
    expected.insert("1".to_string(), Value::from([("name", "Acme"), ("active", "yes")]));
    expected.insert("2".to_string(), Value::from([("name", "Globex"), ("active", "no")]));
    assert_eq!(selection, Selection::Many(expected));
}

#[tokio::test]
async fn test_values_with_index_plucks_field() {
    let (store, _temp_dir) = create_test_store();
    seed_clients(&store).await;

    let selection = store
        .values(&Scope::ns("iam"), "client:*", Some("name"), None)
        .await
        .unwrap();
    let mut expected = BTreeMap::new();
    expected.insert("1".to_string(), Value::from("Acme"));
    expected.insert("2".to_string(), Value::from("Globex"));
    assert_eq!(selection, Selection::Many(expected));
}

#[tokio::test]
async fn test_values_with_index_and_value_filters_records() {
    let (store, _temp_dir) = create_test_store();
    seed_clients(&store).await;

    let selection = store
        .values(&Scope::ns("iam"), "client:*", Some("active"), Some("yes"))
        .await
        .unwrap();
    let mut expected = BTreeMap::new();
    expected.insert("1".to_string(), Value::from([("name", "Acme"), ("active", "yes")]));
    assert_eq!(selection, Selection::Many(expected));
}

#[tokio::test]
async fn test_values_single_key_returns_one() {
    let (store, _temp_dir) = create_test_store();
    seed_clients(&store).await;

    let selection = store.values(&Scope::ns("iam"), "settings", None, None).await.unwrap();
    assert_eq!(selection, Selection::One(Value::from("strict")));

    let missing = store.values(&Scope::ns("iam"), "nothing", None, None).await.unwrap();
    assert_eq!(missing, Selection::Many(BTreeMap::new()));
}

#[tokio::test]
async fn test_stats_track_placement() {
    let (store, _temp_dir) = create_test_store();
    let root = Scope::root();

    store.put(&root, "small", Value::from("s"), false).await.unwrap();
    store.put(&root, "large", Value::from("L".repeat(200)), false).await.unwrap();
    store.put(&Scope::ns("other"), "list", Value::from(vec!["a"]), false).await.unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_keys, 3);
    assert_eq!(stats.fast_keys, 2);
    assert_eq!(stats.file_keys, 1);
    assert_eq!(stats.namespaces, 2);
    assert_eq!(stats.backend_type, "InMemory");
}
