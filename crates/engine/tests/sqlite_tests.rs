// crates/engine/tests/sqlite_tests.rs
//! Integration tests for the SQLite-backed store

use std::sync::Arc;
use syncledger_config::Config;
use syncledger_core::{
    ContentHash, ContentId, ContentMetadata, DeviceId, ErrorKind, Identity, NewVersion,
};
use syncledger_engine::{open_store, ErrorReply, Request, Response, SqliteMetadataStore};
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config_in(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.database.path = dir
        .path()
        .join("ledger.db")
        .to_str()
        .unwrap()
        .to_string();
    config
}

async fn seeded(config: &Config) -> SqliteMetadataStore {
    let store = open_store(config).await.unwrap();
    let alice = Identity::new("alice");
    store
        .register_device(&alice, DeviceId::from("laptop"), "Laptop")
        .await
        .unwrap();
    store
        .create_content(&alice, ContentId::from("doc"), ContentMetadata::new("Doc", "md", 0))
        .await
        .unwrap();
    store
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_version_numbers_are_unique() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(seeded(&config_in(&dir)).await);

    let mut handles = Vec::new();
    for n in 0..20 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .add_version(
                    &Identity::new("alice"),
                    &ContentId::from("doc"),
                    NewVersion::new(
                        ContentHash::digest(format!("edit {}", n).as_bytes()),
                        DeviceId::from("laptop"),
                        format!("edit {}", n),
                        n,
                    ),
                )
                .await
        }));
    }

    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap().unwrap());
    }
    versions.sort_unstable();
    assert_eq!(versions, (2..=21).collect::<Vec<u64>>());

    let item = store
        .get_content_info(&Identity::new("alice"), &ContentId::from("doc"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.latest_version, 21);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_respects_capacity() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir);
    config.store.max_devices_per_identity = 5;
    let store = Arc::new(open_store(&config).await.unwrap());

    let mut handles = Vec::new();
    for n in 0..12 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .register_device(
                    &Identity::new("alice"),
                    DeviceId::from(format!("device-{}", n).as_str()),
                    "",
                )
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 5);
    assert_eq!(
        store
            .get_user_devices(&Identity::new("alice"))
            .await
            .unwrap()
            .len(),
        5
    );
}

#[tokio::test]
async fn test_state_survives_reopen() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let alice = Identity::new("alice");
    let doc = ContentId::from("doc");

    {
        let store = seeded(&config).await;
        store
            .add_version(
                &alice,
                &doc,
                NewVersion::new(ContentHash::digest(b"v2"), DeviceId::from("laptop"), "v2", 2),
            )
            .await
            .unwrap();
        syncledger_database::connection::close(store.storage().pool().clone()).await;
    }

    let store = open_store(&config).await.unwrap();
    assert!(store
        .is_user_device(&alice, &DeviceId::from("laptop"))
        .await
        .unwrap());
    let record = store
        .get_version_details(&alice, &doc, 2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.hash, ContentHash::digest(b"v2"));

    let next = store
        .add_version(
            &alice,
            &doc,
            NewVersion::new(ContentHash::digest(b"v3"), DeviceId::from("laptop"), "v3", 3),
        )
        .await
        .unwrap();
    assert_eq!(next, 3);
}

#[tokio::test]
async fn test_json_requests() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let store = seeded(&config_in(&dir)).await;
    let alice = Identity::new("alice");

    let request: Request = serde_json::from_str(
        r#"{
            "op": "add_version",
            "content_id": "doc",
            "hash": "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
            "device_id": "laptop",
            "change_description": "from json",
            "size_bytes": 3
        }"#,
    )
    .unwrap();
    let response = store.handle(&alice, request).await.unwrap();
    assert_eq!(response, Response::VersionAdded(2));

    let request: Request =
        serde_json::from_str(r#"{"op": "delete_content", "content_id": "doc"}"#).unwrap();
    let err = store
        .handle(&Identity::new("mallory"), request)
        .await
        .unwrap_err();
    let reply = ErrorReply::from(&err);
    assert_eq!(reply.kind, ErrorKind::NotAuthorized);

    let request: Request = serde_json::from_str(
        r#"{"op": "content_exists", "content_id": "doc", "owner": "alice"}"#,
    )
    .unwrap();
    let response = store
        .handle(&Identity::new("mallory"), request)
        .await
        .unwrap();
    assert_eq!(response, Response::Flag(true));
}
