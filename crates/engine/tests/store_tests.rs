// crates/engine/tests/store_tests.rs
//! Store behavior, run against both storage backends

use syncledger_core::{
    ContentHash, ContentId, ContentMetadata, DeviceId, Identity, LedgerStorage, ManualClock,
    NewVersion, StoreError, Timestamp,
};
use syncledger_database::SqliteStorage;
use syncledger_engine::{EngineConfig, MemoryStorage, MetadataStore};

type Store<S> = MetadataStore<S, ManualClock>;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn alice() -> Identity {
    Identity::new("alice")
}

fn edit(device: &str, text: &str) -> NewVersion {
    NewVersion::new(
        ContentHash::digest(text.as_bytes()),
        DeviceId::from(device),
        text,
        text.len() as u64,
    )
}

async fn with_device_and_content<S: LedgerStorage>(store: &Store<S>, device: &str, content: &str) {
    store
        .register_device(&alice(), DeviceId::from(device), device)
        .await
        .unwrap();
    store
        .create_content(
            &alice(),
            ContentId::from(content),
            ContentMetadata::new(content, "txt", 0),
        )
        .await
        .unwrap();
}

async fn versions_count_up_from_two<S: LedgerStorage>(store: Store<S>, _clock: ManualClock) {
    with_device_and_content(&store, "d", "c").await;
    let c = ContentId::from("c");

    let mut previous_latest = 1;
    for expected in 2..=8u64 {
        let v = store
            .add_version(&alice(), &c, edit("d", &format!("rev {}", expected)))
            .await
            .unwrap();
        assert_eq!(v, expected);

        let latest = store
            .get_content_info(&alice(), &c)
            .await
            .unwrap()
            .unwrap()
            .latest_version;
        assert_eq!(latest, v);
        assert!(latest > previous_latest);
        previous_latest = latest;
    }
}

async fn sync_status_accepts_only_known_versions<S: LedgerStorage>(
    store: Store<S>,
    _clock: ManualClock,
) {
    with_device_and_content(&store, "d", "c").await;
    let c = ContentId::from("c");
    let d = DeviceId::from("d");
    for n in 0..3 {
        store
            .add_version(&alice(), &c, edit("d", &n.to_string()))
            .await
            .unwrap();
    }

    for v in 1..=4 {
        let status = store.update_sync_status(&alice(), &c, &d, v).await.unwrap();
        assert_eq!(status.latest_version, v);
    }
    for v in [5, 6, 100] {
        let err = store
            .update_sync_status(&alice(), &c, &d, v)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionNotFound { latest: 4, .. }));
    }

    let stored = store
        .get_device_sync_info(&alice(), &c, &d)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.latest_version, 4);
}

async fn device_list_unchanged_by_failures<S: LedgerStorage>(store: Store<S>, _clock: ManualClock) {
    store
        .register_device(&alice(), DeviceId::from("phone"), "Phone")
        .await
        .unwrap();

    let err = store
        .register_device(&alice(), DeviceId::from("phone"), "Phone again")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DeviceExists { .. }));

    let err = store
        .remove_device(&alice(), &DeviceId::from("tablet"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DeviceNotFound { .. }));

    let devices = store.get_user_devices(&alice()).await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].device_name, "Phone");
}

async fn create_update_round_trip<S: LedgerStorage>(store: Store<S>, clock: ManualClock) {
    let id = ContentId::from("report");
    store
        .create_content(&alice(), id.clone(), ContentMetadata::new("T", "txt", 100))
        .await
        .unwrap();

    let created = store.get_content_info(&alice(), &id).await.unwrap().unwrap();
    assert_eq!(created.latest_version, 1);
    assert_eq!(created.title, "T");

    clock.advance(1_000);
    store
        .update_content(&alice(), &id, ContentMetadata::new("T2", "txt", 200))
        .await
        .unwrap();

    let updated = store.get_content_info(&alice(), &id).await.unwrap().unwrap();
    assert!(updated.last_modified > created.last_modified);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.latest_version, 1);
    assert_eq!(updated.size_bytes, 200);
}

async fn end_to_end<S: LedgerStorage>(store: Store<S>, _clock: ManualClock) {
    with_device_and_content(&store, "D", "C").await;
    let c = ContentId::from("C");

    let v = store
        .add_version(
            &alice(),
            &c,
            NewVersion::new(ContentHash::digest(b"hash1"), DeviceId::from("D"), "init", 10),
        )
        .await
        .unwrap();
    assert_eq!(v, 2);

    let info = store
        .get_device_sync_info(&alice(), &c, &DeviceId::from("D"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(info.latest_version, 2);

    let err = store
        .update_sync_status(&alice(), &c, &DeviceId::from("D2"), 2)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidDevice { .. }));
}

async fn delete_does_not_cascade<S: LedgerStorage>(store: Store<S>, _clock: ManualClock) {
    with_device_and_content(&store, "d", "c").await;
    let c = ContentId::from("c");
    store.add_version(&alice(), &c, edit("d", "one")).await.unwrap();
    store.add_version(&alice(), &c, edit("d", "two")).await.unwrap();

    store.delete_content(&alice(), &c).await.unwrap();

    assert!(!store.content_exists(&alice(), &c).await.unwrap());
    for v in [2, 3] {
        assert!(store
            .get_version_details(&alice(), &c, v)
            .await
            .unwrap()
            .is_some());
    }
    assert!(store
        .get_device_sync_info(&alice(), &c, &DeviceId::from("d"))
        .await
        .unwrap()
        .is_some());

    let err = store
        .add_version(&alice(), &c, edit("d", "three"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotAuthorized { .. }));
}

async fn other_owners_are_rejected<S: LedgerStorage>(store: Store<S>, _clock: ManualClock) {
    with_device_and_content(&store, "d", "c").await;
    let bob = Identity::new("bob");
    let c = ContentId::from("c");
    store
        .register_device(&bob, DeviceId::from("d"), "Bob's d")
        .await
        .unwrap();

    let err = store.add_version(&bob, &c, edit("d", "x")).await.unwrap_err();
    assert!(matches!(err, StoreError::NotAuthorized { .. }));
    let err = store.delete_content(&bob, &c).await.unwrap_err();
    assert!(matches!(err, StoreError::NotAuthorized { .. }));
    let err = store
        .update_sync_status(&bob, &c, &DeviceId::from("d"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotAuthorized { .. }));
    let err = store
        .update_content(&bob, &c, ContentMetadata::new("x", "", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    // Bob's device registration did not leak into Alice's list
    assert_eq!(store.get_user_devices(&alice()).await.unwrap().len(), 1);
    assert!(store.content_exists(&alice(), &c).await.unwrap());
    assert!(!store.content_exists(&bob, &c).await.unwrap());
}

async fn capacity_is_per_identity<S: LedgerStorage>(store: Store<S>, _clock: ManualClock) {
    // Built with a limit of 3 devices
    for n in 0..3 {
        store
            .register_device(&alice(), DeviceId::from(format!("d{}", n).as_str()), "")
            .await
            .unwrap();
    }
    let err = store
        .register_device(&alice(), DeviceId::from("d3"), "")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::CapacityExceeded { limit: 3 }));

    store
        .register_device(&Identity::new("bob"), DeviceId::from("d3"), "")
        .await
        .unwrap();
}

async fn overview_and_history<S: LedgerStorage>(store: Store<S>, clock: ManualClock) {
    with_device_and_content(&store, "a", "c").await;
    store
        .register_device(&alice(), DeviceId::from("b"), "b")
        .await
        .unwrap();
    let c = ContentId::from("c");

    for n in 0..5 {
        clock.advance(10);
        store
            .add_version(&alice(), &c, edit("a", &format!("e{}", n)))
            .await
            .unwrap();
    }
    store
        .update_sync_status(&alice(), &c, &DeviceId::from("b"), 3)
        .await
        .unwrap();

    // Built with a history limit of 3
    let history: Vec<u64> = store
        .version_history(&alice(), &c)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.version)
        .collect();
    assert_eq!(history, vec![6, 5, 4]);

    let overview = store
        .content_sync_overview(&alice(), &c)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(overview.item.latest_version, 6);
    let pending: Vec<String> = overview
        .pending()
        .map(|p| p.status.device_id.to_string())
        .collect();
    assert_eq!(pending, vec!["b".to_string()]);
}

async fn timestamps_come_from_clock<S: LedgerStorage>(store: Store<S>, clock: ManualClock) {
    clock.set(Timestamp::from_millis(5_000));
    with_device_and_content(&store, "d", "c").await;
    let c = ContentId::from("c");

    clock.set(Timestamp::from_millis(9_000));
    store.add_version(&alice(), &c, edit("d", "v")).await.unwrap();

    let device = &store.get_user_devices(&alice()).await.unwrap()[0];
    assert_eq!(device.added_at, Timestamp::from_millis(5_000));
    let item = store.get_content_info(&alice(), &c).await.unwrap().unwrap();
    assert_eq!(item.created_at, Timestamp::from_millis(5_000));
    assert_eq!(item.last_modified, Timestamp::from_millis(9_000));
    let record = store
        .get_version_details(&alice(), &c, 2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.timestamp, Timestamp::from_millis(9_000));
}

fn memory_store() -> (Store<MemoryStorage>, ManualClock) {
    init_logging();
    let clock = ManualClock::new(Timestamp::from_millis(1));
    let store = MetadataStore::with_config(
        MemoryStorage::new(),
        clock.clone(),
        EngineConfig::new(3, 3),
    );
    (store, clock)
}

async fn sqlite_store() -> (Store<SqliteStorage>, ManualClock) {
    init_logging();
    let clock = ManualClock::new(Timestamp::from_millis(1));
    let storage = SqliteStorage::in_memory().await.unwrap();
    let store = MetadataStore::with_config(storage, clock.clone(), EngineConfig::new(3, 3));
    (store, clock)
}

macro_rules! on_both_backends {
    ($($name:ident),* $(,)?) => {
        mod memory {
            use super::*;
            $(
                #[tokio::test]
                async fn $name() {
                    let (store, clock) = memory_store();
                    super::$name(store, clock).await;
                }
            )*
        }

        mod sqlite {
            use super::*;
            $(
                #[tokio::test]
                async fn $name() {
                    let (store, clock) = sqlite_store().await;
                    super::$name(store, clock).await;
                }
            )*
        }
    };
}

on_both_backends!(
    versions_count_up_from_two,
    sync_status_accepts_only_known_versions,
    device_list_unchanged_by_failures,
    create_update_round_trip,
    end_to_end,
    delete_does_not_cascade,
    other_owners_are_rejected,
    capacity_is_per_identity,
    overview_and_history,
    timestamps_come_from_clock,
);
