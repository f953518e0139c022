// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end tests for the offline manager.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::storage::MemoryStorage;
use crate::test_helpers::{MockClock, MockProbe, MockTransport, Recorded, RecordingEvents, T0_MS};
use crate::token::StaticCredential;
use crate::transport::TransportError;
use minder_core::config::DEFAULT_STORAGE_KEY;
use minder_core::ConnectionType;
use std::time::Duration;

struct Fixture {
    manager: Arc<OfflineManager>,
    transport: Arc<MockTransport>,
    probe: Arc<MockProbe>,
    events: Arc<RecordingEvents>,
}

fn fixture_with(config: Config, storage: Option<Arc<dyn Storage>>, initial: NetworkState) -> Fixture {
    let transport = Arc::new(MockTransport::new());
    let probe = MockProbe::new(initial);
    let events = RecordingEvents::new();
    let mut builder = OfflineManager::builder_shared(transport.clone())
        .config(config)
        .probe(probe.clone())
        .events(events.clone())
        .clock(MockClock::new(T0_MS));
    if let Some(storage) = storage {
        builder = builder.storage(storage);
    }
    Fixture { manager: builder.build().unwrap(), transport, probe, events }
}

fn fixture() -> Fixture {
    fixture_with(Config::default(), None, NetworkState::offline())
}

fn wifi() -> NetworkState {
    NetworkState::online(ConnectionType::Wifi)
}

#[tokio::test]
async fn test_queued_offline_then_auto_sync_on_reconnect() {
    let f = fixture();
    f.manager.start().await;
    assert!(!f.manager.is_online());

    for url in ["/a", "/b", "/c"] {
        f.manager.add_to_queue(HttpMethod::Post, url, RequestOptions::new()).await.unwrap();
    }
    assert_eq!(f.transport.call_count(), 0);

    f.manager.set_network_state(wifi());
    f.events.wait_for_sync().await;

    let stats = f.events.completed_syncs().pop().unwrap();
    assert_eq!(stats.successful, 3);
    assert_eq!(stats.pending, 0);
    assert!(f.manager.get_queue().is_empty());
    assert_eq!(f.transport.call_count(), 3);
}

#[tokio::test]
async fn test_start_restores_and_replays_when_online() {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let persisted = serde_json::json!([
        {"id": "req-1", "method": "PUT", "url": "/saved", "timestamp": 1, "retryCount": 1},
    ]);
    storage.set_item(DEFAULT_STORAGE_KEY, persisted.to_string()).await.unwrap();

    let f = fixture_with(Config::default(), Some(storage.clone()), wifi());
    assert_eq!(f.manager.start().await, 1);
    f.events.wait_for_sync().await;

    assert_eq!(f.transport.calls_to("/saved"), 1);
    assert_eq!(storage.get_item(DEFAULT_STORAGE_KEY).await.unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_enqueue_before_start_keeps_persisted_queue() {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let persisted = serde_json::json!([
        {"id": "req-1", "method": "POST", "url": "/old1", "timestamp": 1},
        {"id": "req-2", "method": "POST", "url": "/old2", "timestamp": 2},
    ]);
    storage.set_item(DEFAULT_STORAGE_KEY, persisted.to_string()).await.unwrap();

    let f = fixture_with(Config::default(), Some(storage), NetworkState::offline());
    f.manager.add_to_queue(HttpMethod::Post, "/new", RequestOptions::new()).await.unwrap();
    assert_eq!(f.manager.start().await, 3);

    let urls: Vec<String> = f.manager.get_queue().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, vec!["/old1", "/old2", "/new"]);
}

#[tokio::test]
async fn test_auto_sync_disabled() {
    let mut config = Config::default();
    config.offline.auto_sync = false;
    let f = fixture_with(config, None, NetworkState::offline());
    f.manager.add_to_queue(HttpMethod::Post, "/a", RequestOptions::new()).await.unwrap();

    f.manager.set_network_state(wifi());
    tokio::task::yield_now().await;

    assert_eq!(f.transport.call_count(), 0);
    assert!(matches!(f.manager.sync().await, SyncOutcome::Completed(_)));
    assert_eq!(f.transport.call_count(), 1);
}

#[tokio::test]
async fn test_without_probe_initial_state_decides_connectivity() {
    let transport = Arc::new(MockTransport::new());
    let offline = OfflineManager::builder_shared(transport.clone()).build().unwrap();
    offline.start().await;
    offline.add_to_queue(HttpMethod::Post, "/a", RequestOptions::new()).await.unwrap();
    assert!(!offline.is_online());
    assert_eq!(offline.sync().await, SyncOutcome::Offline);

    let online = OfflineManager::builder_shared(transport.clone())
        .initial_network_state(wifi())
        .build()
        .unwrap();
    online.start().await;
    online.add_to_queue(HttpMethod::Post, "/b", RequestOptions::new()).await.unwrap();
    assert!(online.is_online());
    assert!(matches!(online.sync().await, SyncOutcome::Completed(_)));
    assert_eq!(transport.calls_to("/b"), 1);
}

#[tokio::test]
async fn test_sync_while_offline_is_skipped() {
    let f = fixture();
    f.manager.add_to_queue(HttpMethod::Post, "/a", RequestOptions::new()).await.unwrap();

    assert_eq!(f.manager.sync().await, SyncOutcome::Offline);
    assert_eq!(f.transport.call_count(), 0);
    assert_eq!(f.manager.get_queue().len(), 1);
}

#[tokio::test]
async fn test_network_change_events() {
    let f = fixture();
    f.manager.set_network_state(wifi());
    f.manager.set_network_state(NetworkState::online(ConnectionType::Ethernet));
    f.manager.set_network_state(NetworkState::offline());

    let changes: Vec<Recorded> = f
        .events
        .log()
        .into_iter()
        .filter(|e| matches!(e, Recorded::NetworkChange(_)))
        .collect();
    assert_eq!(changes, vec![Recorded::NetworkChange(true), Recorded::NetworkChange(false)]);
    assert_eq!(f.manager.network_state(), NetworkState::offline());
}

#[tokio::test]
async fn test_check_network_state_uses_probe() {
    let f = fixture();
    f.probe.set(wifi());
    assert_eq!(f.manager.check_network_state().await, wifi());
    assert!(f.manager.is_online());
}

#[tokio::test]
async fn test_send_or_queue_offline_queues() {
    let f = fixture();
    let delivery =
        f.manager.send_or_queue(HttpMethod::Post, "/a", RequestOptions::new()).await.unwrap();
    assert!(matches!(delivery, Delivery::Queued(_)));
    assert_eq!(f.transport.call_count(), 0);
}

#[tokio::test]
async fn test_send_or_queue_online_sends_with_credential() {
    let transport = Arc::new(MockTransport::new());
    let manager = OfflineManager::builder_shared(transport.clone())
        .credentials(Arc::new(StaticCredential("tok".into())))
        .build()
        .unwrap();
    manager.set_network_state(wifi());

    let delivery =
        manager.send_or_queue(HttpMethod::Get, "/me", RequestOptions::new()).await.unwrap();

    assert_eq!(delivery, Delivery::Sent(crate::transport::TransportResponse::ok(200)));
    let sent = &transport.calls()[0];
    assert_eq!(sent.headers.get("Authorization").map(String::as_str), Some("Bearer tok"));
    assert!(manager.get_queue().is_empty());
}

#[tokio::test]
async fn test_send_or_queue_queues_retryable_failure() {
    let f = fixture();
    f.manager.set_network_state(wifi());
    f.transport.push_response("/a", Err(TransportError::Timeout));

    let delivery =
        f.manager.send_or_queue(HttpMethod::Post, "/a", RequestOptions::new()).await.unwrap();

    let queued = f.manager.get_queue();
    assert_eq!(queued.len(), 1);
    assert_eq!(delivery, Delivery::Queued(queued[0].id.clone()));
}

#[tokio::test]
async fn test_send_or_queue_returns_permanent_failure() {
    let f = fixture();
    f.manager.set_network_state(wifi());
    f.transport.push_response("/a", Err(TransportError::status(400, "bad")));

    let err =
        f.manager.send_or_queue(HttpMethod::Post, "/a", RequestOptions::new()).await.unwrap_err();

    assert!(matches!(err, crate::Error::Transport(_)), "{err}");
    assert!(f.manager.get_queue().is_empty());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = Config::default();
    config.offline.batch_size = 0;
    let result = OfflineManager::builder(MockTransport::new()).config(config).build();
    assert!(matches!(result, Err(crate::Error::Core(_))));
}

#[tokio::test(start_paused = true)]
async fn test_polling_detects_reconnect_until_shutdown() {
    let mut config = Config::default();
    config.network.poll_interval_secs = 1;
    let f = fixture_with(config, None, NetworkState::offline());
    f.manager.start().await;
    assert_eq!(f.probe.probe_count(), 1);

    f.probe.set(wifi());
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(f.manager.is_online());

    f.manager.shutdown();
    let probes = f.probe.probe_count();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(f.probe.probe_count(), probes);
}

#[tokio::test]
async fn test_manager_drop_is_not_kept_alive_by_monitor() {
    let f = fixture();
    let weak = Arc::downgrade(&f.manager);
    let monitor = f.manager.monitor().clone();
    drop(f);

    assert!(weak.upgrade().is_none());
    // Listener still runs but finds no manager
    monitor.update(wifi());
}
