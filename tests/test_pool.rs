//! Integration tests: connection pool behavior.

mod common;

use common::*;
use respite::cmd;
use respite::connection::ConnectionPool;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn pool_idle_count_after_call() {
    let mock = MockRedis::start().await;
    let client = mock.client(5);

    assert_eq!(client.pool_idle_count(), 0);
    client.call(&cmd!("PING")).await.unwrap();
    assert_eq!(client.pool_idle_count(), 1);
    assert_eq!(client.pool_available(), 5);
}

#[tokio::test]
async fn slots_fill_lazily() {
    let mock = MockRedis::start().await;
    let pool = ConnectionPool::new(Arc::new(mock.config(4))).unwrap();

    let mut g1 = pool.acquire().await.unwrap();
    let mut g2 = pool.acquire().await.unwrap();
    for guard in [&mut g1, &mut g2] {
        guard.conn().write(&cmd!("PING")).await.unwrap();
        guard.conn().read().await.unwrap();
    }
    assert_eq!(mock.accepted(), 2);
    drop((g1, g2));

    assert_eq!(pool.idle_count(), 2);
    let _g = pool.acquire().await.unwrap();
    assert_eq!(mock.accepted(), 2);
}

#[tokio::test]
async fn acquire_waits_for_release() {
    let mock = MockRedis::start().await;
    let pool = Arc::new(ConnectionPool::new(Arc::new(mock.config(1))).unwrap());

    let held = pool.acquire().await.unwrap();
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut guard = pool.acquire().await.unwrap();
            guard.conn().write(&cmd!("PING")).await.unwrap();
            guard.conn().read().await.unwrap()
        })
    };

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!waiter.is_finished());

    drop(held);
    let reply = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply.as_str(), Some("PONG"));
    assert_eq!(mock.accepted(), 1);
}

#[tokio::test]
async fn rapid_call_sequence_reuses_one_connection() {
    let mock = MockRedis::start().await;
    let client = mock.client(10);
    let p = test_prefix();

    for i in 0..50i64 {
        let key = format!("{p}_{i}");
        client.call(&cmd!("SET", &key, i)).await.unwrap();
    }
    for i in 0..50i64 {
        let key = format!("{p}_{i}");
        let reply = client.call(&cmd!("GET", &key)).await.unwrap();
        assert_eq!(reply.as_bytes(), Some(i.to_string().as_bytes()));
    }
    assert_eq!(mock.accepted(), 1);
}

#[tokio::test]
async fn failed_dial_leaves_slot_empty() {
    let client = respite::Client::new(respite::ClientConfig {
        pool_size: 2,
        timeout_ms: 100,
        ..respite::ClientConfig::new(respite::Transport::Tcp, "127.0.0.1:1")
    });

    for _ in 0..5 {
        let err = client.call(&cmd!("PING")).await.unwrap_err();
        assert!(err.is_transport());
    }
    assert_eq!(client.pool_available(), 2);
    assert_eq!(client.pool_idle_count(), 0);
}
