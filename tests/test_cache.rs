//! Integration tests: byte cache over a pooled client.

mod common;

use bytes::Bytes;
use common::*;
use respite::ByteCache;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn store_and_get() {
    let mock = MockRedis::start().await;
    let cache = ByteCache::new(mock.client(2));
    let key = format!("{}_cache", test_prefix());

    cache.store(&key, b"payload", Duration::ZERO).await.unwrap();
    assert_eq!(
        cache.get(&key).await.unwrap(),
        Some(Bytes::from_static(b"payload"))
    );
}

#[tokio::test]
async fn get_missing_is_none() {
    let mock = MockRedis::start().await;
    let cache = ByteCache::new(mock.client(1));
    assert_eq!(cache.get("absent").await.unwrap(), None);
}

#[tokio::test]
async fn store_with_ttl() {
    let mock = MockRedis::start().await;
    let cache = ByteCache::new(mock.client(1));

    cache.store("ttl", b"v", Duration::from_secs(5)).await.unwrap();
    assert_eq!(cache.get("ttl").await.unwrap(), Some(Bytes::from_static(b"v")));
}

#[tokio::test]
async fn shared_client() {
    let mock = MockRedis::start().await;
    let client = Arc::new(mock.client(2));
    let cache = ByteCache::new(client.clone());

    cache.store("shared", b"x", Duration::ZERO).await.unwrap();
    let reply = client.call(&respite::cmd!("GET", "shared")).await.unwrap();
    assert_eq!(reply.as_bytes(), Some(&b"x"[..]));
}

#[tokio::test]
async fn transport_failure_propagates() {
    let cache = ByteCache::new(respite::Client::new(respite::ClientConfig {
        pool_size: 1,
        timeout_ms: 100,
        ..respite::ClientConfig::new(respite::Transport::Tcp, "127.0.0.1:1")
    }));
    assert!(cache.get("k").await.unwrap_err().is_transport());
}
