//! Byte cache on top of any [`Call`] implementation.

use crate::client::Call;
use crate::cmd;
use crate::error::{Error, Result};
use crate::resp::types::Reply;

use bytes::Bytes;
use std::time::Duration;

/// Stores and fetches raw byte values by key.
#[derive(Debug, Clone)]
pub struct ByteCache<C> {
    client: C,
}

impl<C: Call> ByteCache<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// `SET key value`, expiring after `ttl` when it is non-zero.
    ///
    /// Sub-millisecond TTLs round up to one millisecond.
    pub async fn store(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut cmd = cmd!("SET", key, value);
        if !ttl.is_zero() {
            let ms = i64::try_from(ttl.as_millis().max(1)).unwrap_or(i64::MAX);
            cmd = cmd.arg("PX").arg(ms);
        }
        self.client.call(&cmd).await?;
        Ok(())
    }

    /// Fetch `key`. A missing key is `Ok(None)`.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        match self.client.call(&cmd!("GET", key)).await? {
            Reply::Bulk(b) => Ok(Some(b)),
            Reply::Nil => Ok(None),
            other => Err(Error::Type(format!(
                "GET returned {}, expected bulk string",
                other.type_name()
            ))),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

// ── Tests ──────────────────────────────────────────────────────────
