//! Pooled request/response client.
//!
//! [`Client`] is safe to share between tasks. Each [`Client::call`] checks a
//! connection out of a bounded pool, sends one command under a deadline and
//! reads its reply.

use crate::config::ClientConfig;
use crate::connection::pool::ConnectionPool;
use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::resp::types::Reply;
use crate::resp::writer::Command;

use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::time::Instant;
use tracing::{debug, trace};

/// Anything that can run one command and return its reply.
///
/// Consumers such as [`crate::cache::ByteCache`] depend on this seam rather
/// than on [`Client`] itself.
pub trait Call: Send + Sync {
    fn call(&self, cmd: &Command) -> impl Future<Output = Result<Reply>> + Send;
}

impl<C: Call> Call for Arc<C> {
    fn call(&self, cmd: &Command) -> impl Future<Output = Result<Reply>> + Send {
        (**self).call(cmd)
    }
}

/// A Redis client backed by a bounded connection pool.
#[derive(Debug)]
pub struct Client {
    config: Arc<ClientConfig>,
    /// Created on the first call.
    pool: OnceLock<ConnectionPool>,
}

impl Client {
    /// Create a client. No connection is opened until the first call.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
            pool: OnceLock::new(),
        }
    }

    /// Create a client from a `redis://` or `unix://` URL.
    pub fn from_url(url: &str) -> Result<Self> {
        Ok(Self::new(ClientConfig::from_url(url)?))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `cmd` on a pooled connection and return its reply.
    ///
    /// The configured timeout bounds the whole call: waiting for a free slot,
    /// dialing, the write and the read all share one deadline taken when the
    /// call starts. A connection is returned to the pool only after its reply
    /// has been read in full, or the server answered with an error reply.
    /// Any other outcome, including the future being dropped part way,
    /// discards it.
    pub async fn call(&self, cmd: &Command) -> Result<Reply> {
        let pool = self.pool()?;

        let start = Instant::now();
        let deadline = self.deadline(start);
        let acquired = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, pool.acquire()).await {
                Ok(acquired) => acquired,
                Err(_) => Err(Error::Timeout("pool acquire deadline exceeded".into())),
            },
            None => pool.acquire().await,
        };
        let mut guard = acquired.inspect_err(|e| {
            debug!(cmd = cmd.name(), error = %e, "acquire failed");
        })?;
        trace!(cmd = cmd.name(), elapsed_us = elapsed_us(start), "acquired connection");

        // Cleared once the reply is consumed.
        guard.mark_broken();
        let conn = guard.conn();
        conn.set_deadline(deadline);
        let result = async {
            conn.write(cmd).await?;
            trace!(cmd = cmd.name(), elapsed_us = elapsed_us(start), "wrote command");
            conn.read().await
        }
        .await;
        conn.set_deadline(None);

        match &result {
            Ok(_) => {
                guard.mark_healthy();
                trace!(cmd = cmd.name(), elapsed_us = elapsed_us(start), "read reply");
            }
            Err(e) if e.is_redis() => {
                guard.mark_healthy();
                trace!(cmd = cmd.name(), error = %e, "error reply");
            }
            Err(e) => debug!(cmd = cmd.name(), error = %e, "call failed, dropping connection"),
        }
        result
    }

    /// A pipelining client with its own private connection.
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.config.clone())
    }

    /// Number of opened connections sitting idle in the pool.
    pub fn pool_idle_count(&self) -> usize {
        self.pool.get().map_or(0, ConnectionPool::idle_count)
    }

    /// Number of pool slots not currently checked out.
    pub fn pool_available(&self) -> usize {
        self.pool
            .get()
            .map_or(self.config.pool_size, ConnectionPool::available)
    }

    fn pool(&self) -> Result<&ConnectionPool> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }
        let pool = ConnectionPool::new(self.config.clone())?;
        Ok(self.pool.get_or_init(|| pool))
    }

    fn deadline(&self, start: Instant) -> Option<Instant> {
        (self.config.timeout_ms > 0).then(|| start + self.config.timeout())
    }
}

fn elapsed_us(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}

impl Call for Client {
    async fn call(&self, cmd: &Command) -> Result<Reply> {
        Client::call(self, cmd).await
    }
}

// ── Tests ──────────────────────────────────────────────────────────
