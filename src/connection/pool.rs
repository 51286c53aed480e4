//! Bounded pool of Redis connections.
//!
//! A semaphore holds one permit per slot, so at most `pool_size` connections
//! are ever checked out. Connections are opened lazily on first use of a
//! slot. The idle queue uses `parking_lot::Mutex` (sync, held very briefly)
//! so connections can be returned in `Drop` without needing async.

use crate::config::ClientConfig;
use crate::connection::conn::Connection;
use crate::error::{Error, Result};

use parking_lot::Mutex as SyncMutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::debug;

/// A fixed-size pool of lazily opened connections.
#[derive(Debug)]
pub struct ConnectionPool {
    /// Opened connections ready for reuse (sync mutex, held very briefly).
    idle: SyncMutex<VecDeque<Connection>>,
    /// One permit per slot; a checked-out slot holds its permit.
    semaphore: Semaphore,
    config: Arc<ClientConfig>,
    max_size: usize,
}

impl ConnectionPool {
    /// Create a pool with `config.pool_size` empty slots. No I/O happens here.
    ///
    /// The size must be between 1 and [`Semaphore::MAX_PERMITS`].
    pub fn new(config: Arc<ClientConfig>) -> Result<Self> {
        let max_size = config.pool_size;
        if max_size == 0 {
            return Err(Error::Config("pool size not specified".into()));
        }
        if max_size > Semaphore::MAX_PERMITS {
            return Err(Error::Config(format!(
                "pool size {max_size} exceeds the maximum of {}",
                Semaphore::MAX_PERMITS
            )));
        }
        Ok(Self {
            idle: SyncMutex::new(VecDeque::with_capacity(max_size.min(1024))),
            semaphore: Semaphore::new(max_size),
            config,
            max_size,
        })
    }

    /// Check out a slot, waiting while all slots are in use.
    ///
    /// An empty slot is filled by dialing and handshaking a new connection.
    /// If that fails the slot stays empty and is released for the next caller.
    pub async fn acquire(&self) -> Result<PoolGuard<'_>> {
        let permit = self.semaphore.acquire().await.map_err(|_| {
            Error::Connection(std::io::Error::new(
                std::io::ErrorKind::Other,
                "pool semaphore closed",
            ))
        })?;

        // LIFO for cache warmth
        let idle = self.idle.lock().pop_back();
        let conn = match idle {
            Some(c) => c,
            None => {
                let conn = Connection::open(&self.config).await?;
                debug!(addr = %self.config.addr, "opened pooled connection");
                conn
            }
        };

        Ok(PoolGuard {
            conn: Some(conn),
            broken: false,
            pool: self,
            _permit: permit,
        })
    }

    /// Number of opened connections sitting idle.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Number of slots not currently checked out.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Return a connection to the pool (sync, safe for Drop).
    fn release(&self, conn: Connection) {
        let mut idle = self.idle.lock();
        if idle.len() < self.max_size {
            idle.push_back(conn);
        }
    }
}

/// A checked-out slot. Dropping the guard releases the slot.
///
/// A guard marked broken drops its connection instead of returning it,
/// leaving the slot empty so the next holder redials.
#[derive(Debug)]
pub struct PoolGuard<'a> {
    conn: Option<Connection>,
    broken: bool,
    pool: &'a ConnectionPool,
    _permit: SemaphorePermit<'a>,
}

impl PoolGuard<'_> {
    /// Access the underlying connection.
    pub fn conn(&mut self) -> &mut Connection {
        // Only `Drop` empties the option.
        self.conn.as_mut().expect("connection already released")
    }

    /// Discard the connection on release.
    pub fn mark_broken(&mut self) {
        self.broken = true;
    }

    /// Return the connection to the pool on release again.
    pub fn mark_healthy(&mut self) {
        self.broken = false;
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }
}

impl Drop for PoolGuard<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if self.broken {
                debug!("discarding broken pooled connection");
            } else {
                self.pool.release(conn);
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────
