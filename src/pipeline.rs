//! Pipelining client.
//!
//! [`Pipeline::call`] only buffers the encoded command. The first
//! [`Pipeline::read`] afterwards opens the private connection if needed,
//! flushes everything buffered in a single write and reads one reply; later
//! reads return the remaining replies in order.
//!
//! A `Pipeline` owns its connection and is driven through `&mut self`, so it
//! is never shared between tasks.

use crate::config::ClientConfig;
use crate::connection::conn::Connection;
use crate::error::{Error, Result};
use crate::resp::types::Reply;
use crate::resp::writer::Command;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Initial capacity of the command buffer (16 KB).
const DEFAULT_BUF_CAPACITY: usize = 16 * 1024;

/// Buffers commands and reads their replies over one private connection.
#[derive(Debug)]
pub struct Pipeline {
    config: Arc<ClientConfig>,
    conn: Option<Connection>,
    /// Encoded commands not yet sent.
    buf: Vec<u8>,
    /// Commands buffered or sent whose replies have not been read.
    queued: usize,
    /// Deadline applied to each read, if any.
    timeout: Option<Duration>,
}

impl Pipeline {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            config,
            conn: None,
            buf: Vec::with_capacity(DEFAULT_BUF_CAPACITY),
            queued: 0,
            timeout: None,
        }
    }

    /// Buffer `cmd`. Nothing is sent until the next [`read`](Self::read).
    pub fn call(&mut self, cmd: &Command) -> Result<()> {
        cmd.encode_into(&mut self.buf);
        self.queued += 1;
        Ok(())
    }

    /// Flush buffered commands and read one reply.
    ///
    /// Blocks until a reply arrives when nothing is pending. A failure to
    /// connect leaves the buffered commands and the queued count untouched.
    /// An error reply from the server consumes one queued reply. Any other
    /// failure, such as a timeout or a malformed frame, drops the connection:
    /// replies still owed on it are abandoned and the queued count resets to
    /// zero, so the next read dials again.
    pub async fn read(&mut self) -> Result<Reply> {
        let conn = match &mut self.conn {
            Some(conn) => conn,
            None => {
                let conn = Connection::open(&self.config).await?;
                debug!(addr = %self.config.addr, "opened pipeline connection");
                self.conn.insert(conn)
            }
        };

        conn.set_deadline(self.timeout.map(|t| Instant::now() + t));
        if !self.buf.is_empty() {
            let out = std::mem::take(&mut self.buf);
            let sent = conn.write_raw(&out).await;
            // Keep the allocation for the next batch.
            self.buf = out;
            self.buf.clear();
            if let Err(e) = sent {
                return Err(self.abandon(e));
            }
            trace!(queued = self.queued, "flushed pipeline");
        }

        let result = conn.read().await;
        match result {
            Err(e) if e.is_transport() => Err(self.abandon(e)),
            result => {
                self.queued = self.queued.saturating_sub(1);
                result
            }
        }
    }

    /// Drop the connection along with every reply still owed on it.
    fn abandon(&mut self, err: Error) -> Error {
        debug!(error = %err, abandoned = self.queued, "dropping pipeline connection");
        self.conn = None;
        self.queued = 0;
        err
    }

    /// Number of replies still expected.
    pub fn queued(&self) -> usize {
        self.queued
    }

    /// Read while replies are queued, stopping at the first error.
    ///
    /// On error the replies already read are dropped. After an error reply
    /// the remaining ones stay queued; after a connection failure they are
    /// abandoned as described on [`read`](Self::read).
    pub async fn read_all(&mut self) -> Result<Vec<Reply>> {
        let mut replies = Vec::with_capacity(self.queued);
        while self.queued > 0 {
            replies.push(self.read().await?);
        }
        Ok(replies)
    }

    /// Set the deadline applied to each [`read`](Self::read). `None` waits forever.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Whether the private connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Close the private connection. Buffered commands are kept, so a later
    /// read dials again and sends them.
    pub async fn close(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => conn.close().await,
            None => Ok(()),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────
