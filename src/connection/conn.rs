//! A single connection to a Redis server.
//!
//! Wraps a [`Stream`] with an integrated read buffer and RESP parser. Bytes
//! past the end of the current reply stay buffered, so pipelined replies are
//! handed out one [`Connection::read`] at a time.

use crate::config::{ClientConfig, Transport};
use crate::connection::stream::Stream;
use crate::error::{Error, Result};
use crate::resp::parser::parse;
use crate::resp::types::Reply;
use crate::resp::writer::Command;
use crate::cmd;

use bytes::BytesMut;
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default initial read buffer capacity (16 KB).
const DEFAULT_BUF_CAPACITY: usize = 16 * 1024;

/// A single connection to a Redis server.
#[derive(Debug)]
pub struct Connection {
    stream: Stream,
    /// Data read from the socket but not yet consumed by the parser.
    buf: BytesMut,
    /// Maximum allowed buffer size.
    max_buf_size: usize,
    /// Absolute deadline applied to every write and read.
    deadline: Option<Instant>,
}

impl Connection {
    /// Dial `addr` over `transport`, giving up after `timeout` if one is set.
    pub async fn dial(transport: Transport, addr: &str, timeout: Option<Duration>) -> Result<Self> {
        let connect = Stream::connect(transport, addr);
        let stream = match timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect)
                .await
                .map_err(|_| {
                    Error::Timeout(format!(
                        "connection to {transport}:{addr} timed out after {timeout:?}"
                    ))
                })??,
            None => connect.await?,
        };
        debug!(%transport, addr, "dialed redis");
        Ok(Self {
            stream,
            buf: BytesMut::with_capacity(DEFAULT_BUF_CAPACITY),
            max_buf_size: crate::config::DEFAULT_MAX_BUF_SIZE,
            deadline: None,
        })
    }

    /// Dial and handshake using the client configuration.
    ///
    /// A connection whose handshake fails is dropped, never returned.
    pub async fn open(config: &ClientConfig) -> Result<Self> {
        let timeout = (config.timeout_ms > 0).then(|| config.timeout());
        let mut conn = Self::dial(config.transport, &config.addr, timeout).await?;
        conn.max_buf_size = config.max_buffer_size;
        if let Some(timeout) = timeout {
            conn.set_deadline(Some(Instant::now() + timeout));
        }
        conn.handshake(
            config.username.as_deref(),
            config.password.as_deref(),
            config.db,
        )
        .await?;
        conn.set_deadline(None);
        Ok(conn)
    }

    /// Send `AUTH` when a password is given and `SELECT` when `db != 0`.
    ///
    /// Each must be answered with a non-error reply.
    pub async fn handshake(
        &mut self,
        username: Option<&str>,
        password: Option<&str>,
        db: u16,
    ) -> Result<()> {
        if let Some(pass) = password.filter(|p| !p.is_empty()) {
            let auth = match username {
                Some(user) => cmd!("AUTH", user, pass),
                None => cmd!("AUTH", pass),
            };
            self.write(&auth).await?;
            self.read().await?;
            debug!("authenticated");
        }
        if db != 0 {
            self.write(&cmd!("SELECT", db)).await?;
            self.read().await?;
            debug!(db, "selected database");
        }
        Ok(())
    }

    /// Set (or clear) the absolute deadline for subsequent writes and reads.
    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn transport(&self) -> Transport {
        self.stream.transport()
    }

    /// Set the maximum number of bytes buffered for a single reply.
    pub fn set_max_buffer_size(&mut self, max: usize) {
        self.max_buf_size = max;
    }

    /// Encode `cmd` and write it to the socket in one call.
    pub async fn write(&mut self, cmd: &Command) -> Result<()> {
        self.write_raw(&cmd.encode()).await
    }

    /// Write pre-encoded bytes to the socket.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        let deadline = self.deadline;
        let stream = &mut self.stream;
        with_deadline(deadline, "write", async move {
            stream.write_all(data).await?;
            Ok(())
        })
        .await
    }

    /// Read exactly one reply.
    ///
    /// An error reply from the server is returned as [`Error::Redis`].
    pub async fn read(&mut self) -> Result<Reply> {
        let deadline = self.deadline;
        match with_deadline(deadline, "read", self.read_reply()).await? {
            Reply::Error(msg) => Err(Error::redis(msg)),
            reply => Ok(reply),
        }
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        loop {
            if !self.buf.is_empty() {
                // Parse from a frozen snapshot so bulk strings are zero-copy
                // slices; unconsumed bytes go back into the buffer.
                let snapshot = self.buf.split().freeze();
                match parse(&snapshot) {
                    Ok((reply, consumed)) => {
                        if consumed < snapshot.len() {
                            self.buf.extend_from_slice(&snapshot[consumed..]);
                        }
                        return Ok(reply);
                    }
                    Err(Error::Incomplete) => {
                        self.buf.extend_from_slice(&snapshot);
                    }
                    Err(e) => {
                        self.buf.extend_from_slice(&snapshot);
                        return Err(e);
                    }
                }
            }

            if self.buf.capacity() - self.buf.len() < 4096 {
                let new_cap = (self.buf.capacity() * 2).max(DEFAULT_BUF_CAPACITY);
                if new_cap > self.max_buf_size {
                    if self.buf.capacity() >= self.max_buf_size {
                        return Err(Error::Protocol(format!(
                            "RESP message too large: buffer would exceed {} bytes",
                            self.max_buf_size
                        )));
                    }
                    self.buf.reserve(self.max_buf_size - self.buf.len());
                } else {
                    self.buf.reserve(new_cap - self.buf.len());
                }
            }
            let n = self.stream.read_buf(&mut self.buf).await?;
            if n == 0 {
                return Err(Error::Connection(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed by server",
                )));
            }
        }
    }

    /// Shut the socket down.
    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.stream.shutdown().await {
            warn!(error = %e, "failed to shut down redis connection");
            return Err(e.into());
        }
        Ok(())
    }
}

async fn with_deadline<T>(
    deadline: Option<Instant>,
    op: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| Error::Timeout(format!("{op} deadline exceeded")))?,
        None => fut.await,
    }
}

// ── Tests ──────────────────────────────────────────────────────────
