//! Thread-blocking wrappers around [`Client`] and [`Pipeline`].
//!
//! Every method blocks the calling thread on the global runtime from
//! [`crate::runtime`]. Do not use these from inside an async context.

use crate::client::Client;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::resp::types::Reply;
use crate::resp::writer::Command;
use crate::runtime::block_on;

use std::time::Duration;

/// Blocking pooled client. Shareable between threads.
#[derive(Debug)]
pub struct BlockingClient {
    inner: Client,
}

impl BlockingClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            inner: Client::new(config),
        }
    }

    pub fn from_url(url: &str) -> Result<Self> {
        Ok(Self {
            inner: Client::from_url(url)?,
        })
    }

    /// Send `cmd` and wait for its reply. See [`Client::call`].
    pub fn call(&self, cmd: &Command) -> Result<Reply> {
        block_on(self.inner.call(cmd))
    }

    pub fn pipeline(&self) -> BlockingPipeline {
        BlockingPipeline {
            inner: self.inner.pipeline(),
        }
    }

    /// The async client underneath.
    pub fn as_async(&self) -> &Client {
        &self.inner
    }
}

impl From<Client> for BlockingClient {
    fn from(inner: Client) -> Self {
        Self { inner }
    }
}

/// Blocking pipelining client.
#[derive(Debug)]
pub struct BlockingPipeline {
    inner: Pipeline,
}

impl BlockingPipeline {
    pub fn call(&mut self, cmd: &Command) -> Result<()> {
        self.inner.call(cmd)
    }

    pub fn read(&mut self) -> Result<Reply> {
        block_on(self.inner.read())
    }

    pub fn read_all(&mut self) -> Result<Vec<Reply>> {
        block_on(self.inner.read_all())
    }

    pub fn queued(&self) -> usize {
        self.inner.queued()
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.inner.set_timeout(timeout);
    }

    pub fn close(&mut self) -> Result<()> {
        block_on(self.inner.close())
    }
}

// ── Tests ──────────────────────────────────────────────────────────
