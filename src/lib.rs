//! A small Redis client speaking RESP over TCP or Unix sockets.
//!
//! [`Client`] sends one command per call over a bounded connection pool.
//! [`Pipeline`] buffers commands and streams their replies back over a
//! private connection. [`BlockingClient`] wraps both for synchronous code.

pub mod blocking;
pub mod cache;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod pipeline;
pub mod resp;
pub mod runtime;

pub use blocking::{BlockingClient, BlockingPipeline};
pub use cache::ByteCache;
pub use client::{Call, Client};
pub use config::{ClientConfig, Transport};
pub use error::{Error, RedisErrorKind, Result};
pub use pipeline::Pipeline;
pub use resp::{Arg, Command, Reply};
