//! Client configuration and URL parsing.
//!
//! Supports the following URL schemes:
//! - `redis://[user:pass@]host[:port][/db]`            TCP
//! - `unix://[user:pass@]/path/to/redis.sock[?db=N]`   Unix domain socket

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default Redis port.
pub const DEFAULT_PORT: u16 = 6379;
/// Default server address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:6379";
/// Default number of pool slots.
pub const DEFAULT_POOL_SIZE: usize = 50;
/// Default per-call timeout (1 second).
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
/// Default maximum read buffer size (512 MB).
pub const DEFAULT_MAX_BUF_SIZE: usize = 512 * 1024 * 1024;

/// Stream socket kind used to reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// `host:port` over TCP.
    #[default]
    Tcp,
    /// Filesystem path of a Unix domain socket.
    Unix,
}

impl FromStr for Transport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "unix" => Ok(Self::Unix),
            other => Err(Error::Config(format!("unknown transport: {other}"))),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Unix => f.write_str("unix"),
        }
    }
}

/// Full client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Socket kind.
    pub transport: Transport,
    /// `host:port` for TCP, socket path for Unix.
    pub addr: String,
    /// Optional username (Redis 6+ ACL).
    pub username: Option<String>,
    /// Optional password; when set, `AUTH` is sent after dialing.
    pub password: Option<String>,
    /// Logical database; `SELECT` is sent after dialing when non-zero.
    pub db: u16,
    /// Number of pool slots. Must be > 0 before the first call.
    pub pool_size: usize,
    /// Per-call timeout in milliseconds, also used for dialing.
    pub timeout_ms: u64,
    /// Maximum read buffer size per connection in bytes.
    pub max_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Tcp,
            addr: DEFAULT_ADDR.to_string(),
            username: None,
            password: None,
            db: 0,
            pool_size: DEFAULT_POOL_SIZE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_buffer_size: DEFAULT_MAX_BUF_SIZE,
        }
    }
}

impl ClientConfig {
    /// Config for `addr` over `transport`, everything else default.
    pub fn new(transport: Transport, addr: impl Into<String>) -> Self {
        Self {
            transport,
            addr: addr.into(),
            ..Self::default()
        }
    }

    /// Parse a Redis URL into a ClientConfig.
    pub fn from_url(url: &str) -> Result<Self> {
        let mut config = Self::default();

        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| Error::Config(format!("invalid URL, missing ://: {url}")))?;

        match scheme {
            "redis" => parse_tcp_url(&mut config, rest)?,
            "unix" | "redis+unix" => parse_unix_url(&mut config, rest)?,
            "rediss" => {
                return Err(Error::Config("TLS connections (rediss://) are not supported".into()));
            }
            _ => return Err(Error::Config(format!("unknown URL scheme: {scheme}"))),
        }
        Ok(config)
    }

    /// Per-call timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Parse `[user:pass@]host[:port][/db]`
fn parse_tcp_url(config: &mut ClientConfig, rest: &str) -> Result<()> {
    config.transport = Transport::Tcp;
    let (host_part, db_part) = split_path(rest);

    if let Some(db_str) = db_part {
        config.db = parse_db(db_str)?;
    }

    let host_port = if let Some((userinfo, hp)) = host_part.rsplit_once('@') {
        parse_userinfo(config, userinfo);
        hp
    } else {
        host_part
    };

    let (host, port) = parse_host_port(host_port, DEFAULT_PORT)?;
    config.addr = if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    };
    Ok(())
}

/// Parse `[user:pass@]/path/to.sock[?db=N]`
fn parse_unix_url(config: &mut ClientConfig, rest: &str) -> Result<()> {
    config.transport = Transport::Unix;

    let (path_part, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };

    // Userinfo never contains '/', so an '@' before the first '/' splits it off.
    let path = match path_part.split_once('@') {
        Some((userinfo, path)) if !userinfo.contains('/') => {
            parse_userinfo(config, userinfo);
            path
        }
        _ => path_part,
    };

    if path.is_empty() {
        return Err(Error::Config("unix URL must include a socket path".into()));
    }
    config.addr = path.to_string();

    if let Some(query) = query {
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some(("db", v)) => config.db = parse_db(v)?,
                _ => return Err(Error::Config(format!("unknown URL parameter: {pair}"))),
            }
        }
    }
    Ok(())
}

// ── URL parsing helpers ────────────────────────────────────────────

/// Split `rest` into (before_path, Some(path)) or (rest, None).
fn split_path(rest: &str) -> (&str, Option<&str>) {
    match rest.split_once('/') {
        Some((before, after)) if !after.is_empty() => (before, Some(after)),
        Some((before, _)) => (before, None),
        None => (rest, None),
    }
}

fn parse_db(s: &str) -> Result<u16> {
    s.parse()
        .map_err(|_| Error::Config(format!("invalid db number: {s}")))
}

/// Parse `user:pass` or `:pass` into config.
fn parse_userinfo(config: &mut ClientConfig, userinfo: &str) {
    match userinfo.split_once(':') {
        Some((user, pass)) => {
            if !user.is_empty() {
                config.username = Some(user.to_string());
            }
            if !pass.is_empty() {
                config.password = Some(pass.to_string());
            }
        }
        None => {
            // A bare token is a password.
            if !userinfo.is_empty() {
                config.password = Some(userinfo.to_string());
            }
        }
    }
}

/// Parse `host[:port]` or `[ipv6]:port`.
fn parse_host_port(s: &str, default_port: u16) -> Result<(String, u16)> {
    let (mut host, port) = if s.starts_with('[') {
        let close = s
            .find(']')
            .ok_or_else(|| Error::Config(format!("unclosed IPv6 bracket: {s}")))?;
        let host = s[1..close].to_string();
        let port = match s[close + 1..].strip_prefix(':') {
            Some(port_str) => port_str
                .parse()
                .map_err(|_| Error::Config(format!("invalid port: {port_str}")))?,
            None => default_port,
        };
        (host, port)
    } else if let Some((h, p)) = s.rsplit_once(':') {
        match p.parse::<u16>() {
            Ok(port) => (h.to_string(), port),
            // Bare IPv6 without brackets
            Err(_) if h.contains(':') => (s.to_string(), default_port),
            Err(_) => return Err(Error::Config(format!("invalid port: {p}"))),
        }
    } else {
        (s.to_string(), default_port)
    };

    if host.is_empty() {
        host = "127.0.0.1".to_string();
    }
    Ok((host, port))
}

// ── Tests ──────────────────────────────────────────────────────────
