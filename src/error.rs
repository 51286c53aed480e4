use std::io;

/// Structured Redis error kinds for programmatic matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedisErrorKind {
    /// Generic ERR
    Err,
    /// WRONGTYPE Operation against a key holding the wrong kind of value
    WrongType,
    /// NOAUTH Authentication required
    NoAuth,
    /// WRONGPASS invalid username-password pair
    WrongPass,
    /// LOADING Redis is loading the dataset in memory
    Loading,
    /// READONLY You can't write against a read only replica
    ReadOnly,
    /// NOSCRIPT No matching script
    NoScript,
    /// BUSY Redis is busy running a script
    Busy,
    /// Any other Redis error prefix
    Other(String),
}

impl RedisErrorKind {
    /// Classify a Redis error message by its leading word.
    pub fn from_error_msg(msg: &str) -> Self {
        let prefix = msg.split_whitespace().next().unwrap_or("UNKNOWN");
        match prefix {
            "ERR" => Self::Err,
            "WRONGTYPE" => Self::WrongType,
            "NOAUTH" => Self::NoAuth,
            "WRONGPASS" => Self::WrongPass,
            "LOADING" => Self::Loading,
            "READONLY" => Self::ReadOnly,
            "NOSCRIPT" => Self::NoScript,
            "BUSY" => Self::Busy,
            other => Self::Other(other.to_string()),
        }
    }
}

/// All error variants for respite.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// TCP / Unix socket level errors, including EOF from the server.
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),
    /// A dial, write or read ran past its deadline.
    #[error("timeout: {0}")]
    Timeout(String),
    /// Malformed RESP framing.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// RESP parser needs more data; used as control flow by the reader.
    #[error("incomplete RESP message")]
    Incomplete,
    /// The server answered with an error reply.
    #[error("redis error: {message}")]
    Redis {
        kind: RedisErrorKind,
        message: String,
    },
    /// Invalid client settings, detected before any I/O.
    #[error("configuration error: {0}")]
    Config(String),
    /// A reply had a different shape than the caller expected.
    #[error("type error: {0}")]
    Type(String),
}

impl Error {
    /// Create a Redis error from a raw error message, auto-parsing the kind.
    pub fn redis(msg: impl Into<String>) -> Self {
        let message = msg.into();
        let kind = RedisErrorKind::from_error_msg(&message);
        Self::Redis { kind, message }
    }

    /// Returns true when the connection that produced this error can no
    /// longer be trusted to be in sync with the server.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout(_) | Self::Protocol(_) | Self::Incomplete
        )
    }

    /// Returns true for a server error reply.
    pub fn is_redis(&self) -> bool {
        matches!(self, Self::Redis { .. })
    }

    /// Returns the server error kind, if this is a server error reply.
    pub fn redis_kind(&self) -> Option<&RedisErrorKind> {
        match self {
            Self::Redis { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Returns true if the underlying socket error was "connection refused".
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, Self::Connection(e) if e.kind() == io::ErrorKind::ConnectionRefused)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ── Tests ──────────────────────────────────────────────────────────
