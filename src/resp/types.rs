use bytes::Bytes;

/// One parsed RESP2 reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// +OK\r\n
    Status(String),
    /// -ERR message\r\n
    Error(String),
    /// :1000\r\n
    Integer(i64),
    /// $6\r\nfoobar\r\n
    Bulk(Bytes),
    /// $-1\r\n
    Nil,
    /// *2\r\n…
    Array(Vec<Reply>),
    /// *-1\r\n
    NilArray,
}

// ── Convenience accessors ──────────────────────────────────────────

impl Reply {
    /// Try to interpret this reply as a UTF-8 string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Status(s) => Some(s),
            Self::Bulk(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Try to interpret this reply as bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bulk(b) => Some(b),
            Self::Status(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Try to interpret this reply as i64.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to interpret this reply as an array (consumes self).
    pub fn into_array(self) -> Option<Vec<Reply>> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Take the bulk payload out of the reply (consumes self).
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Self::Bulk(b) => Some(b),
            Self::Status(s) => Some(Bytes::from(s)),
            _ => None,
        }
    }

    /// Returns true for a nil bulk string or a nil array.
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil | Self::NilArray)
    }

    /// Returns true when this is a server error reply.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns the error message if this is an error reply.
    pub fn as_error_msg(&self) -> Option<&str> {
        match self {
            Self::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// Returns the type name as a static string (useful for error messages).
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Error(_) => "error",
            Self::Integer(_) => "integer",
            Self::Bulk(_) => "bulk_string",
            Self::Nil => "nil",
            Self::Array(_) => "array",
            Self::NilArray => "nil_array",
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────
