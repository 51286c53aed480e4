//! RESP command serializer.
//!
//! Encodes a command name and its arguments into the RESP bulk string array
//! wire format: `*<N>\r\n$<len>\r\nname\r\n$<len>\r\narg1\r\n…`

use bytes::Bytes;
use itoa::Buffer;

/// One command argument.
///
/// Every kind is sent as a bulk string; integers as their decimal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Text(String),
    Bytes(Bytes),
    Int(i64),
}

impl Arg {
    /// Bytes on the wire for non-integer arguments, `None` for integers.
    fn raw(&self) -> Option<&[u8]> {
        match self {
            Self::Text(s) => Some(s.as_bytes()),
            Self::Bytes(b) => Some(b),
            Self::Int(_) => None,
        }
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&String> for Arg {
    fn from(v: &String) -> Self {
        Self::Text(v.clone())
    }
}

impl From<&[u8]> for Arg {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(v))
    }
}

impl<const N: usize> From<&[u8; N]> for Arg {
    fn from(v: &[u8; N]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(v))
    }
}

impl From<Vec<u8>> for Arg {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(v))
    }
}

impl From<Bytes> for Arg {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

macro_rules! int_arg {
    ($($t:ty),+) => {
        $(impl From<$t> for Arg {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        })+
    };
}

int_arg!(i64, i32, i16, i8, u32, u16, u8);

/// A command name plus its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<Arg>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append every argument of `args`, in order.
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[Arg] {
        &self.args
    }

    /// Encode into a fresh buffer.
    pub fn encode(&self) -> Vec<u8> {
        encode(&self.name, &self.args)
    }

    /// Append the encoded command to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        encode_into(buf, &self.name, &self.args);
    }
}

/// Encode `name` and `args` into RESP wire format.
///
/// # Example
/// ```ignore
/// let bytes = encode("SET", &["key".into(), 1i64.into()]);
/// // → *3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$1\r\n1\r\n
/// ```
pub fn encode(name: &str, args: &[Arg]) -> Vec<u8> {
    // Pre-calculate capacity; integers need at most 20 digits
    let mut cap = 1 + 10 + 2 + 1 + 10 + 2 + name.len() + 2;
    for arg in args {
        cap += 1 + 10 + 2 + arg.raw().map_or(20, <[u8]>::len) + 2;
    }
    let mut buf = Vec::with_capacity(cap);
    encode_into(&mut buf, name, args);
    buf
}

/// Append the encoding of `name` and `args` to `buf`.
pub fn encode_into(buf: &mut Vec<u8>, name: &str, args: &[Arg]) {
    let mut itoa_buf = Buffer::new();

    // *<N>\r\n
    buf.push(b'*');
    buf.extend_from_slice(itoa_buf.format(args.len() + 1).as_bytes());
    buf.extend_from_slice(b"\r\n");

    push_bulk(buf, &mut itoa_buf, name.as_bytes());
    for arg in args {
        match arg {
            Arg::Int(n) => {
                let mut digits = Buffer::new();
                push_bulk(buf, &mut itoa_buf, digits.format(*n).as_bytes());
            }
            Arg::Text(s) => push_bulk(buf, &mut itoa_buf, s.as_bytes()),
            Arg::Bytes(b) => push_bulk(buf, &mut itoa_buf, b),
        }
    }
}

/// `$<len>\r\n<data>\r\n`
#[inline]
fn push_bulk(buf: &mut Vec<u8>, itoa_buf: &mut Buffer, data: &[u8]) {
    buf.push(b'$');
    buf.extend_from_slice(itoa_buf.format(data.len()).as_bytes());
    buf.extend_from_slice(b"\r\n");
    buf.extend_from_slice(data);
    buf.extend_from_slice(b"\r\n");
}

/// Helper macro for building commands ergonomically.
///
/// Usage:
/// ```ignore
/// let set = cmd!("SET", "mykey", 42);
/// let get = cmd!("GET", key_var);
/// ```
#[macro_export]
macro_rules! cmd {
    ($name:expr $(, $arg:expr)* $(,)?) => {{
        $crate::resp::Command::new($name)$(.arg($arg))*
    }};
}

// ── Tests ──────────────────────────────────────────────────────────
