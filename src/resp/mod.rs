pub mod parser;
pub mod types;
pub mod writer;

pub use parser::{parse, parse_slice};
pub use types::Reply;
pub use writer::{encode, encode_into, Arg, Command};
