pub mod conn;
pub mod pool;
pub mod stream;

pub use conn::Connection;
pub use pool::{ConnectionPool, PoolGuard};
pub use stream::Stream;
