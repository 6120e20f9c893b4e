pub mod error;
pub mod keys;
pub mod notice;
pub mod pool;
pub mod pubsub;
pub mod rate_limiter;
pub mod session;
pub mod snapshot;

pub use error::CacheError;
pub use pool::{create_pool, CachePool};
