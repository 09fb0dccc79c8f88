//! A lightweight asynchronous connection pool.
//!
//! Connections are created lazily through a caller-supplied
//! [`ConnectionFactory`], bounded by a hard capacity, handed to exactly one
//! task at a time and returned to the pool on every exit path.

pub mod config;
pub mod connection;
pub mod error;
pub mod factory;
pub mod pool;
pub mod registry;
pub mod value;

pub use config::PoolOptions;
pub use connection::{Connection, Cursor};
pub use error::{BoxError, PoolError};
pub use factory::{ConnectionFactory, FactoryFn, factory_fn};
pub use pool::{Pool, PoolStatus, PooledConnection};
pub use registry::PoolRegistry;
pub use value::{Row, Value};
