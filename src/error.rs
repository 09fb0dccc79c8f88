use std::time::Duration;

use thiserror::Error;

/// Boxed error type used where foreign errors cross the pool boundary,
/// i.e. whatever the connection factory or a connection's `close` returns.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Represents errors that can occur in pool operations.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("invalid pool configuration: {0}")]
    Config(String),
    #[error("connection creation failed: {0}")]
    Creation(#[source] BoxError),
    #[error("pool exhausted: no connection became available within {0:?}")]
    Exhausted(Duration),
    #[error("connection was not checked out from this pool")]
    ProtocolViolation,
    #[error("{} connection(s) failed to close during shutdown", .0.len())]
    Shutdown(Vec<BoxError>),
}
