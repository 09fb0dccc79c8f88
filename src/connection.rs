use crate::error::BoxError;
use crate::value::{Row, Value};
use async_trait::async_trait;

/// The capability set a pooled connection type must expose.
///
/// Conformance is checked by the compiler through trait satisfaction; the
/// pool itself only ever invokes [`close`](Connection::close), during
/// shutdown. `commit` and `cursor` are part of the consumer-facing
/// contract and pass through the pool untouched.
#[async_trait]
pub trait Connection: Send {
    type Cursor: Cursor;

    /// Disposes of the underlying resource. Called once, at pool shutdown.
    async fn close(&mut self) -> Result<(), BoxError>;

    async fn commit(&mut self) -> Result<(), BoxError>;

    /// Opens a new cursor over this connection.
    async fn cursor(&mut self) -> Result<Self::Cursor, BoxError>;
}

/// The capability set a cursor type must expose.
#[async_trait]
pub trait Cursor: Send {
    async fn close(&mut self) -> Result<(), BoxError>;

    /// Executes one statement, returning the affected row count.
    async fn execute(&mut self, operation: &str, parameters: &[Value]) -> Result<u64, BoxError>;

    /// Executes one statement once per parameter set.
    async fn execute_many(
        &mut self,
        operation: &str,
        parameter_sets: &[Vec<Value>],
    ) -> Result<u64, BoxError>;

    async fn fetch_one(&mut self) -> Result<Option<Row>, BoxError>;

    async fn fetch_many(&mut self, size: usize) -> Result<Vec<Row>, BoxError>;

    async fn fetch_all(&mut self) -> Result<Vec<Row>, BoxError>;
}
