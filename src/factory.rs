use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::connection::Connection;
use crate::error::BoxError;

/// Creates new connections on demand.
///
/// The pool owns its factory and invokes it only from within a checkout
/// that found no idle connection and free capacity. A factory must either
/// return a fully usable connection or fail; the pool never retries.
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    type Conn: Connection + 'static;

    async fn connect(&self) -> Result<Self::Conn, BoxError>;
}

type ConnectFuture<C> = Pin<Box<dyn Future<Output = Result<C, BoxError>> + Send>>;

/// A [`ConnectionFactory`] backed by an async closure, built with
/// [`factory_fn`].
pub struct FactoryFn<C> {
    f: Box<dyn Fn() -> ConnectFuture<C> + Send + Sync>,
}

/// Wraps a zero-argument async closure as a connection factory.
///
/// ```ignore
/// let factory = factory_fn(|| async { MemoryConnection::open().await });
/// let pool = Pool::new(PoolOptions::new(4), factory)?;
/// ```
pub fn factory_fn<C, Fut, F>(f: F) -> FactoryFn<C>
where
    C: Connection + 'static,
    Fut: Future<Output = Result<C, BoxError>> + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
{
    FactoryFn {
        f: Box::new(move || Box::pin(f())),
    }
}

#[async_trait]
impl<C: Connection + 'static> ConnectionFactory for FactoryFn<C> {
    type Conn = C;

    async fn connect(&self) -> Result<Self::Conn, BoxError> {
        (self.f)().await
    }
}
