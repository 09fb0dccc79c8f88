use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Notify;
use tokio::time;
use tracing::{debug, error, warn};

use crate::config::PoolOptions;
use crate::connection::Connection;
use crate::error::PoolError;
use crate::factory::ConnectionFactory;

/// Snapshot of pool accounting at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub maxsize: usize,
    /// Connections currently alive, idle and checked out together.
    pub created: usize,
    /// Connections currently idle in the pool.
    pub idle: usize,
}

struct PoolState<C> {
    idle: Vec<C>,
    created: usize,
}

struct PoolInner<F: ConnectionFactory> {
    factory: F,
    maxsize: usize,
    acquire_timeout: Option<Duration>,
    state: Mutex<PoolState<F::Conn>>,
    released: Notify,
}

impl<F: ConnectionFactory> PoolInner<F> {
    // A caller that panicked while holding the guard must not wedge the pool.
    fn state(&self) -> MutexGuard<'_, PoolState<F::Conn>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A bounded pool of lazily created connections.
///
/// Cloning the pool is cheap and yields another handle to the same state,
/// so it can be passed freely between tasks.
pub struct Pool<F: ConnectionFactory> {
    inner: Arc<PoolInner<F>>,
}

impl<F: ConnectionFactory> Clone for Pool<F> {
    fn clone(&self) -> Self {
        Pool {
            inner: self.inner.clone(),
        }
    }
}

impl<F: ConnectionFactory> fmt::Debug for Pool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.status();
        f.debug_struct("Pool")
            .field("maxsize", &status.maxsize)
            .field("created", &status.created)
            .field("idle", &status.idle)
            .finish()
    }
}

// Rolls back a reserved capacity slot when connection creation fails or the
// caller is cancelled while the factory is still connecting.
struct SlotGuard<'a, F: ConnectionFactory> {
    inner: &'a PoolInner<F>,
    armed: bool,
}

impl<F: ConnectionFactory> Drop for SlotGuard<'_, F> {
    fn drop(&mut self) {
        if self.armed {
            {
                let mut state = self.inner.state();
                state.created = state.created.saturating_sub(1);
            }
            // The slot is free again; let one parked checkout retry.
            self.inner.released.notify_one();
        }
    }
}

impl<F: ConnectionFactory> Pool<F> {
    /// Creates an empty pool. No connections are opened until the first
    /// checkout asks for one.
    pub fn new(options: PoolOptions, factory: F) -> Result<Self, PoolError> {
        if options.maxsize == 0 {
            return Err(PoolError::Config("maxsize must be at least 1".into()));
        }
        Ok(Pool {
            inner: Arc::new(PoolInner {
                factory,
                maxsize: options.maxsize,
                acquire_timeout: options.acquire_timeout,
                state: Mutex::new(PoolState {
                    idle: Vec::new(),
                    created: 0,
                }),
                released: Notify::new(),
            }),
        })
    }

    /// Checks out one connection, creating it if the pool holds no idle
    /// connection and capacity remains.
    ///
    /// Reuse order is LIFO: the most recently released connection is handed
    /// out first. At capacity the call parks until a connection is released;
    /// if [`PoolOptions::acquire_timeout`] is set the wait is bounded and
    /// expiry surfaces [`PoolError::Exhausted`].
    pub async fn acquire(&self) -> Result<F::Conn, PoolError> {
        match self.inner.acquire_timeout {
            Some(limit) => match time::timeout(limit, self.acquire_inner()).await {
                Ok(result) => result,
                Err(_) => Err(PoolError::Exhausted(limit)),
            },
            None => self.acquire_inner().await,
        }
    }

    async fn acquire_inner(&self) -> Result<F::Conn, PoolError> {
        loop {
            // Register interest before checking state so a release landing
            // between the check and the park below is not missed.
            let released = self.inner.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            let may_create = {
                let mut state = self.inner.state();
                if let Some(conn) = state.idle.pop() {
                    debug!(
                        idle = state.idle.len(),
                        created = state.created,
                        "reusing idle connection"
                    );
                    return Ok(conn);
                }
                if state.created < self.inner.maxsize {
                    state.created += 1;
                    true
                } else {
                    false
                }
            };

            if may_create {
                let mut slot = SlotGuard {
                    inner: self.inner.as_ref(),
                    armed: true,
                };
                let conn = self
                    .inner
                    .factory
                    .connect()
                    .await
                    .map_err(PoolError::Creation)?;
                slot.armed = false;
                debug!(maxsize = self.inner.maxsize, "created new connection");
                return Ok(conn);
            }

            released.await;
        }
    }

    /// Returns a previously checked-out connection to the idle set and
    /// wakes at most one parked checkout.
    ///
    /// A release that cannot correspond to a live checkout (more returns
    /// than checkouts, or a connection from elsewhere pushed into a fully
    /// idle pool) is rejected with [`PoolError::ProtocolViolation`] and the
    /// accounting is left untouched. A foreign connection released while
    /// some slot is outstanding cannot be told apart from the real one and
    /// is undefined under the caller contract.
    pub fn release(&self, conn: F::Conn) -> Result<(), PoolError> {
        {
            let mut state = self.inner.state();
            if state.idle.len() >= state.created {
                return Err(PoolError::ProtocolViolation);
            }
            state.idle.push(conn);
            debug!(
                idle = state.idle.len(),
                created = state.created,
                "connection released"
            );
        }
        self.inner.released.notify_one();
        Ok(())
    }

    /// Checks out a connection wrapped in a guard that releases it on every
    /// exit path, including early returns and panics.
    pub async fn connect(&self) -> Result<PooledConnection<F>, PoolError> {
        let conn = self.acquire().await?;
        Ok(PooledConnection {
            pool: self.clone(),
            conn: Some(conn),
        })
    }

    /// Closes every idle connection and resets the pool to empty.
    ///
    /// Disposal is best-effort: a failing close does not stop the rest, and
    /// the failures are reported together as [`PoolError::Shutdown`].
    /// Connections checked out at this moment are not reclaimed; callers
    /// must release them first or they are discarded on return. The pool
    /// itself stays usable and will create fresh connections on demand.
    pub async fn close_all(&self) -> Result<(), PoolError> {
        let drained = {
            let mut state = self.inner.state();
            state.created = 0;
            std::mem::take(&mut state.idle)
        };
        // Capacity is free again; every parked checkout may now create.
        self.inner.released.notify_waiters();

        let mut failures = Vec::new();
        let total = drained.len();
        for mut conn in drained {
            if let Err(err) = conn.close().await {
                error!(error = %err, "failed to close idle connection");
                failures.push(err);
            }
        }
        debug!(closed = total - failures.len(), total, "pool shut down");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(PoolError::Shutdown(failures))
        }
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state();
        PoolStatus {
            maxsize: self.inner.maxsize,
            created: state.created,
            idle: state.idle.len(),
        }
    }
}

/// A connection checked out of a [`Pool`], returned on drop.
///
/// Dereferences to the connection itself. The connection goes back to the
/// idle set exactly as it is; the pool performs no validation or reset on
/// return, so connection-level error recovery belongs to the consumer.
pub struct PooledConnection<F: ConnectionFactory> {
    pool: Pool<F>,
    conn: Option<F::Conn>,
}

impl<F: ConnectionFactory> PooledConnection<F> {
    /// Removes the connection from pool custody entirely.
    ///
    /// The capacity slot is freed, so a parked checkout may create a
    /// replacement. The caller becomes responsible for closing the
    /// detached connection.
    pub fn detach(mut self) -> F::Conn {
        let conn = self.conn.take().expect("connection already detached");
        {
            let mut state = self.pool.inner.state();
            state.created = state.created.saturating_sub(1);
        }
        self.pool.inner.released.notify_one();
        conn
    }
}

impl<F: ConnectionFactory> Deref for PooledConnection<F> {
    type Target = F::Conn;

    fn deref(&self) -> &Self::Target {
        self.conn.as_ref().expect("connection already detached")
    }
}

impl<F: ConnectionFactory> DerefMut for PooledConnection<F> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("connection already detached")
    }
}

impl<F: ConnectionFactory> fmt::Debug for PooledConnection<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl<F: ConnectionFactory> Drop for PooledConnection<F> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(err) = self.pool.release(conn) {
                // The pool was shut down while this connection was out; it
                // is discarded here instead of rejoining the idle set.
                warn!(error = %err, "discarding connection returned after shutdown");
            }
        }
    }
}
