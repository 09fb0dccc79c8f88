use dashmap::DashMap;
use tracing::debug;

use crate::config::PoolOptions;
use crate::error::{BoxError, PoolError};
use crate::factory::ConnectionFactory;
use crate::pool::Pool;

/// A named registry of pools sharing one factory type.
///
/// Constructed by the application's composition root and passed down
/// explicitly; there is no process-global instance.
pub struct PoolRegistry<F: ConnectionFactory> {
    pools: DashMap<String, Pool<F>>,
}

impl<F: ConnectionFactory> PoolRegistry<F> {
    pub fn new() -> Self {
        PoolRegistry {
            pools: DashMap::new(),
        }
    }

    /// Builds a pool from `options` and `factory` and stores it under
    /// `name`, replacing any pool previously registered with that name.
    pub fn register(&self, name: &str, options: PoolOptions, factory: F) -> Result<(), PoolError> {
        let pool = Pool::new(options, factory)?;
        if self.pools.insert(name.to_string(), pool).is_some() {
            debug!(name, "replaced existing pool registration");
        }
        Ok(())
    }

    /// Returns a handle to the pool registered under `name`.
    pub fn pool(&self, name: &str) -> Option<Pool<F>> {
        self.pools.get(name).map(|entry| entry.value().clone())
    }

    /// Shuts down every registered pool, collecting disposal failures
    /// across pools rather than stopping at the first one.
    pub async fn close_all(&self) -> Result<(), PoolError> {
        let pools: Vec<Pool<F>> = self.pools.iter().map(|entry| entry.value().clone()).collect();
        let mut failures: Vec<BoxError> = Vec::new();
        for pool in pools {
            match pool.close_all().await {
                Ok(()) => {}
                Err(PoolError::Shutdown(errs)) => failures.extend(errs),
                Err(other) => failures.push(Box::new(other)),
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(PoolError::Shutdown(failures))
        }
    }
}

impl<F: ConnectionFactory> Default for PoolRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}
