use std::time::Duration;

/// Pool construction options.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Upper bound on simultaneously live connections. Must be at least 1.
    pub maxsize: usize,
    /// Upper bound on how long a checkout may wait for capacity.
    /// `None` waits indefinitely.
    pub acquire_timeout: Option<Duration>,
}

impl PoolOptions {
    pub fn new(maxsize: usize) -> Self {
        PoolOptions {
            maxsize,
            acquire_timeout: None,
        }
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }
}
