#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use upool::{BoxError, Connection, ConnectionFactory, Cursor, Row, Value};

pub struct TestCursor;

#[async_trait]
impl Cursor for TestCursor {
    async fn close(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn execute(&mut self, _operation: &str, _parameters: &[Value]) -> Result<u64, BoxError> {
        Ok(0)
    }

    async fn execute_many(
        &mut self,
        _operation: &str,
        _parameter_sets: &[Vec<Value>],
    ) -> Result<u64, BoxError> {
        Ok(0)
    }

    async fn fetch_one(&mut self) -> Result<Option<Row>, BoxError> {
        Ok(None)
    }

    async fn fetch_many(&mut self, _size: usize) -> Result<Vec<Row>, BoxError> {
        Ok(Vec::new())
    }

    async fn fetch_all(&mut self) -> Result<Vec<Row>, BoxError> {
        Ok(Vec::new())
    }
}

pub struct TestConnection {
    pub id: u64,
    closed: Arc<AtomicUsize>,
    fail_close: bool,
}

impl TestConnection {
    /// A connection that did not come from any pool's factory.
    pub fn stub(id: u64) -> Self {
        TestConnection {
            id,
            closed: Arc::new(AtomicUsize::new(0)),
            fail_close: false,
        }
    }
}

#[async_trait]
impl Connection for TestConnection {
    type Cursor = TestCursor;

    async fn close(&mut self) -> Result<(), BoxError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err("close failed".into());
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn cursor(&mut self) -> Result<TestCursor, BoxError> {
        Ok(TestCursor)
    }
}

/// Factory handing out numbered connections. The shared counters stay
/// observable after the factory moves into the pool.
pub struct TestFactory {
    pub sequence: Arc<AtomicU64>,
    /// Successful `connect` calls.
    pub connects: Arc<AtomicUsize>,
    /// `close` attempts across all connections from this factory.
    pub closed: Arc<AtomicUsize>,
    pub fail_connect: Arc<AtomicBool>,
    pub fail_close: bool,
}

impl TestFactory {
    pub fn new() -> Self {
        TestFactory {
            sequence: Arc::new(AtomicU64::new(0)),
            connects: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            fail_connect: Arc::new(AtomicBool::new(false)),
            fail_close: false,
        }
    }

    pub fn failing_close() -> Self {
        TestFactory {
            fail_close: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl ConnectionFactory for TestFactory {
    type Conn = TestConnection;

    async fn connect(&self) -> Result<TestConnection, BoxError> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err("factory offline".into());
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(TestConnection {
            id: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            closed: self.closed.clone(),
            fail_close: self.fail_close,
        })
    }
}
