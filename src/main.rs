use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use upool::{
    BoxError, Connection, ConnectionFactory, Cursor, Pool, PoolOptions, Row, Value,
};

struct MemoryCursor {
    rows: Vec<Row>,
    position: usize,
}

#[async_trait]
impl Cursor for MemoryCursor {
    async fn close(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn execute(&mut self, _operation: &str, parameters: &[Value]) -> Result<u64, BoxError> {
        self.rows.push(parameters.to_vec());
        Ok(1)
    }

    async fn execute_many(
        &mut self,
        operation: &str,
        parameter_sets: &[Vec<Value>],
    ) -> Result<u64, BoxError> {
        let mut affected = 0;
        for parameters in parameter_sets {
            affected += self.execute(operation, parameters).await?;
        }
        Ok(affected)
    }

    async fn fetch_one(&mut self) -> Result<Option<Row>, BoxError> {
        let row = self.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }

    async fn fetch_many(&mut self, size: usize) -> Result<Vec<Row>, BoxError> {
        let mut rows = Vec::with_capacity(size);
        while rows.len() < size {
            match self.fetch_one().await? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    async fn fetch_all(&mut self) -> Result<Vec<Row>, BoxError> {
        let rows = self.rows[self.position..].to_vec();
        self.position = self.rows.len();
        Ok(rows)
    }
}

struct MemoryConnection {
    id: u64,
}

#[async_trait]
impl Connection for MemoryConnection {
    type Cursor = MemoryCursor;

    async fn close(&mut self) -> Result<(), BoxError> {
        info!(id = self.id, "closing connection");
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    async fn cursor(&mut self) -> Result<MemoryCursor, BoxError> {
        Ok(MemoryCursor {
            rows: Vec::new(),
            position: 0,
        })
    }
}

struct MemoryFactory {
    sequence: AtomicU64,
}

#[async_trait]
impl ConnectionFactory for MemoryFactory {
    type Conn = MemoryConnection;

    async fn connect(&self) -> Result<MemoryConnection, BoxError> {
        // Stand-in for the handshake a real driver would perform.
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(MemoryConnection {
            id: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::new("debug")).init();

    let pool = Pool::new(
        PoolOptions::new(3).acquire_timeout(Duration::from_secs(5)),
        MemoryFactory {
            sequence: AtomicU64::new(0),
        },
    )?;

    let mut handles = Vec::new();
    for task in 0u32..8 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let mut conn = pool.connect().await?;
            info!(task, id = conn.id, "checked out");

            let mut cursor = conn.cursor().await.map_err(|e| anyhow::anyhow!("{e}"))?;
            cursor
                .execute(
                    "INSERT INTO audit (task) VALUES (?)",
                    &[Value::from(task as i64)],
                )
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            let rows = cursor.fetch_all().await.map_err(|e| anyhow::anyhow!("{e}"))?;
            info!(task, rows = rows.len(), "work done");

            tokio::time::sleep(Duration::from_millis(25)).await;
            anyhow::Ok(())
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let status = pool.status();
    info!(
        created = status.created,
        idle = status.idle,
        maxsize = status.maxsize,
        "workload drained"
    );

    pool.close_all().await?;
    info!("pool closed");
    Ok(())
}
