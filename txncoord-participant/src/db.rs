use async_trait::async_trait;
use deadpool_postgres::{Client, Pool};
use tracing::warn;
use txncoord_base::Result;

/// Service-specific work that must run inside the open local transaction
/// before `PREPARE TRANSACTION`. An `Err` return is a normal abort vote
/// (insufficient balance, unknown user, etc.), not a system failure.
#[async_trait]
pub trait BusinessLogic: Send + Sync {
    async fn execute(&self, client: &Client, payload: &[u8]) -> Result<()>;
}

/// Abstracts the local database's support for externally-named prepared
/// transactions (`PREPARE TRANSACTION` / `COMMIT PREPARED` / `ROLLBACK
/// PREPARED`) behind a trait so the participant state machine can be tested
/// without a live Postgres instance.
#[async_trait]
pub trait LocalDb: Send + Sync {
    async fn prepare(&self, tx_id: &str, payload: &[u8], logic: &dyn BusinessLogic) -> Result<()>;
    async fn commit_prepared(&self, tx_id: &str) -> Result<()>;
    async fn rollback_prepared(&self, tx_id: &str) -> Result<()>;
}

pub struct PostgresDb {
    pool: Pool,
}

impl PostgresDb {
    pub fn new(pool: Pool) -> Self {
        PostgresDb { pool }
    }
}

fn quote_ident(tx_id: &str) -> String {
    tx_id.replace('\'', "''")
}

/// Postgres reports a missing prepared transaction as `42704` (undefined
/// object) -- finalize must treat that as "already done", not an error.
fn is_undefined_object(err: &tokio_postgres::Error) -> bool {
    err.code().map(|c| c.code() == "42704").unwrap_or(false)
}

#[async_trait]
impl LocalDb for PostgresDb {
    async fn prepare(&self, tx_id: &str, payload: &[u8], logic: &dyn BusinessLogic) -> Result<()> {
        let client = self.pool.get().await?;
        client.batch_execute("BEGIN").await?;

        if let Err(e) = logic.execute(&client, payload).await {
            if let Err(rollback_err) = client.batch_execute("ROLLBACK").await {
                warn!(target: "txncoord", tx_id, error = %rollback_err, "failed to roll back after business logic error");
            }
            return Err(e);
        }

        client
            .batch_execute(&format!("PREPARE TRANSACTION '{}'", quote_ident(tx_id)))
            .await?;
        Ok(())
    }

    async fn commit_prepared(&self, tx_id: &str) -> Result<()> {
        let client = self.pool.get().await?;
        match client
            .batch_execute(&format!("COMMIT PREPARED '{}'", quote_ident(tx_id)))
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if is_undefined_object(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn rollback_prepared(&self, tx_id: &str) -> Result<()> {
        let client = self.pool.get().await?;
        match client
            .batch_execute(&format!("ROLLBACK PREPARED '{}'", quote_ident(tx_id)))
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if is_undefined_object(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
