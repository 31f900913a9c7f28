use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};
use txncoord_base::Result;
use txncoord_proto::{part_path, Status, TransactionData, TransactionType};
use txncoord_store::StoreClient;
use txncoord_watch::TransactionHandler;

use crate::db::{BusinessLogic, LocalDb};

const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Binds one participant's local database to its status node for one
/// transaction type. Implements [`TransactionHandler`] so it can be
/// registered directly with a `TransactionWatcher`.
pub struct ParticipantHandler<D> {
    store: Arc<dyn StoreClient>,
    db: Arc<D>,
    logic: Arc<dyn BusinessLogic>,
    tx_type: TransactionType,
    name: String,
}

impl<D: LocalDb> ParticipantHandler<D> {
    pub fn new(
        store: Arc<dyn StoreClient>,
        db: Arc<D>,
        logic: Arc<dyn BusinessLogic>,
        tx_type: TransactionType,
        name: impl Into<String>,
    ) -> Self {
        ParticipantHandler { store, db, logic, tx_type, name: name.into() }
    }

    fn own_path(&self, tx_id: &str) -> String {
        part_path(self.tx_type, tx_id, &self.name)
    }

    /// Rolls back the just-prepared local transaction and marks the
    /// participant node `ABORT`, best-effort, after a P3 store write fails.
    async fn abort_after_prepare(&self, tx_id: &str, path: &str) {
        if let Err(e) = self.db.rollback_prepared(tx_id).await {
            error!(target: "txncoord", tx_id, error = ?e, "failed to roll back local prepared transaction after vote publish failure");
        }
        if let Err(e) = self.store.set(path, &Status::Abort.to_bytes()).await {
            error!(target: "txncoord", tx_id, error = %e, "failed to publish ABORT after vote publish failure");
        }
    }

    async fn retry_commit(&self, tx_id: &str) {
        while let Err(e) = self.db.commit_prepared(tx_id).await {
            error!(target: "txncoord", tx_id, error = ?e, "commit prepared failed, retrying in 1s");
            tokio::time::sleep(RETRY_BACKOFF).await;
        }
    }

    async fn retry_rollback(&self, tx_id: &str) {
        while let Err(e) = self.db.rollback_prepared(tx_id).await {
            error!(target: "txncoord", tx_id, error = ?e, "rollback prepared failed, retrying in 1s");
            tokio::time::sleep(RETRY_BACKOFF).await;
        }
    }

    async fn publish_terminal(&self, path: &str, status: Status) {
        while let Err(e) = self.store.set(path, &status.to_bytes()).await {
            error!(target: "txncoord", %path, error = %e, "failed to publish terminal status, retrying in 1s");
            tokio::time::sleep(RETRY_BACKOFF).await;
        }
    }
}

#[async_trait]
impl<D: LocalDb + Send + Sync + 'static> TransactionHandler for ParticipantHandler<D> {
    async fn prepare(&self, tx: &TransactionData) -> Result<()> {
        let path = self.own_path(&tx.id);

        // Phase P1: gate on PREPARED. A token past PREPARED means a prior
        // run (or another watcher) already decided this participant's
        // fate; re-running local prepare would not be idempotent, so we
        // leave quietly.
        loop {
            let (data, watch) = self.store.get_and_watch(&path).await?;
            match Status::from_bytes(&data)? {
                Status::Prepared => break,
                Status::Init => watch.wait().await,
                _ => return Ok(()),
            }
        }

        // Phase P2: local prepare.
        if let Err(e) = self.db.prepare(&tx.id, &tx.payload, self.logic.as_ref()).await {
            self.store.set(&path, &Status::Abort.to_bytes()).await?;
            return Err(e);
        }

        // Phase P3: publish vote.
        if let Err(e) = self.store.set(&path, &Status::Ready.to_bytes()).await {
            self.abort_after_prepare(&tx.id, &path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn finalize(&self, tx_id: &str) -> Result<()> {
        let path = self.own_path(tx_id);
        loop {
            let (data, watch) = self.store.get_and_watch(&path).await?;
            match Status::from_bytes(&data)? {
                Status::Commit => {
                    self.retry_commit(tx_id).await;
                    self.publish_terminal(&path, Status::Committed).await;
                    info!(tx_id, "transaction committed");
                    return Ok(());
                }
                Status::RollBack => {
                    self.retry_rollback(tx_id).await;
                    self.publish_terminal(&path, Status::RolledBack).await;
                    info!(tx_id, "transaction rolled back");
                    return Ok(());
                }
                Status::Committed | Status::RolledBack => return Ok(()),
                _ => watch.wait().await,
            }
        }
    }
}
