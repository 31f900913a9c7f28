use std::sync::Arc;

use tracing::{error, info, info_span, Instrument};
use txncoord_base::{err, Result};
use txncoord_proto::{
    base_path, lock_path, part_path, tx_path, type_path, ResourceType, Status, TransactionData, TransactionType,
};
use txncoord_store::{create_idempotent, StoreClient, StoreError};

use crate::sweeper::SWEEP_INTERVAL;

/// Embedded in the initiating (coordinator) service. Drives a transaction
/// tree through Begin -> Prepare -> Vote -> Finalize against the
/// coordination store, and runs a background sweeper that reaps completed
/// trees.
pub struct TransactionManager {
    pub(crate) store: Arc<dyn StoreClient>,
}

impl TransactionManager {
    /// Idempotently lays down `basePath`, one child per registered
    /// transaction type, and `lockPath`, then launches the garbage sweeper.
    pub async fn new(store: Arc<dyn StoreClient>) -> Result<Arc<Self>> {
        let tm = Arc::new(TransactionManager { store });
        tm.init().await?;

        let sweeper = tm.clone();
        tokio::spawn(
            async move { sweeper.run_sweeper(SWEEP_INTERVAL).await }.instrument(info_span!("sweeper")),
        );

        Ok(tm)
    }

    async fn init(&self) -> Result<()> {
        info!("initializing transaction znodes");
        create_idempotent(self.store.as_ref(), &base_path()).await?;
        for tx_type in TransactionType::ALL {
            create_idempotent(self.store.as_ref(), &type_path(*tx_type)).await?;
        }
        create_idempotent(self.store.as_ref(), &lock_path()).await?;
        info!("transaction znodes initialized");
        Ok(())
    }

    /// Our isolation level is serializable: a tx id is globally unique and
    /// every participant node for it is created before `Begin` returns.
    ///
    /// `resources` is accepted but not acted on: resource locking is wired
    /// up in `acquire_exclusive_lock`/`release_exclusive_lock` but no
    /// production call graph invokes it from here (see the open design
    /// question on resource locks being unused).
    pub async fn begin(
        &self,
        tx_type: TransactionType,
        payload: Vec<u8>,
        participants: Vec<String>,
        _resources: Vec<ResourceType>,
    ) -> Result<String> {
        let tx_id = uuid::Uuid::new_v4().to_string();
        let data = TransactionData {
            id: tx_id.clone(),
            tx_type,
            timestamp: chrono::Utc::now(),
            payload,
            status: Status::Init,
            participants: participants.clone(),
        };

        self.store.create(&tx_path(tx_type, &tx_id), &data.to_json()?).await?;

        for participant in &participants {
            self.store
                .create(&part_path(tx_type, &tx_id, participant), &Status::Init.to_bytes())
                .await?;
        }

        Ok(tx_id)
    }

    /// Finds the tree that owns `tx_id` by scanning each registered type.
    async fn locate(&self, tx_id: &str) -> Result<TransactionType> {
        for tx_type in TransactionType::ALL {
            if self.store.exists(&tx_path(*tx_type, tx_id)).await? {
                return Ok(*tx_type);
            }
        }
        Err(err(format!("transaction id {tx_id} not found")))
    }

    pub async fn prepare(&self, tx_id: &str) -> Result<()> {
        let tx_type = self.locate(tx_id).await?;
        let path = tx_path(tx_type, tx_id);

        let mut data = TransactionData::from_json(&self.store.get(&path).await?)?;
        data.status = Status::Prepared;
        self.store.set(&path, &data.to_json()?).await?;

        // Best-effort fan-out: a lost write here is logged, not fatal --
        // the data node's status has already advanced, so a participant
        // that also watches it (see §9 open question 4) still has a path
        // to observe PREPARED.
        let children = self.store.children(&path).await?;
        for child in children {
            let child_path = format!("{path}/{child}");
            if let Err(e) = self.store.set(&child_path, &Status::Prepared.to_bytes()).await {
                error!(target: "txncoord", %child_path, error = %e, "failed to write PREPARED to participant node");
            }
        }

        Ok(())
    }

    /// Fans out one short-lived task per participant, each re-arming a
    /// watch on its node until it lands on `READY`, `ABORT`, or vanishes.
    /// Returns `true` iff every participant voted commit.
    pub async fn get_votes_result(&self, tx_id: &str) -> Result<bool> {
        let tx_type = self.locate(tx_id).await?;
        let path = tx_path(tx_type, tx_id);
        let children = self.store.children(&path).await?;

        let mut joins = Vec::with_capacity(children.len());
        for child in children {
            let store = self.store.clone();
            let child_path = format!("{path}/{child}");
            joins.push(tokio::spawn(async move { vote_for(store.as_ref(), &child_path).await }));
        }

        let mut is_commit = true;
        for join in joins {
            match join.await.map_err(|e| err(format!("vote task panicked: {e}")))? {
                Ok(vote_commit) => is_commit = is_commit && vote_commit,
                Err(e) => return Err(e),
            }
        }

        Ok(is_commit)
    }

    /// Writes the decision atop the data node, then atop every participant
    /// that voted `READY`. A participant that never reached `READY` (most
    /// commonly one that wrote `ABORT`) must not be asked to commit: it is
    /// moved straight to `ROLLED_BACK` instead, regardless of the overall
    /// decision.
    pub async fn finalize(&self, tx_id: &str, is_commit: bool) -> Result<()> {
        info!(tx_id, is_commit, "finalizing transaction");
        let tx_type = self.locate(tx_id).await?;
        let path = tx_path(tx_type, tx_id);
        let decision = if is_commit { Status::Commit } else { Status::RollBack };

        let mut data = TransactionData::from_json(&self.store.get(&path).await?)?;
        data.status = decision;
        self.store.set(&path, &data.to_json()?).await?;

        let children = self.store.children(&path).await?;
        for child in children {
            let child_path = format!("{path}/{child}");
            if let Err(e) = self.finalize_one(&child_path, decision).await {
                error!(target: "txncoord", %child_path, error = ?e, "failed to write decision to participant node");
            }
        }

        Ok(())
    }

    async fn finalize_one(&self, child_path: &str, decision: Status) -> Result<()> {
        let current = Status::from_bytes(&self.store.get(child_path).await?)?;
        let value = match current {
            Status::Ready => decision,
            // Never ask a participant that did not vote READY to commit.
            _ => Status::RolledBack,
        };
        self.store.set(child_path, &value.to_bytes()).await?;
        Ok(())
    }
}

async fn vote_for(store: &dyn StoreClient, path: &str) -> Result<bool> {
    loop {
        let (data, watch) = match store.get_and_watch(path).await {
            Ok(v) => v,
            Err(StoreError::NotFound) => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let status = Status::from_bytes(&data)?;
        match status {
            Status::Ready => return Ok(true),
            Status::Abort => return Ok(false),
            _ => watch.wait().await,
        }
    }
}
