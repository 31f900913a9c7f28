use std::time::Duration;

use tracing::{error, info};
use txncoord_base::Result;
use txncoord_proto::{base_path, Status, TransactionType};

use crate::manager::TransactionManager;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

impl TransactionManager {
    /// Runs forever, reaping completed transaction trees every `interval`.
    /// Sweeper failures are logged and swallowed: a transient store error
    /// must never block the next TM API call.
    pub(crate) async fn run_sweeper(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; skip it
        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep_once().await {
                error!(target: "txncoord", error = ?e, "garbage sweep failed");
            }
        }
    }

    pub(crate) async fn sweep_once(&self) -> Result<()> {
        for tx_type in TransactionType::ALL {
            let type_path = format!("{}/{}", base_path(), tx_type);
            let tx_ids = self.store.children(&type_path).await?;
            for tx_id in tx_ids {
                let tx_path = format!("{type_path}/{tx_id}");
                if self.tree_is_deletable(&tx_path).await? {
                    info!(tx_id, "sweeping completed transaction tree");
                    self.store.delete_recursive(&tx_path).await?;
                }
            }
        }
        Ok(())
    }

    async fn tree_is_deletable(&self, tx_path: &str) -> Result<bool> {
        let children = self.store.children(tx_path).await?;
        for child in children {
            let child_path = format!("{tx_path}/{child}");
            let status = Status::from_bytes(&self.store.get(&child_path).await?)?;
            if !status.is_terminal() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
