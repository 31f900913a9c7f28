use std::time::{Duration, Instant};

use tracing::error;
use txncoord_base::{err, Result};
use txncoord_proto::{resource_lock_path, ResourceType};
use txncoord_store::StoreError;

use crate::manager::TransactionManager;

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(100);
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

impl TransactionManager {
    /// Ephemerally creates one lock node per resource, retrying
    /// `AlreadyExists` every 100ms up to a 5s budget, and releasing
    /// whatever it already acquired if any resource times out.
    ///
    /// Not currently called from `begin` -- see the open design question on
    /// resource locking being unwired from the production call graph.
    #[allow(dead_code)]
    pub async fn acquire_exclusive_lock(&self, resources: &[ResourceType]) -> Result<()> {
        let start = Instant::now();
        for (i, resource) in resources.iter().enumerate() {
            let path = resource_lock_path(resource.as_str());
            loop {
                match self.store.create_ephemeral(&path, &[]).await {
                    Ok(()) => break,
                    Err(StoreError::AlreadyExists) => {
                        if start.elapsed() > LOCK_TIMEOUT {
                            error!(target: "txncoord", %resource, "timeout while acquiring lock");
                            return Err(err(format!("timeout while acquiring lock for {resource}")));
                        }
                        tokio::time::sleep(LOCK_RETRY_INTERVAL).await;
                        continue;
                    }
                    Err(e) => {
                        for held in &resources[..i] {
                            if let Err(re) = self.release_lock(held).await {
                                error!(target: "txncoord", resource = %held, error = %re, "failed to release lock during rollback");
                            }
                        }
                        return Err(err(format!("error acquiring lock for {resource}: {e}")));
                    }
                }
            }
        }
        Ok(())
    }

    #[allow(dead_code)]
    pub async fn release_exclusive_lock(&self, resources: &[ResourceType]) -> Result<()> {
        for resource in resources {
            self.release_lock(resource).await?;
        }
        Ok(())
    }

    async fn release_lock(&self, resource: &ResourceType) -> Result<()> {
        let path = resource_lock_path(resource.as_str());
        self.store.delete(&path).await?;
        Ok(())
    }
}
