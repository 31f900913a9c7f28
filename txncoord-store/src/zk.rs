use async_trait::async_trait;
use tracing::warn;
use zookeeper_client::{Acls, Client, CreateMode};

use crate::error::StoreError;
use crate::watch::Watch;
use crate::{StoreClient, StoreResult};

/// The production [`StoreClient`], backed by a live session to a ZooKeeper
/// ensemble. One `ZkStoreClient` is shared (via `Arc`) by every task in a
/// process; the underlying session, and therefore every ephemeral node
/// created through it, dies together with the process's connection.
pub struct ZkStoreClient {
    client: Client,
}

impl ZkStoreClient {
    pub async fn connect(cluster: &str) -> StoreResult<Self> {
        let client = Client::connect(cluster)
            .await
            .map_err(|e| StoreError::Other(txncoord_base::err(format!("zk connect failed: {e}"))))?;
        Ok(ZkStoreClient { client })
    }

    fn arm(&self, watcher: zookeeper_client::OneshotWatcher) -> Watch {
        let (tx, watch) = Watch::pair();
        tokio::spawn(async move {
            watcher.changed().await;
            let _ = tx.send(());
        });
        watch
    }
}

#[async_trait]
impl StoreClient for ZkStoreClient {
    async fn create(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        self.client
            .create(path, data, &CreateMode::Persistent.with_acls(Acls::anyone_all()))
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn create_ephemeral(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        self.client
            .create(path, data, &CreateMode::Ephemeral.with_acls(Acls::anyone_all()))
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn set(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        self.client
            .set_data(path, data, None)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn get(&self, path: &str) -> StoreResult<Vec<u8>> {
        let (data, _stat) = self.client.get_data(path).await.map_err(StoreError::from)?;
        Ok(data)
    }

    async fn get_and_watch(&self, path: &str) -> StoreResult<(Vec<u8>, Watch)> {
        let (data, _stat, watcher) = self
            .client
            .get_and_watch_data(path)
            .await
            .map_err(StoreError::from)?;
        Ok((data, self.arm(watcher)))
    }

    async fn exists(&self, path: &str) -> StoreResult<bool> {
        match self.client.check_stat(path).await {
            Ok(stat) => Ok(stat.is_some()),
            Err(e) => Err(StoreError::from(e)),
        }
    }

    async fn exists_and_watch(&self, path: &str) -> StoreResult<(bool, Watch)> {
        match self.client.check_and_watch_stat(path).await {
            Ok((stat, watcher)) => Ok((stat.is_some(), self.arm(watcher))),
            Err(e) => Err(StoreError::from(e)),
        }
    }

    async fn children(&self, path: &str) -> StoreResult<Vec<String>> {
        let children = self.client.list_children(path).await.map_err(StoreError::from)?;
        Ok(children)
    }

    async fn children_and_watch(&self, path: &str) -> StoreResult<(Vec<String>, Watch)> {
        let (children, _stat, watcher) = self
            .client
            .get_and_watch_children(path)
            .await
            .map_err(StoreError::from)?;
        Ok((children, self.arm(watcher)))
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        self.client.delete(path, None).await.map_err(StoreError::from)?;
        Ok(())
    }

    async fn delete_recursive(&self, path: &str) -> StoreResult<()> {
        let children = self.children(path).await?;
        for child in children {
            let child_path = format!("{path}/{child}");
            if let Err(e) = Box::pin(self.delete_recursive(&child_path)).await {
                warn!(target: "txncoord", %child_path, error = %e, "failed to delete child during recursive delete");
                return Err(e);
            }
        }
        self.delete(path).await
    }
}
