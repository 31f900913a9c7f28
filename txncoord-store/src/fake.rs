use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::watch::Watch;
use crate::{StoreClient, StoreResult};

#[derive(Default)]
struct Inner {
    nodes: BTreeMap<String, Vec<u8>>,
    ephemeral: BTreeSet<String>,
    data_watchers: HashMap<String, Vec<tokio::sync::oneshot::Sender<()>>>,
    child_watchers: HashMap<String, Vec<tokio::sync::oneshot::Sender<()>>>,
}

/// An in-process [`StoreClient`] used by the TM/TW/participant test suites
/// in place of a real ZooKeeper ensemble. One `FakeStore` instance models
/// one client session: ephemeral nodes it created are released by
/// [`FakeStore::kill_session`], mirroring what session loss does to a real
/// `ZkStoreClient`.
#[derive(Clone, Default)]
pub struct FakeStore(Arc<Mutex<Inner>>);

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}

impl FakeStore {
    pub fn new() -> Self {
        FakeStore::default()
    }

    /// Releases every ephemeral node this instance holds, as if its
    /// session to the store had just expired.
    pub async fn kill_session(&self) {
        let mut inner = self.0.lock().await;
        let doomed: Vec<String> = inner.ephemeral.iter().cloned().collect();
        for path in doomed {
            inner.nodes.remove(&path);
            inner.ephemeral.remove(&path);
            if let Some(waiters) = inner.data_watchers.remove(&path) {
                for w in waiters {
                    let _ = w.send(());
                }
            }
            let parent = parent_of(&path).to_string();
            if let Some(waiters) = inner.child_watchers.remove(&parent) {
                for w in waiters {
                    let _ = w.send(());
                }
            }
        }
    }

    fn arm_data(inner: &mut Inner, path: &str) -> Watch {
        let (tx, watch) = Watch::pair();
        inner.data_watchers.entry(path.to_string()).or_default().push(tx);
        watch
    }

    fn arm_children(inner: &mut Inner, path: &str) -> Watch {
        let (tx, watch) = Watch::pair();
        inner.child_watchers.entry(path.to_string()).or_default().push(tx);
        watch
    }

    fn notify_data(inner: &mut Inner, path: &str) {
        if let Some(waiters) = inner.data_watchers.remove(path) {
            for w in waiters {
                let _ = w.send(());
            }
        }
    }

    fn notify_children(inner: &mut Inner, parent: &str) {
        if let Some(waiters) = inner.child_watchers.remove(parent) {
            for w in waiters {
                let _ = w.send(());
            }
        }
    }

    fn do_create(inner: &mut Inner, path: &str, data: &[u8], ephemeral: bool) -> StoreResult<()> {
        if inner.nodes.contains_key(path) {
            return Err(StoreError::AlreadyExists);
        }
        inner.nodes.insert(path.to_string(), data.to_vec());
        if ephemeral {
            inner.ephemeral.insert(path.to_string());
        }
        Self::notify_data(inner, path);
        let parent = parent_of(path).to_string();
        Self::notify_children(inner, &parent);
        Ok(())
    }
}

#[async_trait]
impl StoreClient for FakeStore {
    async fn create(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        let mut inner = self.0.lock().await;
        Self::do_create(&mut inner, path, data, false)
    }

    async fn create_ephemeral(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        let mut inner = self.0.lock().await;
        Self::do_create(&mut inner, path, data, true)
    }

    async fn set(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        let mut inner = self.0.lock().await;
        if !inner.nodes.contains_key(path) {
            return Err(StoreError::NotFound);
        }
        inner.nodes.insert(path.to_string(), data.to_vec());
        Self::notify_data(&mut inner, path);
        Ok(())
    }

    async fn get(&self, path: &str) -> StoreResult<Vec<u8>> {
        let inner = self.0.lock().await;
        inner.nodes.get(path).cloned().ok_or(StoreError::NotFound)
    }

    async fn get_and_watch(&self, path: &str) -> StoreResult<(Vec<u8>, Watch)> {
        let mut inner = self.0.lock().await;
        let data = inner.nodes.get(path).cloned().ok_or(StoreError::NotFound)?;
        let watch = Self::arm_data(&mut inner, path);
        Ok((data, watch))
    }

    async fn exists(&self, path: &str) -> StoreResult<bool> {
        let inner = self.0.lock().await;
        Ok(inner.nodes.contains_key(path))
    }

    async fn exists_and_watch(&self, path: &str) -> StoreResult<(bool, Watch)> {
        let mut inner = self.0.lock().await;
        let exists = inner.nodes.contains_key(path);
        let watch = Self::arm_data(&mut inner, path);
        Ok((exists, watch))
    }

    async fn children(&self, path: &str) -> StoreResult<Vec<String>> {
        let inner = self.0.lock().await;
        if !inner.nodes.contains_key(path) {
            return Err(StoreError::NotFound);
        }
        Ok(list_children(&inner.nodes, path))
    }

    async fn children_and_watch(&self, path: &str) -> StoreResult<(Vec<String>, Watch)> {
        let mut inner = self.0.lock().await;
        if !inner.nodes.contains_key(path) {
            return Err(StoreError::NotFound);
        }
        let children = list_children(&inner.nodes, path);
        let watch = Self::arm_children(&mut inner, path);
        Ok((children, watch))
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        let mut inner = self.0.lock().await;
        if !inner.nodes.contains_key(path) {
            return Err(StoreError::NotFound);
        }
        if !list_children(&inner.nodes, path).is_empty() {
            return Err(StoreError::Other(txncoord_base::err("node has children")));
        }
        inner.nodes.remove(path);
        inner.ephemeral.remove(path);
        Self::notify_data(&mut inner, path);
        let parent = parent_of(path).to_string();
        Self::notify_children(&mut inner, &parent);
        Ok(())
    }

    async fn delete_recursive(&self, path: &str) -> StoreResult<()> {
        let children = self.children(path).await?;
        for child in children {
            let child_path = format!("{path}/{child}");
            Box::pin(self.delete_recursive(&child_path)).await?;
        }
        self.delete(path).await
    }
}

fn list_children(nodes: &BTreeMap<String, Vec<u8>>, path: &str) -> Vec<String> {
    let prefix = if path == "/" { "/".to_string() } else { format!("{path}/") };
    let mut out = Vec::new();
    for key in nodes.keys() {
        if let Some(rest) = key.strip_prefix(&prefix) {
            if !rest.is_empty() && !rest.contains('/') {
                out.push(rest.to_string());
            }
        }
    }
    out.sort();
    out
}
