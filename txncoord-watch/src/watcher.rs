use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::sync::RwLock;
use tracing::{info, info_span, Instrument};
use txncoord_base::Result;
use txncoord_proto::{base_path, type_path, TransactionType};
use txncoord_store::StoreClient;

use crate::handler::TransactionHandler;
use crate::typeworker::run_type_worker;

/// Embedded in a participant service. Discovers transaction trees as they
/// appear under each registered type and drives them through the
/// registered handler, one type-worker task per type.
pub struct TransactionWatcher {
    pub(crate) store: Arc<dyn StoreClient>,
    handlers: RwLock<HashMap<TransactionType, Arc<dyn TransactionHandler>>>,
    workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl TransactionWatcher {
    pub fn new(store: Arc<dyn StoreClient>) -> Arc<Self> {
        Arc::new(TransactionWatcher {
            store,
            handlers: RwLock::new(HashMap::new()),
            workers: tokio::sync::Mutex::new(Vec::new()),
        })
    }

    pub async fn register_handler(&self, tx_type: TransactionType, handler: Arc<dyn TransactionHandler>) {
        self.handlers.write().await.insert(tx_type, handler);
    }

    /// Waits (via watches, not polling) for `basePath` and every registered
    /// type's path to exist, tolerating a watcher that starts racing the
    /// coordinator's own initialization.
    pub async fn init(&self) -> Result<()> {
        self.wait_for_path(&base_path()).await?;
        let types: Vec<TransactionType> = self.handlers.read().await.keys().copied().collect();
        for tx_type in types {
            self.wait_for_path(&type_path(tx_type)).await?;
        }
        info!("transaction watcher initialized");
        Ok(())
    }

    async fn wait_for_path(&self, path: &str) -> Result<()> {
        loop {
            let (exists, watch) = self.store.exists_and_watch(path).await?;
            if exists {
                return Ok(());
            }
            watch.wait().await;
        }
    }

    /// Spawns one type-worker task per registered type. Must be called
    /// after every `register_handler` call it should cover.
    pub async fn watch(self: &Arc<Self>) {
        let handlers = self.handlers.read().await;
        let mut workers = self.workers.lock().await;
        for (tx_type, handler) in handlers.iter() {
            let store = self.store.clone();
            let handler = handler.clone();
            let tx_type = *tx_type;
            workers.push(tokio::spawn(
                run_type_worker(store, tx_type, handler)
                    .instrument(info_span!("type_worker", tx_type = %tx_type)),
            ));
        }
    }

    /// Aborts every type-worker task. There is no in-flight transaction to
    /// drain cleanly: a transaction interrupted mid-processing is simply
    /// retried by whichever watcher picks it up next.
    pub async fn stop(&self) {
        let mut workers = self.workers.lock().await;
        for worker in workers.drain(..) {
            worker.abort();
            let _ = worker.await;
        }
    }
}
