use std::sync::Arc;
use std::time::Duration;

use tracing::error;
use txncoord_base::Result;
use txncoord_proto::{tx_path, type_path, Status, TransactionData, TransactionType};
use txncoord_store::{StoreClient, StoreError};

use crate::handler::TransactionHandler;

const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// One task per registered type. Children are processed strictly serially
/// within a type so a local DB that only carries one prepared transaction
/// at a time is never asked to interleave two.
pub(crate) async fn run_type_worker(
    store: Arc<dyn StoreClient>,
    tx_type: TransactionType,
    handler: Arc<dyn TransactionHandler>,
) {
    let path = type_path(tx_type);
    loop {
        let (mut children, watch) = match store.children_and_watch(&path).await {
            Ok(v) => v,
            Err(e) => {
                error!(target: "txncoord", %path, error = %e, "failed to list transaction tree, retrying");
                tokio::time::sleep(RETRY_BACKOFF).await;
                continue;
            }
        };
        children.sort();

        for tx_id in children {
            loop {
                match process_transaction(store.as_ref(), tx_type, &tx_id, handler.as_ref()).await {
                    Ok(()) => break,
                    Err(e) => {
                        error!(target: "txncoord", tx_id, error = ?e, "transaction processing failed, retrying");
                        tokio::time::sleep(RETRY_BACKOFF).await;
                    }
                }
            }
        }

        watch.wait().await;
    }
}

async fn process_transaction(
    store: &dyn StoreClient,
    tx_type: TransactionType,
    tx_id: &str,
    handler: &dyn TransactionHandler,
) -> Result<()> {
    let path = tx_path(tx_type, tx_id);
    let tx_data = loop {
        let (data, watch) = match store.get_and_watch(&path).await {
            Ok(v) => v,
            Err(StoreError::NotFound) => return Ok(()), // swept away, already done
            Err(e) => return Err(e.into()),
        };
        let tx_data = TransactionData::from_json(&data)?;
        match tx_data.status {
            Status::Prepared | Status::Commit | Status::RollBack => break tx_data,
            Status::Committed | Status::RolledBack => return Ok(()),
            Status::Init | Status::Ready | Status::Abort => watch.wait().await,
        }
    };

    handler.prepare(&tx_data).await?;
    handler.finalize(&tx_data.id).await
}
