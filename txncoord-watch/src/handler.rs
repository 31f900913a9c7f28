use async_trait::async_trait;
use txncoord_base::Result;
use txncoord_proto::TransactionData;

/// The participant-side contract for one transaction type: `prepare` runs
/// the local two-phase-commit dance up to voting `READY`/`ABORT`, `finalize`
/// carries a published decision through to `COMMITTED`/`ROLLED_BACK`. See
/// the participant state machine crate for the concrete implementation over
/// a local database.
#[async_trait]
pub trait TransactionHandler: Send + Sync {
    async fn prepare(&self, tx: &TransactionData) -> Result<()>;
    async fn finalize(&self, tx_id: &str) -> Result<()>;
}
