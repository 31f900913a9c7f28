use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::Client;
use txncoord_base::{err, Result};
use txncoord_proto::{part_path, Status, TransactionData, TransactionType};
use txncoord_store::{FakeStore, StoreClient};
use txncoord_watch::TransactionHandler;

use txncoord_participant::{BusinessLogic, LocalDb, ParticipantHandler};

struct AcceptingLogic;

#[async_trait]
impl BusinessLogic for AcceptingLogic {
    async fn execute(&self, _client: &Client, _payload: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// An in-memory stand-in for [`LocalDb`] that tracks which transaction ids
/// are "prepared" and records whether the business logic was allowed to
/// run, without ever touching a real Postgres connection.
#[derive(Default)]
struct FakeDb {
    reject: AtomicBool,
    prepared: tokio::sync::Mutex<Vec<String>>,
    committed: tokio::sync::Mutex<Vec<String>>,
    rolled_back: tokio::sync::Mutex<Vec<String>>,
}

impl FakeDb {
    fn rejecting() -> Self {
        FakeDb { reject: AtomicBool::new(true), ..Default::default() }
    }
}

#[async_trait]
impl LocalDb for FakeDb {
    async fn prepare(&self, tx_id: &str, _payload: &[u8], _logic: &dyn BusinessLogic) -> Result<()> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(err("insufficient balance"));
        }
        self.prepared.lock().await.push(tx_id.to_string());
        Ok(())
    }

    async fn commit_prepared(&self, tx_id: &str) -> Result<()> {
        self.committed.lock().await.push(tx_id.to_string());
        Ok(())
    }

    async fn rollback_prepared(&self, tx_id: &str) -> Result<()> {
        self.rolled_back.lock().await.push(tx_id.to_string());
        Ok(())
    }
}

fn sample_tx(tx_id: &str) -> TransactionData {
    TransactionData {
        id: tx_id.to_string(),
        tx_type: TransactionType::OrderCreation,
        timestamp: chrono::Utc::now(),
        payload: vec![],
        status: Status::Prepared,
        participants: vec!["user".into()],
    }
}

#[tokio::test]
async fn prepare_votes_ready_and_publishes_it() {
    let store = FakeStore::new();
    let path = part_path(TransactionType::OrderCreation, "tx-1", "user");
    store.create(&path, &Status::Prepared.to_bytes()).await.unwrap();

    let db = Arc::new(FakeDb::default());
    let handler = ParticipantHandler::new(
        Arc::new(store.clone()),
        db.clone(),
        Arc::new(AcceptingLogic),
        TransactionType::OrderCreation,
        "user",
    );

    handler.prepare(&sample_tx("tx-1")).await.unwrap();

    assert_eq!(store.get(&path).await.unwrap(), Status::Ready.to_bytes());
    assert_eq!(*db.prepared.lock().await, vec!["tx-1".to_string()]);
}

#[tokio::test]
async fn prepare_votes_abort_when_business_logic_rejects() {
    let store = FakeStore::new();
    let path = part_path(TransactionType::OrderCreation, "tx-2", "user");
    store.create(&path, &Status::Prepared.to_bytes()).await.unwrap();

    let db = Arc::new(FakeDb::rejecting());
    let handler = ParticipantHandler::new(
        Arc::new(store.clone()),
        db,
        Arc::new(AcceptingLogic),
        TransactionType::OrderCreation,
        "user",
    );

    assert!(handler.prepare(&sample_tx("tx-2")).await.is_err());
    assert_eq!(store.get(&path).await.unwrap(), Status::Abort.to_bytes());
}

#[tokio::test]
async fn prepare_is_a_noop_once_a_decision_already_landed() {
    let store = FakeStore::new();
    let path = part_path(TransactionType::OrderCreation, "tx-3", "user");
    // A late watcher observes a tree whose decision is already in, e.g. the
    // participant restarted between READY and COMMIT.
    store.create(&path, &Status::Commit.to_bytes()).await.unwrap();

    let db = Arc::new(FakeDb::default());
    let handler = ParticipantHandler::new(
        Arc::new(store.clone()),
        db.clone(),
        Arc::new(AcceptingLogic),
        TransactionType::OrderCreation,
        "user",
    );

    handler.prepare(&sample_tx("tx-3")).await.unwrap();

    assert!(db.prepared.lock().await.is_empty());
    assert_eq!(store.get(&path).await.unwrap(), Status::Commit.to_bytes());
}

#[tokio::test]
async fn finalize_commits_then_publishes_committed() {
    let store = FakeStore::new();
    let path = part_path(TransactionType::OrderCreation, "tx-4", "user");
    store.create(&path, &Status::Commit.to_bytes()).await.unwrap();

    let db = Arc::new(FakeDb::default());
    let handler = ParticipantHandler::new(
        Arc::new(store.clone()),
        db.clone(),
        Arc::new(AcceptingLogic),
        TransactionType::OrderCreation,
        "user",
    );

    handler.finalize("tx-4").await.unwrap();

    assert_eq!(store.get(&path).await.unwrap(), Status::Committed.to_bytes());
    assert_eq!(*db.committed.lock().await, vec!["tx-4".to_string()]);
}

#[tokio::test]
async fn finalize_rolls_back_then_publishes_rolled_back() {
    let store = FakeStore::new();
    let path = part_path(TransactionType::OrderCreation, "tx-5", "user");
    store.create(&path, &Status::RollBack.to_bytes()).await.unwrap();

    let db = Arc::new(FakeDb::default());
    let handler = ParticipantHandler::new(
        Arc::new(store.clone()),
        db.clone(),
        Arc::new(AcceptingLogic),
        TransactionType::OrderCreation,
        "user",
    );

    handler.finalize("tx-5").await.unwrap();

    assert_eq!(store.get(&path).await.unwrap(), Status::RolledBack.to_bytes());
    assert_eq!(*db.rolled_back.lock().await, vec!["tx-5".to_string()]);
}

#[tokio::test]
async fn finalize_is_a_noop_once_terminal() {
    let store = FakeStore::new();
    let path = part_path(TransactionType::OrderCreation, "tx-6", "user");
    store.create(&path, &Status::Committed.to_bytes()).await.unwrap();

    let db = Arc::new(FakeDb::default());
    let handler = ParticipantHandler::new(
        Arc::new(store.clone()),
        db.clone(),
        Arc::new(AcceptingLogic),
        TransactionType::OrderCreation,
        "user",
    );

    handler.finalize("tx-6").await.unwrap();
    assert!(db.committed.lock().await.is_empty());
}
