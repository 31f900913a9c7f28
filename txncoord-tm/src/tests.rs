use std::sync::Arc;

use txncoord_proto::{part_path, Status, TransactionType};
use txncoord_store::{FakeStore, StoreClient};

use crate::TransactionManager;

async fn new_tm() -> (Arc<TransactionManager>, FakeStore) {
    let store = FakeStore::new();
    let tm = TransactionManager::new(Arc::new(store.clone())).await.unwrap();
    (tm, store)
}

#[tokio::test]
async fn init_is_idempotent() {
    let store = FakeStore::new();
    TransactionManager::new(Arc::new(store.clone())).await.unwrap();
    // A second TM sharing the same store must not fail just because the
    // tree already exists.
    TransactionManager::new(Arc::new(store)).await.unwrap();
}

#[tokio::test]
async fn begin_creates_data_and_participant_nodes() {
    let (tm, store) = new_tm().await;
    let tx_id = tm
        .begin(
            TransactionType::OrderCreation,
            b"payload".to_vec(),
            vec!["user".into(), "order".into()],
            vec![],
        )
        .await
        .unwrap();

    let user_path = part_path(TransactionType::OrderCreation, &tx_id, "user");
    let order_path = part_path(TransactionType::OrderCreation, &tx_id, "order");
    assert_eq!(store.get(&user_path).await.unwrap(), Status::Init.to_bytes());
    assert_eq!(store.get(&order_path).await.unwrap(), Status::Init.to_bytes());
}

#[tokio::test]
async fn prepare_advances_data_and_children() {
    let (tm, store) = new_tm().await;
    let tx_id = tm
        .begin(TransactionType::OrderCreation, vec![], vec!["user".into()], vec![])
        .await
        .unwrap();

    tm.prepare(&tx_id).await.unwrap();

    let user_path = part_path(TransactionType::OrderCreation, &tx_id, "user");
    assert_eq!(store.get(&user_path).await.unwrap(), Status::Prepared.to_bytes());
}

#[tokio::test]
async fn happy_path_commits_when_all_ready() {
    let (tm, store) = new_tm().await;
    let tx_id = tm
        .begin(
            TransactionType::OrderCreation,
            vec![],
            vec!["user".into(), "order".into()],
            vec![],
        )
        .await
        .unwrap();
    tm.prepare(&tx_id).await.unwrap();

    let user_path = part_path(TransactionType::OrderCreation, &tx_id, "user");
    let order_path = part_path(TransactionType::OrderCreation, &tx_id, "order");
    store.set(&user_path, &Status::Ready.to_bytes()).await.unwrap();
    store.set(&order_path, &Status::Ready.to_bytes()).await.unwrap();

    let commit = tm.get_votes_result(&tx_id).await.unwrap();
    assert!(commit);

    tm.finalize(&tx_id, commit).await.unwrap();
    assert_eq!(store.get(&user_path).await.unwrap(), Status::Commit.to_bytes());
    assert_eq!(store.get(&order_path).await.unwrap(), Status::Commit.to_bytes());
}

#[tokio::test]
async fn any_abort_forces_rollback_and_never_commits_an_unready_participant() {
    let (tm, store) = new_tm().await;
    let tx_id = tm
        .begin(
            TransactionType::OrderCreation,
            vec![],
            vec!["user".into(), "order".into()],
            vec![],
        )
        .await
        .unwrap();
    tm.prepare(&tx_id).await.unwrap();

    let user_path = part_path(TransactionType::OrderCreation, &tx_id, "user");
    let order_path = part_path(TransactionType::OrderCreation, &tx_id, "order");
    store.set(&user_path, &Status::Abort.to_bytes()).await.unwrap();
    store.set(&order_path, &Status::Ready.to_bytes()).await.unwrap();

    let commit = tm.get_votes_result(&tx_id).await.unwrap();
    assert!(!commit);

    tm.finalize(&tx_id, commit).await.unwrap();
    // The invariant from §4.3.5: COMMIT is only ever written atop READY, so
    // a rollback decision still drives the READY participant to ROLL_BACK,
    // never COMMIT, and the ABORT participant goes straight to ROLLED_BACK.
    assert_eq!(store.get(&user_path).await.unwrap(), Status::RolledBack.to_bytes());
    assert_eq!(store.get(&order_path).await.unwrap(), Status::RollBack.to_bytes());
}

#[tokio::test]
async fn vote_result_treats_vanished_participant_as_rollback() {
    let (tm, store) = new_tm().await;
    let tx_id = tm
        .begin(TransactionType::OrderCreation, vec![], vec!["user".into()], vec![])
        .await
        .unwrap();
    tm.prepare(&tx_id).await.unwrap();

    let user_path = part_path(TransactionType::OrderCreation, &tx_id, "user");
    store.delete(&user_path).await.unwrap();

    assert!(!tm.get_votes_result(&tx_id).await.unwrap());
}

#[tokio::test]
async fn sweeper_deletes_only_fully_terminal_trees() {
    let (tm, store) = new_tm().await;
    let done_tx = tm
        .begin(TransactionType::OrderCreation, vec![], vec!["user".into()], vec![])
        .await
        .unwrap();
    let pending_tx = tm
        .begin(TransactionType::OrderCreation, vec![], vec!["user".into()], vec![])
        .await
        .unwrap();

    let done_path = part_path(TransactionType::OrderCreation, &done_tx, "user");
    store.set(&done_path, &Status::Committed.to_bytes()).await.unwrap();

    tm.sweep_once().await.unwrap();

    assert!(!store
        .exists(&txncoord_proto::tx_path(TransactionType::OrderCreation, &done_tx))
        .await
        .unwrap());
    assert!(store
        .exists(&txncoord_proto::tx_path(TransactionType::OrderCreation, &pending_tx))
        .await
        .unwrap());
}

#[tokio::test]
async fn locks_are_released_on_session_loss() {
    let store = FakeStore::new();
    let tm = TransactionManager::new(Arc::new(store.clone())).await.unwrap();
    tm.acquire_exclusive_lock(&[txncoord_proto::ResourceType::UserResource])
        .await
        .unwrap();
    assert!(store
        .exists(&txncoord_proto::resource_lock_path("USER_RESOURCE"))
        .await
        .unwrap());

    store.kill_session().await;

    assert!(!store
        .exists(&txncoord_proto::resource_lock_path("USER_RESOURCE"))
        .await
        .unwrap());
}
