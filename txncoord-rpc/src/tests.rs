use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use txncoord_proto::{part_path, type_path, Status, TransactionType};
use txncoord_store::{FakeStore, StoreClient};
use txncoord_tm::TransactionManager;

use crate::coordinator::{place_order, PlaceOrderRequest};

/// Watches for new participant nodes under `OrderCreation` and votes
/// `vote` on each as soon as it reaches `PREPARED`, standing in for the
/// participant services this crate's coordinator talks to only through
/// the store.
async fn auto_vote(store: FakeStore, vote: Status) {
    let path = type_path(TransactionType::OrderCreation);
    loop {
        let (children, watch) = match store.children_and_watch(&path).await {
            Ok(v) => v,
            Err(_) => return,
        };
        for tx_id in children {
            for participant in ["user", "order"] {
                tokio::spawn(vote_once(store.clone(), part_path(TransactionType::OrderCreation, &tx_id, participant), vote));
            }
        }
        watch.wait().await;
    }
}

async fn vote_once(store: FakeStore, path: String, vote: Status) {
    loop {
        let (data, watch) = match store.get_and_watch(&path).await {
            Ok(v) => v,
            Err(_) => return,
        };
        match Status::from_bytes(&data) {
            Ok(Status::Prepared) => {
                let _ = store.set(&path, &vote.to_bytes()).await;
                return;
            }
            Ok(Status::Init) => watch.wait().await,
            _ => return,
        }
    }
}

#[tokio::test]
async fn place_order_succeeds_when_all_participants_vote_ready() {
    let store = FakeStore::new();
    let tm = TransactionManager::new(Arc::new(store.clone())).await.unwrap();
    tokio::spawn(auto_vote(store.clone(), Status::Ready));

    let response = place_order(
        State(tm),
        Json(PlaceOrderRequest { user_id: "u1".into(), price: 500 }),
    )
    .await;

    assert!(response.0.success);
}

#[tokio::test]
async fn place_order_reports_rollback_when_a_participant_votes_abort() {
    let store = FakeStore::new();
    let tm = TransactionManager::new(Arc::new(store.clone())).await.unwrap();
    tokio::spawn(auto_vote(store.clone(), Status::Abort));

    let response = place_order(
        State(tm),
        Json(PlaceOrderRequest { user_id: "u2".into(), price: 10_000 }),
    )
    .await;

    assert!(!response.0.success);
}
