use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::error;
use txncoord_base::Result;
use txncoord_proto::{ResourceType, TransactionType};
use txncoord_tm::TransactionManager;

#[derive(Debug, Deserialize, Serialize)]
pub struct PlaceOrderRequest {
    pub user_id: String,
    pub price: i64,
}

#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub message: String,
}

/// The coordinator RPC front door: `POST /orders` drives a full
/// Begin -> Prepare -> GetVotesResult -> Finalize round trip and returns
/// the outcome once, with no retry at this layer.
pub fn router(tm: Arc<TransactionManager>) -> Router {
    Router::new().route("/orders", post(place_order)).with_state(tm)
}

pub(crate) async fn place_order(
    State(tm): State<Arc<TransactionManager>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Json<PlaceOrderResponse> {
    let payload = match serde_json::to_vec(&req) {
        Ok(p) => p,
        Err(e) => {
            return Json(PlaceOrderResponse { success: false, message: format!("invalid request: {e}") })
        }
    };

    let participants = vec!["user".to_string(), "order".to_string()];
    let resources = vec![ResourceType::UserResource];

    match run_order_creation(&tm, payload, participants, resources).await {
        Ok(true) => Json(PlaceOrderResponse { success: true, message: "order placed".into() }),
        Ok(false) => Json(PlaceOrderResponse { success: false, message: "transaction rolled back".into() }),
        Err(e) => {
            error!(target: "txncoord", error = ?e, "place_order transaction failed");
            Json(PlaceOrderResponse { success: false, message: "internal error".into() })
        }
    }
}

async fn run_order_creation(
    tm: &TransactionManager,
    payload: Vec<u8>,
    participants: Vec<String>,
    resources: Vec<ResourceType>,
) -> Result<bool> {
    let tx_id = tm.begin(TransactionType::OrderCreation, payload, participants, resources).await?;
    tm.prepare(&tx_id).await?;
    let commit = tm.get_votes_result(&tx_id).await?;
    tm.finalize(&tx_id, commit).await?;
    Ok(commit)
}
