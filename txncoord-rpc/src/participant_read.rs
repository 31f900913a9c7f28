use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use deadpool_postgres::Pool;
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub balance: i64,
}

/// Non-transactional read API for the user service: `GET /users/:id` hits
/// the local DB directly and is independent of the 2PC protocol.
pub fn user_router(pool: Pool) -> Router {
    Router::new().route("/users/:id", get(get_user)).with_state(pool)
}

async fn get_user(State(pool): State<Pool>, Path(id): Path<String>) -> Result<Json<UserResponse>, StatusCode> {
    let client = pool.get().await.map_err(|e| {
        error!(target: "txncoord", error = %e, "failed to acquire db connection");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let row = client
        .query_opt("SELECT id, name, balance FROM users WHERE id = $1", &[&id])
        .await
        .map_err(|e| {
            error!(target: "txncoord", error = %e, "get_user query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    match row {
        Some(row) => Ok(Json(UserResponse { id: row.get(0), name: row.get(1), balance: row.get(2) })),
        None => Err(StatusCode::NOT_FOUND),
    }
}

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub price: i64,
}

/// Non-transactional read API for the order service: `GET /orders?user_id=`.
pub fn order_router(pool: Pool) -> Router {
    Router::new().route("/orders", get(list_orders)).with_state(pool)
}

async fn list_orders(
    State(pool): State<Pool>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, StatusCode> {
    let client = pool.get().await.map_err(|e| {
        error!(target: "txncoord", error = %e, "failed to acquire db connection");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let rows = client
        .query("SELECT id, user_id, price FROM orders WHERE user_id = $1", &[&query.user_id])
        .await
        .map_err(|e| {
            error!(target: "txncoord", error = %e, "list_orders query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(
        rows.iter()
            .map(|row| OrderResponse { id: row.get(0), user_id: row.get(1), price: row.get(2) })
            .collect(),
    ))
}
