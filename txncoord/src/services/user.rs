use async_trait::async_trait;
use deadpool_postgres::Client;
use serde::Deserialize;
use txncoord_base::{err, Result};
use txncoord_participant::BusinessLogic;

#[derive(Deserialize)]
struct OrderRequest {
    user_id: String,
    price: i64,
}

/// The user service's half of an `OrderCreation` transaction: deduct the
/// order price from the user's balance, inside the same local transaction
/// `PREPARE TRANSACTION` will later make durable.
///
/// Insufficient balance or an unknown user id return `Err`, which the
/// participant handler turns into an `ABORT` vote, not a system failure.
pub struct DeductBalance;

#[async_trait]
impl BusinessLogic for DeductBalance {
    async fn execute(&self, client: &Client, payload: &[u8]) -> Result<()> {
        let req: OrderRequest = serde_json::from_slice(payload)?;

        let row = client
            .query_opt("SELECT balance FROM users WHERE id = $1 FOR UPDATE", &[&req.user_id])
            .await?;
        let balance: i64 = match row {
            Some(row) => row.get(0),
            None => return Err(err(format!("unknown user {}", req.user_id))),
        };
        if balance < req.price {
            return Err(err(format!(
                "insufficient balance for user {}: have {balance}, need {}",
                req.user_id, req.price
            )));
        }

        client
            .execute("UPDATE users SET balance = balance - $1 WHERE id = $2", &[&req.price, &req.user_id])
            .await?;
        Ok(())
    }
}
