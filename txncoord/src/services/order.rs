use async_trait::async_trait;
use deadpool_postgres::Client;
use serde::Deserialize;
use txncoord_base::Result;
use txncoord_participant::BusinessLogic;

#[derive(Deserialize)]
struct OrderRequest {
    user_id: String,
    price: i64,
}

/// The order service's half of an `OrderCreation` transaction: insert the
/// order row. The insert always succeeds if the request parses, so this
/// participant only ever votes `ABORT` on a malformed payload.
pub struct InsertOrder;

#[async_trait]
impl BusinessLogic for InsertOrder {
    async fn execute(&self, client: &Client, payload: &[u8]) -> Result<()> {
        let req: OrderRequest = serde_json::from_slice(payload)?;
        client
            .execute(
                "INSERT INTO orders (id, user_id, price) VALUES (gen_random_uuid(), $1, $2)",
                &[&req.user_id, &req.price],
            )
            .await?;
        Ok(())
    }
}
