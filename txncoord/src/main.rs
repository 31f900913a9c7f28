mod db;
mod services;

use std::sync::Arc;

use axum::Router;
use tracing::info;
use txncoord_base::{err, CoordinatorConfig, Error, ParticipantConfig, Result};
use txncoord_participant::{BusinessLogic, ParticipantHandler, PostgresDb};
use txncoord_proto::TransactionType;
use txncoord_store::{StoreClient, ZkStoreClient};
use txncoord_tm::TransactionManager;
use txncoord_watch::TransactionWatcher;

#[tokio::main]
async fn main() -> Result<()> {
    txncoord_base::init_logging();

    match std::env::var("ROLE").ok().as_deref() {
        Some("coordinator") => run_coordinator().await,
        Some("participant") => run_participant().await,
        other => Err(err(format!("ROLE must be \"coordinator\" or \"participant\", got {other:?}"))),
    }
}

async fn run_coordinator() -> Result<()> {
    let config = CoordinatorConfig::from_env()?;
    let store = ZkStoreClient::connect(&config.common.zk_server).await?;
    let tm = TransactionManager::new(Arc::new(store)).await?;

    info!(host = %config.common.host, "coordinator starting");
    serve(&config.common.host, txncoord_rpc::coordinator_router(tm)).await
}

async fn run_participant() -> Result<()> {
    let config = ParticipantConfig::from_env()?;
    let store: Arc<dyn StoreClient> = Arc::new(ZkStoreClient::connect(&config.common.zk_server).await?);
    let pool = db::build_pool(&config.db)?;
    let local_db = Arc::new(PostgresDb::new(pool.clone()));

    let (logic, read_side): (Arc<dyn BusinessLogic>, Router) = match config.participant_name.as_str() {
        "user" => (Arc::new(services::user::DeductBalance), txncoord_rpc::user_router(pool)),
        "order" => (Arc::new(services::order::InsertOrder), txncoord_rpc::order_router(pool)),
        other => return Err(err(format!("unknown PARTICIPANT_NAME {other:?}"))),
    };

    let handler = Arc::new(ParticipantHandler::new(
        store.clone(),
        local_db,
        logic,
        TransactionType::OrderCreation,
        config.participant_name.clone(),
    ));

    let watcher = TransactionWatcher::new(store);
    watcher.register_handler(TransactionType::OrderCreation, handler).await;
    watcher.init().await?;
    watcher.watch().await;

    info!(host = %config.common.host, participant = %config.participant_name, "participant starting");
    serve(&config.common.host, read_side).await
}

async fn serve(host: &str, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(host).await.map_err(Error::new)?;
    axum::serve(listener, app).await.map_err(Error::new)
}
