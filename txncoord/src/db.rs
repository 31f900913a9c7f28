use deadpool_postgres::{ManagerConfig, Pool, RecyclingMethod, Runtime};
use txncoord_base::{DbConfig, Error, Result};

/// Builds the pool this process borrows a connection from for every
/// participant-handler call and every read-side query; sized from
/// `DbConfig` rather than opened fresh per request.
pub fn build_pool(db: &DbConfig) -> Result<Pool> {
    let mut cfg = deadpool_postgres::Config::new();
    cfg.url = Some(db.database_url.clone());
    cfg.manager = Some(ManagerConfig { recycling_method: RecyclingMethod::Fast });
    cfg.pool = Some(deadpool_postgres::PoolConfig {
        max_size: db.pool_max_size,
        ..Default::default()
    });
    cfg.create_pool(Some(Runtime::Tokio1), tokio_postgres::NoTls).map_err(Error::new)
}
