// Process configuration is env-var only, by design: no CLI flags, no config
// file. Every service binary loads one of these once at startup and treats
// a missing or unparsable required variable as fatal.

use std::env;
use std::time::Duration;

use crate::{err, Result};

fn var(name: &str) -> Result<String> {
    env::var(name).map_err(|_| err(format!("missing required env var {name}")))
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(v) => v
            .parse()
            .map_err(|_| err(format!("env var {name} has a non-numeric value: {v}"))),
        Err(_) => Ok(default),
    }
}

/// Bind address and coordination-store endpoint shared by every service.
#[derive(Clone, Debug)]
pub struct CommonConfig {
    pub host: String,
    pub zk_server: String,
}

impl CommonConfig {
    pub fn from_env() -> Result<Self> {
        Ok(CommonConfig {
            host: var_or("HOST", "127.0.0.1"),
            zk_server: var("ZK_SERVER")?,
        })
    }
}

/// Postgres pool sizing, read once at process start.
#[derive(Clone, Debug)]
pub struct DbConfig {
    pub database_url: String,
    pub pool_max_size: usize,
    pub pool_min_idle: usize,
    pub conn_lifetime: Duration,
}

impl DbConfig {
    pub fn from_env() -> Result<Self> {
        Ok(DbConfig {
            database_url: var("DATABASE_URL")?,
            pool_max_size: parse_var("DB_POOL_MAX_SIZE", 16usize)?,
            pool_min_idle: parse_var("DB_POOL_MIN_IDLE", 1usize)?,
            conn_lifetime: Duration::from_secs(parse_var("DB_CONN_LIFETIME_SECS", 1800u64)?),
        })
    }
}

/// Loaded by a participant service: its own identity, and where to reach
/// the coordination store and its local database.
#[derive(Clone, Debug)]
pub struct ParticipantConfig {
    pub common: CommonConfig,
    pub db: DbConfig,
    pub participant_name: String,
}

impl ParticipantConfig {
    pub fn from_env() -> Result<Self> {
        Ok(ParticipantConfig {
            common: CommonConfig::from_env()?,
            db: DbConfig::from_env()?,
            participant_name: var("PARTICIPANT_NAME")?,
        })
    }
}

/// Loaded by the coordinator's RPC front door: where the store is, plus the
/// addresses of the participant read-side services it proxies to.
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    pub common: CommonConfig,
    pub user_service_addr: String,
    pub order_service_addr: String,
}

impl CoordinatorConfig {
    pub fn from_env() -> Result<Self> {
        Ok(CoordinatorConfig {
            common: CommonConfig::from_env()?,
            user_service_addr: var_or("USER_SERVICE_ADDR", "http://127.0.0.1:8080"),
            order_service_addr: var_or("ORDER_SERVICE_ADDR", "http://127.0.0.1:8081"),
        })
    }
}
