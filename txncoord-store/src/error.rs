use std::fmt;

use txncoord_base::Error;

/// The three kinds of failure the core actually branches on. Everything
/// else -- connection loss, session expiry, marshalling errors -- collapses
/// into `Other` and surfaces on the *next* call, per the coordination
/// store's session model.
#[derive(Debug)]
pub enum StoreError {
    NotFound,
    AlreadyExists,
    Other(Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "znode not found"),
            StoreError::AlreadyExists => write!(f, "znode already exists"),
            StoreError::Other(e) => write!(f, "store error: {e:?}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<zookeeper_client::Error> for StoreError {
    fn from(e: zookeeper_client::Error) -> Self {
        match e {
            zookeeper_client::Error::NoNode => StoreError::NotFound,
            zookeeper_client::Error::NodeExists => StoreError::AlreadyExists,
            other => StoreError::Other(txncoord_base::err(format!("zookeeper error: {other}"))),
        }
    }
}
