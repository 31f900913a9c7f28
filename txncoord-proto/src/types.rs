// Closed enumerations. TransactionType and ResourceType are fixed,
// compile-time-known sets, represented as tagged variants rather than open
// strings, so a typo in a path component is a compile error rather than a
// silently-missing znode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use txncoord_base::{err, Error, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "ORDER_CREATION")]
    OrderCreation,
}

impl TransactionType {
    pub const ALL: &'static [TransactionType] = &[TransactionType::OrderCreation];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::OrderCreation => "ORDER_CREATION",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Error> {
        match s {
            "ORDER_CREATION" => Ok(TransactionType::OrderCreation),
            other => Err(err(format!("unknown transaction type {other}"))),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "USER_RESOURCE")]
    UserResource,
    #[serde(rename = "ORDER_RESOURCE")]
    OrderResource,
}

impl ResourceType {
    pub const ALL: &'static [ResourceType] =
        &[ResourceType::UserResource, ResourceType::OrderResource];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::UserResource => "USER_RESOURCE",
            ResourceType::OrderResource => "ORDER_RESOURCE",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single status-token vocabulary used throughout the protocol (see the
/// data-model invariants: every participant node's lifetime is a prefix of
/// one of the two linear paths `INIT -> PREPARED -> READY -> COMMIT ->
/// COMMITTED` or `INIT -> PREPARED -> {ABORT|READY} -> ROLL_BACK ->
/// ROLLED_BACK`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Status {
    Init,
    Prepared,
    Ready,
    Abort,
    Commit,
    Committed,
    RollBack,
    RolledBack,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Init => "INIT",
            Status::Prepared => "PREPARED",
            Status::Ready => "READY",
            Status::Abort => "ABORT",
            Status::Commit => "COMMIT",
            Status::Committed => "COMMITTED",
            Status::RollBack => "ROLL_BACK",
            Status::RolledBack => "ROLLED_BACK",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Committed | Status::RolledBack)
    }

    /// True for the decision tokens a participant's finalize loop dispatches on.
    pub fn is_decision(&self) -> bool {
        matches!(self, Status::Commit | Status::RollBack)
    }

    /// True for tokens the TM's Prepare/Commit/Finalize operations will
    /// release a participant or gate a watcher on.
    pub fn is_gate_release(&self) -> bool {
        matches!(self, Status::Prepared | Status::Commit | Status::RollBack)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Error> {
        match s {
            "INIT" => Ok(Status::Init),
            "PREPARED" => Ok(Status::Prepared),
            "READY" => Ok(Status::Ready),
            "ABORT" => Ok(Status::Abort),
            "COMMIT" => Ok(Status::Commit),
            "COMMITTED" => Ok(Status::Committed),
            "ROLL_BACK" => Ok(Status::RollBack),
            "ROLLED_BACK" => Ok(Status::RolledBack),
            other => Err(err(format!("unknown status token {other:?}"))),
        }
    }
}

impl Status {
    /// Participant node payloads are the raw token bytes, not JSON.
    pub fn to_bytes(self) -> Vec<u8> {
        self.as_str().as_bytes().to_vec()
    }

    pub fn from_bytes(data: &[u8]) -> Result<Status> {
        let s = std::str::from_utf8(data).map_err(|e| err(format!("status token not utf8: {e}")))?;
        s.parse()
    }
}

mod base64_payload {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(bytes).serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

/// The payload of the tx-id node. Created by `Begin`, mutated only by
/// `Prepare` and `Finalize`, removed wholesale by the garbage sweeper.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionData {
    pub id: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(with = "base64_payload")]
    pub payload: Vec<u8>,
    pub status: Status,
    pub participants: Vec<String>,
}

impl TransactionData {
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(data: &[u8]) -> Result<TransactionData> {
        Ok(serde_json::from_slice(data)?)
    }
}
