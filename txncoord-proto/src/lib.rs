mod paths;
mod types;

pub use paths::{base_path, lock_path, part_path, resource_lock_path, tx_path, type_path, BASE_PATH};
pub use types::{ResourceType, Status, TransactionData, TransactionType};
