// Pure path builders. No I/O, no store client -- a small enough surface
// that correctness is checked by simple assertions rather than mocking.

use crate::types::TransactionType;

pub const BASE_PATH: &str = "/transactions";

pub fn base_path() -> String {
    BASE_PATH.to_string()
}

pub fn lock_path() -> String {
    format!("{BASE_PATH}/locks")
}

pub fn resource_lock_path(resource: &str) -> String {
    format!("{}/{}", lock_path(), resource)
}

pub fn type_path(tx_type: TransactionType) -> String {
    format!("{BASE_PATH}/{tx_type}")
}

pub fn tx_path(tx_type: TransactionType, tx_id: &str) -> String {
    format!("{}/{}", type_path(tx_type), tx_id)
}

pub fn part_path(tx_type: TransactionType, tx_id: &str, participant: &str) -> String {
    format!("{}/{}", tx_path(tx_type, tx_id), participant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_spec() {
        assert_eq!(base_path(), "/transactions");
        assert_eq!(lock_path(), "/transactions/locks");
        assert_eq!(
            resource_lock_path("USER_RESOURCE"),
            "/transactions/locks/USER_RESOURCE"
        );
        assert_eq!(
            type_path(TransactionType::OrderCreation),
            "/transactions/ORDER_CREATION"
        );
        assert_eq!(
            tx_path(TransactionType::OrderCreation, "tx-1"),
            "/transactions/ORDER_CREATION/tx-1"
        );
        assert_eq!(
            part_path(TransactionType::OrderCreation, "tx-1", "user"),
            "/transactions/ORDER_CREATION/tx-1/user"
        );
    }
}
