mod coordinator;
mod participant_read;

pub use coordinator::{router as coordinator_router, PlaceOrderRequest, PlaceOrderResponse};
pub use participant_read::{order_router, user_router, OrderResponse, OrdersQuery, UserResponse};

#[cfg(test)]
mod tests;
