mod db;
mod handler;

pub use db::{BusinessLogic, LocalDb, PostgresDb};
pub use handler::ParticipantHandler;
