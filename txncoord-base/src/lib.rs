mod config;
mod error;
mod logging;

pub use config::{CommonConfig, CoordinatorConfig, DbConfig, ParticipantConfig};
pub use error::{err, Error, Result};
pub use logging::init as init_logging;
