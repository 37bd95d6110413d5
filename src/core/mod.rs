pub mod config;
pub mod error;
pub mod types;

pub use config::{config, set_config, ArenaConfig};
pub use error::{ArenaError, Result};
pub use types::CharacterId;
