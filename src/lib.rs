pub mod error;
pub mod model;
pub mod rds;

pub use error::{ConfigError, ConnectorError, StorageError};
pub use model::config::Config;
