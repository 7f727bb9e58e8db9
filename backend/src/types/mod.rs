mod environment;
mod error;
mod extractors;
mod storage_config;

pub use environment::Environment;
pub use error::{ApiErrorResponse, AppError};
pub use extractors::IMAGE_FIELD_NAME;
pub use storage_config::{ConfigError, StorageConfig};
