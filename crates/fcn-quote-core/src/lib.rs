pub mod config;
pub mod error;
pub mod types;

pub mod fcn;

pub use config::EngineConfig;
pub use error::{FcnError, OracleError};
pub use types::*;

/// Standard result type for all fcn-quote operations
pub type FcnResult<T> = Result<T, FcnError>;
