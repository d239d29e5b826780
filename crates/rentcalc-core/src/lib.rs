pub mod config;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "projection")]
pub mod projection;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

pub use config::ProjectionConfig;
pub use error::RentcalcError;
pub use types::*;

/// Standard result type for all rentcalc operations
pub type RentcalcResult<T> = Result<T, RentcalcError>;
