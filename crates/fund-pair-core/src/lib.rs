pub mod error;
pub mod returns;
pub mod statistics;
pub mod types;

pub mod optimization;

#[cfg(feature = "allocation")]
pub mod allocation;

#[cfg(feature = "analysis")]
pub mod analysis;

pub use error::FundPairError;
pub use types::*;

/// Standard result type for all fund-pair operations
pub type FundPairResult<T> = Result<T, FundPairError>;
