//! Convenient re-exports for downstream crates.

pub use crate::config::BlockConfig;
pub use crate::error::{Error, Result};
pub use crate::hash::{value_hash, NULL_HASH};
pub use crate::logical_type::LogicalType;
pub use crate::session::Session;
pub use crate::types::Scalar;
