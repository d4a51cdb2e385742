#![forbid(unsafe_code)]
//! tessera-core: logical types, boxed values, errors, config, and hashing
//! shared by every crate of the block layer.
//!
//! No block storage lives here; see `tessera-block` for the Block contract.

pub mod config;
pub mod error;
pub mod hash;
pub mod logical_type;
pub mod prelude;
pub mod session;
pub mod types;
