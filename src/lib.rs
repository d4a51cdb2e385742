//! tessera: columnar blocks for a distributed SQL execution layer.
//!
//! Facade over the workspace crates; depend on `tessera-block` directly if
//! you do not need the re-exports.

pub use tessera_block as block;
pub use tessera_core as core;

pub mod prelude {
    pub use tessera_block::{
        Block, BlockBuilder, BlockEncoding, BlockRef, DictionaryBlock, EncodingRegistry,
        FixedWidthBlock, VariableWidthBlock,
    };
    pub use tessera_core::prelude::*;
}
