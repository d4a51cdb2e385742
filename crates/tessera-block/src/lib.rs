#![forbid(unsafe_code)]
//! tessera-block: the positional Block contract, plain and dictionary-encoded
//! blocks, the block builder, and self-describing block encodings.
//!
//! Blocks are immutable once built and shared through `Arc`, so any number
//! of threads may read the same block (and the same dictionary) without
//! synchronization.

pub mod block;
pub mod builder;
pub mod dictionary;
pub mod encoding;
pub mod fixed_width;
pub mod slice;
pub mod variable_width;

pub use block::{Block, BlockRef};
pub use builder::BlockBuilder;
pub use dictionary::DictionaryBlock;
pub use encoding::{
    default_registry, deserialize_block, serialize_block, BlockEncoding, DictionaryBlockEncoding,
    EncodingRegistry, FixedWidthBlockEncoding, VariableWidthBlockEncoding,
};
pub use fixed_width::FixedWidthBlock;
pub use slice::{SliceInput, SliceOutput};
pub use variable_width::VariableWidthBlock;
