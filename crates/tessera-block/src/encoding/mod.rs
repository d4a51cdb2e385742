//! Self-describing block serialization.
//!
//! Every encoded block is `[ name: u32 len + utf-8 ][ payload … ]`. Readers
//! look the name up in an [`EncodingRegistry`] and hand the rest of the
//! stream to the matching decoder, which may recurse for nested blocks.
//! An unknown name is fatal; there is no skip-ahead for unknown encodings.

mod dictionary;
mod fixed_width;
mod variable_width;

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use tessera_core::config::BlockConfig;
use tessera_core::error::{Error, Result};

use crate::block::{Block, BlockRef};
use crate::slice::{SliceInput, SliceOutput};

pub use dictionary::DictionaryBlockEncoding;
pub use fixed_width::FixedWidthBlockEncoding;
pub use variable_width::VariableWidthBlockEncoding;

/// Serialization descriptor returned by [`Block::encoding`].
pub trait BlockEncoding: Send + Sync + fmt::Debug {
    /// Stable discriminator written ahead of the payload.
    fn name(&self) -> &'static str;

    /// Write the payload of `block` (the name is written by the registry).
    fn write(&self, registry: &EncodingRegistry, out: &mut SliceOutput, block: &dyn Block)
        -> Result<()>;

    /// Read a payload previously produced by `write`.
    fn read(&self, registry: &EncodingRegistry, input: &mut SliceInput<'_>) -> Result<BlockRef>;
}

/// Decoder entry point registered under an encoding name.
pub type DecodeFn = fn(&EncodingRegistry, &mut SliceInput<'_>) -> Result<BlockRef>;

/// Name → decoder table plus the limits decoders enforce.
pub struct EncodingRegistry {
    config: BlockConfig,
    decoders: HashMap<&'static str, DecodeFn>,
}

impl EncodingRegistry {
    /// Registry with the built-in plain and dictionary encodings.
    pub fn new(config: BlockConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_builtins(config))
    }

    fn with_builtins(config: BlockConfig) -> Self {
        let mut decoders: HashMap<&'static str, DecodeFn> = HashMap::new();
        decoders.insert(fixed_width::NAME, fixed_width::decode);
        decoders.insert(variable_width::NAME, variable_width::decode);
        decoders.insert(dictionary::NAME, dictionary::decode);
        Self { config, decoders }
    }

    pub fn register(&mut self, name: &'static str, decode: DecodeFn) -> Result<()> {
        if self.decoders.contains_key(name) {
            return Err(Error::IllegalArgument(format!(
                "block encoding '{name}' is already registered"
            )));
        }
        self.decoders.insert(name, decode);
        Ok(())
    }

    pub fn config(&self) -> &BlockConfig {
        &self.config
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decoders.contains_key(name)
    }

    /// Write the block's encoding name followed by its payload.
    pub fn write_block(&self, out: &mut SliceOutput, block: &dyn Block) -> Result<()> {
        let encoding = block.encoding();
        out.write_str(encoding.name())?;
        encoding.write(self, out, block)?;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            encoding = encoding.name(),
            positions = block.position_count(),
            bytes = out.len(),
            "wrote block"
        );
        Ok(())
    }

    /// Read an encoding name and dispatch to its decoder.
    ///
    /// Nested reads count against `max_nesting_depth`; a stream that nests
    /// deeper fails with [`Error::Corrupt`] instead of recursing further.
    pub fn read_block(&self, input: &mut SliceInput<'_>) -> Result<BlockRef> {
        let depth = input.nesting_depth();
        if depth >= self.config.max_nesting_depth {
            return Err(Error::Corrupt(format!(
                "block encodings nested deeper than {} at offset {}",
                self.config.max_nesting_depth,
                input.position()
            )));
        }
        input.set_nesting_depth(depth + 1);
        let block = self.read_block_payload(input);
        input.set_nesting_depth(depth);
        block
    }

    fn read_block_payload(&self, input: &mut SliceInput<'_>) -> Result<BlockRef> {
        let name = input.read_str()?;
        let Some(decode) = self.decoders.get(name) else {
            #[cfg(feature = "tracing")]
            tracing::warn!(encoding = name, offset = input.position(), "unknown block encoding");
            return Err(Error::UnknownEncoding(name.to_string()));
        };
        let block = decode(self, input)?;

        #[cfg(feature = "tracing")]
        tracing::trace!(encoding = name, positions = block.position_count(), "read block");
        Ok(block)
    }

    /// Reject a decoded length above `max_decoded_block_bytes`.
    pub fn check_decoded_len(&self, what: &str, len: usize) -> Result<()> {
        if len > self.config.max_decoded_block_bytes {
            return Err(Error::Corrupt(format!(
                "{what} of {len} exceeds limit {}",
                self.config.max_decoded_block_bytes
            )));
        }
        Ok(())
    }
}

impl Default for EncodingRegistry {
    fn default() -> Self {
        Self::with_builtins(BlockConfig::default())
    }
}

impl fmt::Debug for EncodingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.decoders.keys().collect();
        names.sort();
        f.debug_struct("EncodingRegistry")
            .field("config", &self.config)
            .field("encodings", &names)
            .finish()
    }
}

static DEFAULT_REGISTRY: Lazy<EncodingRegistry> = Lazy::new(|| {
    let config = BlockConfig::from_env();
    let registry = EncodingRegistry::new(config).unwrap_or_else(|_e| {
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %_e, "invalid block config in environment, using defaults");
        EncodingRegistry::default()
    });

    #[cfg(feature = "tracing")]
    tracing::debug!(registry = ?registry, "initialised block encoding registry");
    registry
});

/// Process-wide registry, built from `BlockConfig::from_env` on first use.
pub fn default_registry() -> &'static EncodingRegistry {
    &DEFAULT_REGISTRY
}

/// Encode `block` with the default registry.
pub fn serialize_block(block: &dyn Block) -> Result<Vec<u8>> {
    let mut out = SliceOutput::new();
    default_registry().write_block(&mut out, block)?;
    Ok(out.into_inner())
}

/// Decode one block from `bytes` with the default registry; trailing bytes are an error.
pub fn deserialize_block(bytes: &[u8]) -> Result<BlockRef> {
    let mut input = SliceInput::new(bytes);
    let block = default_registry().read_block(&mut input)?;
    if input.remaining() != 0 {
        return Err(Error::Corrupt(format!(
            "{} trailing bytes after block",
            input.remaining()
        )));
    }
    Ok(block)
}

// ----- null mask, shared by the plain encodings -----
//
// [ has_nulls: u8 ][ one u8 (0/1) per position, only when has_nulls = 1 ]

pub(crate) fn write_nulls(out: &mut SliceOutput, block: &dyn Block) {
    let count = block.position_count();
    if !(0..count).any(|p| block.is_null(p)) {
        out.write_u8(0);
        return;
    }
    out.write_u8(1);
    for p in 0..count {
        out.write_u8(block.is_null(p) as u8);
    }
}

pub(crate) fn read_nulls(input: &mut SliceInput<'_>, count: usize) -> Result<Option<Vec<bool>>> {
    match input.read_u8()? {
        0 => Ok(None),
        1 => input
            .read_bytes(count)?
            .iter()
            .map(|&b| match b {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(Error::Corrupt(format!("invalid null flag {other}"))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        other => Err(Error::Corrupt(format!("invalid null mask marker {other}"))),
    }
}
