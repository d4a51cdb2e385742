//! Block-layer configuration that embedding services can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Upper bound for any length or byte count read from an encoded block.
    pub max_decoded_block_bytes: usize,

    /// Range-check every dictionary id while decoding a dictionary block.
    pub validate_decoded_ids: bool,

    /// Largest dictionary (in positions) accepted while decoding.
    pub max_dictionary_positions: usize,

    /// Deepest chain of nested encodings (a dictionary whose dictionary is
    /// itself encoded, and so on) accepted while decoding.
    pub max_nesting_depth: usize,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            max_decoded_block_bytes: 256 * 1024 * 1024, // 256 MiB
            validate_decoded_ids: true,
            max_dictionary_positions: i32::MAX as usize,
            max_nesting_depth: 64,
        }
    }
}

impl BlockConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TESSERA_MAX_DECODED_BLOCK_BYTES`: decode size limit in bytes
    /// - `TESSERA_VALIDATE_DECODED_IDS`: `true`/`false`
    /// - `TESSERA_MAX_DICTIONARY_POSITIONS`: dictionary size limit
    /// - `TESSERA_MAX_NESTING_DEPTH`: nested encoding depth limit
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TESSERA_MAX_DECODED_BLOCK_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_decoded_block_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("TESSERA_VALIDATE_DECODED_IDS") {
            if let Ok(v) = s.parse::<bool>() {
                cfg.validate_decoded_ids = v;
            }
        }

        if let Ok(s) = std::env::var("TESSERA_MAX_DICTIONARY_POSITIONS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_dictionary_positions = v;
            }
        }

        if let Ok(s) = std::env::var("TESSERA_MAX_NESTING_DEPTH") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_nesting_depth = v;
            }
        }

        cfg
    }

    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: BlockConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_decoded_block_bytes == 0 {
            return Err(Error::Config("max_decoded_block_bytes must be > 0".into()));
        }
        if self.max_dictionary_positions == 0 {
            return Err(Error::Config("max_dictionary_positions must be > 0".into()));
        }
        if self.max_nesting_depth == 0 {
            return Err(Error::Config("max_nesting_depth must be > 0".into()));
        }
        if self.max_dictionary_positions > i32::MAX as usize {
            return Err(Error::Config(format!(
                "max_dictionary_positions {} exceeds 32-bit key range",
                self.max_dictionary_positions
            )));
        }
        Ok(())
    }
}
