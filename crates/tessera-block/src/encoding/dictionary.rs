//! Dictionary layout:
//! [ dictionary encoding name ][ dictionary payload ][ ids encoding name ][ ids payload ]
//!
//! Both halves go through the registry, so a dictionary may itself be any
//! registered encoding, including another dictionary block.

use std::sync::Arc;

use tessera_core::error::{Error, Result};

use super::{BlockEncoding, EncodingRegistry};
use crate::block::{Block, BlockRef};
use crate::dictionary::DictionaryBlock;
use crate::slice::{SliceInput, SliceOutput};

pub(super) const NAME: &str = "DICTIONARY";

/// Descriptor pairing the dictionary block itself with the id block's encoding.
#[derive(Debug, Clone)]
pub struct DictionaryBlockEncoding {
    dictionary: BlockRef,
    ids_encoding: Arc<dyn BlockEncoding>,
}

impl DictionaryBlockEncoding {
    pub fn new(dictionary: BlockRef, ids_encoding: Arc<dyn BlockEncoding>) -> Self {
        Self {
            dictionary,
            ids_encoding,
        }
    }

    pub fn dictionary(&self) -> &BlockRef {
        &self.dictionary
    }

    pub fn ids_encoding(&self) -> &Arc<dyn BlockEncoding> {
        &self.ids_encoding
    }

    /// Identity of the dictionary, for serializers that write shared dictionaries once.
    pub fn shares_dictionary_with(&self, other: &DictionaryBlockEncoding) -> bool {
        Arc::ptr_eq(&self.dictionary, &other.dictionary)
    }
}

impl BlockEncoding for DictionaryBlockEncoding {
    fn name(&self) -> &'static str {
        NAME
    }

    fn write(
        &self,
        registry: &EncodingRegistry,
        out: &mut SliceOutput,
        block: &dyn Block,
    ) -> Result<()> {
        let block = block
            .as_any()
            .downcast_ref::<DictionaryBlock>()
            .ok_or_else(|| {
                Error::IllegalArgument(format!("{NAME} cannot write {block:?}"))
            })?;
        if !Arc::ptr_eq(block.dictionary(), &self.dictionary) {
            return Err(Error::IllegalArgument(
                "block does not reference this encoding's dictionary".into(),
            ));
        }

        registry.write_block(out, self.dictionary.as_ref())?;
        out.write_str(self.ids_encoding.name())?;
        self.ids_encoding.write(registry, out, block.ids().as_ref())
    }

    fn read(&self, registry: &EncodingRegistry, input: &mut SliceInput<'_>) -> Result<BlockRef> {
        decode(registry, input)
    }
}

pub(super) fn decode(registry: &EncodingRegistry, input: &mut SliceInput<'_>) -> Result<BlockRef> {
    let dictionary = registry.read_block(input)?;
    let limit = registry.config().max_dictionary_positions;
    if dictionary.position_count() > limit {
        return Err(Error::Corrupt(format!(
            "dictionary of {} positions exceeds limit {limit}",
            dictionary.position_count()
        )));
    }
    let ids = registry.read_block(input)?;

    let block = DictionaryBlock::new(dictionary, ids)?;
    if registry.config().validate_decoded_ids {
        block
            .validate_ids()
            .map_err(|e| Error::Corrupt(format!("decoded dictionary ids: {e}")))?;
    }
    Ok(Arc::new(block))
}
