//! Dictionary-encoded block.
//!
//! A `DictionaryBlock` pairs a dictionary of values with a `bigint` id block
//! holding one dictionary key per logical position. Every position-keyed call
//! resolves `key = ids[position]` (narrowed to 32 bits) and forwards the same
//! call to the dictionary at `key`. Neither constituent is copied: the block
//! holds shared handles, and many dictionary blocks may share one dictionary.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tessera_core::error::{Error, Result};
use tessera_core::logical_type::LogicalType;
use tessera_core::session::Session;
use tessera_core::types::Scalar;

use crate::block::{check_position, Block, BlockRef};
use crate::builder::BlockBuilder;
use crate::encoding::{BlockEncoding, DictionaryBlockEncoding};
use crate::fixed_width::FixedWidthBlock;

#[derive(Clone)]
pub struct DictionaryBlock {
    dictionary: BlockRef,
    ids: BlockRef,
}

impl DictionaryBlock {
    /// Fails with [`Error::IllegalArgument`] unless `ids` is a `bigint` block
    /// without null ids.
    ///
    /// Nulls are checked here only for plain id blocks that carry a null
    /// mask; any other id block must not hold nulls, which
    /// [`Self::dictionary_key`] asserts in debug builds. Id bounds are the
    /// producer's responsibility; see [`Self::validate_ids`].
    pub fn new(dictionary: BlockRef, ids: BlockRef) -> Result<Self> {
        if ids.logical_type() != LogicalType::BigInt {
            return Err(Error::IllegalArgument(format!(
                "Expected bigint block but got {} block",
                ids.logical_type()
            )));
        }
        if let Some(plain) = ids.as_any().downcast_ref::<FixedWidthBlock>() {
            if plain.may_have_null() {
                if let Some(position) = (0..plain.position_count()).find(|&p| plain.is_null(p)) {
                    return Err(Error::IllegalArgument(format!(
                        "null dictionary id at position {position}"
                    )));
                }
            }
        }
        Ok(Self { dictionary, ids })
    }

    /// Assemble from constituents that may still be missing.
    pub fn from_parts(dictionary: Option<BlockRef>, ids: Option<BlockRef>) -> Result<Self> {
        let dictionary = dictionary.ok_or(Error::NullArgument("dictionary is null"))?;
        let ids = ids.ok_or(Error::NullArgument("ids is null"))?;
        Self::new(dictionary, ids)
    }

    pub fn dictionary(&self) -> &BlockRef {
        &self.dictionary
    }

    pub fn ids(&self) -> &BlockRef {
        &self.ids
    }

    /// Encoding descriptor pairing this block's dictionary with the id encoding.
    pub fn dictionary_encoding(&self) -> DictionaryBlockEncoding {
        DictionaryBlockEncoding::new(Arc::clone(&self.dictionary), self.ids.encoding())
    }

    /// True when both blocks reference the identical dictionary instance.
    pub fn shares_dictionary_with(&self, other: &DictionaryBlock) -> bool {
        Arc::ptr_eq(&self.dictionary, &other.dictionary)
    }

    /// Dictionary key for `position`.
    ///
    /// Panics if the stored id does not narrow to a non-negative 32-bit key;
    /// that only happens when the id block is corrupt.
    pub fn dictionary_key(&self, position: usize) -> usize {
        debug_assert!(
            !self.ids.is_null(position),
            "null dictionary id at position {position}"
        );
        let id = self.ids.get_long_value(position);
        match narrow_id(id) {
            Ok(key) => key,
            Err(e) => panic!("dictionary id at position {position}: {e}"),
        }
    }

    /// Checked counterpart of [`Self::dictionary_key`].
    pub fn try_dictionary_key(&self, position: usize) -> Result<usize> {
        check_position(position, self.ids.position_count())?;
        if self.ids.is_null(position) {
            return Err(Error::IllegalArgument(format!(
                "null dictionary id at position {position}"
            )));
        }
        narrow_id(self.ids.try_get_long(position, 0)?)
    }

    /// Check every id against the dictionary bounds. O(position count).
    pub fn validate_ids(&self) -> Result<()> {
        let dictionary_size = self.dictionary.position_count();
        for position in 0..self.ids.position_count() {
            let key = self.try_dictionary_key(position)?;
            if key >= dictionary_size {
                return Err(Error::IllegalArgument(format!(
                    "dictionary id {key} at position {position} outside dictionary of {dictionary_size} entries"
                )));
            }
        }
        Ok(())
    }
}

fn narrow_id(id: i64) -> Result<usize> {
    let key = i32::try_from(id)
        .map_err(|_| Error::Overflow(format!("dictionary id {id} does not fit in 32 bits")))?;
    usize::try_from(key).map_err(|_| Error::IllegalArgument(format!("negative dictionary id {key}")))
}

impl fmt::Debug for DictionaryBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictionaryBlock")
            .field("logical_type", &self.dictionary.logical_type())
            .field("position_count", &self.ids.position_count())
            .field("dictionary_positions", &self.dictionary.position_count())
            .finish()
    }
}

impl Block for DictionaryBlock {
    fn logical_type(&self) -> LogicalType {
        self.dictionary.logical_type()
    }

    fn position_count(&self) -> usize {
        self.ids.position_count()
    }

    fn size_in_bytes(&self) -> Result<usize> {
        let dictionary = self.dictionary.size_in_bytes()?;
        let ids = self.ids.size_in_bytes()?;
        dictionary.checked_add(ids).ok_or_else(|| {
            Error::Overflow(format!(
                "dictionary block size {dictionary} + {ids} exceeds usize"
            ))
        })
    }

    fn is_null(&self, position: usize) -> bool {
        self.dictionary.is_null(self.dictionary_key(position))
    }

    fn length(&self, position: usize) -> usize {
        self.dictionary.length(self.dictionary_key(position))
    }

    fn get_slice(&self, position: usize, offset: usize, length: usize) -> &[u8] {
        self.dictionary
            .get_slice(self.dictionary_key(position), offset, length)
    }

    fn check_access(&self, position: usize, offset: usize, width: usize) -> Result<()> {
        let key = self.try_dictionary_key(position)?;
        self.dictionary.check_access(key, offset, width)
    }

    /// Slices only the ids; the dictionary handle is shared, not copied.
    fn get_region(&self, offset: usize, length: usize) -> Result<BlockRef> {
        Ok(Arc::new(Self {
            dictionary: Arc::clone(&self.dictionary),
            ids: self.ids.get_region(offset, length)?,
        }))
    }

    fn get_single_value_block(&self, position: usize) -> BlockRef {
        self.dictionary
            .get_single_value_block(self.dictionary_key(position))
    }

    fn encoding(&self) -> Arc<dyn BlockEncoding> {
        Arc::new(self.dictionary_encoding())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get_byte(&self, position: usize, offset: usize) -> i8 {
        self.dictionary.get_byte(self.dictionary_key(position), offset)
    }

    fn get_short(&self, position: usize, offset: usize) -> i16 {
        self.dictionary.get_short(self.dictionary_key(position), offset)
    }

    fn get_int(&self, position: usize, offset: usize) -> i32 {
        self.dictionary.get_int(self.dictionary_key(position), offset)
    }

    fn get_long(&self, position: usize, offset: usize) -> i64 {
        self.dictionary.get_long(self.dictionary_key(position), offset)
    }

    fn get_float(&self, position: usize, offset: usize) -> f32 {
        self.dictionary.get_float(self.dictionary_key(position), offset)
    }

    fn get_double(&self, position: usize, offset: usize) -> f64 {
        self.dictionary.get_double(self.dictionary_key(position), offset)
    }

    fn get_boolean(&self, position: usize) -> bool {
        self.dictionary.get_boolean(self.dictionary_key(position))
    }

    fn get_long_value(&self, position: usize) -> i64 {
        self.dictionary.get_long_value(self.dictionary_key(position))
    }

    fn get_double_value(&self, position: usize) -> f64 {
        self.dictionary.get_double_value(self.dictionary_key(position))
    }

    fn get_slice_value(&self, position: usize) -> &[u8] {
        self.dictionary.get_slice_value(self.dictionary_key(position))
    }

    fn bytes_equal(
        &self,
        position: usize,
        offset: usize,
        other: &[u8],
        other_offset: usize,
        length: usize,
    ) -> bool {
        self.dictionary.bytes_equal(
            self.dictionary_key(position),
            offset,
            other,
            other_offset,
            length,
        )
    }

    fn bytes_compare(
        &self,
        position: usize,
        offset: usize,
        length: usize,
        other: &[u8],
        other_offset: usize,
        other_length: usize,
    ) -> Ordering {
        self.dictionary.bytes_compare(
            self.dictionary_key(position),
            offset,
            length,
            other,
            other_offset,
            other_length,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn equals(
        &self,
        position: usize,
        offset: usize,
        other_block: &dyn Block,
        other_position: usize,
        other_offset: usize,
        length: usize,
    ) -> bool {
        self.dictionary.equals(
            self.dictionary_key(position),
            offset,
            other_block,
            other_position,
            other_offset,
            length,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn compare_to(
        &self,
        left_position: usize,
        left_offset: usize,
        left_length: usize,
        right_block: &dyn Block,
        right_position: usize,
        right_offset: usize,
        right_length: usize,
    ) -> Ordering {
        self.dictionary.compare_to(
            self.dictionary_key(left_position),
            left_offset,
            left_length,
            right_block,
            right_position,
            right_offset,
            right_length,
        )
    }

    fn equal_to(&self, position: usize, other_block: &dyn Block, other_position: usize) -> bool {
        let key = self.dictionary_key(position);
        // Equal keys into one shared dictionary are equal values. Unequal keys
        // are not proof of inequality: dictionaries may hold duplicates.
        if let Some(other) = other_block.as_any().downcast_ref::<DictionaryBlock>() {
            if self.shares_dictionary_with(other) && key == other.dictionary_key(other_position) {
                return true;
            }
        }
        self.dictionary.equal_to(key, other_block, other_position)
    }

    fn hash(&self, position: usize) -> u64 {
        self.dictionary.hash(self.dictionary_key(position))
    }

    fn hash_range(&self, position: usize, offset: usize, length: usize) -> u64 {
        self.dictionary
            .hash_range(self.dictionary_key(position), offset, length)
    }

    fn append_to(&self, position: usize, builder: &mut BlockBuilder) {
        self.dictionary.append_to(self.dictionary_key(position), builder);
    }

    fn append_slice_to(
        &self,
        position: usize,
        offset: usize,
        length: usize,
        builder: &mut BlockBuilder,
    ) {
        self.dictionary
            .append_slice_to(self.dictionary_key(position), offset, length, builder);
    }

    fn object_value(&self, session: &Session, position: usize) -> Scalar {
        self.dictionary
            .object_value(session, self.dictionary_key(position))
    }
}
