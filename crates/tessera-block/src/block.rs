//! The positional Block contract.
//!
//! Operators hold a [`BlockRef`] and call these methods by logical position;
//! they never branch on the concrete variant. Every variant must honour the
//! same semantics, so a dictionary-encoded value and a plain value with equal
//! bytes compare and hash identically.
//!
//! Accessors come in two flavours:
//! - the trusted fast path (`get_*`), where the caller already knows the
//!   stored width. Position bounds always panic; width misuse trips a
//!   `debug_assert!` and otherwise a slice bounds panic.
//! - the checked path (`try_get_*`), which reports [`Error::WidthMismatch`] or
//!   [`Error::PositionOutOfRange`] instead.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tessera_core::error::{Error, Result};
use tessera_core::hash::{value_hash, NULL_HASH};
use tessera_core::logical_type::LogicalType;
use tessera_core::session::Session;
use tessera_core::types::Scalar;

use crate::builder::BlockBuilder;
use crate::encoding::BlockEncoding;

/// Shared, immutable handle to a block.
pub type BlockRef = Arc<dyn Block>;

pub trait Block: Send + Sync + fmt::Debug + 'static {
    fn logical_type(&self) -> LogicalType;

    fn position_count(&self) -> usize;

    /// Best-effort memory footprint. Fails with [`Error::Overflow`] rather than wrap.
    fn size_in_bytes(&self) -> Result<usize>;

    fn is_null(&self, position: usize) -> bool;

    /// Bytes stored at `position` (the type width for fixed-width blocks).
    fn length(&self, position: usize) -> usize;

    /// Borrow `length` raw bytes starting `offset` bytes into the value at `position`.
    fn get_slice(&self, position: usize, offset: usize, length: usize) -> &[u8];

    /// Verify that `width` bytes can be read at `offset` of `position`.
    fn check_access(&self, position: usize, offset: usize, width: usize) -> Result<()>;

    /// Lazy view of positions `[offset, offset + length)`.
    fn get_region(&self, offset: usize, length: usize) -> Result<BlockRef>;

    /// Copy of the single value at `position`.
    fn get_single_value_block(&self, position: usize) -> BlockRef;

    fn encoding(&self) -> Arc<dyn BlockEncoding>;

    fn as_any(&self) -> &dyn Any;

    // ----- raw fixed-width reads -----

    fn get_byte(&self, position: usize, offset: usize) -> i8 {
        i8::from_le_bytes(read_array(self.get_slice(position, offset, 1)))
    }

    fn get_short(&self, position: usize, offset: usize) -> i16 {
        i16::from_le_bytes(read_array(self.get_slice(position, offset, 2)))
    }

    fn get_int(&self, position: usize, offset: usize) -> i32 {
        i32::from_le_bytes(read_array(self.get_slice(position, offset, 4)))
    }

    fn get_long(&self, position: usize, offset: usize) -> i64 {
        i64::from_le_bytes(read_array(self.get_slice(position, offset, 8)))
    }

    fn get_float(&self, position: usize, offset: usize) -> f32 {
        f32::from_le_bytes(read_array(self.get_slice(position, offset, 4)))
    }

    fn get_double(&self, position: usize, offset: usize) -> f64 {
        f64::from_le_bytes(read_array(self.get_slice(position, offset, 8)))
    }

    // ----- whole-value reads -----

    fn get_boolean(&self, position: usize) -> bool {
        self.get_byte(position, 0) != 0
    }

    fn get_long_value(&self, position: usize) -> i64 {
        self.get_long(position, 0)
    }

    fn get_double_value(&self, position: usize) -> f64 {
        self.get_double(position, 0)
    }

    fn get_slice_value(&self, position: usize) -> &[u8] {
        self.get_slice(position, 0, self.length(position))
    }

    // ----- checked reads -----

    fn try_get_byte(&self, position: usize, offset: usize) -> Result<i8> {
        self.check_access(position, offset, 1)?;
        Ok(self.get_byte(position, offset))
    }

    fn try_get_short(&self, position: usize, offset: usize) -> Result<i16> {
        self.check_access(position, offset, 2)?;
        Ok(self.get_short(position, offset))
    }

    fn try_get_int(&self, position: usize, offset: usize) -> Result<i32> {
        self.check_access(position, offset, 4)?;
        Ok(self.get_int(position, offset))
    }

    fn try_get_long(&self, position: usize, offset: usize) -> Result<i64> {
        self.check_access(position, offset, 8)?;
        Ok(self.get_long(position, offset))
    }

    fn try_get_float(&self, position: usize, offset: usize) -> Result<f32> {
        self.check_access(position, offset, 4)?;
        Ok(self.get_float(position, offset))
    }

    fn try_get_double(&self, position: usize, offset: usize) -> Result<f64> {
        self.check_access(position, offset, 8)?;
        Ok(self.get_double(position, offset))
    }

    fn try_get_slice(&self, position: usize, offset: usize, length: usize) -> Result<&[u8]> {
        self.check_access(position, offset, length)?;
        Ok(self.get_slice(position, offset, length))
    }

    // ----- comparison and hashing -----

    fn bytes_equal(
        &self,
        position: usize,
        offset: usize,
        other: &[u8],
        other_offset: usize,
        length: usize,
    ) -> bool {
        self.get_slice(position, offset, length) == &other[other_offset..other_offset + length]
    }

    /// Lexicographic three-way comparison of raw bytes.
    fn bytes_compare(
        &self,
        position: usize,
        offset: usize,
        length: usize,
        other: &[u8],
        other_offset: usize,
        other_length: usize,
    ) -> Ordering {
        self.get_slice(position, offset, length)
            .cmp(&other[other_offset..other_offset + other_length])
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
        other_block.bytes_equal(
            other_position,
            other_offset,
            self.get_slice(position, offset, length),
            0,
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
        right_block
            .bytes_compare(
                right_position,
                right_offset,
                right_length,
                self.get_slice(left_position, left_offset, left_length),
                0,
                left_length,
            )
            .reverse()
    }

    /// Whole-value equality. Two nulls are equal; null never equals a value.
    fn equal_to(&self, position: usize, other_block: &dyn Block, other_position: usize) -> bool {
        match (self.is_null(position), other_block.is_null(other_position)) {
            (true, true) => return true,
            (true, false) | (false, true) => return false,
            (false, false) => {}
        }
        let length = self.length(position);
        length == other_block.length(other_position)
            && self.equals(position, 0, other_block, other_position, 0, length)
    }

    /// Content hash of the whole value; [`NULL_HASH`] for nulls.
    fn hash(&self, position: usize) -> u64 {
        if self.is_null(position) {
            return NULL_HASH;
        }
        value_hash(self.get_slice_value(position))
    }

    fn hash_range(&self, position: usize, offset: usize, length: usize) -> u64 {
        value_hash(self.get_slice(position, offset, length))
    }

    // ----- copying out -----

    fn append_to(&self, position: usize, builder: &mut BlockBuilder) {
        if self.is_null(position) {
            builder.append_null();
        } else {
            builder.append_value(self.get_slice_value(position));
        }
    }

    /// Write bytes into the builder's open entry; the caller closes it.
    fn append_slice_to(
        &self,
        position: usize,
        offset: usize,
        length: usize,
        builder: &mut BlockBuilder,
    ) {
        builder.write_bytes(self.get_slice(position, offset, length));
    }

    /// Boxed value for display paths.
    fn object_value(&self, _session: &Session, position: usize) -> Scalar {
        if self.is_null(position) {
            return Scalar::Null;
        }
        match self.logical_type() {
            LogicalType::Boolean => Scalar::Bool(self.get_boolean(position)),
            LogicalType::TinyInt => Scalar::I8(self.get_byte(position, 0)),
            LogicalType::SmallInt => Scalar::I16(self.get_short(position, 0)),
            LogicalType::Integer => Scalar::I32(self.get_int(position, 0)),
            LogicalType::BigInt => Scalar::I64(self.get_long(position, 0)),
            LogicalType::Real => Scalar::F32(self.get_float(position, 0)),
            LogicalType::Double => Scalar::F64(self.get_double(position, 0)),
            LogicalType::Varchar => {
                Scalar::Str(String::from_utf8_lossy(self.get_slice_value(position)).into_owned())
            }
            LogicalType::Varbinary => Scalar::Bin(self.get_slice_value(position).to_vec()),
        }
    }
}

fn read_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

pub(crate) fn check_position(position: usize, position_count: usize) -> Result<()> {
    if position >= position_count {
        return Err(Error::PositionOutOfRange {
            position,
            position_count,
        });
    }
    Ok(())
}

pub(crate) fn check_region(offset: usize, length: usize, position_count: usize) -> Result<()> {
    match offset.checked_add(length) {
        Some(end) if end <= position_count => Ok(()),
        _ => Err(Error::RegionOutOfRange {
            offset,
            length,
            position_count,
        }),
    }
}

/// Fast-path position guard, checked in release builds too.
#[inline]
pub(crate) fn assert_position(position: usize, position_count: usize) {
    assert!(
        position < position_count,
        "position {position} out of range for block with {position_count} positions"
    );
}

pub(crate) fn check_width(
    position: usize,
    offset: usize,
    width: usize,
    length: usize,
) -> Result<()> {
    match offset.checked_add(width) {
        Some(end) if end <= length => Ok(()),
        _ => Err(Error::WidthMismatch {
            position,
            offset,
            width,
            length,
        }),
    }
}
