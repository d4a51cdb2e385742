//! Plain block of fixed-width values (booleans, integers, floats).
//!
//! Values are stored little-endian, back to back, in storage shared between
//! a block and every region view cut from it.

use std::any::Any;
use std::sync::Arc;

use tessera_core::error::{Error, Result};
use tessera_core::logical_type::LogicalType;

use crate::block::{assert_position, check_position, check_region, check_width, Block, BlockRef};
use crate::encoding::{BlockEncoding, FixedWidthBlockEncoding};

#[derive(Debug, Clone)]
pub struct FixedWidthBlock {
    logical_type: LogicalType,
    width: usize,
    position_offset: usize,
    position_count: usize,
    values: Arc<[u8]>,
    nulls: Option<Arc<[bool]>>,
}

impl FixedWidthBlock {
    /// Build a block over `values` (`position_count * width` bytes).
    /// Null positions still occupy `width` bytes.
    pub fn new(
        logical_type: LogicalType,
        position_count: usize,
        values: Vec<u8>,
        nulls: Option<Vec<bool>>,
    ) -> Result<Self> {
        let width = logical_type.fixed_width().ok_or_else(|| {
            Error::IllegalArgument(format!("{logical_type} is not a fixed-width type"))
        })?;
        let expected = position_count
            .checked_mul(width)
            .ok_or_else(|| Error::Overflow(format!("{position_count} x {width} bytes")))?;
        if values.len() != expected {
            return Err(Error::IllegalArgument(format!(
                "expected {expected} value bytes for {position_count} {logical_type} positions, got {}",
                values.len()
            )));
        }
        if let Some(nulls) = &nulls {
            if nulls.len() != position_count {
                return Err(Error::IllegalArgument(format!(
                    "null mask has {} entries for {position_count} positions",
                    nulls.len()
                )));
            }
        }
        Ok(Self {
            logical_type,
            width,
            position_offset: 0,
            position_count,
            values: values.into(),
            nulls: nulls.filter(|n| n.iter().any(|&v| v)).map(Into::into),
        })
    }

    pub fn from_longs(values: &[i64]) -> Self {
        Self::from_le_values(LogicalType::BigInt, values.iter().map(|v| v.to_le_bytes()), None)
    }

    pub fn from_optional_longs(values: &[Option<i64>]) -> Self {
        let nulls = values.iter().map(Option::is_none).collect();
        Self::from_le_values(
            LogicalType::BigInt,
            values.iter().map(|v| v.unwrap_or_default().to_le_bytes()),
            Some(nulls),
        )
    }

    pub fn from_ints(values: &[i32]) -> Self {
        Self::from_le_values(LogicalType::Integer, values.iter().map(|v| v.to_le_bytes()), None)
    }

    pub fn from_doubles(values: &[f64]) -> Self {
        Self::from_le_values(LogicalType::Double, values.iter().map(|v| v.to_le_bytes()), None)
    }

    pub fn from_booleans(values: &[bool]) -> Self {
        Self::from_le_values(LogicalType::Boolean, values.iter().map(|&v| [v as u8]), None)
    }

    fn from_le_values<const N: usize>(
        logical_type: LogicalType,
        values: impl ExactSizeIterator<Item = [u8; N]>,
        nulls: Option<Vec<bool>>,
    ) -> Self {
        let position_count = values.len();
        let mut bytes = Vec::with_capacity(position_count * N);
        for v in values {
            bytes.extend_from_slice(&v);
        }
        Self {
            logical_type,
            width: N,
            position_offset: 0,
            position_count,
            values: bytes.into(),
            nulls: nulls.filter(|n| n.iter().any(|&v| v)).map(Into::into),
        }
    }

    /// True when a null mask is present; a region view may still hold no nulls.
    pub fn may_have_null(&self) -> bool {
        self.nulls.is_some()
    }

    fn value_start(&self, position: usize) -> usize {
        (self.position_offset + position) * self.width
    }
}

impl Block for FixedWidthBlock {
    fn logical_type(&self) -> LogicalType {
        self.logical_type
    }

    fn position_count(&self) -> usize {
        self.position_count
    }

    fn size_in_bytes(&self) -> Result<usize> {
        let values = self
            .position_count
            .checked_mul(self.width)
            .ok_or_else(|| Error::Overflow("fixed-width block size".into()))?;
        let nulls = if self.nulls.is_some() { self.position_count } else { 0 };
        values
            .checked_add(nulls)
            .ok_or_else(|| Error::Overflow("fixed-width block size".into()))
    }

    fn is_null(&self, position: usize) -> bool {
        assert_position(position, self.position_count);
        self.nulls
            .as_ref()
            .is_some_and(|n| n[self.position_offset + position])
    }

    fn length(&self, position: usize) -> usize {
        assert_position(position, self.position_count);
        self.width
    }

    fn get_slice(&self, position: usize, offset: usize, length: usize) -> &[u8] {
        assert_position(position, self.position_count);
        debug_assert!(
            offset.checked_add(length).is_some_and(|end| end <= self.width),
            "read of {length} bytes at offset {offset} exceeds {} width {}",
            self.logical_type,
            self.width
        );
        let start = self.value_start(position) + offset;
        &self.values[start..start + length]
    }

    fn check_access(&self, position: usize, offset: usize, width: usize) -> Result<()> {
        check_position(position, self.position_count)?;
        check_width(position, offset, width, self.width)
    }

    fn get_region(&self, offset: usize, length: usize) -> Result<BlockRef> {
        check_region(offset, length, self.position_count)?;
        Ok(Arc::new(Self {
            position_offset: self.position_offset + offset,
            position_count: length,
            ..self.clone()
        }))
    }

    fn get_single_value_block(&self, position: usize) -> BlockRef {
        let value = self.get_slice(position, 0, self.width).to_vec();
        let nulls = self.is_null(position).then(|| vec![true]);
        Arc::new(Self {
            logical_type: self.logical_type,
            width: self.width,
            position_offset: 0,
            position_count: 1,
            values: value.into(),
            nulls: nulls.map(Into::into),
        })
    }

    fn encoding(&self) -> Arc<dyn BlockEncoding> {
        Arc::new(FixedWidthBlockEncoding)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::session::Session;
    use tessera_core::types::Scalar;

    #[test]
    fn reads_little_endian_longs() {
        let block = FixedWidthBlock::from_longs(&[7, -1, i64::MAX]);
        assert_eq!(block.position_count(), 3);
        assert_eq!(block.get_long(0, 0), 7);
        assert_eq!(block.get_long_value(1), -1);
        assert_eq!(block.get_long(2, 0), i64::MAX);
        assert_eq!(block.size_in_bytes().unwrap(), 24);
    }

    #[test]
    fn region_shares_storage_and_rebases_positions() {
        let block = FixedWidthBlock::from_longs(&[10, 20, 30, 40]);
        let region = block.get_region(1, 2).unwrap();
        assert_eq!(region.position_count(), 2);
        assert_eq!(region.get_long(0, 0), 20);
        assert_eq!(region.get_long(1, 0), 30);

        let inner = region.as_any().downcast_ref::<FixedWidthBlock>().unwrap();
        assert!(Arc::ptr_eq(&inner.values, &block.values));
    }

    #[test]
    fn region_out_of_range_is_an_error() {
        let block = FixedWidthBlock::from_longs(&[1, 2]);
        assert!(matches!(
            block.get_region(1, 2),
            Err(Error::RegionOutOfRange { .. })
        ));
        assert!(block.get_region(2, 0).is_ok());
    }

    #[test]
    fn nulls_follow_regions() {
        let block = FixedWidthBlock::from_optional_longs(&[Some(1), None, Some(3)]);
        assert!(block.is_null(1));
        let region = block.get_region(1, 2).unwrap();
        assert!(region.is_null(0));
        assert!(!region.is_null(1));
        assert_eq!(region.object_value(&Session::default(), 0), Scalar::Null);
        assert_eq!(region.object_value(&Session::default(), 1), Scalar::I64(3));
    }

    #[test]
    fn checked_reads_report_width_mismatch() {
        let block = FixedWidthBlock::from_ints(&[5]);
        assert_eq!(block.try_get_int(0, 0).unwrap(), 5);
        assert!(matches!(
            block.try_get_long(0, 0),
            Err(Error::WidthMismatch { width: 8, length: 4, .. })
        ));
        assert!(matches!(
            block.try_get_int(1, 0),
            Err(Error::PositionOutOfRange { position: 1, .. })
        ));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn fast_path_panics_past_region_end() {
        let block = FixedWidthBlock::from_longs(&[1, 2, 3]);
        let region = block.get_region(0, 1).unwrap();
        region.get_long(1, 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "exceeds bigint width 8")]
    fn fast_slice_offset_overflow_asserts() {
        let block = FixedWidthBlock::from_longs(&[1]);
        block.get_slice(0, usize::MAX, 2);
    }

    #[test]
    fn rejects_variable_width_type() {
        let err = FixedWidthBlock::new(LogicalType::Varchar, 0, vec![], None).unwrap_err();
        assert!(matches!(err, Error::IllegalArgument(_)));
    }
}
