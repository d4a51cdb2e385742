//! Plain block of variable-width values (varchar, varbinary).

use std::any::Any;
use std::sync::Arc;

use tessera_core::error::{Error, Result};
use tessera_core::logical_type::LogicalType;

use crate::block::{assert_position, check_position, check_region, check_width, Block, BlockRef};
use crate::encoding::{BlockEncoding, VariableWidthBlockEncoding};

/// `offsets` holds `n + 1` absolute byte offsets into `data`; a region view
/// keeps the full arrays and moves `position_offset`.
#[derive(Debug, Clone)]
pub struct VariableWidthBlock {
    logical_type: LogicalType,
    position_offset: usize,
    position_count: usize,
    offsets: Arc<[usize]>,
    data: Arc<[u8]>,
    nulls: Option<Arc<[bool]>>,
}

impl VariableWidthBlock {
    pub fn new(
        logical_type: LogicalType,
        offsets: Vec<usize>,
        data: Vec<u8>,
        nulls: Option<Vec<bool>>,
    ) -> Result<Self> {
        if logical_type.is_fixed_width() {
            return Err(Error::IllegalArgument(format!(
                "{logical_type} is not a variable-width type"
            )));
        }
        let Some(&first) = offsets.first() else {
            return Err(Error::IllegalArgument("offsets must hold at least one entry".into()));
        };
        if first != 0 {
            return Err(Error::IllegalArgument(format!("first offset is {first}, expected 0")));
        }
        if offsets.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::IllegalArgument("offsets are not monotonic".into()));
        }
        let position_count = offsets.len() - 1;
        if offsets[position_count] != data.len() {
            return Err(Error::IllegalArgument(format!(
                "last offset {} does not match {} data bytes",
                offsets[position_count],
                data.len()
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
            position_offset: 0,
            position_count,
            offsets: offsets.into(),
            data: data.into(),
            nulls: nulls.filter(|n| n.iter().any(|&v| v)).map(Into::into),
        })
    }

    pub fn from_strs(values: &[&str]) -> Self {
        let values: Vec<Option<&[u8]>> = values.iter().map(|v| Some(v.as_bytes())).collect();
        Self::from_parts(LogicalType::Varchar, &values)
    }

    pub fn from_optional_strs(values: &[Option<&str>]) -> Self {
        let values: Vec<Option<&[u8]>> = values.iter().map(|v| v.map(str::as_bytes)).collect();
        Self::from_parts(LogicalType::Varchar, &values)
    }

    pub fn from_binaries(values: &[&[u8]]) -> Self {
        let values: Vec<Option<&[u8]>> = values.iter().map(|&v| Some(v)).collect();
        Self::from_parts(LogicalType::Varbinary, &values)
    }

    fn from_parts(logical_type: LogicalType, values: &[Option<&[u8]>]) -> Self {
        let mut offsets = Vec::with_capacity(values.len() + 1);
        let mut data = Vec::new();
        let mut nulls = Vec::with_capacity(values.len());
        offsets.push(0);
        for v in values {
            if let Some(bytes) = v {
                data.extend_from_slice(bytes);
            }
            nulls.push(v.is_none());
            offsets.push(data.len());
        }
        Self {
            logical_type,
            position_offset: 0,
            position_count: values.len(),
            offsets: offsets.into(),
            data: data.into(),
            nulls: Some(nulls).filter(|n| n.iter().any(|&v| v)).map(Into::into),
        }
    }

    fn value_start(&self, position: usize) -> usize {
        self.offsets[self.position_offset + position]
    }

    fn value_end(&self, position: usize) -> usize {
        self.offsets[self.position_offset + position + 1]
    }
}

impl Block for VariableWidthBlock {
    fn logical_type(&self) -> LogicalType {
        self.logical_type
    }

    fn position_count(&self) -> usize {
        self.position_count
    }

    fn size_in_bytes(&self) -> Result<usize> {
        let overflow = || Error::Overflow("variable-width block size".into());
        let data = self.offsets[self.position_offset + self.position_count]
            - self.offsets[self.position_offset];
        let offsets = (self.position_count + 1)
            .checked_mul(std::mem::size_of::<u32>())
            .ok_or_else(overflow)?;
        let nulls = if self.nulls.is_some() { self.position_count } else { 0 };
        data.checked_add(offsets)
            .and_then(|s| s.checked_add(nulls))
            .ok_or_else(overflow)
    }

    fn is_null(&self, position: usize) -> bool {
        assert_position(position, self.position_count);
        self.nulls
            .as_ref()
            .is_some_and(|n| n[self.position_offset + position])
    }

    fn length(&self, position: usize) -> usize {
        assert_position(position, self.position_count);
        self.value_end(position) - self.value_start(position)
    }

    fn get_slice(&self, position: usize, offset: usize, length: usize) -> &[u8] {
        assert_position(position, self.position_count);
        debug_assert!(
            offset
                .checked_add(length)
                .is_some_and(|end| end <= self.length(position)),
            "read of {length} bytes at offset {offset} exceeds value length {}",
            self.length(position)
        );
        let start = self.value_start(position) + offset;
        &self.data[start..start + length]
    }

    fn check_access(&self, position: usize, offset: usize, width: usize) -> Result<()> {
        check_position(position, self.position_count)?;
        check_width(position, offset, width, self.length(position))
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
        let value = self.get_slice_value(position).to_vec();
        let nulls = self.is_null(position).then(|| vec![true]);
        Arc::new(Self {
            logical_type: self.logical_type,
            position_offset: 0,
            position_count: 1,
            offsets: vec![0, value.len()].into(),
            data: value.into(),
            nulls: nulls.map(Into::into),
        })
    }

    fn encoding(&self) -> Arc<dyn BlockEncoding> {
        Arc::new(VariableWidthBlockEncoding)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn slices_and_lengths() {
        let block = VariableWidthBlock::from_strs(&["apple", "", "kiwi"]);
        assert_eq!(block.position_count(), 3);
        assert_eq!(block.get_slice_value(0), b"apple");
        assert_eq!(block.length(1), 0);
        assert_eq!(block.get_slice(2, 1, 2), b"iw");
    }

    #[test]
    fn byte_comparisons() {
        let block = VariableWidthBlock::from_strs(&["apple", "apricot"]);
        assert!(block.bytes_equal(0, 0, b"xapp", 1, 3));
        assert_eq!(block.bytes_compare(0, 0, 5, b"apricot", 0, 7), Ordering::Less);
        assert_eq!(block.compare_to(1, 0, 7, &block, 0, 0, 5), Ordering::Greater);
        assert!(block.equals(0, 0, &block, 1, 0, 2));
    }

    #[test]
    fn region_and_single_value() {
        let block = VariableWidthBlock::from_optional_strs(&[Some("a"), None, Some("ccc")]);
        let region = block.get_region(1, 2).unwrap();
        assert!(region.is_null(0));
        assert_eq!(region.get_slice_value(1), b"ccc");
        assert_eq!(region.size_in_bytes().unwrap(), 3 + 3 * 4 + 2);

        let single = region.get_single_value_block(1);
        assert_eq!(single.position_count(), 1);
        assert!(single.equal_to(0, &block, 2));
    }

    #[test]
    fn rejects_malformed_offsets() {
        assert!(VariableWidthBlock::new(LogicalType::Varchar, vec![0, 3, 2], vec![0; 2], None).is_err());
        assert!(VariableWidthBlock::new(LogicalType::Varchar, vec![], vec![], None).is_err());
        assert!(VariableWidthBlock::new(LogicalType::BigInt, vec![0], vec![], None).is_err());
    }

    #[test]
    fn checked_slice_past_value_end() {
        let block = VariableWidthBlock::from_strs(&["abc"]);
        assert!(block.try_get_slice(0, 1, 2).is_ok());
        assert!(matches!(
            block.try_get_slice(0, 2, 2),
            Err(Error::WidthMismatch { length: 3, .. })
        ));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn fast_slice_checks_position_first() {
        let block = VariableWidthBlock::from_strs(&["abc"]);
        block.get_slice(4, usize::MAX, 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "exceeds value length 3")]
    fn fast_slice_offset_overflow_asserts() {
        let block = VariableWidthBlock::from_strs(&["abc"]);
        block.get_slice(0, usize::MAX, 2);
    }
}
