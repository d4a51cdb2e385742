//! Mutable accumulator that blocks copy values into.
//!
//! Bytes are written into an open entry and committed with `close_entry`.
//! Fixed-width entries are checked against the type width in `build`.

use std::sync::Arc;

use tessera_core::error::{Error, Result};
use tessera_core::logical_type::LogicalType;

use crate::block::BlockRef;
use crate::fixed_width::FixedWidthBlock;
use crate::variable_width::VariableWidthBlock;

#[derive(Debug)]
pub struct BlockBuilder {
    logical_type: LogicalType,
    data: Vec<u8>,
    offsets: Vec<usize>,
    nulls: Vec<bool>,
    /// First entry whose width did not match a fixed-width type: (entry, bytes).
    bad_entry: Option<(usize, usize)>,
}

impl BlockBuilder {
    pub fn new(logical_type: LogicalType, expected_entries: usize) -> Self {
        let mut offsets = Vec::with_capacity(expected_entries + 1);
        offsets.push(0);
        Self {
            logical_type,
            data: Vec::with_capacity(expected_entries * logical_type.fixed_width().unwrap_or(16)),
            offsets,
            nulls: Vec::with_capacity(expected_entries),
            bad_entry: None,
        }
    }

    /// Closed entries so far.
    pub fn position_count(&self) -> usize {
        self.nulls.len()
    }

    pub fn write_byte(&mut self, value: i8) -> &mut Self {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_short(&mut self, value: i16) -> &mut Self {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_int(&mut self, value: i32) -> &mut Self {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_long(&mut self, value: i64) -> &mut Self {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_float(&mut self, value: f32) -> &mut Self {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_double(&mut self, value: f64) -> &mut Self {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn close_entry(&mut self) -> &mut Self {
        let start = self.offsets[self.offsets.len() - 1];
        let len = self.data.len() - start;
        if let Some(width) = self.logical_type.fixed_width() {
            if len != width && self.bad_entry.is_none() {
                self.bad_entry = Some((self.nulls.len(), len));
            }
        }
        self.offsets.push(self.data.len());
        self.nulls.push(false);
        self
    }

    /// Append a null. Fixed-width nulls still occupy a zeroed slot.
    pub fn append_null(&mut self) -> &mut Self {
        debug_assert_eq!(
            self.data.len(),
            self.offsets[self.offsets.len() - 1],
            "append_null with an open entry"
        );
        if let Some(width) = self.logical_type.fixed_width() {
            self.data.resize(self.data.len() + width, 0);
        }
        self.offsets.push(self.data.len());
        self.nulls.push(true);
        self
    }

    pub fn append_value(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_bytes(bytes).close_entry()
    }

    pub fn build(self) -> Result<BlockRef> {
        let open = self.data.len() - self.offsets[self.offsets.len() - 1];
        if open != 0 {
            return Err(Error::IllegalArgument(format!(
                "builder has an unclosed entry of {open} bytes"
            )));
        }
        let has_nulls = self.nulls.iter().any(|&n| n);
        let nulls = has_nulls.then_some(self.nulls);
        match self.logical_type.fixed_width() {
            Some(width) => {
                if let Some((entry, len)) = self.bad_entry {
                    return Err(Error::IllegalArgument(format!(
                        "entry {entry} has {len} bytes, expected {width} for {}",
                        self.logical_type
                    )));
                }
                let count = self.offsets.len() - 1;
                Ok(Arc::new(FixedWidthBlock::new(
                    self.logical_type,
                    count,
                    self.data,
                    nulls,
                )?))
            }
            None => Ok(Arc::new(VariableWidthBlock::new(
                self.logical_type,
                self.offsets,
                self.data,
                nulls,
            )?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;

    #[test]
    fn builds_fixed_width_with_nulls() {
        let mut builder = BlockBuilder::new(LogicalType::BigInt, 3);
        builder.write_long(11).close_entry();
        builder.append_null();
        builder.write_long(33).close_entry();
        assert_eq!(builder.position_count(), 3);

        let block = builder.build().unwrap();
        assert_eq!(block.logical_type(), LogicalType::BigInt);
        assert_eq!(block.get_long(0, 0), 11);
        assert!(block.is_null(1));
        assert_eq!(block.get_long(2, 0), 33);
    }

    #[test]
    fn builds_variable_width_from_pieces() {
        let mut builder = BlockBuilder::new(LogicalType::Varchar, 2);
        builder.write_bytes(b"foo").write_bytes(b"bar").close_entry();
        builder.append_value(b"baz");
        let block = builder.build().unwrap();
        assert_eq!(block.get_slice_value(0), b"foobar");
        assert_eq!(block.get_slice_value(1), b"baz");
    }

    #[test]
    fn wrong_width_entry_fails_build() {
        let mut builder = BlockBuilder::new(LogicalType::Integer, 1);
        builder.write_long(1).close_entry();
        assert!(matches!(builder.build(), Err(Error::IllegalArgument(_))));
    }

    #[test]
    fn unclosed_entry_fails_build() {
        let mut builder = BlockBuilder::new(LogicalType::Varchar, 1);
        builder.write_bytes(b"x");
        assert!(builder.build().is_err());
    }
}
