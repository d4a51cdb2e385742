//! Plain fixed-width layout:
//! [ type name ][ position_count: u32 ][ null mask ][ position_count * width value bytes ]

use std::sync::Arc;

use tessera_core::error::{Error, Result};
use tessera_core::logical_type::LogicalType;

use super::{read_nulls, write_nulls, BlockEncoding, EncodingRegistry};
use crate::block::{Block, BlockRef};
use crate::fixed_width::FixedWidthBlock;
use crate::slice::{SliceInput, SliceOutput};

pub(super) const NAME: &str = "FIXED_WIDTH";

#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWidthBlockEncoding;

impl BlockEncoding for FixedWidthBlockEncoding {
    fn name(&self) -> &'static str {
        NAME
    }

    /// Writes only the visible positions, so region views encode compactly.
    fn write(
        &self,
        _registry: &EncodingRegistry,
        out: &mut SliceOutput,
        block: &dyn Block,
    ) -> Result<()> {
        let logical_type = block.logical_type();
        let width = logical_type.fixed_width().ok_or_else(|| {
            Error::IllegalArgument(format!("{NAME} cannot write a {logical_type} block"))
        })?;
        let count = block.position_count();
        out.write_str(logical_type.name())?;
        out.write_len(count)?;
        write_nulls(out, block);
        for position in 0..count {
            out.write_bytes(block.get_slice(position, 0, width));
        }
        Ok(())
    }

    fn read(&self, registry: &EncodingRegistry, input: &mut SliceInput<'_>) -> Result<BlockRef> {
        decode(registry, input)
    }
}

pub(super) fn decode(registry: &EncodingRegistry, input: &mut SliceInput<'_>) -> Result<BlockRef> {
    let logical_type: LogicalType = input
        .read_str()?
        .parse()
        .map_err(|e: Error| Error::Corrupt(e.to_string()))?;
    let width = logical_type
        .fixed_width()
        .ok_or_else(|| Error::Corrupt(format!("{NAME} payload tagged {logical_type}")))?;
    let count = input.read_len()?;
    let value_bytes = count
        .checked_mul(width)
        .ok_or_else(|| Error::Corrupt(format!("{count} positions of width {width}")))?;
    registry.check_decoded_len("fixed-width value bytes", value_bytes)?;

    let nulls = read_nulls(input, count)?;
    let values = input.read_bytes(value_bytes)?.to_vec();
    let block = FixedWidthBlock::new(logical_type, count, values, nulls)
        .map_err(|e| Error::Corrupt(e.to_string()))?;
    Ok(Arc::new(block))
}
