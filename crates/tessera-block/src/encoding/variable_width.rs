//! Plain variable-width layout:
//! [ type name ][ position_count: u32 ][ null mask ]
//! [ (position_count + 1) offsets: u32, rebased to 0 ][ data_len: u32 ][ data bytes ]

use std::sync::Arc;

use tessera_core::error::{Error, Result};
use tessera_core::logical_type::LogicalType;

use super::{read_nulls, write_nulls, BlockEncoding, EncodingRegistry};
use crate::block::{Block, BlockRef};
use crate::slice::{SliceInput, SliceOutput};
use crate::variable_width::VariableWidthBlock;

pub(super) const NAME: &str = "VARIABLE_WIDTH";

#[derive(Debug, Clone, Copy, Default)]
pub struct VariableWidthBlockEncoding;

impl BlockEncoding for VariableWidthBlockEncoding {
    fn name(&self) -> &'static str {
        NAME
    }

    fn write(
        &self,
        _registry: &EncodingRegistry,
        out: &mut SliceOutput,
        block: &dyn Block,
    ) -> Result<()> {
        let logical_type = block.logical_type();
        if logical_type.is_fixed_width() {
            return Err(Error::IllegalArgument(format!(
                "{NAME} cannot write a {logical_type} block"
            )));
        }
        let count = block.position_count();
        out.write_str(logical_type.name())?;
        out.write_len(count)?;
        write_nulls(out, block);

        let mut end = 0usize;
        out.write_len(end)?;
        for position in 0..count {
            end += block.length(position);
            out.write_len(end)?;
        }
        out.write_len(end)?;
        for position in 0..count {
            out.write_bytes(block.get_slice_value(position));
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
    if logical_type.is_fixed_width() {
        return Err(Error::Corrupt(format!("{NAME} payload tagged {logical_type}")));
    }
    let count = input.read_len()?;
    registry.check_decoded_len("variable-width positions", count)?;

    let nulls = read_nulls(input, count)?;
    if (count + 1).saturating_mul(4) > input.remaining() {
        return Err(Error::Corrupt(format!(
            "{count} positions need more offset bytes than the {} remaining",
            input.remaining()
        )));
    }
    let mut offsets = Vec::with_capacity(count + 1);
    for _ in 0..=count {
        offsets.push(input.read_len()?);
    }
    let data_len = input.read_len()?;
    registry.check_decoded_len("variable-width data bytes", data_len)?;
    let data = input.read_bytes(data_len)?.to_vec();

    let block = VariableWidthBlock::new(logical_type, offsets, data, nulls)
        .map_err(|e| Error::Corrupt(e.to_string()))?;
    Ok(Arc::new(block))
}
