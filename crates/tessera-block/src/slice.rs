//! Little-endian byte cursors used by block encodings.

use tessera_core::error::{Error, Result};

#[derive(Debug, Default)]
pub struct SliceOutput {
    buf: Vec<u8>,
}

impl SliceOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a length as u32, failing if it does not fit.
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        let v = u32::try_from(len)
            .map_err(|_| Error::Overflow(format!("length {len} does not fit in u32")))?;
        self.write_u32(v);
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Length-prefixed UTF-8 string.
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_len(s.len())?;
        self.write_bytes(s.as_bytes());
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug, Clone)]
pub struct SliceInput<'a> {
    bytes: &'a [u8],
    pos: usize,
    /// Blocks currently being decoded from this stream, outermost included.
    depth: usize,
}

impl<'a> SliceInput<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            depth: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn nesting_depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn set_nesting_depth(&mut self, depth: usize) {
        self.depth = depth;
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::Corrupt(format!(
                "short read: need {len} bytes at offset {}, {} remaining",
                self.pos,
                self.remaining()
            )));
        }
        let out = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.read_bytes(4)?);
        Ok(u32::from_le_bytes(raw))
    }

    pub fn read_len(&mut self) -> Result<usize> {
        Ok(self.read_u32()? as usize)
    }

    pub fn read_str(&mut self) -> Result<&'a str> {
        let len = self.read_len()?;
        let raw = self.read_bytes(len)?;
        std::str::from_utf8(raw).map_err(|e| Error::Corrupt(format!("invalid utf-8 name: {e}")))
    }
}
