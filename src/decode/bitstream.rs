//! BitReader - bit-addressable cursor over an immutable byte buffer
//!
//! Bits are consumed most-significant first within each byte. Raw integer
//! reads (`read_u8`, `read_u16`, `read_u32`) work on whole bytes starting at
//! the current byte offset; they ignore any partially consumed byte and leave
//! the cursor byte-aligned.

use crate::{LsdError, Result};
use byteorder::{BigEndian, ByteOrder};

/// Bit-level reader over a borrowed byte slice
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bit_pos: 0,
        }
    }

    /// Length of the underlying buffer in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the underlying buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current `(byte offset, bit offset)` of the cursor
    pub fn position(&self) -> (usize, u8) {
        (self.pos, self.bit_pos)
    }

    /// Number of bits left between the cursor and the end of the buffer
    pub fn remaining_bits(&self) -> u64 {
        let remaining_bytes = self.data.len().saturating_sub(self.pos) as u64;
        (remaining_bytes * 8).saturating_sub(self.bit_pos as u64)
    }

    /// Move to an absolute byte offset and clear the bit offset
    ///
    /// Returns `false` when the offset lies at or beyond the end of the
    /// buffer. The cursor moves regardless.
    pub fn seek(&mut self, pos: usize) -> bool {
        self.pos = pos;
        self.bit_pos = 0;
        pos < self.data.len()
    }

    /// Advance to the next byte boundary unless already aligned
    pub fn align_to_byte(&mut self) {
        if self.bit_pos != 0 {
            self.bit_pos = 0;
            self.pos += 1;
        }
    }

    /// Read a single bit
    pub fn read_bit(&mut self) -> Result<u32> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| self.out_of_bounds(1))?;
        let bit = (byte >> (7 - self.bit_pos)) & 1;
        if self.bit_pos == 7 {
            self.pos += 1;
            self.bit_pos = 0;
        } else {
            self.bit_pos += 1;
        }
        Ok(bit as u32)
    }

    /// Read `count` bits (at most 32), most significant bit first
    pub fn read_bits(&mut self, count: u32) -> Result<u32> {
        if count > 32 {
            return Err(LsdError::TooManyBits(count));
        }
        if count == 0 {
            return Ok(0);
        }

        let end_bit = self.bit_pos as usize + count as usize;
        let byte_count = end_bit.div_ceil(8);
        let data = self.data;
        let bytes = data
            .get(self.pos..self.pos + byte_count)
            .ok_or_else(|| self.out_of_bounds(byte_count))?;

        // At most five bytes: 7 leading bits already consumed plus 32 wanted
        let mut acc: u64 = 0;
        for &byte in bytes {
            acc = (acc << 8) | byte as u64;
        }
        let shift = byte_count * 8 - end_bit;
        let mask = (1u64 << count) - 1;
        let value = ((acc >> shift) & mask) as u32;

        self.pos += end_bit / 8;
        self.bit_pos = (end_bit % 8) as u8;
        Ok(value)
    }

    /// Read one raw byte
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_raw(1)?[0])
    }

    /// Read a raw big-endian 16-bit word
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.read_raw(2)?))
    }

    /// Read a raw big-endian 32-bit integer
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.read_raw(4)?))
    }

    /// Read `len` raw bytes starting at the current byte offset
    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8]> {
        let data = self.data;
        let bytes = data
            .get(self.pos..self.pos + len)
            .ok_or_else(|| self.out_of_bounds(len))?;
        self.pos += len;
        self.bit_pos = 0;
        Ok(bytes)
    }

    /// Read `len` raw 16-bit units in big-endian order
    pub fn read_utf16_be(&mut self, len: usize) -> Result<Vec<u16>> {
        (0..len).map(|_| self.read_u16()).collect()
    }

    /// Read `len` raw 16-bit units stored little-endian
    pub fn read_utf16_le(&mut self, len: usize) -> Result<Vec<u16>> {
        (0..len).map(|_| Ok(self.read_u16()?.swap_bytes())).collect()
    }

    /// Read a symbol table: 32-bit count, 8-bit entry width, then the entries
    pub fn read_symbols(&mut self) -> Result<Vec<u32>> {
        let count = self.read_bits(32)?;
        let bits_per_symbol = self.read_bits(8)?;
        if bits_per_symbol > 32 {
            return Err(LsdError::TooManyBits(bits_per_symbol));
        }
        self.ensure_bits(count as u64 * bits_per_symbol.max(1) as u64)?;
        (0..count).map(|_| self.read_bits(bits_per_symbol)).collect()
    }

    /// Fail early when fewer than `bits` remain, before sizing a table by them
    pub fn ensure_bits(&self, bits: u64) -> Result<()> {
        if bits > self.remaining_bits() {
            return Err(self.out_of_bounds(bits.div_ceil(8) as usize));
        }
        Ok(())
    }

    fn out_of_bounds(&self, needed: usize) -> LsdError {
        LsdError::OutOfBounds {
            offset: self.pos,
            needed,
            len: self.data.len(),
        }
    }
}
