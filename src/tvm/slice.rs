//! Slice implementation for reading data from cells
//!
//! A Slice reads a Cell sequentially, tracking the current position in both
//! bits and references. Slices are owned values: cloning one gives an
//! independent cursor, so a speculative parse on a copy never moves the
//! original.

use crate::tvm::address::Address;
use crate::tvm::cell::Cell;
use crate::tvm::error::{CellError, CellResult};
use num_bigint::BigUint;
use std::sync::Arc;

/// A slice for reading data from a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    /// The cell being read
    cell: Arc<Cell>,
    /// Current bit position in the cell
    bit_pos: usize,
    /// Current reference position
    ref_pos: usize,
}

impl Slice {
    /// Creates a new slice from a cell
    pub fn new(cell: Arc<Cell>) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    /// Returns the number of remaining bits
    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len() - self.bit_pos
    }

    /// Returns the number of remaining references
    pub fn remaining_refs(&self) -> usize {
        self.cell.reference_count() - self.ref_pos
    }

    /// Checks if neither bits nor references remain
    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0 && self.remaining_refs() == 0
    }

    fn ensure_bits(&self, n: usize) -> CellResult<()> {
        let remaining = self.remaining_bits();
        if n > remaining {
            return Err(CellError::CellUnderflow {
                requested: n,
                remaining,
            });
        }
        Ok(())
    }

    /// Loads a single bit
    pub fn load_bit(&mut self) -> CellResult<bool> {
        self.ensure_bits(1)?;
        let bit = self.cell.bit_at(self.bit_pos);
        self.bit_pos += 1;
        Ok(bit)
    }

    /// Loads multiple bits into a left-aligned byte vector
    pub fn load_bits(&mut self, n: usize) -> CellResult<Vec<u8>> {
        self.ensure_bits(n)?;

        let mut result = vec![0u8; n.div_ceil(8)];
        for i in 0..n {
            if self.cell.bit_at(self.bit_pos + i) {
                result[i / 8] |= 1 << (7 - i % 8);
            }
        }
        self.bit_pos += n;

        Ok(result)
    }

    /// Loads a byte (8 bits)
    pub fn load_byte(&mut self) -> CellResult<u8> {
        Ok(self.load_uint(8)? as u8)
    }

    /// Loads multiple bytes
    pub fn load_bytes(&mut self, n: usize) -> CellResult<Vec<u8>> {
        self.load_bits(n * 8)
    }

    /// Loads a u16 value (16 bits, big-endian)
    pub fn load_u16(&mut self) -> CellResult<u16> {
        Ok(self.load_uint(16)? as u16)
    }

    /// Loads a u32 value (32 bits, big-endian)
    pub fn load_u32(&mut self) -> CellResult<u32> {
        Ok(self.load_uint(32)? as u32)
    }

    /// Loads a u64 value (64 bits, big-endian)
    pub fn load_u64(&mut self) -> CellResult<u64> {
        self.load_uint(64)
    }

    /// Loads an unsigned integer of `bits` width (at most 64)
    pub fn load_uint(&mut self, bits: usize) -> CellResult<u64> {
        let value = self.preload_uint(bits)?;
        self.bit_pos += bits;
        Ok(value)
    }

    /// Reads an unsigned integer without advancing the position
    pub fn preload_uint(&self, bits: usize) -> CellResult<u64> {
        if bits > 64 {
            return Err(CellError::IntegerOverflow(bits));
        }
        self.ensure_bits(bits)?;

        let mut result = 0u64;
        for i in 0..bits {
            result = (result << 1) | self.cell.bit_at(self.bit_pos + i) as u64;
        }
        Ok(result)
    }

    /// Loads an unsigned integer of arbitrary width (up to a full cell)
    pub fn load_big_uint(&mut self, bits: usize) -> CellResult<BigUint> {
        let bytes = self.load_bits(bits)?;
        // `load_bits` left-aligns, shift back to get the numeric value
        let value = BigUint::from_bytes_be(&bytes);
        Ok(value >> (bytes.len() * 8 - bits))
    }

    /// Loads a signed integer with a specific number of bits
    pub fn load_int(&mut self, bits: usize) -> CellResult<i64> {
        if bits == 0 {
            return Ok(0);
        }

        let unsigned = self.load_uint(bits)?;

        let sign_bit = 1u64 << (bits - 1);
        if bits < 64 && unsigned & sign_bit != 0 {
            let mask = !0u64 << bits;
            Ok((unsigned | mask) as i64)
        } else {
            Ok(unsigned as i64)
        }
    }

    /// Loads a reference to another cell
    pub fn load_reference(&mut self) -> CellResult<Arc<Cell>> {
        let reference = self
            .cell
            .reference(self.ref_pos)
            .ok_or(CellError::RefUnderflow)?
            .clone();

        self.ref_pos += 1;
        Ok(reference)
    }

    /// Reads an unsigned integer and returns it with an advanced copy of the slice
    pub fn read_uint(&self, bits: usize) -> CellResult<(u64, Slice)> {
        let mut next = self.clone();
        let value = next.load_uint(bits)?;
        Ok((value, next))
    }

    /// Reads a reference and returns it with an advanced copy of the slice
    pub fn read_ref(&self) -> CellResult<(Arc<Cell>, Slice)> {
        let mut next = self.clone();
        let cell = next.load_reference()?;
        Ok((cell, next))
    }

    /// Skips a number of bits
    pub fn skip_bits(&mut self, n: usize) -> CellResult<()> {
        self.ensure_bits(n)?;
        self.bit_pos += n;
        Ok(())
    }

    /// Gets the current bit position
    pub fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Loads coins (VarUInteger 16)
    /// Length is encoded in 4 bits, then that many bytes of value
    pub fn load_coins(&mut self) -> CellResult<u128> {
        let len = self.load_uint(4)? as usize;
        if len == 0 {
            return Ok(0);
        }

        let bytes = self.load_bytes(len)?;
        Ok(bytes
            .iter()
            .fold(0u128, |acc, &byte| (acc << 8) | byte as u128))
    }

    /// Loads a message address, `None` for `addr_none`
    pub fn load_address(&mut self) -> CellResult<Option<Address>> {
        match self.load_uint(2)? {
            // addr_none$00
            0b00 => Ok(None),
            // addr_std$10 anycast:(Maybe Anycast) workchain_id:int8 address:bits256
            0b10 => {
                if self.load_bit()? {
                    return Err(CellError::InvalidTag(1));
                }
                let workchain = self.load_int(8)? as i8;
                let bytes = self.load_bytes(32)?;
                let mut account_id = [0u8; 32];
                account_id.copy_from_slice(&bytes);
                Ok(Some(Address::new(workchain, account_id)))
            }
            tag => Err(CellError::InvalidTag(tag)),
        }
    }

    /// Loads an optional reference (Maybe ^Cell)
    pub fn load_maybe_ref(&mut self) -> CellResult<Option<Arc<Cell>>> {
        if self.load_bit()? {
            Ok(Some(self.load_reference()?))
        } else {
            Ok(None)
        }
    }
}

impl From<Arc<Cell>> for Slice {
    fn from(cell: Arc<Cell>) -> Self {
        Self::new(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tvm::cell::CellBuilder;

    #[test]
    fn test_slice_load_bits() {
        let mut builder = CellBuilder::new();
        builder.store_byte(0xFF).unwrap();
        builder.store_byte(0x00).unwrap();
        let cell = builder.build().unwrap();

        let mut slice = Slice::new(cell);
        assert_eq!(slice.remaining_bits(), 16);

        assert_eq!(slice.load_byte().unwrap(), 0xFF);
        assert_eq!(slice.remaining_bits(), 8);

        assert_eq!(slice.load_byte().unwrap(), 0x00);
        assert_eq!(slice.remaining_bits(), 0);
    }

    #[test]
    fn test_slice_load_uint_unaligned() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0b1, 1).unwrap();
        builder.store_uint(0x1234, 13).unwrap();
        let cell = builder.build().unwrap();

        let mut slice = Slice::new(cell);
        assert!(slice.load_bit().unwrap());
        assert_eq!(slice.load_uint(13).unwrap(), 0x1234);
    }

    #[test]
    fn test_slice_underflow_at_end() {
        let mut builder = CellBuilder::new();
        builder.store_u32(7).unwrap();
        let mut slice = Slice::new(builder.build().unwrap());
        slice.load_u32().unwrap();

        assert_eq!(
            slice.load_uint(1).unwrap_err(),
            CellError::CellUnderflow {
                requested: 1,
                remaining: 0
            }
        );
        // A failed read does not move the cursor
        assert_eq!(slice.bit_position(), 32);
    }

    #[test]
    fn test_slice_ref_underflow() {
        let ref_cell = CellBuilder::new().build().unwrap();

        let mut builder = CellBuilder::new();
        builder.store_reference(ref_cell).unwrap();
        let mut slice = Slice::new(builder.build().unwrap());
        assert_eq!(slice.remaining_refs(), 1);

        slice.load_reference().unwrap();
        assert_eq!(slice.remaining_refs(), 0);
        assert_eq!(slice.load_reference().unwrap_err(), CellError::RefUnderflow);
    }

    #[test]
    fn test_read_returns_advanced_copy() {
        let mut builder = CellBuilder::new();
        builder.store_u32(0xAABBCCDD).unwrap();
        builder.store_reference(Cell::empty_cell()).unwrap();
        let slice = Slice::new(builder.build().unwrap());

        let (value, next) = slice.read_uint(8).unwrap();
        assert_eq!(value, 0xAA);
        assert_eq!(next.remaining_bits(), 24);
        assert_eq!(slice.remaining_bits(), 32);

        let (_, after_ref) = next.read_ref().unwrap();
        assert_eq!(after_ref.remaining_refs(), 0);
        assert_eq!(next.remaining_refs(), 1);
    }

    #[test]
    fn test_slice_skip() {
        let mut builder = CellBuilder::new();
        builder.store_u32(0x12345678).unwrap();
        let cell = builder.build().unwrap();

        let mut slice = Slice::new(cell);
        slice.skip_bits(16).unwrap();
        assert_eq!(slice.remaining_bits(), 16);
        assert_eq!(slice.load_u16().unwrap(), 0x5678);
    }

    #[test]
    fn test_load_maybe_ref() {
        let mut builder = CellBuilder::new();
        builder.store_bit(false).unwrap();
        builder.store_bit(true).unwrap();
        builder.store_reference(Cell::empty_cell()).unwrap();
        let mut slice = Slice::new(builder.build().unwrap());

        assert_eq!(slice.load_maybe_ref().unwrap(), None);
        assert_eq!(slice.load_maybe_ref().unwrap(), Some(Cell::empty_cell()));
        assert_eq!(
            slice.load_maybe_ref().unwrap_err(),
            CellError::CellUnderflow {
                requested: 1,
                remaining: 0
            }
        );
    }

    #[test]
    fn test_load_int_negative() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0xFF, 8).unwrap();
        let mut slice = Slice::new(builder.build().unwrap());
        assert_eq!(slice.load_int(8).unwrap(), -1);
    }
}
