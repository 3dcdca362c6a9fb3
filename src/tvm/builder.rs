//! High-level builder for constructing cells
//!
//! `Builder` wraps the low-level [`CellBuilder`] with methods for the layouts
//! contracts and messages use: wide unsigned integers, coins, addresses,
//! optional references and snake-encoded byte strings.
//!
//! # Examples
//!
//! ```rust
//! use tvm_sandbox_rs::tvm::{Address, Builder};
//!
//! let mut builder = Builder::new();
//! builder.store_uint(0x0f8a7ea5, 32).unwrap();
//! builder.store_address(Some(&Address::new(0, [0u8; 32]))).unwrap();
//! builder.store_coins(1_000_000_000).unwrap();
//!
//! let cell = builder.build().unwrap();
//! assert_eq!(cell.bit_len(), 32 + 267 + 4 + 32);
//! ```

use crate::tvm::address::Address;
use crate::tvm::cell::{Cell, CellBuilder, MAX_CELL_BITS, MAX_CELL_REFS};
use crate::tvm::error::{CellError, CellResult};
use crate::tvm::slice::Slice;
use num_bigint::BigUint;
use std::sync::Arc;

/// Extended builder with convenience methods
#[derive(Debug, Clone, Default)]
pub struct Builder {
    inner: CellBuilder,
}

impl Builder {
    /// Creates a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bits used
    pub fn bit_len(&self) -> usize {
        self.inner.bit_len()
    }

    /// Returns the number of available bits
    pub fn available_bits(&self) -> usize {
        MAX_CELL_BITS - self.bit_len()
    }

    /// Returns the number of available bytes
    pub fn available_bytes(&self) -> usize {
        self.available_bits() / 8
    }

    /// Returns the number of references
    pub fn ref_count(&self) -> usize {
        self.inner.ref_count()
    }

    /// Stores a single bit
    pub fn store_bit(&mut self, bit: bool) -> CellResult<&mut Self> {
        self.inner.store_bit(bit)?;
        Ok(self)
    }

    /// Stores multiple bits from a byte slice
    pub fn store_bits(&mut self, bits: &[u8], bit_len: usize) -> CellResult<&mut Self> {
        self.inner.store_bits(bits, bit_len)?;
        Ok(self)
    }

    /// Stores a byte
    pub fn store_byte(&mut self, byte: u8) -> CellResult<&mut Self> {
        self.inner.store_byte(byte)?;
        Ok(self)
    }

    /// Stores multiple bytes
    pub fn store_bytes(&mut self, bytes: &[u8]) -> CellResult<&mut Self> {
        self.inner.store_bytes(bytes)?;
        Ok(self)
    }

    /// Stores a u32 value
    pub fn store_u32(&mut self, value: u32) -> CellResult<&mut Self> {
        self.inner.store_u32(value)?;
        Ok(self)
    }

    /// Stores a u64 value
    pub fn store_u64(&mut self, value: u64) -> CellResult<&mut Self> {
        self.inner.store_u64(value)?;
        Ok(self)
    }

    /// Stores an unsigned integer with specific bit length (at most 64)
    pub fn store_uint(&mut self, value: u64, bits: usize) -> CellResult<&mut Self> {
        self.inner.store_uint(value, bits)?;
        Ok(self)
    }

    /// Stores an unsigned integer of arbitrary width (up to a full cell)
    pub fn store_big_uint(&mut self, value: &BigUint, bits: usize) -> CellResult<&mut Self> {
        if value.bits() as usize > bits {
            return Err(CellError::IntegerOverflow(bits));
        }
        if bits == 0 {
            return Ok(self);
        }

        // Left-align into ceil(bits / 8) bytes
        let byte_len = bits.div_ceil(8);
        let aligned = value << (byte_len * 8 - bits);
        let raw = aligned.to_bytes_be();
        let mut buf = vec![0u8; byte_len];
        if *value != BigUint::ZERO {
            buf[byte_len - raw.len()..].copy_from_slice(&raw);
        }

        self.store_bits(&buf, bits)
    }

    /// Stores a signed integer with specific bit length
    pub fn store_int(&mut self, value: i64, bits: usize) -> CellResult<&mut Self> {
        if bits == 0 || bits > 64 {
            return Err(CellError::IntegerOverflow(bits));
        }
        if bits < 64 {
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << (bits - 1)) - 1;
            if value < min || value > max {
                return Err(CellError::IntegerOverflow(bits));
            }
        }

        let unsigned = if bits == 64 {
            value as u64
        } else {
            (value as u64) & ((1u64 << bits) - 1)
        };

        self.store_uint(unsigned, bits)
    }

    /// Stores a reference to another cell
    pub fn store_ref(&mut self, cell: Arc<Cell>) -> CellResult<&mut Self> {
        self.inner.store_reference(cell)?;
        Ok(self)
    }

    /// Stores an optional reference (Maybe ^Cell)
    pub fn store_maybe_ref(&mut self, cell: Option<Arc<Cell>>) -> CellResult<&mut Self> {
        match cell {
            Some(c) => {
                self.store_bit(true)?;
                self.store_ref(c)?;
            }
            None => {
                self.store_bit(false)?;
            }
        }
        Ok(self)
    }

    /// Stores the contents of another cell
    pub fn store_cell(&mut self, cell: &Arc<Cell>) -> CellResult<&mut Self> {
        if self.ref_count() + cell.reference_count() > MAX_CELL_REFS {
            return Err(CellError::CapacityExceeded {
                bits: self.bit_len() + cell.bit_len(),
                refs: self.ref_count() + cell.reference_count(),
            });
        }

        self.store_bits(cell.data(), cell.bit_len())?;
        for reference in cell.references() {
            self.store_ref(reference.clone())?;
        }

        Ok(self)
    }

    /// Stores the unread part of a slice
    pub fn store_slice(&mut self, slice: &Slice) -> CellResult<&mut Self> {
        let mut rest = slice.clone();
        let remaining_bits = rest.remaining_bits();
        let data = rest.load_bits(remaining_bits)?;
        self.store_bits(&data, remaining_bits)?;

        while rest.remaining_refs() > 0 {
            let reference = rest.load_reference()?;
            self.store_ref(reference)?;
        }

        Ok(self)
    }

    /// Stores coins (VarUInteger 16)
    pub fn store_coins(&mut self, amount: u128) -> CellResult<&mut Self> {
        if amount == 0 {
            return self.store_uint(0, 4);
        }

        let byte_len = (128 - amount.leading_zeros() as usize).div_ceil(8);
        if byte_len > 15 {
            return Err(CellError::IntegerOverflow(120));
        }

        self.store_uint(byte_len as u64, 4)?;
        let bytes = amount.to_be_bytes();
        self.store_bytes(&bytes[16 - byte_len..])?;

        Ok(self)
    }

    /// Stores bytes using snake encoding (splits across multiple cells if needed)
    pub fn store_snake_bytes(&mut self, bytes: &[u8]) -> CellResult<&mut Self> {
        let available = self.available_bytes();
        if bytes.len() <= available {
            return self.store_bytes(bytes);
        }

        self.store_bytes(&bytes[..available])?;

        let mut next_builder = Builder::new();
        next_builder.store_snake_bytes(&bytes[available..])?;
        self.store_ref(next_builder.build()?)?;

        Ok(self)
    }

    /// Stores an address, `None` is stored as `addr_none`
    pub fn store_address(&mut self, address: Option<&Address>) -> CellResult<&mut Self> {
        match address {
            None => {
                // addr_none$00
                self.store_uint(0b00, 2)?;
            }
            Some(addr) => {
                // addr_std$10 anycast:(Maybe Anycast) workchain_id:int8 address:bits256
                self.store_uint(0b10, 2)?;
                self.store_bit(false)?;
                self.store_int(addr.workchain as i64, 8)?;
                self.store_bytes(&addr.account_id)?;
            }
        }
        Ok(self)
    }

    /// Builds the cell
    pub fn build(self) -> CellResult<Arc<Cell>> {
        self.inner.build()
    }

    /// Converts to a slice
    pub fn to_slice(self) -> CellResult<Slice> {
        let cell = self.build()?;
        Ok(Slice::new(cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let mut builder = Builder::new();
        builder.store_u32(0x12345678).unwrap();
        builder.store_byte(0xFF).unwrap();
        assert_eq!(builder.bit_len(), 40);
        assert_eq!(builder.available_bits(), MAX_CELL_BITS - 40);

        let cell = builder.build().unwrap();
        assert_eq!(cell.bit_len(), 40);
    }

    #[test]
    fn test_builder_address() {
        let addr = Address::new(-1, [0x5Au8; 32]);
        let mut builder = Builder::new();
        builder.store_address(Some(&addr)).unwrap();
        builder.store_address(None).unwrap();

        let cell = builder.build().unwrap();
        // 267 bits for addr_std + 2 bits for addr_none
        assert_eq!(cell.bit_len(), 269);

        let mut slice = Slice::new(cell);
        assert_eq!(slice.load_address().unwrap(), Some(addr));
        assert_eq!(slice.load_address().unwrap(), None);
    }

    #[test]
    fn test_builder_coins() {
        let mut builder = Builder::new();
        builder.store_coins(1_000_000_000).unwrap();
        builder.store_coins(0).unwrap();

        let mut slice = builder.to_slice().unwrap();
        assert_eq!(slice.load_coins().unwrap(), 1_000_000_000);
        assert_eq!(slice.load_coins().unwrap(), 0);
        assert!(slice.is_empty());

        assert!(Builder::new().store_coins(1u128 << 120).is_err());
    }

    #[test]
    fn test_store_int_range() {
        let mut builder = Builder::new();
        builder.store_int(-128, 8).unwrap();
        builder.store_int(127, 8).unwrap();
        assert!(builder.store_int(128, 8).is_err());
        assert!(builder.store_int(-129, 8).is_err());
    }

    #[test]
    fn test_store_big_uint_overflow() {
        let value = BigUint::from(256u32);
        assert_eq!(
            Builder::new().store_big_uint(&value, 8).unwrap_err(),
            CellError::IntegerOverflow(8)
        );
    }

    #[test]
    fn test_store_slice_copies_rest() {
        let mut inner = Builder::new();
        inner.store_u32(0xDEADBEEF).unwrap();
        inner.store_ref(Cell::empty_cell()).unwrap();
        let mut slice = inner.to_slice().unwrap();
        slice.skip_bits(16).unwrap();

        let mut builder = Builder::new();
        builder.store_slice(&slice).unwrap();
        let cell = builder.build().unwrap();
        assert_eq!(cell.bit_len(), 16);
        assert_eq!(cell.reference_count(), 1);
        assert_eq!(Slice::new(cell).load_u16().unwrap(), 0xBEEF);
    }

    #[test]
    fn test_builder_snake_bytes() {
        let long = vec![b'a'; 200];
        let mut builder = Builder::new();
        builder.store_snake_bytes(&long).unwrap();

        let cell = builder.build().unwrap();
        assert_eq!(cell.bit_len(), 127 * 8);
        assert_eq!(cell.reference_count(), 1);
        assert_eq!(cell.reference(0).unwrap().bit_len(), 73 * 8);
    }
}
