//! Cell implementation
//!
//! A cell stores up to 1023 bits of data and up to 4 references to other cells.
//! Cells are immutable: the bit length, references, hash and depth are fixed
//! when the cell is constructed.

use crate::tvm::error::{CellError, CellResult};
use sha2::{Digest, Sha256};
use std::sync::{Arc, OnceLock};

/// Maximum number of bits a cell can store
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references a cell can have
pub const MAX_CELL_REFS: usize = 4;

/// Maximum depth of a cell tree
pub const MAX_CELL_DEPTH: u16 = 1024;

/// Representation hash of a cell
pub type CellHash = [u8; 32];

/// An immutable cell
#[derive(Debug, Clone)]
pub struct Cell {
    /// Cell data, bits past `bit_len` are always zero
    data: Vec<u8>,
    /// Number of bits in the cell (not necessarily a multiple of 8)
    bit_len: usize,
    /// References to other cells
    references: Vec<Arc<Cell>>,
    hash: CellHash,
    depth: u16,
}

impl Cell {
    /// Creates a cell from raw data, bit length and references
    pub fn new(mut data: Vec<u8>, bit_len: usize, references: Vec<Arc<Cell>>) -> CellResult<Self> {
        if bit_len > MAX_CELL_BITS || references.len() > MAX_CELL_REFS {
            return Err(CellError::CapacityExceeded {
                bits: bit_len,
                refs: references.len(),
            });
        }

        let required_bytes = bit_len.div_ceil(8);
        if data.len() < required_bytes {
            return Err(CellError::CellUnderflow {
                requested: bit_len,
                remaining: data.len() * 8,
            });
        }

        // Normalize the tail so that equal bit strings have equal bytes
        data.truncate(required_bytes);
        if bit_len % 8 != 0 {
            let last = required_bytes - 1;
            data[last] &= 0xFFu8 << (8 - bit_len % 8);
        }

        let mut depth = 0u16;
        for reference in &references {
            let child = reference
                .depth()
                .checked_add(1)
                .filter(|d| *d <= MAX_CELL_DEPTH)
                .ok_or(CellError::DepthExceeded(MAX_CELL_DEPTH))?;
            depth = depth.max(child);
        }

        let mut cell = Self {
            data,
            bit_len,
            references,
            hash: [0u8; 32],
            depth,
        };
        cell.hash = cell.compute_hash();
        Ok(cell)
    }

    /// Creates a cell with the given data and no references
    pub fn with_data(data: Vec<u8>, bit_len: usize) -> CellResult<Self> {
        Self::new(data, bit_len, Vec::new())
    }

    /// Returns a shared empty cell
    pub fn empty_cell() -> Arc<Cell> {
        static EMPTY: OnceLock<Arc<Cell>> = OnceLock::new();
        EMPTY
            .get_or_init(|| {
                Arc::new(Self {
                    data: Vec::new(),
                    bit_len: 0,
                    references: Vec::new(),
                    hash: Self::empty_hash(),
                    depth: 0,
                })
            })
            .clone()
    }

    fn empty_hash() -> CellHash {
        let mut hasher = Sha256::new();
        hasher.update([0u8, 0u8]);
        hasher.finalize().into()
    }

    /// Returns the cell's data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of bits in the cell
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns the cell's references
    pub fn references(&self) -> &[Arc<Cell>] {
        &self.references
    }

    /// Returns the number of references
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Gets a reference by index
    pub fn reference(&self, index: usize) -> Option<&Arc<Cell>> {
        self.references.get(index)
    }

    /// Returns the depth of the cell
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Returns the representation hash of the cell
    pub fn hash(&self) -> CellHash {
        self.hash
    }

    /// Returns the hash as a lowercase hex string
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Returns whether the cell has neither data nor references
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0 && self.references.is_empty()
    }

    /// Computes the cell's descriptors (2 bytes)
    pub fn descriptors(&self) -> [u8; 2] {
        // Ordinary cells only: level 0, no exotic flag
        let refs_descriptor = self.references.len() as u8;
        // floor(b/8) + ceil(b/8)
        let bits_descriptor = (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8;

        [refs_descriptor, bits_descriptor]
    }

    /// Serializes the cell data with the completion tag if needed
    pub fn serialize_data(&self) -> Vec<u8> {
        let mut result = self.data.clone();

        if self.bit_len % 8 != 0 {
            let last_byte_idx = self.bit_len / 8;
            let bits_in_last_byte = self.bit_len % 8;
            result[last_byte_idx] |= 1 << (7 - bits_in_last_byte);
        }

        result
    }

    fn compute_hash(&self) -> CellHash {
        let mut hasher = Sha256::new();

        hasher.update(self.descriptors());
        hasher.update(self.serialize_data());

        for reference in &self.references {
            hasher.update(reference.depth().to_be_bytes());
        }
        for reference in &self.references {
            hasher.update(reference.hash());
        }

        hasher.finalize().into()
    }

    /// Reads a single bit at the given position
    pub(crate) fn bit_at(&self, pos: usize) -> bool {
        (self.data[pos / 8] >> (7 - pos % 8)) & 1 == 1
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        // Child hashes already cover the whole subtree
        self.hash == other.hash
            && self.bit_len == other.bit_len
            && self.data == other.data
            && self.references.len() == other.references.len()
            && self
                .references
                .iter()
                .map(|r| r.hash())
                .eq(other.references.iter().map(|r| r.hash()))
    }
}

impl Eq for Cell {}

impl Default for Cell {
    fn default() -> Self {
        Arc::unwrap_or_clone(Self::empty_cell())
    }
}

/// Low-level builder for constructing cells
///
/// Provides the raw bit/byte operations; see [`Builder`](crate::tvm::Builder)
/// for addresses, coins and big integers.
///
/// # Example
///
/// ```rust
/// use tvm_sandbox_rs::tvm::CellBuilder;
///
/// let mut builder = CellBuilder::new();
/// builder.store_u32(0x12345678).unwrap();
/// builder.store_byte(0xFF).unwrap();
/// let cell = builder.build().unwrap();
/// assert_eq!(cell.bit_len(), 40);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<Arc<Cell>>,
}

impl CellBuilder {
    /// Creates a new cell builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bits stored so far
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns the number of references stored so far
    pub fn ref_count(&self) -> usize {
        self.references.len()
    }

    /// Stores the first `bit_len` bits of a byte slice
    pub fn store_bits(&mut self, bits: &[u8], bit_len: usize) -> CellResult<&mut Self> {
        if self.bit_len + bit_len > MAX_CELL_BITS {
            return Err(CellError::CapacityExceeded {
                bits: self.bit_len + bit_len,
                refs: self.references.len(),
            });
        }

        if bits.len() < bit_len.div_ceil(8) {
            return Err(CellError::CellUnderflow {
                requested: bit_len,
                remaining: bits.len() * 8,
            });
        }

        for i in 0..bit_len {
            let bit = (bits[i / 8] >> (7 - i % 8)) & 1;

            let target_byte_idx = self.bit_len / 8;
            if target_byte_idx >= self.data.len() {
                self.data.push(0);
            }
            if bit == 1 {
                self.data[target_byte_idx] |= 1 << (7 - self.bit_len % 8);
            }

            self.bit_len += 1;
        }

        Ok(self)
    }

    /// Stores a byte
    pub fn store_byte(&mut self, byte: u8) -> CellResult<&mut Self> {
        self.store_bits(&[byte], 8)
    }

    /// Stores multiple bytes
    pub fn store_bytes(&mut self, bytes: &[u8]) -> CellResult<&mut Self> {
        self.store_bits(bytes, bytes.len() * 8)
    }

    /// Stores a u32 value
    pub fn store_u32(&mut self, value: u32) -> CellResult<&mut Self> {
        self.store_bits(&value.to_be_bytes(), 32)
    }

    /// Stores a u64 value
    pub fn store_u64(&mut self, value: u64) -> CellResult<&mut Self> {
        self.store_bits(&value.to_be_bytes(), 64)
    }

    /// Stores the value as an unsigned integer of `bits` width (big-endian)
    pub fn store_uint(&mut self, value: u64, bits: usize) -> CellResult<&mut Self> {
        if bits > 64 || (bits < 64 && value >> bits != 0) {
            return Err(CellError::IntegerOverflow(bits));
        }
        if bits == 0 {
            return Ok(self);
        }

        // Left-align the value so the first stored bit is the MSB of the buffer
        let aligned = value << (64 - bits);
        self.store_bits(&aligned.to_be_bytes(), bits)
    }

    /// Stores a single bit
    pub fn store_bit(&mut self, bit: bool) -> CellResult<&mut Self> {
        self.store_bits(&[if bit { 0x80 } else { 0x00 }], 1)
    }

    /// Adds a reference to another cell
    pub fn store_reference(&mut self, cell: Arc<Cell>) -> CellResult<&mut Self> {
        if self.references.len() >= MAX_CELL_REFS {
            return Err(CellError::CapacityExceeded {
                bits: self.bit_len,
                refs: self.references.len() + 1,
            });
        }
        self.references.push(cell);
        Ok(self)
    }

    /// Builds the cell
    pub fn build(self) -> CellResult<Arc<Cell>> {
        Ok(Arc::new(Cell::new(self.data, self.bit_len, self.references)?))
    }
}
