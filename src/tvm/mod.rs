//! Cell data structures
//!
//! - Cell: immutable unit of storage, up to 1023 bits and up to 4 references
//! - Slice: bounds-checked reader for sequentially accessing cell data
//! - Builder: write accumulator finalized into a cell
//! - CellStore: content-addressed interning of cell trees
//! - BoC: Bag of Cells serialization format
//! - Address: workchain-qualified account address

pub mod address;
pub mod boc;
pub mod builder;
pub mod cell;
pub mod error;
pub mod slice;
pub mod store;
#[cfg(test)]
mod tests;

pub use address::{Address, AddressFlags};
pub use boc::{
    base64_to_boc, boc_to_base64, boc_to_hex, deserialize_boc, hex_to_boc, serialize_boc,
};
pub use builder::Builder;
pub use cell::{Cell, CellBuilder, CellHash, MAX_CELL_BITS, MAX_CELL_DEPTH, MAX_CELL_REFS};
pub use error::{CellError, CellResult};
pub use slice::Slice;
pub use store::CellStore;
