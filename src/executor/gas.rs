use crate::executor::error::{VmError, VmResult};
use crate::tvm::CellHash;
use ahash::HashSet;
use std::cell::{Cell, RefCell};

/// Gas tracking context for one message.
///
/// Counters live in `Cell`s so that metered slices can charge through a
/// shared reference while the contract holds other borrows of the context.
#[derive(Debug)]
pub struct GasMeter {
    /// Gas limit for the out-of-gas exception.
    limit: u64,
    /// Gas consumed so far (may exceed `limit` by the last charge).
    consumed: Cell<u64>,
    /// A set of cells opened for reading.
    loaded_cells: RefCell<HashSet<CellHash>>,
}

impl GasMeter {
    /// Opening a cell for the first time.
    pub const NEW_CELL_GAS: u64 = 100;
    /// Opening a cell that was already opened in this run.
    pub const OLD_CELL_GAS: u64 = 25;
    /// Finalizing a builder into a cell.
    pub const BUILD_CELL_GAS: u64 = 500;
    /// Any single load from a slice.
    pub const LOAD_GAS: u64 = 10;
    /// Queueing an outbound message.
    pub const SEND_MSG_GAS: u64 = 100;

    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            consumed: Cell::new(0),
            loaded_cells: Default::default(),
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Gas consumed, capped at the limit.
    pub fn consumed(&self) -> u64 {
        std::cmp::min(self.consumed.get(), self.limit)
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.consumed.get())
    }

    /// Charges `amount`, failing once the total exceeds the limit.
    pub fn try_consume(&self, amount: u64) -> VmResult<()> {
        let consumed = self.consumed.get().saturating_add(amount);
        self.consumed.set(consumed);
        if consumed > self.limit {
            return Err(VmError::OutOfGas);
        }
        Ok(())
    }

    /// Charges for opening a cell.
    pub fn try_consume_load_cell(&self, hash: &CellHash) -> VmResult<()> {
        let is_new = self.loaded_cells.borrow_mut().insert(*hash);
        self.try_consume(if is_new {
            Self::NEW_CELL_GAS
        } else {
            Self::OLD_CELL_GAS
        })
    }

    pub fn try_consume_load(&self) -> VmResult<()> {
        self.try_consume(Self::LOAD_GAS)
    }

    pub fn try_consume_build_cell(&self) -> VmResult<()> {
        self.try_consume(Self::BUILD_CELL_GAS)
    }
}
