//! Content-addressed cell storage
//!
//! Interns cells by representation hash so that structurally equal trees
//! share one allocation. Cells are never mutated or removed once stored.

use crate::tvm::cell::{Cell, CellHash};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct CellStore {
    cells: HashMap<CellHash, Arc<Cell>>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a cell tree and returns the canonical instance of its root
    ///
    /// Children are interned first, so a subtree already present in the store
    /// is reused instead of duplicated.
    pub fn insert(&mut self, cell: &Arc<Cell>) -> Arc<Cell> {
        if let Some(existing) = self.cells.get(&cell.hash()) {
            return existing.clone();
        }

        for reference in cell.references() {
            self.insert(reference);
        }

        self.cells.insert(cell.hash(), cell.clone());
        cell.clone()
    }

    /// Looks a cell up by its hash
    pub fn get(&self, hash: &CellHash) -> Option<Arc<Cell>> {
        self.cells.get(hash).cloned()
    }

    pub fn contains(&self, hash: &CellHash) -> bool {
        self.cells.contains_key(hash)
    }

    /// Number of distinct cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
