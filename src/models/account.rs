use crate::tvm::{Address, Cell, CellHash};
use num_bigint::BigUint;
use std::sync::Arc;

/// Persistent state of one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub address: Address,
    /// Contract code, `None` for an uninitialized account
    pub code: Option<Arc<Cell>>,
    pub data: Arc<Cell>,
    pub balance: BigUint,
}

impl AccountState {
    pub fn new(address: Address, code: Arc<Cell>, data: Arc<Cell>, balance: BigUint) -> Self {
        Self {
            address,
            code: Some(code),
            data,
            balance,
        }
    }

    /// Creates an account without code and with empty data
    pub fn uninit(address: Address, balance: BigUint) -> Self {
        Self {
            address,
            code: None,
            data: Cell::empty_cell(),
            balance,
        }
    }

    pub fn is_active(&self) -> bool {
        self.code.is_some()
    }

    pub fn code_hash(&self) -> Option<CellHash> {
        self.code.as_ref().map(|code| code.hash())
    }
}
