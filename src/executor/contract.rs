//! Contract logic resolution
//!
//! Accounts store a code cell. The executor resolves the code hash to native
//! contract logic through a [`CodeProvider`].

use crate::executor::context::ComputeContext;
use crate::executor::error::VmResult;
use crate::tvm::{Builder, Cell, CellHash, CellResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Prefix of code cells that name native contract logic
pub const NATIVE_CODE_TAG: u32 = 0x6e617476;

/// Contract entry point
pub trait Contract: Send + Sync {
    /// Human readable name, used in logs
    fn name(&self) -> &str;

    /// Code cell accounts running this contract carry
    fn code(&self) -> Arc<Cell>;

    /// Handles one inbound internal message
    fn receive(&self, ctx: &mut ComputeContext<'_>) -> VmResult<()>;
}

/// Code cells resolver.
pub trait CodeProvider {
    fn find(&self, code_hash: &CellHash) -> Option<Arc<dyn Contract>>;
}

impl<T: CodeProvider + ?Sized> CodeProvider for &'_ T {
    fn find(&self, code_hash: &CellHash) -> Option<Arc<dyn Contract>> {
        T::find(self, code_hash)
    }
}

impl<T: CodeProvider> CodeProvider for Option<T> {
    fn find(&self, code_hash: &CellHash) -> Option<Arc<dyn Contract>> {
        self.as_ref().and_then(|this| this.find(code_hash))
    }
}

impl<S: std::hash::BuildHasher> CodeProvider for HashMap<CellHash, Arc<dyn Contract>, S> {
    fn find(&self, code_hash: &CellHash) -> Option<Arc<dyn Contract>> {
        self.get(code_hash).cloned()
    }
}

/// Empty code provider.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoContracts;

impl CodeProvider for NoContracts {
    fn find(&self, _code_hash: &CellHash) -> Option<Arc<dyn Contract>> {
        None
    }
}

/// Registry of contracts keyed by code hash
#[derive(Default, Clone)]
pub struct ContractRegistry {
    contracts: HashMap<CellHash, Arc<dyn Contract>>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a contract and returns its code cell
    pub fn register(&mut self, contract: Arc<dyn Contract>) -> Arc<Cell> {
        let code = contract.code();
        log::debug!("registered contract {} ({})", contract.name(), code.hash_hex());
        self.contracts.insert(code.hash(), contract);
        code
    }

    /// Binds externally produced code (e.g. compiler output) to contract logic
    pub fn register_code(&mut self, code: &Arc<Cell>, contract: Arc<dyn Contract>) {
        self.contracts.insert(code.hash(), contract);
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl CodeProvider for ContractRegistry {
    fn find(&self, code_hash: &CellHash) -> Option<Arc<dyn Contract>> {
        self.contracts.get(code_hash).cloned()
    }
}

/// Builds the code cell naming a native contract
pub fn native_code_cell(name: &str, version: u32) -> CellResult<Arc<Cell>> {
    let mut builder = Builder::new();
    builder.store_u32(NATIVE_CODE_TAG)?;
    builder.store_u32(version)?;
    builder.store_snake_bytes(name.as_bytes())?;
    builder.build()
}
