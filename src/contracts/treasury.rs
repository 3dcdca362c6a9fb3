use crate::executor::{native_code_cell, ComputeContext, Contract, VmResult};
use crate::tvm::{Cell, CellResult};
use std::sync::Arc;

/// Wallet that accepts every inbound message.
///
/// Used as the sender of injected messages so that bounces and excesses
/// have somewhere to land.
pub struct Treasury {
    code: Arc<Cell>,
}

impl Treasury {
    pub const NAME: &'static str = "treasury";

    pub fn new() -> CellResult<Self> {
        Ok(Self {
            code: native_code_cell(Self::NAME, 1)?,
        })
    }
}

impl Contract for Treasury {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn code(&self) -> Arc<Cell> {
        self.code.clone()
    }

    fn receive(&self, _ctx: &mut ComputeContext<'_>) -> VmResult<()> {
        Ok(())
    }
}
