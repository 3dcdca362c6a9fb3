//! Owner-managed counter
//!
//! Persistent data: `counter:uint64 owner:MsgAddress`

use crate::executor::{native_code_cell, ComputeContext, Contract, VmError, VmResult};
use crate::tvm::{Address, Builder, Cell, CellResult, Slice};
use crate::vm_ensure;
use std::sync::Arc;

pub mod op {
    pub const INCREMENT: u32 = 1;
    pub const RESET: u32 = 2;
}

pub mod exit_code {
    pub const UNKNOWN_OP: u32 = 8192;
    pub const NOT_OWNER: u32 = 8193;
    pub const COUNTER_OVERFLOW: u32 = 8194;
    pub const EXTRA_DATA: u32 = 8195;
    pub const BAD_DATA_LAYOUT: u32 = 8196;
}

pub struct Counter {
    code: Arc<Cell>,
}

impl Counter {
    pub const NAME: &'static str = "counter";

    pub fn new() -> CellResult<Self> {
        Ok(Self {
            code: native_code_cell(Self::NAME, 1)?,
        })
    }

    pub fn data(counter: u64, owner: &Address) -> CellResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_u64(counter)?;
        builder.store_address(Some(owner))?;
        builder.build()
    }

    pub fn increment_body(amount: u32) -> CellResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_u32(op::INCREMENT)?;
        builder.store_u32(amount)?;
        builder.build()
    }

    pub fn reset_body() -> CellResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_u32(op::RESET)?;
        builder.build()
    }

    /// Reads the counter value from account data
    pub fn value(data: &Arc<Cell>) -> CellResult<u64> {
        Slice::new(data.clone()).load_u64()
    }

    fn store(ctx: &mut ComputeContext<'_>, counter: u64, owner: &Address) -> VmResult<()> {
        let mut builder = Builder::new();
        builder.store_u64(counter)?;
        builder.store_address(Some(owner))?;
        let data = ctx.build(builder)?;
        ctx.set_data(data);
        Ok(())
    }
}

impl Contract for Counter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn code(&self) -> Arc<Cell> {
        self.code.clone()
    }

    fn receive(&self, ctx: &mut ComputeContext<'_>) -> VmResult<()> {
        let mut body = ctx.body()?;
        if body.is_empty() || ctx.message().bounced {
            return Ok(());
        }

        let mut ds = ctx.data()?;
        let counter = ds.load_u64()?;
        let owner = ds
            .load_address()?
            .ok_or(VmError::Exit(exit_code::BAD_DATA_LAYOUT))?;
        vm_ensure!(ds.is_empty(), exit_code::BAD_DATA_LAYOUT);

        match body.load_u32()? {
            op::INCREMENT => {
                let amount = body.load_u32()?;
                vm_ensure!(body.is_empty(), exit_code::EXTRA_DATA);
                let counter = counter
                    .checked_add(u64::from(amount))
                    .ok_or(VmError::Exit(exit_code::COUNTER_OVERFLOW))?;
                Self::store(ctx, counter, &owner)
            }
            op::RESET => {
                vm_ensure!(body.is_empty(), exit_code::EXTRA_DATA);
                vm_ensure!(ctx.sender() == owner, exit_code::NOT_OWNER);
                Self::store(ctx, 0, &owner)
            }
            _ => Err(VmError::Exit(exit_code::UNKNOWN_OP)),
        }
    }
}
