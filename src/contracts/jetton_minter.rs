//! Fungible token minter
//!
//! Persistent data:
//! ```text
//! total_supply:Coins admin:MsgAddress ^content ^wallet_code ^Cell ^Cell
//! ```

use crate::executor::{
    native_code_cell, ComputeContext, Contract, GasMeter, VmError, VmResult, VmSlice,
};
use crate::tvm::{Address, Builder, Cell, CellError, CellResult, Slice};
use crate::vm_ensure;
use std::sync::Arc;

pub mod op {
    pub const MINT: u32 = 21;
    pub const CHANGE_ADMIN: u32 = 3;
    pub const BURN_NOTIFICATION: u32 = 0x7bdd97de;
    pub const EXCESSES: u32 = 0xd53276db;
    pub const INTERNAL_TRANSFER: u32 = 0x178d4519;
}

pub mod exit_code {
    pub const UNKNOWN_OP: u32 = 65;
    pub const NOT_ADMIN: u32 = 73;
    pub const SUPPLY_UNDERFLOW: u32 = 74;
    pub const EXTRA_DATA: u32 = 75;
    pub const BAD_DATA_LAYOUT: u32 = 76;
    pub const MALFORMED_EXCESSES: u32 = 77;
}

const DATA_REFS: usize = 4;

/// Decoded minter data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinterData {
    pub total_supply: u128,
    pub admin: Option<Address>,
    pub refs: [Arc<Cell>; DATA_REFS],
}

impl MinterData {
    /// Data with the given admin and empty content cells
    pub fn new(admin: Option<Address>) -> Self {
        Self {
            total_supply: 0,
            admin,
            refs: std::array::from_fn(|_| Cell::empty_cell()),
        }
    }

    fn load(ds: &mut VmSlice<'_>) -> VmResult<Self> {
        let total_supply = ds.load_coins()?;
        let admin = ds.load_address()?;
        vm_ensure!(
            ds.remaining_bits() == 0 && ds.remaining_refs() == DATA_REFS,
            exit_code::BAD_DATA_LAYOUT
        );
        let refs = [
            ds.load_reference()?,
            ds.load_reference()?,
            ds.load_reference()?,
            ds.load_reference()?,
        ];
        Ok(Self {
            total_supply,
            admin,
            refs,
        })
    }

    fn store(&self, builder: &mut Builder) -> CellResult<()> {
        builder.store_coins(self.total_supply)?;
        builder.store_address(self.admin.as_ref())?;
        for cell in &self.refs {
            builder.store_ref(cell.clone())?;
        }
        Ok(())
    }

    pub fn to_cell(&self) -> CellResult<Arc<Cell>> {
        let mut builder = Builder::new();
        self.store(&mut builder)?;
        builder.build()
    }

    /// Decodes data outside of any execution, failures carry minter exit codes
    pub fn from_cell(cell: Arc<Cell>) -> VmResult<Self> {
        let gas = GasMeter::new(u64::MAX);
        Self::load(&mut VmSlice::new(Slice::new(cell), &gas))
    }
}

pub struct JettonMinter {
    code: Arc<Cell>,
}

impl JettonMinter {
    pub const NAME: &'static str = "jetton-minter";

    pub fn new() -> CellResult<Self> {
        Ok(Self {
            code: native_code_cell(Self::NAME, 1)?,
        })
    }

    pub fn mint_body(
        query_id: u64,
        to: &Address,
        ton_amount: u128,
        jetton_amount: u128,
    ) -> CellResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_u32(op::MINT)?;
        builder.store_u64(query_id)?;
        builder.store_address(Some(to))?;
        builder.store_coins(ton_amount)?;
        builder.store_coins(jetton_amount)?;
        builder.build()
    }

    pub fn change_admin_body(query_id: u64, new_admin: Option<&Address>) -> CellResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_u32(op::CHANGE_ADMIN)?;
        builder.store_u64(query_id)?;
        builder.store_address(new_admin)?;
        builder.build()
    }

    pub fn burn_notification_body(
        query_id: u64,
        amount: u128,
        owner: &Address,
        response: Option<&Address>,
    ) -> CellResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_u32(op::BURN_NOTIFICATION)?;
        builder.store_u64(query_id)?;
        builder.store_coins(amount)?;
        builder.store_address(Some(owner))?;
        builder.store_address(response)?;
        builder.build()
    }

    pub fn excesses_body(query_id: u64) -> CellResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder.store_u32(op::EXCESSES)?;
        builder.store_u64(query_id)?;
        builder.build()
    }

    fn load_data(ctx: &ComputeContext<'_>) -> VmResult<MinterData> {
        let mut ds = ctx.data()?;
        MinterData::load(&mut ds)
    }

    fn save_data(ctx: &mut ComputeContext<'_>, data: &MinterData) -> VmResult<()> {
        let mut builder = Builder::new();
        data.store(&mut builder)?;
        let cell = ctx.build(builder)?;
        ctx.set_data(cell);
        Ok(())
    }

    fn on_bounce(ctx: &mut ComputeContext<'_>, mut body: VmSlice<'_>) -> VmResult<()> {
        body.skip_bits(32)?; // 0xFFFFFFFF
        if body.load_u32()? != op::INTERNAL_TRANSFER {
            return Ok(());
        }
        body.skip_bits(64)?; // query_id
        let amount = body.load_coins()?;

        let mut data = Self::load_data(ctx)?;
        data.total_supply = data
            .total_supply
            .checked_sub(amount)
            .ok_or(VmError::Exit(exit_code::SUPPLY_UNDERFLOW))?;
        Self::save_data(ctx, &data)
    }

    fn mint(ctx: &mut ComputeContext<'_>, query_id: u64, mut body: VmSlice<'_>) -> VmResult<()> {
        let to = body.load_address()?;
        let ton_amount = body.load_coins()?;
        let jetton_amount = body.load_coins()?;
        vm_ensure!(body.is_empty(), exit_code::EXTRA_DATA);

        let mut data = Self::load_data(ctx)?;
        vm_ensure!(data.admin == Some(ctx.sender()), exit_code::NOT_ADMIN);
        let Some(to) = to else {
            return Err(VmError::Exit(exit_code::BAD_DATA_LAYOUT));
        };

        let mut transfer = Builder::new();
        transfer.store_u32(op::INTERNAL_TRANSFER)?;
        transfer.store_u64(query_id)?;
        transfer.store_coins(jetton_amount)?;
        transfer.store_address(Some(&ctx.address()))?;
        let transfer = ctx.build(transfer)?;
        ctx.send(to, ton_amount, true, transfer)?;

        data.total_supply = data
            .total_supply
            .checked_add(jetton_amount)
            .ok_or(CellError::IntegerOverflow(120))?;
        Self::save_data(ctx, &data)
    }

    fn change_admin(ctx: &mut ComputeContext<'_>, mut body: VmSlice<'_>) -> VmResult<()> {
        let new_admin = body.load_address()?;
        vm_ensure!(body.is_empty(), exit_code::EXTRA_DATA);

        let mut data = Self::load_data(ctx)?;
        vm_ensure!(data.admin == Some(ctx.sender()), exit_code::NOT_ADMIN);
        data.admin = new_admin;
        Self::save_data(ctx, &data)
    }

    fn burn_notification(
        ctx: &mut ComputeContext<'_>,
        query_id: u64,
        mut body: VmSlice<'_>,
    ) -> VmResult<()> {
        let amount = body.load_coins()?;
        body.load_address()?; // owner
        let response = body.load_address()?;
        vm_ensure!(body.is_empty(), exit_code::EXTRA_DATA);

        let mut data = Self::load_data(ctx)?;
        data.total_supply = data
            .total_supply
            .checked_sub(amount)
            .ok_or(VmError::Exit(exit_code::SUPPLY_UNDERFLOW))?;
        Self::save_data(ctx, &data)?;

        if let Some(response) = response {
            let mut excesses = Builder::new();
            excesses.store_u32(op::EXCESSES)?;
            excesses.store_u64(query_id)?;
            let excesses = ctx.build(excesses)?;
            let value = ctx.message().value.clone();
            ctx.send(response, value, false, excesses)?;
        }
        Ok(())
    }
}

impl Contract for JettonMinter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn code(&self) -> Arc<Cell> {
        self.code.clone()
    }

    fn receive(&self, ctx: &mut ComputeContext<'_>) -> VmResult<()> {
        let mut body = ctx.body()?;
        if body.is_empty() {
            return Ok(());
        }
        if ctx.message().bounced {
            return Self::on_bounce(ctx, body);
        }

        let op = body.load_u32()?;
        vm_ensure!(
            matches!(
                op,
                op::MINT | op::CHANGE_ADMIN | op::BURN_NOTIFICATION | op::EXCESSES
            ),
            exit_code::UNKNOWN_OP
        );

        let query_id = body.load_u64()?;
        match op {
            op::MINT => Self::mint(ctx, query_id, body),
            op::CHANGE_ADMIN => Self::change_admin(ctx, body),
            op::BURN_NOTIFICATION => Self::burn_notification(ctx, query_id, body),
            _ => {
                vm_ensure!(body.is_empty(), exit_code::MALFORMED_EXCESSES);
                Ok(())
            }
        }
    }
}
