//! Contract-facing execution context

use crate::executor::error::VmResult;
use crate::executor::gas::GasMeter;
use crate::models::{AccountState, MessageEnvelope};
use crate::tvm::{Address, Builder, Cell, Slice};
use num_bigint::BigUint;
use std::sync::Arc;

/// Everything a contract can observe or change while handling one message.
///
/// Changes are staged here; the executor commits them only if the contract
/// terminates successfully.
pub struct ComputeContext<'a> {
    gas: &'a GasMeter,
    message: &'a MessageEnvelope,
    account: &'a AccountState,
    new_data: Option<Arc<Cell>>,
    out_msgs: Vec<MessageEnvelope>,
}

/// Effects staged by a successful run.
pub struct StagedEffects {
    pub new_data: Option<Arc<Cell>>,
    pub out_msgs: Vec<MessageEnvelope>,
}

impl<'a> ComputeContext<'a> {
    pub fn new(gas: &'a GasMeter, message: &'a MessageEnvelope, account: &'a AccountState) -> Self {
        Self {
            gas,
            message,
            account,
            new_data: None,
            out_msgs: Vec::new(),
        }
    }

    /// Inbound message
    pub fn message(&self) -> &'a MessageEnvelope {
        self.message
    }

    pub fn sender(&self) -> Address {
        self.message.from
    }

    /// Address of the running contract
    pub fn address(&self) -> Address {
        self.account.address
    }

    /// Balance before the inbound value is credited
    pub fn balance(&self) -> &'a BigUint {
        &self.account.balance
    }

    pub fn gas(&self) -> &'a GasMeter {
        self.gas
    }

    /// Opens the inbound message body
    pub fn body(&self) -> VmResult<VmSlice<'a>> {
        self.open(self.message.body.clone())
    }

    /// Opens the current persistent data, including data staged by [`set_data`]
    ///
    /// [`set_data`]: Self::set_data
    pub fn data(&self) -> VmResult<VmSlice<'a>> {
        let data = self
            .new_data
            .clone()
            .unwrap_or_else(|| self.account.data.clone());
        self.open(data)
    }

    /// Opens any cell for reading
    pub fn open(&self, cell: Arc<Cell>) -> VmResult<VmSlice<'a>> {
        self.gas.try_consume_load_cell(&cell.hash())?;
        Ok(VmSlice {
            inner: Slice::new(cell),
            gas: self.gas,
        })
    }

    /// Finalizes a builder into a cell
    pub fn build(&self, builder: Builder) -> VmResult<Arc<Cell>> {
        self.gas.try_consume_build_cell()?;
        Ok(builder.build()?)
    }

    /// Stages new persistent data
    pub fn set_data(&mut self, data: Arc<Cell>) {
        self.new_data = Some(data);
    }

    /// Queues an outbound internal message from this contract
    pub fn send(
        &mut self,
        to: Address,
        value: impl Into<BigUint>,
        bounce: bool,
        body: Arc<Cell>,
    ) -> VmResult<()> {
        self.gas.try_consume(GasMeter::SEND_MSG_GAS)?;
        self.out_msgs.push(
            MessageEnvelope::internal(self.account.address, to, value, body).with_bounce(bounce),
        );
        Ok(())
    }

    pub fn into_effects(self) -> StagedEffects {
        StagedEffects {
            new_data: self.new_data,
            out_msgs: self.out_msgs,
        }
    }
}

/// Gas-metered read cursor.
///
/// Cloning gives an independent cursor sharing the same gas meter.
#[derive(Clone)]
pub struct VmSlice<'a> {
    inner: Slice,
    gas: &'a GasMeter,
}

impl<'a> VmSlice<'a> {
    pub fn new(slice: Slice, gas: &'a GasMeter) -> Self {
        Self { inner: slice, gas }
    }

    pub fn remaining_bits(&self) -> usize {
        self.inner.remaining_bits()
    }

    pub fn remaining_refs(&self) -> usize {
        self.inner.remaining_refs()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn load_bit(&mut self) -> VmResult<bool> {
        self.gas.try_consume_load()?;
        Ok(self.inner.load_bit()?)
    }

    pub fn load_uint(&mut self, bits: usize) -> VmResult<u64> {
        self.gas.try_consume_load()?;
        Ok(self.inner.load_uint(bits)?)
    }

    pub fn preload_uint(&self, bits: usize) -> VmResult<u64> {
        self.gas.try_consume_load()?;
        Ok(self.inner.preload_uint(bits)?)
    }

    pub fn load_u32(&mut self) -> VmResult<u32> {
        Ok(self.load_uint(32)? as u32)
    }

    pub fn load_u64(&mut self) -> VmResult<u64> {
        self.load_uint(64)
    }

    pub fn load_big_uint(&mut self, bits: usize) -> VmResult<BigUint> {
        self.gas.try_consume_load()?;
        Ok(self.inner.load_big_uint(bits)?)
    }

    pub fn load_coins(&mut self) -> VmResult<u128> {
        self.gas.try_consume_load()?;
        Ok(self.inner.load_coins()?)
    }

    pub fn load_address(&mut self) -> VmResult<Option<Address>> {
        self.gas.try_consume_load()?;
        Ok(self.inner.load_address()?)
    }

    pub fn load_reference(&mut self) -> VmResult<Arc<Cell>> {
        self.gas.try_consume_load()?;
        Ok(self.inner.load_reference()?)
    }

    pub fn skip_bits(&mut self, bits: usize) -> VmResult<()> {
        self.gas.try_consume_load()?;
        Ok(self.inner.skip_bits(bits)?)
    }
}
