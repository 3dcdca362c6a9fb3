use crate::tvm::{Address, Builder, Cell, CellError, CellResult, Slice};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use std::sync::Arc;

/// Internal message delivered to an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    pub from: Address,
    pub to: Address,
    pub value: BigUint,
    /// Return the value to the sender if processing fails
    pub bounce: bool,
    /// This message is itself a returned one
    pub bounced: bool,
    pub body: Arc<Cell>,
}

impl MessageEnvelope {
    /// Creates a bounceable message
    pub fn internal(from: Address, to: Address, value: impl Into<BigUint>, body: Arc<Cell>) -> Self {
        Self {
            from,
            to,
            value: value.into(),
            bounce: true,
            bounced: false,
            body,
        }
    }

    pub fn with_bounce(mut self, bounce: bool) -> Self {
        self.bounce = bounce;
        self
    }

    pub fn with_bounced(mut self, bounced: bool) -> Self {
        self.bounced = bounced;
        self
    }

    /// Encodes the message as a cell
    ///
    /// ```text
    /// int_msg_info$0 ihr_disabled:Bool bounce:Bool bounced:Bool
    ///   src:MsgAddress dest:MsgAddressInt value:CurrencyCollection
    ///   ihr_fee:Grams fwd_fee:Grams created_lt:uint64 created_at:uint32
    ///   init:(Maybe ...) body:(Either X ^X)
    /// ```
    ///
    /// The body is always stored as a reference.
    pub fn to_cell(&self) -> CellResult<Arc<Cell>> {
        let value = self
            .value
            .to_u128()
            .ok_or(CellError::IntegerOverflow(120))?;

        let mut builder = Builder::new();
        builder.store_bit(false)?; // int_msg_info$0
        builder.store_bit(true)?; // ihr_disabled
        builder.store_bit(self.bounce)?;
        builder.store_bit(self.bounced)?;
        builder.store_address(Some(&self.from))?;
        builder.store_address(Some(&self.to))?;
        builder.store_coins(value)?;
        builder.store_bit(false)?; // no extra currencies
        builder.store_coins(0)?; // ihr_fee
        builder.store_coins(0)?; // fwd_fee
        builder.store_u64(0)?; // created_lt
        builder.store_u32(0)?; // created_at
        builder.store_bit(false)?; // no state init
        builder.store_bit(true)?; // body in reference
        builder.store_ref(self.body.clone())?;
        builder.build()
    }

    /// Decodes a message encoded by [`MessageEnvelope::to_cell`]
    ///
    /// Inline bodies are accepted as well and become a standalone cell.
    pub fn from_cell(cell: Arc<Cell>) -> CellResult<Self> {
        let mut slice = Slice::new(cell);
        if slice.load_bit()? {
            return Err(CellError::InvalidTag(1));
        }
        slice.skip_bits(1)?; // ihr_disabled
        let bounce = slice.load_bit()?;
        let bounced = slice.load_bit()?;
        let from = slice.load_address()?.ok_or(CellError::InvalidTag(0))?;
        let to = slice.load_address()?.ok_or(CellError::InvalidTag(0))?;
        let value = slice.load_coins()?;
        slice.load_maybe_ref()?; // extra currencies are ignored
        slice.load_coins()?;
        slice.load_coins()?;
        slice.skip_bits(64 + 32)?;
        if slice.load_bit()? {
            return Err(CellError::InvalidTag(1)); // state init is not supported
        }

        let body = if slice.load_bit()? {
            slice.load_reference()?
        } else {
            let mut builder = Builder::new();
            builder.store_slice(&slice)?;
            builder.build()?
        };

        Ok(Self {
            from,
            to,
            value: BigUint::from(value),
            bounce,
            bounced,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_cell_roundtrip() {
        let mut body = Builder::new();
        body.store_u32(0xd53276db).unwrap();
        body.store_u64(7).unwrap();

        let msg = MessageEnvelope::internal(
            Address::new(0, [1u8; 32]),
            Address::new(-1, [2u8; 32]),
            1_500_000_000u64,
            body.build().unwrap(),
        )
        .with_bounced(true);

        let decoded = MessageEnvelope::from_cell(msg.to_cell().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_extra_currencies_are_skipped() {
        let from = Address::new(0, [1u8; 32]);
        let to = Address::new(0, [2u8; 32]);
        let mut body = Builder::new();
        body.store_u32(0x7bdd97de).unwrap();
        let body = body.build().unwrap();

        let mut builder = Builder::new();
        builder.store_uint(0b0110, 4).unwrap(); // int_msg_info$0, bounce
        builder.store_address(Some(&from)).unwrap();
        builder.store_address(Some(&to)).unwrap();
        builder.store_coins(500).unwrap();
        builder.store_maybe_ref(Some(Cell::empty_cell())).unwrap();
        builder.store_coins(0).unwrap();
        builder.store_coins(0).unwrap();
        builder.store_u64(0).unwrap();
        builder.store_u32(0).unwrap();
        builder.store_bit(false).unwrap();
        builder.store_maybe_ref(Some(body.clone())).unwrap();

        let decoded = MessageEnvelope::from_cell(builder.build().unwrap()).unwrap();
        assert_eq!(decoded.value, BigUint::from(500u32));
        assert!(decoded.bounce);
        assert_eq!(decoded.body, body);
    }

    #[test]
    fn test_value_too_large_for_coins() {
        let msg = MessageEnvelope::internal(
            Address::new(0, [1u8; 32]),
            Address::new(0, [2u8; 32]),
            BigUint::from(1u8) << 130,
            Cell::empty_cell(),
        );
        assert_eq!(msg.to_cell().unwrap_err(), CellError::IntegerOverflow(120));
    }
}
