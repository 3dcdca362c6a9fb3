use crate::models::MessageEnvelope;
use crate::tvm::{Builder, CellResult, Slice};
use std::cmp::min;

/// Prefix of every bounced message body.
pub const BOUNCE_PREFIX: u32 = 0xFFFF_FFFF;

/// Builds a message returning the inbound value to its sender.
///
/// - Source and destination are swapped;
/// - The full inbound value is returned;
/// - The body is `0xFFFFFFFF` followed by up to `body_bits` bits of the
///   original body, references are not copied;
/// - The result is never bounceable itself.
///
/// Returns `None` for messages that must not bounce.
pub fn bounce_message(
    msg: &MessageEnvelope,
    body_bits: usize,
) -> CellResult<Option<MessageEnvelope>> {
    if !msg.bounce || msg.bounced {
        return Ok(None);
    }

    let mut original = Slice::new(msg.body.clone());
    let mut builder = Builder::new();
    builder.store_u32(BOUNCE_PREFIX)?;

    let take = min(
        min(body_bits, original.remaining_bits()),
        builder.available_bits(),
    );
    let bits = original.load_bits(take)?;
    builder.store_bits(&bits, take)?;

    Ok(Some(MessageEnvelope {
        from: msg.to,
        to: msg.from,
        value: msg.value.clone(),
        bounce: false,
        bounced: true,
        body: builder.build()?,
    }))
}
