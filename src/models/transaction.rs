use crate::models::account::AccountState;
use crate::models::message::MessageEnvelope;
use crate::tvm::Address;

/// Result of delivering one message to one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Logical time, increases with every executed message
    pub lt: u64,
    pub from: Address,
    pub to: Address,
    pub exit_code: u32,
    /// Whether the exit code is 0 or 1 and the state was committed
    pub success: bool,
    pub gas_used: u64,
    pub in_msg: MessageEnvelope,
    pub out_msgs: Vec<MessageEnvelope>,
    /// Account state after the transaction, `None` if the account does not exist
    pub state: Option<AccountState>,
}

impl Transaction {
    /// Outbound message that returns the inbound value to the sender, if any
    pub fn bounce_message(&self) -> Option<&MessageEnvelope> {
        self.out_msgs.iter().find(|msg| msg.bounced)
    }
}
