//! Ledger data model: accounts, messages and transactions

pub mod account;
pub mod message;
pub mod transaction;

pub use account::AccountState;
pub use message::MessageEnvelope;
pub use transaction::Transaction;
