use crate::models::Transaction;
use crate::tvm::Address;
use anyhow::{bail, Result};
use std::fmt;

/// Append-only record of executed transactions, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionLog {
    transactions: Vec<Transaction>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn last(&self) -> Option<&Transaction> {
        self.transactions.last()
    }

    /// First transaction matching the filter
    pub fn find(&self, filter: &TxFilter) -> Option<&Transaction> {
        self.find_by(|tx| filter.matches(tx))
    }

    pub fn find_by(&self, mut predicate: impl FnMut(&Transaction) -> bool) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| predicate(tx))
    }

    /// All transactions matching the filter
    pub fn filter(&self, filter: &TxFilter) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .collect()
    }

    pub fn has_transaction(&self, filter: &TxFilter) -> bool {
        self.find(filter).is_some()
    }

    /// Returns the first matching transaction or an error listing what was logged
    pub fn expect(&self, filter: &TxFilter) -> Result<&Transaction> {
        if let Some(tx) = self.find(filter) {
            return Ok(tx);
        }

        let logged = self
            .transactions
            .iter()
            .map(|tx| {
                format!(
                    "lt {} {} -> {} exit code {}",
                    tx.lt, tx.from, tx.to, tx.exit_code
                )
            })
            .collect::<Vec<_>>()
            .join("; ");
        bail!("No transaction matching {filter}, logged: [{logged}]")
    }
}

impl<'a> IntoIterator for &'a TransactionLog {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}

impl Extend<Transaction> for TransactionLog {
    fn extend<T: IntoIterator<Item = Transaction>>(&mut self, iter: T) {
        self.transactions.extend(iter);
    }
}

/// Transaction matcher, unset fields match anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxFilter {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub exit_code: Option<u32>,
    pub success: Option<bool>,
    pub bounced: Option<bool>,
    pub out_msgs: Option<usize>,
}

impl TxFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, address: Address) -> Self {
        self.from = Some(address);
        self
    }

    pub fn to(mut self, address: Address) -> Self {
        self.to = Some(address);
        self
    }

    pub fn exit_code(mut self, exit_code: u32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    /// Matches on the `bounced` flag of the inbound message
    pub fn bounced(mut self, bounced: bool) -> Self {
        self.bounced = Some(bounced);
        self
    }

    pub fn out_msgs(mut self, count: usize) -> Self {
        self.out_msgs = Some(count);
        self
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        self.from.is_none_or(|from| tx.from == from)
            && self.to.is_none_or(|to| tx.to == to)
            && self.exit_code.is_none_or(|code| tx.exit_code == code)
            && self.success.is_none_or(|success| tx.success == success)
            && self.bounced.is_none_or(|bounced| tx.in_msg.bounced == bounced)
            && self.out_msgs.is_none_or(|count| tx.out_msgs.len() == count)
    }
}

impl fmt::Display for TxFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(from) = &self.from {
            parts.push(format!("from={from}"));
        }
        if let Some(to) = &self.to {
            parts.push(format!("to={to}"));
        }
        if let Some(code) = self.exit_code {
            parts.push(format!("exit_code={code}"));
        }
        if let Some(success) = self.success {
            parts.push(format!("success={success}"));
        }
        if let Some(bounced) = self.bounced {
            parts.push(format!("bounced={bounced}"));
        }
        if let Some(count) = self.out_msgs {
            parts.push(format!("out_msgs={count}"));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}
