//! In-memory ledger for running messages against contracts
//!
//! A [`Blockchain`] owns every account, the contract registry and the
//! transaction log. Each test constructs its own instance.

pub mod log;


pub use self::log::{TransactionLog, TxFilter};

use crate::contracts::Treasury;
use crate::executor::{Contract, ContractRegistry, Executor, ExecutorConfig};
use crate::models::{AccountState, MessageEnvelope, Transaction};
use crate::tvm::{Address, Cell, CellStore};
use anyhow::{bail, Result};
use num_bigint::BigUint;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;

/// Starting balance of a treasury wallet
pub const TREASURY_BALANCE: u128 = 1_000_000 * 1_000_000_000;

/// Transactions produced by one [`Blockchain::send_message`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageResult {
    pub transactions: Vec<Transaction>,
}

impl SendMessageResult {
    /// Transaction of the injected message itself
    pub fn first(&self) -> Option<&Transaction> {
        self.transactions.first()
    }
}

/// Returned when one `send_message` call hits `max_messages_per_send`
///
/// `delivered` holds the transactions that were already committed.
#[derive(Debug, Clone, Error)]
#[error("Message limit of {limit} per send exceeded, {undelivered} messages left undelivered")]
pub struct MessageLimitExceeded {
    pub limit: usize,
    pub undelivered: usize,
    pub delivered: SendMessageResult,
}

/// Restorable copy of the mutable ledger state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    accounts: BTreeMap<Address, AccountState>,
    log: TransactionLog,
    lt: u64,
}

pub struct Blockchain {
    executor: Executor,
    contracts: ContractRegistry,
    accounts: BTreeMap<Address, AccountState>,
    cells: CellStore,
    log: TransactionLog,
    lt: u64,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::with_config(ExecutorConfig::default())
    }
}

impl Blockchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ExecutorConfig) -> Self {
        Self {
            executor: Executor::new(config),
            contracts: ContractRegistry::new(),
            accounts: BTreeMap::new(),
            cells: CellStore::new(),
            log: TransactionLog::new(),
            lt: 0,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        self.executor.config()
    }

    /// Makes contract logic available to accounts carrying its code
    pub fn register(&mut self, contract: Arc<dyn Contract>) -> Arc<Cell> {
        let code = self.contracts.register(contract);
        self.cells.insert(&code)
    }

    /// Binds externally produced code to contract logic
    pub fn register_code(&mut self, code: &Arc<Cell>, contract: Arc<dyn Contract>) {
        self.contracts.register_code(code, contract);
        self.cells.insert(code);
    }

    pub fn create_account(
        &mut self,
        address: Address,
        code: Arc<Cell>,
        data: Arc<Cell>,
        balance: impl Into<BigUint>,
    ) -> Result<()> {
        if self.accounts.contains_key(&address) {
            bail!("Account {address} already exists");
        }

        let code = self.cells.insert(&code);
        let data = self.cells.insert(&data);
        let state = AccountState::new(address, code, data, balance.into());
        ::log::info!("created account {address}, balance {}", state.balance);
        self.accounts.insert(address, state);
        Ok(())
    }

    /// Deploys a contract at the address derived from its initial state
    pub fn deploy(
        &mut self,
        contract: Arc<dyn Contract>,
        data: Arc<Cell>,
        balance: impl Into<BigUint>,
        workchain: i8,
    ) -> Result<Address> {
        let name = contract.name().to_owned();
        let code = self.register(contract);
        let address = Address::from_state_init(workchain, &code, &data)?;
        self.create_account(address, code, data, balance)?;
        ::log::info!("deployed {name} at {address}");
        Ok(address)
    }

    /// Returns the wallet named `name`, creating it on first use
    pub fn treasury(&mut self, name: &str) -> Result<Address> {
        let address = Address::new(0, Sha256::digest(name.as_bytes()).into());
        if !self.accounts.contains_key(&address) {
            let code = self.register(Arc::new(Treasury::new()?));
            self.create_account(address, code, Cell::empty_cell(), TREASURY_BALANCE)?;
        }
        Ok(address)
    }

    /// Delivers a message and every message it causes, in FIFO order
    ///
    /// Fails with [`MessageLimitExceeded`] once `max_messages_per_send`
    /// transactions ran; those stay committed and logged.
    pub fn send_message(&mut self, msg: MessageEnvelope) -> Result<SendMessageResult> {
        let limit = self.config().max_messages_per_send;
        let mut queue = VecDeque::from([msg]);
        let mut result = SendMessageResult::default();

        while let Some(msg) = queue.pop_front() {
            if result.transactions.len() >= limit {
                let undelivered = queue.len() + 1;
                ::log::warn!("message limit {limit} reached, {undelivered} messages left undelivered");
                return Err(MessageLimitExceeded {
                    limit,
                    undelivered,
                    delivered: result,
                }
                .into());
            }

            self.lt += 1;
            let tx = self
                .executor
                .execute(&self.contracts, self.accounts.get(&msg.to), &msg, self.lt);

            if let Some(state) = &tx.state {
                let mut state = state.clone();
                state.data = self.cells.insert(&state.data);
                self.accounts.insert(state.address, state);
            }
            if !tx.success {
                ::log::info!("{} -> {} failed with exit code {}", tx.from, tx.to, tx.exit_code);
            }

            queue.extend(tx.out_msgs.iter().cloned());
            self.log.push(tx.clone());
            result.transactions.push(tx);
        }

        Ok(result)
    }

    /// Sends an internal bounceable message
    pub fn send(
        &mut self,
        from: Address,
        to: Address,
        value: impl Into<BigUint>,
        body: Arc<Cell>,
    ) -> Result<SendMessageResult> {
        self.send_message(MessageEnvelope::internal(from, to, value, body))
    }

    pub fn account(&self, address: &Address) -> Option<&AccountState> {
        self.accounts.get(address)
    }

    /// Balance of an account, zero if it does not exist
    pub fn balance(&self, address: &Address) -> BigUint {
        self.accounts
            .get(address)
            .map(|account| account.balance.clone())
            .unwrap_or_default()
    }

    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    pub fn cells(&self) -> &CellStore {
        &self.cells
    }

    /// Logical time of the last executed transaction
    pub fn lt(&self) -> u64 {
        self.lt
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            accounts: self.accounts.clone(),
            log: self.log.clone(),
            lt: self.lt,
        }
    }

    /// Rolls accounts, log and logical time back to a snapshot
    ///
    /// Cells interned since the snapshot stay in the store.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.accounts = snapshot.accounts;
        self.log = snapshot.log;
        self.lt = snapshot.lt;
    }
}
