//! Message execution engine
//!
//! Delivers one internal message to one account and produces a
//! [`Transaction`]. Execution is all-or-nothing: state changes staged by the
//! contract are committed only when it terminates with a success exit code.

pub mod bounce;
pub mod config;
pub mod context;
pub mod contract;
pub mod error;
pub mod gas;

#[cfg(test)]
mod tests;

pub use bounce::{bounce_message, BOUNCE_PREFIX};
pub use config::{is_success, EngineExitCodes, ExecutorConfig, EXIT_ALT_SUCCESS, EXIT_SUCCESS};
pub use context::{ComputeContext, StagedEffects, VmSlice};
pub use contract::{
    native_code_cell, CodeProvider, Contract, ContractRegistry, NoContracts, NATIVE_CODE_TAG,
};
pub use error::{VmError, VmResult};
pub use gas::GasMeter;

use crate::models::{AccountState, MessageEnvelope, Transaction};
use num_bigint::BigUint;

#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: ExecutorConfig,
}

/// Result of the compute step before bouncing
enum ComputeResult {
    Committed {
        exit_code: u32,
        state: AccountState,
        out_msgs: Vec<MessageEnvelope>,
    },
    Failed(u32),
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Executes one message against the recipient's state.
    ///
    /// `account` is the current state of `msg.to`, or `None` if the account
    /// does not exist. The returned transaction carries the state after
    /// execution, which equals the input state on failure.
    pub fn execute(
        &self,
        code: &dyn CodeProvider,
        account: Option<&AccountState>,
        msg: &MessageEnvelope,
        lt: u64,
    ) -> Transaction {
        let codes = &self.config.exit_codes;
        let gas = GasMeter::new(self.config.gas_limit);

        let result = match account {
            Some(account) if account.is_active() => self.compute(code, account, msg, &gas),
            _ => ComputeResult::Failed(codes.no_code),
        };

        let (exit_code, state, out_msgs) = match result {
            ComputeResult::Committed {
                exit_code,
                state,
                out_msgs,
            } => (exit_code, Some(state), out_msgs),
            ComputeResult::Failed(exit_code) => {
                let out_msgs = match bounce_message(msg, self.config.bounce_body_bits) {
                    Ok(bounced) => bounced.into_iter().collect(),
                    Err(e) => {
                        log::warn!("failed to build bounced message: {e}");
                        Vec::new()
                    }
                };
                (exit_code, account.cloned(), out_msgs)
            }
        };

        let success = is_success(exit_code);
        log::debug!(
            "lt {lt}: {} -> {}, exit code {exit_code}, gas {}, {} out msgs",
            msg.from,
            msg.to,
            gas.consumed(),
            out_msgs.len()
        );

        Transaction {
            lt,
            from: msg.from,
            to: msg.to,
            exit_code,
            success,
            gas_used: gas.consumed(),
            in_msg: msg.clone(),
            out_msgs,
            state,
        }
    }

    fn compute(
        &self,
        code: &dyn CodeProvider,
        account: &AccountState,
        msg: &MessageEnvelope,
        gas: &GasMeter,
    ) -> ComputeResult {
        let codes = &self.config.exit_codes;

        let contract = match account.code_hash().and_then(|hash| code.find(&hash)) {
            Some(contract) => contract,
            None => return ComputeResult::Failed(codes.invalid_opcode),
        };

        let mut ctx = ComputeContext::new(gas, msg, account);
        let exit_code = match contract.receive(&mut ctx) {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                log::trace!("{} terminated: {e}", contract.name());
                codes.for_error(&e)
            }
        };
        if !is_success(exit_code) {
            return ComputeResult::Failed(exit_code);
        }

        let StagedEffects { new_data, out_msgs } = ctx.into_effects();

        let credited = &account.balance + &msg.value;
        let outgoing: BigUint = out_msgs.iter().map(|out| &out.value).sum();
        if outgoing > credited {
            return ComputeResult::Failed(codes.insufficient_funds);
        }

        ComputeResult::Committed {
            exit_code,
            state: AccountState {
                address: account.address,
                code: account.code.clone(),
                data: new_data.unwrap_or_else(|| account.data.clone()),
                balance: credited - outgoing,
            },
            out_msgs,
        }
    }
}
