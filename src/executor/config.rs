//! Executor configuration

use crate::executor::error::VmError;
use crate::tvm::CellError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Exit code of a normal termination
pub const EXIT_SUCCESS: u32 = 0;
/// Alternative success exit code
pub const EXIT_ALT_SUCCESS: u32 = 1;

pub fn is_success(exit_code: u32) -> bool {
    exit_code == EXIT_SUCCESS || exit_code == EXIT_ALT_SUCCESS
}

/// Exit codes the engine itself reports
///
/// Contract-thrown codes are transported as is; these only cover failures
/// detected outside of contract logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineExitCodes {
    pub int_overflow: u32,
    pub invalid_opcode: u32,
    pub cell_overflow: u32,
    pub cell_underflow: u32,
    pub out_of_gas: u32,
    pub insufficient_funds: u32,
    pub no_code: u32,
}

impl Default for EngineExitCodes {
    fn default() -> Self {
        Self {
            int_overflow: 5,
            invalid_opcode: 6,
            cell_overflow: 8,
            cell_underflow: 9,
            out_of_gas: 13,
            insufficient_funds: 37,
            no_code: 0xFFFF_FFFF,
        }
    }
}

impl EngineExitCodes {
    /// Maps an abnormal termination to the reported exit code
    pub fn for_error(&self, error: &VmError) -> u32 {
        match error {
            VmError::Exit(code) => *code,
            VmError::OutOfGas => self.out_of_gas,
            VmError::Cell(CellError::CapacityExceeded { .. } | CellError::DepthExceeded(_)) => {
                self.cell_overflow
            }
            VmError::Cell(CellError::IntegerOverflow(_)) => self.int_overflow,
            VmError::Cell(
                CellError::CellUnderflow { .. } | CellError::RefUnderflow | CellError::InvalidTag(_),
            ) => self.cell_underflow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Gas available to one message
    pub gas_limit: u64,
    /// Messages processed by one `send_message` call before it gives up
    pub max_messages_per_send: usize,
    /// Bits of the original body copied into a bounced message
    pub bounce_body_bits: usize,
    pub exit_codes: EngineExitCodes,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            gas_limit: 1_000_000,
            max_messages_per_send: 256,
            bounce_body_bits: 256,
            exit_codes: EngineExitCodes::default(),
        }
    }
}

/// Parses a JSON config, missing fields take their defaults
impl FromStr for ExecutorConfig {
    type Err = anyhow::Error;

    fn from_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse executor config")
    }
}

impl ExecutorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        json.parse()
    }
}
