use crate::tvm::CellError;
use thiserror::Error;

pub type VmResult<T> = std::result::Result<T, VmError>;

/// Abnormal termination of contract code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error(transparent)]
    Cell(#[from] CellError),
    #[error("out of gas")]
    OutOfGas,
    /// Exit code thrown by the contract itself
    #[error("exit code {0}")]
    Exit(u32),
}

/// Returns `Err(VmError::Exit(code))` from the enclosing function unless `cond` holds
#[macro_export]
macro_rules! vm_ensure {
    ($cond:expr, $code:expr $(,)?) => {
        if !$cond {
            return Err($crate::executor::VmError::Exit($code));
        }
    };
}
