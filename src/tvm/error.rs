use thiserror::Error;

/// Errors produced while building or reading cells
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    /// Builder or cell would exceed 1023 bits or 4 references
    #[error("cell capacity exceeded: {bits} bits, {refs} references")]
    CapacityExceeded { bits: usize, refs: usize },
    /// Read past the end of the slice data
    #[error("cell underflow: requested {requested} bits, {remaining} remaining")]
    CellUnderflow { requested: usize, remaining: usize },
    /// No references left in the slice
    #[error("reference underflow")]
    RefUnderflow,
    /// Value does not fit into the requested bit width
    #[error("integer does not fit into {0} bits")]
    IntegerOverflow(usize),
    /// Cell tree would be deeper than the maximum depth
    #[error("cell depth exceeds {0}")]
    DepthExceeded(u16),
    /// Unexpected constructor prefix
    #[error("invalid tag: {0}")]
    InvalidTag(u64),
}

pub type CellResult<T> = std::result::Result<T, CellError>;
