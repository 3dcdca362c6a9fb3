//! Native reference contracts

pub mod counter;
pub mod jetton_minter;
pub mod treasury;

pub use counter::Counter;
pub use jetton_minter::{JettonMinter, MinterData};
pub use treasury::Treasury;
