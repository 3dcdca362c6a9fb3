pub mod cli;
pub mod compiler;
pub mod contracts;
pub mod crc;
pub mod executor;
pub mod models;
pub mod sandbox;
pub mod tvm;
pub mod utils;
