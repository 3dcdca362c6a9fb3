use crate::tvm::{base64_to_boc, hex_to_boc, Cell};
use anyhow::{Context, Result};
use pretty_env_logger::formatted_builder;
use std::sync::Arc;

pub fn init_logger() -> Result<(), log::SetLoggerError> {
    let mut builder = formatted_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else {
        builder.parse_filters("info");
    }

    builder.try_init()
}

/// Decodes a BoC given either as hex or as base64
pub fn parse_boc(input: &str) -> Result<Arc<Cell>> {
    let input = input.trim();
    if !input.is_empty() && input.len() % 2 == 0 && input.bytes().all(|b| b.is_ascii_hexdigit()) {
        return hex_to_boc(input);
    }
    base64_to_boc(input).context("BoC is neither hex nor base64")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boc_formats() {
        let from_hex = parse_boc("b5ee9c72010101010002000000").unwrap();
        assert!(from_hex.is_empty());

        let b64 = crate::tvm::boc_to_base64(&from_hex, false).unwrap();
        assert_eq!(parse_boc(&b64).unwrap().hash(), from_hex.hash());

        assert!(parse_boc("not a boc").is_err());
    }
}
