//! Account address implementation
//!
//! An address is a workchain id plus a 256-bit account id. It can be printed
//! in raw form (`workchain:hex`) or in the user-friendly base64 form with
//! bounceable / test-only flags and a CRC16 checksum.

use crate::crc::CRC16;
use crate::tvm::builder::Builder;
use crate::tvm::cell::Cell;
use crate::tvm::error::CellResult;
use anyhow::{Result, bail};
use base64::Engine;
use std::fmt;
use std::sync::Arc;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TEST_ONLY: u8 = 0x80;

/// Represents an account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    /// Workchain ID (-1 for masterchain, 0 for basechain)
    pub workchain: i8,
    /// 32-byte account id
    pub account_id: [u8; 32],
}

/// Flags carried by the user-friendly form of an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressFlags {
    pub bounceable: bool,
    pub test_only: bool,
}

impl Address {
    /// Creates a new address from workchain and account id
    pub const fn new(workchain: i8, account_id: [u8; 32]) -> Self {
        Self {
            workchain,
            account_id,
        }
    }

    /// Derives the address of a contract from its initial code and data
    ///
    /// The account id is the hash of the StateInit cell
    /// `_ split_depth:(Maybe ...) special:(Maybe ...) code:(Maybe ^Cell) data:(Maybe ^Cell) library:(HashmapE ...)`.
    pub fn from_state_init(workchain: i8, code: &Arc<Cell>, data: &Arc<Cell>) -> CellResult<Self> {
        let mut builder = Builder::new();
        builder.store_bit(false)?; // no split_depth
        builder.store_bit(false)?; // not special
        builder.store_maybe_ref(Some(code.clone()))?;
        builder.store_maybe_ref(Some(data.clone()))?;
        builder.store_bit(false)?; // empty library
        let state_init = builder.build()?;

        Ok(Self::new(workchain, state_init.hash()))
    }

    /// Parses an address from string (supports both raw and base64 formats)
    pub fn parse(address: &str) -> Result<Self> {
        if let Ok(addr) = Self::from_hex(address) {
            return Ok(addr);
        }

        if let Ok((addr, _)) = Self::from_base64(address) {
            return Ok(addr);
        }

        bail!("Invalid address format: {address}")
    }

    /// Parses address from raw format: "workchain:hash"
    pub fn from_hex(address: &str) -> Result<Self> {
        let Some((workchain, hash_hex)) = address.split_once(':') else {
            bail!("Invalid raw address format");
        };

        let workchain = workchain.parse::<i8>()?;
        if hash_hex.len() != 64 {
            bail!("Account id must be 64 hex characters");
        }

        let mut account_id = [0u8; 32];
        hex::decode_to_slice(hash_hex, &mut account_id)?;

        Ok(Self::new(workchain, account_id))
    }

    /// Parses address from the user-friendly base64 format
    pub fn from_base64(address: &str) -> Result<(Self, AddressFlags)> {
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(address)
            .or_else(|_| base64::engine::general_purpose::STANDARD.decode(address))?;

        if decoded.len() != 36 {
            bail!("Invalid base64 address length");
        }

        let mut tag = decoded[0];
        let test_only = tag & TAG_TEST_ONLY != 0;
        tag &= !TAG_TEST_ONLY;

        let bounceable = match tag {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            _ => bail!("Invalid address tag"),
        };

        let expected_crc = u16::from_be_bytes([decoded[34], decoded[35]]);
        if CRC16.checksum(&decoded[..34]) != expected_crc {
            bail!("Invalid address CRC");
        }

        let workchain = decoded[1] as i8;
        let mut account_id = [0u8; 32];
        account_id.copy_from_slice(&decoded[2..34]);

        Ok((
            Self::new(workchain, account_id),
            AddressFlags {
                bounceable,
                test_only,
            },
        ))
    }

    /// Converts address to the user-friendly representation
    pub fn to_friendly(&self, url_safe: bool, flags: AddressFlags) -> String {
        let mut tag = if flags.bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if flags.test_only {
            tag |= TAG_TEST_ONLY;
        }

        let mut data = Vec::with_capacity(36);
        data.push(tag);
        data.push(self.workchain as u8);
        data.extend_from_slice(&self.account_id);
        data.extend_from_slice(&CRC16.checksum(&data).to_be_bytes());

        if url_safe {
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&data)
        } else {
            base64::engine::general_purpose::STANDARD.encode(&data)
        }
    }

    /// Converts to raw format (workchain:hash)
    pub fn to_hex(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.account_id))
    }

    /// Converts to the bounceable url-safe base64 format
    pub fn to_base64(&self) -> String {
        self.to_friendly(
            true,
            AddressFlags {
                bounceable: true,
                test_only: false,
            },
        )
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}
