//! Output of the external contract compiler

use crate::tvm::{base64_to_boc, Cell};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CompileResult {
    Ok {
        /// Base64 encoded bag of cells with the code root
        #[serde(rename = "codeBoc")]
        code_boc: String,
    },
    Error {
        message: String,
    },
}

impl CompileResult {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse compiler output")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read compiler output {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Decodes the code cell, failing on a compilation error
    pub fn into_code(self) -> Result<Arc<Cell>> {
        match self {
            Self::Ok { code_boc } => {
                base64_to_boc(&code_boc).context("Compiler returned an invalid code BoC")
            }
            Self::Error { message } => bail!("Compilation failed: {message}"),
        }
    }
}
