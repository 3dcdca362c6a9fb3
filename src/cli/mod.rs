use crate::contracts::{Counter, JettonMinter, MinterData};
use crate::executor::{Contract, ExecutorConfig};
use crate::models::MessageEnvelope;
use crate::sandbox::Blockchain;
use crate::tvm::{Address, AddressFlags, Cell};
use crate::utils::parse_boc;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

/// tvm-sandbox-rs CLI
#[derive(Parser, Debug)]
#[command(name = "tvm-sandbox-rs")]
#[command(about = "Local ledger sandbox for cell-based contracts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    Minter,
    Counter,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a bag of cells and print its tree
    Inspect {
        /// BoC as hex or base64
        boc: String,
    },
    /// Print an address in every format
    Address {
        /// Raw ("0:abc...") or user-friendly address
        address: String,
    },
    /// Deploy a reference contract and send it one message
    Run {
        #[arg(short = 'c', long, value_enum)]
        contract: ContractKind,
        /// Initial data BoC, defaults to an empty state owned by the sender
        #[arg(short = 'd', long)]
        data: Option<String>,
        /// Initial balance
        #[arg(long, default_value = "10000000")]
        balance: u64,
        /// Message value
        #[arg(short = 'v', long, default_value = "1000000000")]
        value: u64,
        /// Message body BoC, defaults to an empty cell
        #[arg(short = 'b', long)]
        body: Option<String>,
        /// Send a non-bounceable message
        #[arg(long)]
        no_bounce: bool,
        /// Executor config JSON file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Execute the command
    pub fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Inspect { boc } => self.execute_inspect(boc),
            Commands::Address { address } => self.execute_address(address),
            Commands::Run {
                contract,
                data,
                balance,
                value,
                body,
                no_bounce,
                config,
            } => self.execute_run(
                *contract,
                data.as_deref(),
                *balance,
                *value,
                body.as_deref(),
                !*no_bounce,
                config.as_ref(),
            ),
        }
    }

    fn execute_inspect(&self, boc: &str) -> Result<()> {
        let root = parse_boc(boc)?;
        log::info!("Root hash: {}", root.hash_hex());
        log::info!("Depth: {}", root.depth());
        print_cell(&root, 0);
        Ok(())
    }

    fn execute_address(&self, address: &str) -> Result<()> {
        let address = Address::parse(address)?;
        let flags = |bounceable| AddressFlags {
            bounceable,
            test_only: false,
        };
        log::info!("Raw: {}", address.to_hex());
        log::info!("Bounceable: {}", address.to_friendly(true, flags(true)));
        log::info!("Non-bounceable: {}", address.to_friendly(true, flags(false)));
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn execute_run(
        &self,
        kind: ContractKind,
        data: Option<&str>,
        balance: u64,
        value: u64,
        body: Option<&str>,
        bounce: bool,
        config: Option<&PathBuf>,
    ) -> Result<()> {
        let config = match config {
            Some(path) => ExecutorConfig::load(path)?,
            None => ExecutorConfig::default(),
        };
        let mut chain = Blockchain::with_config(config);
        let sender = chain.treasury("cli")?;

        let (contract, default_data): (Arc<dyn Contract>, Arc<Cell>) = match kind {
            ContractKind::Minter => (
                Arc::new(JettonMinter::new()?),
                MinterData::new(Some(sender)).to_cell()?,
            ),
            ContractKind::Counter => (Arc::new(Counter::new()?), Counter::data(0, &sender)?),
        };
        let data = match data {
            Some(boc) => parse_boc(boc)?,
            None => default_data,
        };
        let body = match body {
            Some(boc) => parse_boc(boc)?,
            None => Cell::empty_cell(),
        };

        let address = chain.deploy(contract, data, balance, 0)?;
        let msg = MessageEnvelope::internal(sender, address, value, body).with_bounce(bounce);
        let result = chain.send_message(msg)?;

        for tx in &result.transactions {
            log::info!(
                "lt {} {} -> {}: exit code {} ({}), gas {}, {} out msgs",
                tx.lt,
                tx.from,
                tx.to,
                tx.exit_code,
                if tx.success { "committed" } else { "rolled back" },
                tx.gas_used,
                tx.out_msgs.len()
            );
        }
        if let Some(account) = chain.account(&address) {
            log::info!("Balance: {}", account.balance);
            log::info!("Data hash: {}", account.data.hash_hex());
        }
        Ok(())
    }
}

fn print_cell(cell: &Arc<Cell>, indent: usize) {
    log::info!(
        "{:indent$}{} bits, {} refs: {}",
        "",
        cell.bit_len(),
        cell.reference_count(),
        hex::encode(cell.data()),
        indent = indent * 2
    );
    for reference in cell.references() {
        print_cell(reference, indent + 1);
    }
}
