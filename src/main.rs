use tvm_sandbox_rs::cli::Cli;
use tvm_sandbox_rs::utils::init_logger;

fn main() -> anyhow::Result<()> {
    init_logger()?;
    let cli = Cli::parse_args();
    cli.execute()?;
    Ok(())
}
