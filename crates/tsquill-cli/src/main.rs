use clap::Parser;
use tsquill_cli::{CliArgs, TsquillCli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let cli = TsquillCli::from_args(&args)?;
    cli.run(args).await?;
    Ok(())
}
