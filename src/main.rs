use bfd_high_volume::cli::{run_cli, Cli};
use bfd_high_volume::logging::{init_logging, LogConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&LogConfig::from_env())?;
    if let Err(err) = run_cli(cli).await {
        tracing::error!(error = ?err, "load test failed");
        return Err(err);
    }
    Ok(())
}
