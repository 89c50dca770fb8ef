use std::process::ExitCode;

use clap::Parser;
use coursefit_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    coursefit_cli::init_logging(&cli.log_level);
    coursefit_cli::run(cli).await
}
