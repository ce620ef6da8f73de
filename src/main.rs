use anyhow::Result;
use clap::Parser;
use voxbridge::app;
use voxbridge::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    app::init_logging(cli.verbose, cli.quiet);
    app::run(cli).await
}
