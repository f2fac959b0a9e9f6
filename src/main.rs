use clap::Parser;
use site_migrator::cli::{self, Cli};
use site_migrator::utils::init_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    cli::run(cli).await
}
