use anyhow::Result;
use clap::Parser;
use rationale_trainer::{cli::Cli, infra::runtime::init_single_thread};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("rationale_trainer=info".parse()?),
        )
        .init();

    init_single_thread();

    let cli = Cli::parse();
    cli.run()
}
