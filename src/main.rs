use anyhow::Result;
use clap::Parser;
use weather_director::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    weather_director::init_tracing(&cli);
    weather_director::run(cli).await
}
