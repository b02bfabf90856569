use clap::Parser;
use tracing::error;

mod config;
mod llm;
mod planner;
mod util;
mod warehouse;

use crate::config::{AppConfig, CliArgs, Command};
use crate::util::logging::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    let args = CliArgs::parse();

    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Command::InitSchema => warehouse::ddl::init_schema(&config).await,
        Command::Plan { user_id } => match planner::generate_itinerary(&config, &user_id).await {
            Ok(itinerary) => {
                println!("{}", itinerary);
                Ok(())
            }
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
