use clap::Parser;
use env_logger::Env;
use log::{error, info, LevelFilter};

use daoit::cli::Cli;
use daoit::config::Config;
use daoit::errors::Result;
use daoit::handlers::{dispatch, Context};

async fn run(args: Cli) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    info!("Configuration loaded: {:?}", config);
    let ctx = Context::new(config, args.network.as_deref(), args.json)?;
    dispatch(&ctx, args.command).await
}

#[tokio::main]
async fn main() {
    // 1. Parse command line arguments and setup logging
    let args = Cli::parse();
    let log_level = match args.log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level.to_string())).init();

    // 2. Run the command; any error ends the process with exit code 1
    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
