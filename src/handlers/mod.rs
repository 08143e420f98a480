pub mod app;
pub mod context;
pub mod dao;
pub mod deploy;
pub mod fork;
pub mod gov;
pub mod network;
pub mod stream;

pub use context::{stop_listener, Context};

use crate::cli::Command;
use crate::errors::Result;

/// Route a parsed command to its handler.
pub async fn dispatch(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Networks { all } => network::networks_handler(ctx, all),
        Command::Plan { seed } => deploy::plan_handler(ctx, &seed),
        Command::Deploy { seed, pipelined } => deploy::deploy_handler(ctx, &seed, pipelined).await,
        Command::DeployFactory { seed } => deploy::deploy_factory_handler(ctx, &seed).await,
        Command::CreateApp(token) => dao::create_app_handler(ctx, &token).await,
        Command::CreateGov { token, governance } => {
            dao::create_gov_handler(ctx, token, &governance).await
        }
        Command::CreateDao { token, governance } => {
            dao::create_dao_handler(ctx, &token, &governance).await
        }
        Command::Stream(command) => stream::stream_handler(ctx, command).await,
        Command::App(command) => app::app_handler(ctx, command).await,
        Command::Gov(command) => gov::gov_handler(ctx, command).await,
        Command::Fork(command) => fork::fork_handler(ctx, command).await,
    }
}
