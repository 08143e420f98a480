use alloy::primitives::Address;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::services::streams::FlowRate;

#[derive(Parser, Debug)]
#[command(author, version, about = "Deploy and operate streaming DAOs", long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Network key or chain id; overrides `network.active` from the config.
    #[arg(long, global = true)]
    pub network: Option<String>,

    /// Config file, defaults to config/config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the address table of the active network, or of every network.
    Networks {
        #[arg(long)]
        all: bool,
    },
    /// Salts and predicted addresses for a deployment seed.
    Plan {
        #[arg(long)]
        seed: String,
    },
    /// Deploy implementations and factory through the CREATE2 factory.
    Deploy {
        #[arg(long)]
        seed: String,
        /// Submit the implementation deployments back-to-back.
        #[arg(long)]
        pipelined: bool,
    },
    /// Deploy only the DAO factory.
    DeployFactory {
        #[arg(long)]
        seed: String,
    },
    /// Step 1: DAO token and managing super app.
    CreateApp(TokenArgs),
    /// Step 2: governor and timelock for an existing DAO token.
    CreateGov {
        #[arg(long)]
        token: Address,
        #[command(flatten)]
        governance: GovernanceArgs,
    },
    /// Both creation steps.
    CreateDao {
        #[command(flatten)]
        token: TokenArgs,
        #[command(flatten)]
        governance: GovernanceArgs,
    },
    #[command(subcommand)]
    Stream(StreamCommand),
    #[command(subcommand)]
    App(AppCommand),
    #[command(subcommand)]
    Gov(GovCommand),
    #[command(subcommand)]
    Fork(ForkCommand),
}

#[derive(Args, Debug, Clone)]
pub struct TokenArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub symbol: String,
    /// Accepted token symbol from the network table, or an address.
    #[arg(long)]
    pub accepted: String,
}

#[derive(Args, Debug, Clone)]
pub struct GovernanceArgs {
    #[arg(long)]
    pub vetoable: bool,
    /// Voting period in blocks.
    #[arg(long, default_value_t = 45818)]
    pub voting_period: u64,
}

#[derive(Subcommand, Debug)]
pub enum StreamCommand {
    Open {
        /// Super token symbol or address.
        #[arg(long)]
        token: String,
        #[arg(long)]
        receiver: Address,
        /// Wei per second.
        #[arg(long)]
        rate: FlowRate,
    },
    Update {
        #[arg(long)]
        token: String,
        #[arg(long)]
        receiver: Address,
        #[arg(long)]
        rate: FlowRate,
    },
    Delete {
        #[arg(long)]
        token: String,
        /// Defaults to the configured account.
        #[arg(long)]
        sender: Option<Address>,
        #[arg(long)]
        receiver: Address,
    },
    Show {
        #[arg(long)]
        token: String,
        #[arg(long)]
        sender: Option<Address>,
        #[arg(long)]
        receiver: Address,
    },
}

#[derive(Subcommand, Debug)]
pub enum AppCommand {
    Info {
        #[arg(long)]
        app: Address,
    },
    Deposit {
        #[arg(long)]
        app: Address,
        #[arg(long)]
        token: String,
        /// Amount in wei.
        #[arg(long)]
        amount: String,
        #[arg(long)]
        beneficiary: Option<Address>,
    },
    Grant {
        #[arg(long)]
        app: Address,
        #[arg(long)]
        to: Option<Address>,
        #[arg(long)]
        amount: String,
    },
    Approve {
        #[arg(long)]
        token: String,
        #[arg(long)]
        spender: Address,
        #[arg(long)]
        amount: String,
    },
    Upgrade {
        #[arg(long)]
        super_token: String,
        #[arg(long)]
        amount: String,
    },
    MintDai {
        #[arg(long)]
        amount: String,
        #[arg(long)]
        to: Option<Address>,
    },
    Deposits {
        #[arg(long)]
        app: Address,
        #[arg(long, action = ArgAction::Set)]
        enabled: bool,
    },
    Streams {
        #[arg(long)]
        app: Address,
        #[arg(long, action = ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GrantProposalArgs {
    #[arg(long)]
    pub governor: Address,
    #[arg(long)]
    pub app: Address,
    /// Grant beneficiary, defaults to the configured account.
    #[arg(long)]
    pub to: Option<Address>,
    #[arg(long)]
    pub amount: String,
    #[arg(long)]
    pub description: String,
}

#[derive(Subcommand, Debug)]
pub enum GovCommand {
    Propose(GrantProposalArgs),
    State(GrantProposalArgs),
    Queue(GrantProposalArgs),
    Execute(GrantProposalArgs),
}

#[derive(Subcommand, Debug)]
pub enum ForkCommand {
    /// Move a holder's whole token balance to an account.
    Fund {
        #[arg(long)]
        token: String,
        #[arg(long)]
        holder: Address,
        #[arg(long)]
        to: Option<Address>,
    },
    AuthorizeFactory {
        #[arg(long)]
        owner: Option<Address>,
        #[arg(long)]
        host: Option<Address>,
        #[arg(long)]
        factory: Option<Address>,
    },
    SetNonce {
        #[arg(long)]
        account: Option<Address>,
        #[arg(long)]
        nonce: u64,
    },
}
