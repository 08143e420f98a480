use alloy::primitives::Address;
use log::info;
use serde_json::json;

use crate::cli::{GovCommand, GrantProposalArgs};
use crate::errors::Result;
use crate::handlers::Context;
use crate::services::governance::{grant_proposal, GovernorClient, Proposal};
use crate::services::super_app::parse_amount;

fn build_proposal(args: &GrantProposalArgs, account: Address) -> Result<Proposal> {
    let amount = parse_amount(&args.amount)?;
    let proposal = grant_proposal(
        args.app,
        args.to.unwrap_or(account),
        amount,
        &args.description,
    );
    proposal.validate()?;
    Ok(proposal)
}

/// Explicit beneficiary, else the configured account. A read-only `state`
/// with `--to` needs no wallet at all.
fn beneficiary(ctx: &Context, args: &GrantProposalArgs) -> Result<Address> {
    match args.to {
        Some(to) => Ok(to),
        None => ctx.account(),
    }
}

/// `gov propose|state|queue|execute` for grant proposals
///
/// The proposal is rebuilt from the same arguments each time; the governor
/// identifies it by targets, values, calldatas and description hash.
pub async fn gov_handler(ctx: &Context, command: GovCommand) -> Result<()> {
    match command {
        GovCommand::Propose(args) => {
            info!("Handling gov propose command");
            let (provider, account) = ctx.signing_provider().await?;
            let proposal = build_proposal(&args, account)?;
            let client =
                GovernorClient::new(provider, ctx.network.clone(), args.governor, ctx.confirmations());
            let id = client.propose(&proposal).await?;
            ctx.emit(
                &json!({ "proposal_id": id.to_string(), "proposal": proposal }),
                &format!("proposal id {}", id),
            )
        }
        GovCommand::State(args) => {
            info!("Handling gov state command");
            let proposal = build_proposal(&args, beneficiary(ctx, &args)?)?;
            let provider = ctx.read_provider().await?;
            let client =
                GovernorClient::new(provider, ctx.network.clone(), args.governor, ctx.confirmations());
            let id = client.proposal_id(&proposal).await?;
            let state = client.state(id).await?;
            ctx.emit(
                &json!({ "proposal_id": id.to_string(), "state": state }),
                &format!("proposal {} is {}", id, state),
            )
        }
        GovCommand::Queue(args) => {
            info!("Handling gov queue command");
            let (provider, account) = ctx.signing_provider().await?;
            let proposal = build_proposal(&args, account)?;
            let client =
                GovernorClient::new(provider, ctx.network.clone(), args.governor, ctx.confirmations());
            let receipt = client.queue(&proposal).await?;
            let id = client.proposal_id(&proposal).await?;
            let state = client.state(id).await?;
            ctx.emit(
                &json!({ "transaction_hash": receipt.transaction_hash, "state": state }),
                &format!("queued in {}, proposal is {}", receipt.transaction_hash, state),
            )
        }
        GovCommand::Execute(args) => {
            info!("Handling gov execute command");
            let (provider, account) = ctx.signing_provider().await?;
            let proposal = build_proposal(&args, account)?;
            let client =
                GovernorClient::new(provider, ctx.network.clone(), args.governor, ctx.confirmations());
            let receipt = client.execute(&proposal).await?;
            ctx.emit(
                &json!({ "transaction_hash": receipt.transaction_hash }),
                &format!("executed in {}", receipt.transaction_hash),
            )
        }
    }
}
