use alloy::rpc::types::TransactionReceipt;
use log::info;
use serde_json::json;

use crate::cli::AppCommand;
use crate::errors::Result;
use crate::handlers::Context;
use crate::services::super_app::{parse_amount, SuperAppClient, SuperAppInfo, TokenClient};

fn render_info(info: &SuperAppInfo) -> String {
    format!(
        "superApp        {}\n\
         acceptedToken   {}\n\
         want            {}\n\
         underlying      {}\n\
         daoToken        {}\n\
         treasury        {}\n\
         sharePrice      {}\n\
         depositsEnabled {}\n\
         streamsEnabled  {}",
        info.address,
        info.accepted_token,
        info.want,
        info.underlying,
        info.dao_token,
        info.treasury,
        info.share_price,
        info.deposits_enabled,
        info.streams_enabled
    )
}

fn emit_receipt(ctx: &Context, action: &str, receipt: &TransactionReceipt) -> Result<()> {
    let response = json!({
        "action": action,
        "transaction_hash": receipt.transaction_hash,
        "block": receipt.block_number,
    });
    ctx.emit(
        &response,
        &format!("{} in transaction {}", action, receipt.transaction_hash),
    )
}

/// `app ...` - super app administration and token helpers
pub async fn app_handler(ctx: &Context, command: AppCommand) -> Result<()> {
    match command {
        AppCommand::Info { app } => {
            info!("Handling app info command for {}", app);
            let provider = ctx.read_provider().await?;
            let client = SuperAppClient::new(provider, ctx.network.clone(), app, ctx.confirmations());
            let info = client.info().await?;
            ctx.emit(&info, &render_info(&info))
        }
        AppCommand::Deposit {
            app,
            token,
            amount,
            beneficiary,
        } => {
            info!("Handling app deposit command for {}", app);
            let token = ctx.network.resolve_token(&token)?;
            let amount = parse_amount(&amount)?;
            let (provider, account) = ctx.signing_provider().await?;
            let client = SuperAppClient::new(provider, ctx.network.clone(), app, ctx.confirmations());
            let receipt = client
                .deposit(token, amount, beneficiary.unwrap_or(account))
                .await?;
            emit_receipt(ctx, "deposited", &receipt)
        }
        AppCommand::Grant { app, to, amount } => {
            info!("Handling app grant command for {}", app);
            let amount = parse_amount(&amount)?;
            let (provider, account) = ctx.signing_provider().await?;
            let client = SuperAppClient::new(provider, ctx.network.clone(), app, ctx.confirmations());
            if !client.is_manager(account).await? {
                info!("{} does not hold MANAGER_ROLE, the grant will likely revert", account);
            }
            let receipt = client.grant(to.unwrap_or(account), amount).await?;
            emit_receipt(ctx, "granted", &receipt)
        }
        AppCommand::Approve {
            token,
            spender,
            amount,
        } => {
            info!("Handling app approve command");
            let token = ctx.network.resolve_token(&token)?;
            let amount = parse_amount(&amount)?;
            let (provider, _) = ctx.signing_provider().await?;
            let client = TokenClient::new(provider, ctx.network.clone(), ctx.confirmations());
            let receipt = client.approve(token, spender, amount).await?;
            emit_receipt(ctx, "approved", &receipt)
        }
        AppCommand::Upgrade {
            super_token,
            amount,
        } => {
            info!("Handling app upgrade command");
            let super_token = ctx.network.resolve_token(&super_token)?;
            let amount = parse_amount(&amount)?;
            let (provider, account) = ctx.signing_provider().await?;
            let client = TokenClient::new(provider, ctx.network.clone(), ctx.confirmations());
            let receipt = client.upgrade(super_token, amount).await?;
            let balance = client.balance_of(super_token, account).await?;
            info!("Super token balance of {} is now {}", account, balance);
            emit_receipt(ctx, "upgraded", &receipt)
        }
        AppCommand::MintDai { amount, to } => {
            info!("Handling app mint-dai command");
            let amount = parse_amount(&amount)?;
            let (provider, account) = ctx.signing_provider().await?;
            let client = TokenClient::new(provider, ctx.network.clone(), ctx.confirmations());
            let receipt = client.mint_fake_dai(to.unwrap_or(account), amount).await?;
            emit_receipt(ctx, "minted DAI", &receipt)
        }
        AppCommand::Deposits { app, enabled } => {
            info!("Handling app deposits command for {}", app);
            let (provider, _) = ctx.signing_provider().await?;
            let client = SuperAppClient::new(provider, ctx.network.clone(), app, ctx.confirmations());
            let now = client.set_deposits_enabled(enabled).await?;
            ctx.emit(
                &json!({ "deposits_enabled": now }),
                &format!("depositsEnabled = {}", now),
            )
        }
        AppCommand::Streams { app, enabled } => {
            info!("Handling app streams command for {}", app);
            let (provider, _) = ctx.signing_provider().await?;
            let client = SuperAppClient::new(provider, ctx.network.clone(), app, ctx.confirmations());
            let now = client.set_streams_enabled(enabled).await?;
            ctx.emit(
                &json!({ "streams_enabled": now }),
                &format!("streamsEnabled = {}", now),
            )
        }
    }
}
