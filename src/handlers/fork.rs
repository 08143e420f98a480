use log::info;
use serde_json::json;

use crate::cli::ForkCommand;
use crate::errors::Result;
use crate::handlers::Context;
use crate::services::fork::{ensure_fork, ForkHelper, SF_GOVERNANCE_OWNER};

/// `fork ...` - local fork setup; refuses any network but localhost
pub async fn fork_handler(ctx: &Context, command: ForkCommand) -> Result<()> {
    ensure_fork(&ctx.network)?;
    let provider = ctx.read_provider().await?;
    let helper = ForkHelper::new(provider, ctx.network.clone(), ctx.confirmations())?;

    match command {
        ForkCommand::Fund { token, holder, to } => {
            info!("Handling fork fund command");
            let token = ctx.network.resolve_token(&token)?;
            let recipient = match to {
                Some(to) => to,
                None => ctx.account()?,
            };
            let moved = helper.fund_from(token, holder, recipient).await?;
            ctx.emit(
                &json!({ "token": token, "recipient": recipient, "amount": moved.to_string() }),
                &format!("moved {} of {} to {}", moved, token, recipient),
            )
        }
        ForkCommand::AuthorizeFactory {
            owner,
            host,
            factory,
        } => {
            info!("Handling fork authorize-factory command");
            let host = match host {
                Some(host) => host,
                None => ctx.network.host()?,
            };
            let factory = match factory {
                Some(factory) => factory,
                None => ctx.network.dao_factory()?,
            };
            let authorized = helper
                .authorize_app_factory(owner.unwrap_or(SF_GOVERNANCE_OWNER), host, factory)
                .await?;
            ctx.emit(
                &json!({ "host": host, "factory": factory, "authorized": authorized }),
                &format!("Factory authorized: {}", authorized),
            )
        }
        ForkCommand::SetNonce { account, nonce } => {
            info!("Handling fork set-nonce command");
            let account = match account {
                Some(account) => account,
                None => ctx.account()?,
            };
            helper.set_nonce(account, nonce).await?;
            ctx.emit(
                &json!({ "account": account, "nonce": nonce }),
                &format!("nonce of {} set to {}", account, nonce),
            )
        }
    }
}
