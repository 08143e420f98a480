use alloy::primitives::Address;
use log::{error, info};
use std::sync::Arc;

use crate::cli::{GovernanceArgs, TokenArgs};
use crate::errors::Result;
use crate::handlers::{stop_listener, Context};
use crate::services::dao_factory::DaoFactoryClient;
use crate::services::listeners::{Correlations, CreationListener};

async fn connect(ctx: &Context) -> Result<(DaoFactoryClient, Option<CreationListener>)> {
    let (provider, account) = ctx.signing_provider().await?;
    info!("Creating from {}", account);
    let correlations = Arc::new(Correlations::new());
    let client = DaoFactoryClient::new(
        ctx.sender(provider.clone(), account),
        ctx.network.clone(),
        ctx.config.deploy.clone(),
        correlations.clone(),
    );
    let listener = ctx.start_listener(provider, correlations).await;
    Ok((client, listener))
}

/// `create-app` - DAO token, super token and manager app
pub async fn create_app_handler(ctx: &Context, args: &TokenArgs) -> Result<()> {
    info!("Handling create-app command for {} ({})", args.name, args.symbol);

    let (client, listener) = connect(ctx).await?;
    let result = client
        .create_super_app(&args.name, &args.symbol, &args.accepted)
        .await;
    stop_listener(listener).await;

    let created = result.map_err(|e| {
        error!("Failed to create token + manager: {}", e);
        e
    })?;
    let text = format!(
        "superApp created at {}\ntoken created at {}\nsToken created at {}\nblock {}",
        created.super_app,
        created.underlying,
        created.super_token,
        created
            .block
            .map(|b| b.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    ctx.emit(&created, &text)
}

/// `create-gov` - governor and timelock for an existing token
pub async fn create_gov_handler(
    ctx: &Context,
    token: Address,
    args: &GovernanceArgs,
) -> Result<()> {
    info!("Handling create-gov command for token {}", token);

    let (client, listener) = connect(ctx).await?;
    let result = client
        .create_governance(token, args.vetoable, args.voting_period)
        .await;
    stop_listener(listener).await;

    let created = result.map_err(|e| {
        error!("Failed to create governor + timelock: {}", e);
        e
    })?;
    let text = format!(
        "governor created at {}\ntimelock created at {}",
        created.governor, created.timelock
    );
    ctx.emit(&created, &text)
}

/// `create-dao` - both steps, then the summary with Tally details
pub async fn create_dao_handler(
    ctx: &Context,
    token: &TokenArgs,
    governance: &GovernanceArgs,
) -> Result<()> {
    info!("Handling create-dao command for {} ({})", token.name, token.symbol);

    let (client, listener) = connect(ctx).await?;
    let result = client
        .create_dao(
            &token.name,
            &token.symbol,
            &token.accepted,
            governance.vetoable,
            governance.voting_period,
        )
        .await;
    stop_listener(listener).await;

    let dao = result.map_err(|e| {
        error!("Failed to create DAO {}: {}", token.name, e);
        e
    })?;
    info!("Successfully created DAO {}", dao.name);
    ctx.emit(&dao, &dao.summary(&ctx.network))
}
