use log::{error, info};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::errors::Result;
use crate::handlers::{stop_listener, Context};
use crate::models::artifact::{ArtifactKind, ArtifactStore};
use crate::models::deployment::CompleteImplementations;
use crate::services::deployer::{self, Deployer, PlannedDeployment};
use crate::providers::TxSender;
use crate::services::listeners::Correlations;

#[derive(Debug, Serialize)]
pub struct DeployResponse {
    pub network: String,
    pub seed: String,
    pub implementations: CompleteImplementations,
}

fn render_plan(plan: &[PlannedDeployment]) -> String {
    let mut out = String::new();
    for entry in plan {
        let _ = writeln!(
            out,
            "{:<22} salt {} -> {}",
            entry.contract_name, entry.salt, entry.predicted
        );
    }
    out
}

/// `plan` - salts and predicted addresses, no transactions
pub fn plan_handler(ctx: &Context, seed: &str) -> Result<()> {
    info!("Handling plan command for seed '{}'", seed);
    let artifacts = ArtifactStore::load(&ctx.config.deploy.artifacts_dir)?;
    let plan = deployer::plan(&ctx.network, &artifacts, seed)?;
    ctx.emit(&plan, &render_plan(&plan))
}

fn build_deployer(
    ctx: &Context,
    sender: Arc<dyn TxSender>,
    correlations: Arc<Correlations>,
    pipelined: bool,
) -> Result<Deployer> {
    let artifacts = ArtifactStore::load(&ctx.config.deploy.artifacts_dir)?;
    let mut config = ctx.config.deploy.clone();
    config.pipelined = config.pipelined || pipelined;
    Ok(Deployer::new(
        sender,
        ctx.network.clone(),
        artifacts,
        config,
        correlations,
    ))
}

/// `deploy` - the full deterministic sequence
pub async fn deploy_handler(ctx: &Context, seed: &str, pipelined: bool) -> Result<()> {
    info!("Handling deploy command for seed '{}'", seed);

    let (provider, account) = ctx.signing_provider().await?;
    info!("Deploying from {}", account);
    let correlations = Arc::new(Correlations::new());
    let sender = ctx.sender(provider.clone(), account);
    let deployer = build_deployer(ctx, sender, correlations.clone(), pipelined)?;
    let listener = ctx.start_listener(provider, correlations).await;

    let result = deployer.run(seed).await;
    stop_listener(listener).await;

    match result {
        Ok(implementations) => {
            info!("Successfully deployed with seed '{}'", seed);
            let mut text = String::new();
            for (kind, address) in implementations.addresses() {
                let _ = write!(text, "{:<22} {}", kind.contract_name(), address);
                if let Some(link) = ctx.network.explorer_link(address) {
                    let _ = write!(text, "  {}", link);
                }
                text.push('\n');
            }
            let response = DeployResponse {
                network: ctx.network.name().to_string(),
                seed: seed.to_string(),
                implementations,
            };
            ctx.emit(&response, &text)
        }
        Err(e) => {
            error!("Deployment with seed '{}' failed: {}", seed, e);
            Err(e)
        }
    }
}

/// `deploy-factory` - only the DAO factory
pub async fn deploy_factory_handler(ctx: &Context, seed: &str) -> Result<()> {
    info!("Handling deploy-factory command for seed '{}'", seed);

    let (provider, account) = ctx.signing_provider().await?;
    let correlations = Arc::new(Correlations::new());
    let sender = ctx.sender(provider.clone(), account);
    let deployer = build_deployer(ctx, sender, correlations.clone(), false)?;
    let listener = ctx.start_listener(provider, correlations).await;

    let result = deployer.deploy_factory_only(seed).await;
    stop_listener(listener).await;

    let address = result?;
    let response = serde_json::json!({
        "contract": ArtifactKind::Factory.contract_name(),
        "address": address,
    });
    ctx.emit(
        &response,
        &format!("{} created at {}", ArtifactKind::Factory, address),
    )
}
