use alloy::primitives::Address;
use alloy::providers::DynProvider;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use url::Url;

use crate::config::Config;
use crate::errors::{DaoError, Result};
use crate::models::network::{Network, NetworkKind};
use crate::providers::{
    create_provider, create_read_provider, ensure_chain, ProviderSender, TxSender,
};
use crate::services::listeners::{Correlations, CreationListener, EventListener};

/// Everything a command needs: configuration, the selected address table
/// and the output mode.
pub struct Context {
    pub config: Config,
    pub network: Network,
    pub json: bool,
}

impl Context {
    pub fn new(mut config: Config, network: Option<&str>, json: bool) -> Result<Self> {
        if let Some(network) = network {
            config.network.active = network.to_string();
        }
        let network = config.network.resolve()?;
        info!("Using network {} (chain {})", network.name(), network.chain_id);
        Ok(Self {
            config,
            network,
            json,
        })
    }

    pub fn kind(&self) -> NetworkKind {
        self.network.kind
    }

    pub fn rpc_urls(&self) -> Result<Vec<Url>> {
        self.config.rpc.urls_for(self.network.kind)
    }

    pub fn confirmations(&self) -> u64 {
        self.config.deploy.confirmations
    }

    /// Provider signing with the configured key, checked against the chain id.
    pub async fn signing_provider(&self) -> Result<(DynProvider, Address)> {
        let signer = self.config.wallet.signer()?;
        let account = signer.address();
        let provider = create_provider(self.rpc_urls()?, Some(signer))?;
        ensure_chain(&provider, &self.network).await?;
        Ok((provider, account))
    }

    pub async fn read_provider(&self) -> Result<DynProvider> {
        let provider = create_read_provider(self.rpc_urls()?)?;
        ensure_chain(&provider, &self.network).await?;
        Ok(provider)
    }

    /// The configured account, without building a signer when only the
    /// address is needed.
    pub fn account(&self) -> Result<Address> {
        match self.config.wallet.public_address()? {
            Some(address) => Ok(address),
            None => Ok(self.config.wallet.signer()?.address()),
        }
    }

    /// Transaction sender for `account` with the network's gas price and
    /// the configured confirmation depth.
    pub fn sender(&self, provider: DynProvider, account: Address) -> Arc<dyn TxSender> {
        Arc::new(ProviderSender::new(
            provider,
            account,
            self.network.gas_price_wei(),
            self.confirmations(),
        ))
    }

    /// Start polling the factories of the active network for creation events.
    ///
    /// Receipt logs still resolve every request, so an endpoint that refuses
    /// log filters only costs the early notification: the command goes on
    /// without a listener.
    pub async fn start_listener(
        &self,
        provider: DynProvider,
        correlations: Arc<Correlations>,
    ) -> Option<CreationListener> {
        let addresses: Vec<Address> = [self.network.create2_factory, self.network.dao_factory]
            .into_iter()
            .flatten()
            .collect();
        let mut listener = CreationListener::new(
            provider,
            addresses,
            self.config.deploy.poll_interval(),
            correlations,
        );
        match listener.start().await {
            Ok(()) => {
                debug!("Creation listener running: {}", listener.is_running().await);
                Some(listener)
            }
            Err(e) => {
                warn!("Creation listener unavailable, relying on receipts: {}", e);
                None
            }
        }
    }

    /// Print `value` as JSON in `--json` mode, `text` otherwise.
    pub fn emit<T: Serialize>(&self, value: &T, text: &str) -> Result<()> {
        if self.json {
            let rendered = serde_json::to_string_pretty(value)
                .map_err(|e| DaoError::Internal(format!("Failed to render JSON: {}", e)))?;
            println!("{}", rendered);
        } else {
            println!("{}", text.trim_end());
        }
        Ok(())
    }
}

pub async fn stop_listener(listener: Option<CreationListener>) {
    if let Some(mut listener) = listener {
        listener.stop().await;
    }
}
