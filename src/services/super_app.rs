use alloy::primitives::{Address, B256, U256};
use alloy::providers::DynProvider;
use alloy::rpc::types::TransactionReceipt;
use log::{debug, info};
use serde::Serialize;

use crate::contracts::{IDAOSuperApp, IERC20, IFakeDAI, ISuperToken};
use crate::errors::{DaoError, Result};
use crate::models::network::Network;
use crate::models::salt::role_hash;
use crate::providers::{send_and_confirm, with_gas_price};

pub const MANAGER_ROLE: &str = "MANAGER_ROLE";

/// Parse a base-10 amount of wei.
pub fn parse_amount(raw: &str) -> Result<U256> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DaoError::InvalidInput("Amount must not be empty".to_string()));
    }
    U256::from_str_radix(raw, 10)
        .map_err(|e| DaoError::InvalidInput(format!("Invalid amount '{}': {}", raw, e)))
}

#[derive(Debug, Clone, Serialize)]
pub struct SuperAppInfo {
    pub address: Address,
    /// Super token accepted for incoming streams.
    pub accepted_token: Address,
    /// Token the treasury accumulates.
    pub want: Address,
    /// The DAO's ERC20 governance token.
    pub underlying: Address,
    /// Super token wrapper streamed back to contributors.
    pub dao_token: Address,
    pub treasury: Address,
    pub share_price: U256,
    pub deposits_enabled: bool,
    pub streams_enabled: bool,
}

/// Admin operations on a deployed DAO super app.
pub struct SuperAppClient {
    provider: DynProvider,
    network: Network,
    app: Address,
    confirmations: u64,
}

impl SuperAppClient {
    pub fn new(provider: DynProvider, network: Network, app: Address, confirmations: u64) -> Self {
        Self {
            provider,
            network,
            app,
            confirmations,
        }
    }

    pub fn address(&self) -> Address {
        self.app
    }

    pub async fn info(&self) -> Result<SuperAppInfo> {
        let app = IDAOSuperApp::new(self.app, &self.provider);
        let info = SuperAppInfo {
            address: self.app,
            accepted_token: app.acceptedToken().call().await?,
            want: app.want().call().await?,
            underlying: app.underlying().call().await?,
            dao_token: app.daoToken().call().await?,
            treasury: app.treasury().call().await?,
            share_price: app.sharePrice().call().await?,
            deposits_enabled: app.depositsEnabled().call().await?,
            streams_enabled: app.streamsEnabled().call().await?,
        };
        debug!("{:?}", info);
        Ok(info)
    }

    /// Deposit `amount` of `token` into the treasury, minting DAO tokens to
    /// `beneficiary`. The token must be approved for the app first.
    pub async fn deposit(
        &self,
        token: Address,
        amount: U256,
        beneficiary: Address,
    ) -> Result<TransactionReceipt> {
        info!("Depositing {} of {} for {}", amount, token, beneficiary);
        let app = IDAOSuperApp::new(self.app, &self.provider);
        let call = app.deposit(token, amount, beneficiary);
        send_and_confirm(
            with_gas_price(call, self.network.gas_price_wei()),
            self.confirmations,
            "deposit",
        )
        .await
    }

    pub async fn grant(&self, beneficiary: Address, amount: U256) -> Result<TransactionReceipt> {
        info!("Granting {} DAO tokens to {}", amount, beneficiary);
        let app = IDAOSuperApp::new(self.app, &self.provider);
        let call = app.grant(beneficiary, amount);
        send_and_confirm(
            with_gas_price(call, self.network.gas_price_wei()),
            self.confirmations,
            "grant",
        )
        .await
    }

    pub async fn set_deposits_enabled(&self, enabled: bool) -> Result<bool> {
        info!("Setting deposits enabled = {}", enabled);
        let app = IDAOSuperApp::new(self.app, &self.provider);
        let call = app.setDepositsEnabled(enabled);
        send_and_confirm(
            with_gas_price(call, self.network.gas_price_wei()),
            self.confirmations,
            "setDepositsEnabled",
        )
        .await?;
        Ok(app.depositsEnabled().call().await?)
    }

    pub async fn set_streams_enabled(&self, enabled: bool) -> Result<bool> {
        info!("Setting streams enabled = {}", enabled);
        let app = IDAOSuperApp::new(self.app, &self.provider);
        let call = app.setStreamsEnabled(enabled);
        send_and_confirm(
            with_gas_price(call, self.network.gas_price_wei()),
            self.confirmations,
            "setStreamsEnabled",
        )
        .await?;
        Ok(app.streamsEnabled().call().await?)
    }

    pub async fn has_role(&self, role: B256, account: Address) -> Result<bool> {
        let app = IDAOSuperApp::new(self.app, &self.provider);
        Ok(app.hasRole(role, account).call().await?)
    }

    pub async fn is_manager(&self, account: Address) -> Result<bool> {
        self.has_role(role_hash(MANAGER_ROLE), account).await
    }
}

/// ERC20 and super token helpers used around the app.
pub struct TokenClient {
    provider: DynProvider,
    network: Network,
    confirmations: u64,
}

impl TokenClient {
    pub fn new(provider: DynProvider, network: Network, confirmations: u64) -> Self {
        Self {
            provider,
            network,
            confirmations,
        }
    }

    pub async fn balance_of(&self, token: Address, account: Address) -> Result<U256> {
        let erc20 = IERC20::new(token, &self.provider);
        Ok(erc20.balanceOf(account).call().await?)
    }

    pub async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TransactionReceipt> {
        info!("Approving {} to spend {} of {}", spender, amount, token);
        let erc20 = IERC20::new(token, &self.provider);
        let call = erc20.approve(spender, amount);
        send_and_confirm(
            with_gas_price(call, self.network.gas_price_wei()),
            self.confirmations,
            "approve",
        )
        .await
    }

    /// Wrap `amount` of the underlying ERC20 into `super_token`.
    pub async fn upgrade(&self, super_token: Address, amount: U256) -> Result<TransactionReceipt> {
        let wrapper = ISuperToken::new(super_token, &self.provider);
        let underlying = wrapper.getUnderlyingToken().call().await?;
        if underlying == Address::ZERO {
            return Err(DaoError::InvalidInput(format!(
                "{} is a native super token and cannot be upgraded",
                super_token
            )));
        }
        self.approve(underlying, super_token, amount).await?;

        info!("Upgrading {} of {} into {}", amount, underlying, super_token);
        let call = wrapper.upgrade(amount);
        send_and_confirm(
            with_gas_price(call, self.network.gas_price_wei()),
            self.confirmations,
            "upgrade",
        )
        .await
    }

    /// Mint test DAI from the faucet token of the active network.
    pub async fn mint_fake_dai(&self, recipient: Address, amount: U256) -> Result<TransactionReceipt> {
        let dai = self.network.require("dai", self.network.dai)?;
        info!("Minting {} DAI to {}", amount, recipient);
        let faucet = IFakeDAI::new(dai, &self.provider);
        let call = faucet.allocateTo(recipient, amount);
        send_and_confirm(
            with_gas_price(call, self.network.gas_price_wei()),
            self.confirmations,
            "allocateTo",
        )
        .await
    }
}
