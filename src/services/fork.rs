//! Helpers for a local Hardhat/Anvil fork of Polygon.
//!
//! Transactions here are sent from impersonated accounts, so the provider
//! must not carry a wallet: the node signs on their behalf.

use alloy::primitives::{address, Address, U256};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionReceipt;
use log::{debug, info};
use serde_json::Value;

use crate::contracts::{IERC20, ISuperfluidGovernance};
use crate::errors::{DaoError, Result};
use crate::models::network::{Network, NetworkKind};
use crate::providers::send_and_confirm;

/// Owner of the Superfluid governance contract on Polygon.
pub const SF_GOVERNANCE_OWNER: Address = address!("0x1EB3FAA360bF1f093F5A18d21f21f13D769d044A");

pub fn ensure_fork(network: &Network) -> Result<()> {
    if network.kind != NetworkKind::Localhost {
        return Err(DaoError::InvalidInput(format!(
            "Fork helpers only run against localhost, not {}",
            network.name()
        )));
    }
    Ok(())
}

pub struct ForkHelper {
    provider: DynProvider,
    network: Network,
    confirmations: u64,
}

impl ForkHelper {
    pub fn new(provider: DynProvider, network: Network, confirmations: u64) -> Result<Self> {
        ensure_fork(&network)?;
        Ok(Self {
            provider,
            network,
            confirmations,
        })
    }

    pub async fn impersonate(&self, account: Address) -> Result<()> {
        debug!("Impersonating {}", account);
        let _: Value = self
            .provider
            .raw_request("hardhat_impersonateAccount".into(), [account])
            .await?;
        Ok(())
    }

    pub async fn stop_impersonating(&self, account: Address) -> Result<()> {
        debug!("Stop impersonating {}", account);
        let _: Value = self
            .provider
            .raw_request("hardhat_stopImpersonatingAccount".into(), [account])
            .await?;
        Ok(())
    }

    /// Move the holder's whole `token` balance to `recipient`.
    pub async fn fund_from(
        &self,
        token: Address,
        holder: Address,
        recipient: Address,
    ) -> Result<U256> {
        self.impersonate(holder).await?;
        let result = self.transfer_all(token, holder, recipient).await;
        self.stop_impersonating(holder).await?;
        result
    }

    async fn transfer_all(&self, token: Address, holder: Address, recipient: Address) -> Result<U256> {
        let erc20 = IERC20::new(token, &self.provider);
        let balance = erc20.balanceOf(holder).call().await?;
        info!("Moving {} of {} from {} to {}", balance, token, holder, recipient);
        send_and_confirm(
            erc20.transfer(recipient, balance).from(holder),
            self.confirmations,
            "transfer",
        )
        .await?;
        Ok(balance)
    }

    /// Authorize `factory` to register super apps with `host`, acting as the
    /// Superfluid governance owner. Returns the authorization read back.
    pub async fn authorize_app_factory(
        &self,
        owner: Address,
        host: Address,
        factory: Address,
    ) -> Result<bool> {
        let governance = self
            .network
            .require("sf_governance", self.network.sf_governance)?;

        self.impersonate(owner).await?;
        let contract = ISuperfluidGovernance::new(governance, &self.provider);
        info!("Authorizing app factory {} on host {}", factory, host);
        let result: Result<TransactionReceipt> = send_and_confirm(
            contract.authorizeAppFactory(host, factory).from(owner),
            self.confirmations,
            "authorizeAppFactory",
        )
        .await;
        self.stop_impersonating(owner).await?;
        result?;

        let authorized = contract.isAuthorizedAppFactory(host, factory).call().await?;
        info!("Factory authorized: {}", authorized);
        Ok(authorized)
    }

    pub async fn set_nonce(&self, account: Address, nonce: u64) -> Result<()> {
        info!("Setting nonce of {} to {}", account, nonce);
        let _: Value = self
            .provider
            .raw_request(
                "hardhat_setNonce".into(),
                (account, format!("{:#x}", nonce)),
            )
            .await?;
        let current = self.provider.get_transaction_count(account).await?;
        if current != nonce {
            return Err(DaoError::Rpc(format!(
                "Nonce of {} is {} after setting {}",
                account, current, nonce
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_localhost() {
        assert!(ensure_fork(&Network::for_kind(NetworkKind::Localhost)).is_ok());
        for kind in [NetworkKind::Polygon, NetworkKind::Mumbai, NetworkKind::Rinkeby] {
            assert!(matches!(
                ensure_fork(&Network::for_kind(kind)),
                Err(DaoError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_nonce_hex_param() {
        // the fork scripts reset the nonce to 0x3C
        assert_eq!(format!("{:#x}", 60u64), "0x3c");
    }
}
