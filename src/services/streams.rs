use alloy::primitives::aliases::I96;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::DynProvider;
use alloy::rpc::types::TransactionReceipt;
use alloy::sol_types::SolCall;
use log::{debug, info};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::contracts::{ICFAv1, ISuperfluidHost};
use crate::errors::{DaoError, Result};
use crate::models::network::Network;
use crate::providers::{send_and_confirm, with_gas_price};

pub const SECONDS_PER_MONTH: i128 = 30 * 24 * 60 * 60;

/// Streamed amount per second, in wei of the super token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowRate(I96);

impl FlowRate {
    pub const ZERO: FlowRate = FlowRate(I96::ZERO);

    pub fn from_i96(rate: I96) -> Self {
        Self(rate)
    }

    pub fn as_i96(&self) -> I96 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Amount streamed over a 30 day month, if it fits in an i128.
    pub fn per_month(&self) -> Option<i128> {
        i128::try_from(self.0)
            .ok()
            .and_then(|rate| rate.checked_mul(SECONDS_PER_MONTH))
    }
}

impl FromStr for FlowRate {
    type Err = DaoError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        let value: i128 = raw
            .parse()
            .map_err(|e| DaoError::InvalidInput(format!("Invalid flow rate '{}': {}", raw, e)))?;
        if value < 0 {
            return Err(DaoError::InvalidInput(format!(
                "Flow rate must not be negative, got {}",
                raw
            )));
        }
        let rate = I96::try_from(value).map_err(|_| {
            DaoError::InvalidInput(format!("Flow rate {} does not fit in int96", raw))
        })?;
        Ok(Self(rate))
    }
}

impl fmt::Display for FlowRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for FlowRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

/// One sender to receiver flow as reported by the constant flow agreement.
#[derive(Debug, Clone, Serialize)]
pub struct FlowInfo {
    pub token: Address,
    pub sender: Address,
    pub receiver: Address,
    pub timestamp: U256,
    pub flow_rate: FlowRate,
    pub deposit: U256,
    pub owed_deposit: U256,
}

impl FlowInfo {
    pub fn exists(&self) -> bool {
        !self.flow_rate.is_zero()
    }
}

/// Check a flow read back from chain against the requested rate.
pub fn verify_flow(info: &FlowInfo, expected: FlowRate) -> Result<()> {
    if info.flow_rate != expected {
        return Err(DaoError::FlowMismatch {
            expected: expected.to_string(),
            actual: info.flow_rate.to_string(),
        });
    }
    Ok(())
}

/// Opens, updates and closes streams through the Superfluid host.
pub struct StreamClient {
    provider: DynProvider,
    network: Network,
    confirmations: u64,
}

impl StreamClient {
    pub fn new(provider: DynProvider, network: Network, confirmations: u64) -> Self {
        Self {
            provider,
            network,
            confirmations,
        }
    }

    pub async fn open_stream(
        &self,
        token: Address,
        receiver: Address,
        rate: FlowRate,
    ) -> Result<TransactionReceipt> {
        if rate.is_zero() || rate.is_negative() {
            return Err(DaoError::InvalidInput(
                "A new stream needs a positive flow rate".to_string(),
            ));
        }
        info!("Opening stream of {} wei/s of {} to {}", rate, token, receiver);
        let data = ICFAv1::createFlowCall {
            token,
            receiver,
            flowRate: rate.as_i96(),
            ctx: Bytes::new(),
        }
        .abi_encode();
        self.call_agreement(data.into(), "createFlow").await
    }

    pub async fn update_stream(
        &self,
        token: Address,
        receiver: Address,
        rate: FlowRate,
    ) -> Result<TransactionReceipt> {
        if rate.is_zero() || rate.is_negative() {
            return Err(DaoError::InvalidInput(
                "Use delete to stop a stream".to_string(),
            ));
        }
        info!("Updating stream of {} to {} to {} wei/s", token, receiver, rate);
        let data = ICFAv1::updateFlowCall {
            token,
            receiver,
            flowRate: rate.as_i96(),
            ctx: Bytes::new(),
        }
        .abi_encode();
        self.call_agreement(data.into(), "updateFlow").await
    }

    /// Either party of a flow may close it.
    pub async fn delete_stream(
        &self,
        token: Address,
        sender: Address,
        receiver: Address,
    ) -> Result<TransactionReceipt> {
        info!("Deleting stream of {} from {} to {}", token, sender, receiver);
        let data = ICFAv1::deleteFlowCall {
            token,
            sender,
            receiver,
            ctx: Bytes::new(),
        }
        .abi_encode();
        self.call_agreement(data.into(), "deleteFlow").await
    }

    pub async fn get_flow(
        &self,
        token: Address,
        sender: Address,
        receiver: Address,
    ) -> Result<FlowInfo> {
        let cfa = ICFAv1::new(self.network.cfa()?, &self.provider);
        let flow = cfa.getFlow(token, sender, receiver).call().await?;
        debug!(
            "Flow {} -> {} of {}: {} wei/s",
            sender, receiver, token, flow.flowRate
        );
        Ok(FlowInfo {
            token,
            sender,
            receiver,
            timestamp: flow.timestamp,
            flow_rate: FlowRate::from_i96(flow.flowRate),
            deposit: flow.deposit,
            owed_deposit: flow.owedDeposit,
        })
    }

    /// Incoming minus outgoing rate; negative for net senders.
    pub async fn net_flow(&self, token: Address, account: Address) -> Result<FlowRate> {
        let cfa = ICFAv1::new(self.network.cfa()?, &self.provider);
        let rate = cfa.getNetFlow(token, account).call().await?;
        Ok(FlowRate::from_i96(rate))
    }

    async fn call_agreement(&self, data: Bytes, context: &str) -> Result<TransactionReceipt> {
        let host = ISuperfluidHost::new(self.network.host()?, &self.provider);
        let call = host.callAgreement(self.network.cfa()?, data, Bytes::new());
        send_and_confirm(
            with_gas_price(call, self.network.gas_price_wei()),
            self.confirmations,
            context,
        )
        .await
    }
}
