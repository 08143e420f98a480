use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::DynProvider;
use alloy::rpc::types::TransactionReceipt;
use alloy::sol_types::SolCall;
use log::info;
use serde::Serialize;
use std::fmt;

use crate::contracts::{IDAOGovernor, IDAOSuperApp};
use crate::errors::{DaoError, Result};
use crate::models::network::Network;
use crate::models::salt::description_hash;
use crate::providers::{send_and_confirm, with_gas_price};

/// Governor proposal lifecycle, in the order the contract numbers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProposalState {
    Pending,
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Expired,
    Executed,
}

impl TryFrom<u8> for ProposalState {
    type Error = DaoError;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => ProposalState::Pending,
            1 => ProposalState::Active,
            2 => ProposalState::Canceled,
            3 => ProposalState::Defeated,
            4 => ProposalState::Succeeded,
            5 => ProposalState::Queued,
            6 => ProposalState::Expired,
            7 => ProposalState::Executed,
            other => {
                return Err(DaoError::Rpc(format!(
                    "Governor returned unknown proposal state {}",
                    other
                )))
            }
        })
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The four arrays a Governor identifies a proposal by.
#[derive(Debug, Clone, Serialize)]
pub struct Proposal {
    pub targets: Vec<Address>,
    pub values: Vec<U256>,
    pub calldatas: Vec<Bytes>,
    pub description: String,
}

impl Proposal {
    pub fn new(description: &str) -> Self {
        Self {
            targets: Vec::new(),
            values: Vec::new(),
            calldatas: Vec::new(),
            description: description.to_string(),
        }
    }

    pub fn with_action(mut self, target: Address, value: U256, calldata: Bytes) -> Self {
        self.targets.push(target);
        self.values.push(value);
        self.calldatas.push(calldata);
        self
    }

    /// Queue and execute identify the proposal by this hash, not the text.
    pub fn description_hash(&self) -> B256 {
        description_hash(&self.description)
    }

    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(DaoError::InvalidInput(
                "Proposal needs at least one action".to_string(),
            ));
        }
        if self.targets.len() != self.values.len() || self.targets.len() != self.calldatas.len() {
            return Err(DaoError::InvalidInput(
                "Proposal targets, values and calldatas differ in length".to_string(),
            ));
        }
        if self.description.trim().is_empty() {
            return Err(DaoError::InvalidInput(
                "Proposal description must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A proposal asking the DAO's super app to mint `amount` DAO tokens to `beneficiary`.
pub fn grant_proposal(app: Address, beneficiary: Address, amount: U256, description: &str) -> Proposal {
    let calldata = IDAOSuperApp::grantCall {
        to: beneficiary,
        amount,
    }
    .abi_encode();
    Proposal::new(description).with_action(app, U256::ZERO, calldata.into())
}

pub struct GovernorClient {
    provider: DynProvider,
    network: Network,
    governor: Address,
    confirmations: u64,
}

impl GovernorClient {
    pub fn new(provider: DynProvider, network: Network, governor: Address, confirmations: u64) -> Self {
        Self {
            provider,
            network,
            governor,
            confirmations,
        }
    }

    /// Submit a proposal and return its id.
    pub async fn propose(&self, proposal: &Proposal) -> Result<U256> {
        proposal.validate()?;
        info!("Proposing '{}' to {}", proposal.description, self.governor);
        let governor = IDAOGovernor::new(self.governor, &self.provider);
        let call = governor.propose(
            proposal.targets.clone(),
            proposal.values.clone(),
            proposal.calldatas.clone(),
            proposal.description.clone(),
        );
        send_and_confirm(
            with_gas_price(call, self.network.gas_price_wei()),
            self.confirmations,
            "propose",
        )
        .await?;
        self.proposal_id(proposal).await
    }

    pub async fn proposal_id(&self, proposal: &Proposal) -> Result<U256> {
        let governor = IDAOGovernor::new(self.governor, &self.provider);
        let id = governor
            .hashProposal(
                proposal.targets.clone(),
                proposal.values.clone(),
                proposal.calldatas.clone(),
                proposal.description_hash(),
            )
            .call()
            .await?;
        Ok(id)
    }

    pub async fn state(&self, proposal_id: U256) -> Result<ProposalState> {
        let governor = IDAOGovernor::new(self.governor, &self.provider);
        let raw = governor.state(proposal_id).call().await?;
        ProposalState::try_from(raw)
    }

    pub async fn queue(&self, proposal: &Proposal) -> Result<TransactionReceipt> {
        proposal.validate()?;
        info!("Queueing '{}'", proposal.description);
        let governor = IDAOGovernor::new(self.governor, &self.provider);
        let call = governor.queue(
            proposal.targets.clone(),
            proposal.values.clone(),
            proposal.calldatas.clone(),
            proposal.description_hash(),
        );
        send_and_confirm(
            with_gas_price(call, self.network.gas_price_wei()),
            self.confirmations,
            "queue",
        )
        .await
    }

    pub async fn execute(&self, proposal: &Proposal) -> Result<TransactionReceipt> {
        proposal.validate()?;
        info!("Executing '{}'", proposal.description);
        let governor = IDAOGovernor::new(self.governor, &self.provider);
        let total_value = proposal.values.iter().fold(U256::ZERO, |acc, v| acc + *v);
        let call = governor
            .execute(
                proposal.targets.clone(),
                proposal.values.clone(),
                proposal.calldatas.clone(),
                proposal.description_hash(),
            )
            .value(total_value);
        send_and_confirm(
            with_gas_price(call, self.network.gas_price_wei()),
            self.confirmations,
            "execute",
        )
        .await
    }
}
