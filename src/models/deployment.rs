use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;

use crate::errors::{DaoError, Result};
use crate::models::artifact::ArtifactKind;
use crate::models::network::Network;

/// Addresses learned while a deterministic deployment run progresses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImplementationSet {
    pub token: Option<Address>,
    pub app: Option<Address>,
    pub governor: Option<Address>,
    pub executor: Option<Address>,
    pub factory: Option<Address>,
}

/// A finished run: all five addresses known and distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteImplementations {
    pub token: Address,
    pub app: Address,
    pub governor: Address,
    pub executor: Address,
    pub factory: Address,
}

impl ImplementationSet {
    pub fn record(&mut self, kind: ArtifactKind, address: Address) {
        let slot = match kind {
            ArtifactKind::Token => &mut self.token,
            ArtifactKind::App => &mut self.app,
            ArtifactKind::Governor => &mut self.governor,
            ArtifactKind::Executor => &mut self.executor,
            ArtifactKind::Factory => &mut self.factory,
        };
        *slot = Some(address);
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<Address> {
        match kind {
            ArtifactKind::Token => self.token,
            ArtifactKind::App => self.app,
            ArtifactKind::Governor => self.governor,
            ArtifactKind::Executor => self.executor,
            ArtifactKind::Factory => self.factory,
        }
    }

    pub fn implementations_ready(&self) -> bool {
        ArtifactKind::implementations()
            .iter()
            .all(|k| self.get(*k).is_some())
    }

    pub fn is_complete(&self) -> bool {
        ArtifactKind::all().iter().all(|k| self.get(*k).is_some())
    }

    pub fn missing(&self) -> Vec<ArtifactKind> {
        ArtifactKind::all()
            .into_iter()
            .filter(|k| self.get(*k).is_none())
            .collect()
    }

    pub fn into_complete(self) -> Result<CompleteImplementations> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(DaoError::Internal(format!(
                "Deployment incomplete, missing: {}",
                missing
                    .iter()
                    .map(|k| k.contract_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        let complete = CompleteImplementations {
            token: self.token.unwrap_or_default(),
            app: self.app.unwrap_or_default(),
            governor: self.governor.unwrap_or_default(),
            executor: self.executor.unwrap_or_default(),
            factory: self.factory.unwrap_or_default(),
        };
        complete.validate_distinct()?;
        Ok(complete)
    }
}

impl CompleteImplementations {
    pub fn addresses(&self) -> [(ArtifactKind, Address); 5] {
        [
            (ArtifactKind::Token, self.token),
            (ArtifactKind::App, self.app),
            (ArtifactKind::Governor, self.governor),
            (ArtifactKind::Executor, self.executor),
            (ArtifactKind::Factory, self.factory),
        ]
    }

    /// No zero address, no address shared by two artifacts.
    pub fn validate_distinct(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (kind, address) in self.addresses() {
            if address == Address::ZERO {
                return Err(DaoError::DuplicateAddress(format!(
                    "{} resolved to the zero address",
                    kind
                )));
            }
            if !seen.insert(address) {
                return Err(DaoError::DuplicateAddress(format!(
                    "{} reuses {}",
                    kind, address
                )));
            }
        }
        Ok(())
    }
}

/// Result of the two-step DAO wizard: token + manager, then governor + timelock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaoDeployment {
    pub name: String,
    pub symbol: String,
    pub network: String,
    pub super_app: Option<Address>,
    pub dao_token: Option<Address>,
    pub super_token: Option<Address>,
    pub token_block: Option<u64>,
    pub governor: Option<Address>,
    pub timelock: Option<Address>,
    pub gov_block: Option<u64>,
    pub created_at: i64,
}

/// Addresses announced by `DAOSuperAppCreated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperAppCreated {
    pub owner: Address,
    pub super_app: Address,
    pub underlying: Address,
    pub super_token: Address,
    pub block: Option<u64>,
}

/// Addresses announced by `DAOGovernorCreated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorCreated {
    pub owner: Address,
    pub governor: Address,
    pub timelock: Address,
    pub block: Option<u64>,
}

impl DaoDeployment {
    pub fn new(name: &str, symbol: &str, network: &Network) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            network: network.name().to_string(),
            created_at: chrono::Utc::now().timestamp(),
            ..Default::default()
        }
    }

    pub fn record_super_app(&mut self, created: &SuperAppCreated) {
        self.super_app = Some(created.super_app);
        self.dao_token = Some(created.underlying);
        self.super_token = Some(created.super_token);
        self.token_block = created.block;
    }

    pub fn record_governor(&mut self, created: &GovernorCreated) {
        self.governor = Some(created.governor);
        self.timelock = Some(created.timelock);
        self.gov_block = created.block;
    }

    pub fn is_complete(&self) -> bool {
        self.super_app.is_some()
            && self.dao_token.is_some()
            && self.super_token.is_some()
            && self.governor.is_some()
            && self.timelock.is_some()
    }

    /// Human-readable report with explorer links and Tally registration fields.
    pub fn summary(&self, network: &Network) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "DAO created on {}", network.name());
        let rows = [
            ("DAO Token", self.dao_token, "ERC20 governance token"),
            ("Super Token", self.super_token, "streamable wrapper of the DAO token"),
            ("DAO Manager", self.super_app, "super app managing deposits and streams"),
            ("Governor", self.governor, "OpenZeppelin Governor"),
            ("Timelock", self.timelock, "OpenZeppelin TimelockController"),
        ];
        for (label, address, about) in rows {
            let Some(address) = address else {
                let _ = writeln!(out, "  {:<12} (not deployed)", label);
                continue;
            };
            let _ = write!(out, "  {:<12} {} - {}", label, address, about);
            if let Some(link) = network.explorer_link(address) {
                let _ = write!(out, " [{}]", link);
            }
            out.push('\n');
        }

        let chain = network.kind.display_name();
        let _ = writeln!(out, "\nAdd the DAO to Tally:");
        let _ = writeln!(out, "  Token");
        let _ = writeln!(out, "    Type:          ERC20");
        if let Some(token) = self.dao_token {
            let _ = writeln!(out, "    Token address: {}", token);
        }
        let _ = writeln!(out, "    Chain:         {}", chain);
        let _ = writeln!(out, "    Start block:   {}", display_block(self.token_block));
        let _ = writeln!(out, "  Governance");
        let _ = writeln!(out, "    Type:          OPENZEPPELINGOVERNOR");
        let _ = writeln!(out, "    Chain:         {}", chain);
        if let Some(governor) = self.governor {
            let _ = writeln!(out, "    Governor:      {}", governor);
        }
        let _ = writeln!(out, "    Start block:   {}", display_block(self.gov_block));
        out
    }
}

fn display_block(block: Option<u64>) -> String {
    block.map(|b| b.to_string()).unwrap_or_else(|| "unknown".to_string())
}
