use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use log::info;
use std::sync::Arc;

use crate::config::DeployConfig;
use crate::contracts::IDAOFactory;
use crate::errors::{DaoError, Result};
use crate::models::deployment::{DaoDeployment, GovernorCreated, SuperAppCreated};
use crate::models::network::Network;
use crate::providers::{check_status, TxSender};
use crate::services::listeners::{dispatch_logs, Correlations, Creation};

/// Two-step DAO creation against a deployed DAOFactory: token + manager
/// app first, then governor + timelock for that token.
pub struct DaoFactoryClient {
    sender: Arc<dyn TxSender>,
    network: Network,
    config: DeployConfig,
    correlations: Arc<Correlations>,
}

/// Name and symbol of the DAO token.
pub fn validate_token_params(name: &str, symbol: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DaoError::InvalidInput("Token name must not be empty".to_string()));
    }
    if symbol.trim().is_empty() {
        return Err(DaoError::InvalidInput("Token symbol must not be empty".to_string()));
    }
    if symbol.chars().any(char::is_whitespace) {
        return Err(DaoError::InvalidInput(format!(
            "Token symbol '{}' must not contain whitespace",
            symbol
        )));
    }
    Ok(())
}

/// Voting period in blocks.
pub fn validate_voting_period(voting_period: u64) -> Result<()> {
    if voting_period == 0 {
        return Err(DaoError::InvalidInput(
            "Voting period must be at least one block".to_string(),
        ));
    }
    Ok(())
}

impl DaoFactoryClient {
    pub fn new(
        sender: Arc<dyn TxSender>,
        network: Network,
        config: DeployConfig,
        correlations: Arc<Correlations>,
    ) -> Self {
        Self {
            sender,
            network,
            config,
            correlations,
        }
    }

    /// Step 1: DAO token, its super token wrapper and the managing super app.
    ///
    /// # Arguments
    /// * `name` - DAO token name
    /// * `symbol` - DAO token symbol
    /// * `accepted` - symbol from the network's token table, or a token address
    ///
    /// # Returns
    /// * `Result<SuperAppCreated>` - addresses announced by the factory
    pub async fn create_super_app(
        &self,
        name: &str,
        symbol: &str,
        accepted: &str,
    ) -> Result<SuperAppCreated> {
        validate_token_params(name, symbol)?;
        let accepted = self.network.resolve_token(accepted)?;

        info!(
            "Deploying token + manager for {} ({}) accepting {}",
            name, symbol, accepted
        );
        let call = IDAOFactory::createDAOSuperAppCall {
            name: name.to_string(),
            symbol: symbol.to_string(),
            accepted,
            weth: self.network.require("weth", self.network.weth)?,
            host: self.network.host()?,
            cfa: self.network.cfa()?,
            router: self.network.require("router", self.network.router)?,
        };

        match self.await_creation(call.abi_encode().into(), "createDAOSuperApp").await? {
            Creation::SuperApp(created) => {
                info!("Token created at {}", created.underlying);
                Ok(created)
            }
            other => Err(unexpected("DAOSuperAppCreated", other)),
        }
    }

    /// Step 2: governor and timelock governing `token`.
    pub async fn create_governance(
        &self,
        token: Address,
        vetoable: bool,
        voting_period: u64,
    ) -> Result<GovernorCreated> {
        validate_voting_period(voting_period)?;

        info!(
            "Deploying governor + timelock for {} (vetoable: {}, voting period: {} blocks)",
            token, vetoable, voting_period
        );
        let call = IDAOFactory::createGoveranceCall {
            token,
            vetoable,
            votingPeriod: U256::from(voting_period),
        };

        match self.await_creation(call.abi_encode().into(), "createGoverance").await? {
            Creation::Governor(created) => {
                info!("Governor created at {}", created.governor);
                info!("Timelock created at {}", created.timelock);
                Ok(created)
            }
            other => Err(unexpected("DAOGovernorCreated", other)),
        }
    }

    /// Both steps, governance bound to the freshly created DAO token.
    pub async fn create_dao(
        &self,
        name: &str,
        symbol: &str,
        accepted: &str,
        vetoable: bool,
        voting_period: u64,
    ) -> Result<DaoDeployment> {
        validate_token_params(name, symbol)?;
        validate_voting_period(voting_period)?;

        let mut dao = DaoDeployment::new(name, symbol, &self.network);
        let app = self.create_super_app(name, symbol, accepted).await?;
        dao.record_super_app(&app);

        let gov = self
            .create_governance(app.underlying, vetoable, voting_period)
            .await?;
        dao.record_governor(&gov);
        Ok(dao)
    }

    /// Send a factory call and wait for the creation event it emits. The
    /// poller may report the event before the receipt arrives; the receipt
    /// logs cover endpoints where it never does.
    async fn await_creation(&self, input: Bytes, context: &str) -> Result<Creation> {
        let tx_hash = self
            .sender
            .send(self.network.dao_factory()?, input, None)
            .await?;
        info!("{}: submitted {}", context, tx_hash);
        let handle = self.correlations.creations.register(tx_hash)?;
        let receipt = check_status(self.sender.receipt(tx_hash).await?, context)?;
        dispatch_logs(&self.correlations, receipt.inner.logs());
        handle.wait(self.config.event_wait()).await
    }
}

fn unexpected(expected: &str, got: Creation) -> DaoError {
    DaoError::Internal(format!("Expected {} but the factory reported {:?}", expected, got))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::network::NetworkKind;
    use crate::providers::sender::tests::{Outcome, ScriptedSender, SentTx};
    use alloy::sol_types::SolEvent;

    const OWNER: Address = Address::repeat_byte(0xee);

    fn polygon() -> Network {
        Network::for_kind(NetworkKind::Polygon)
    }

    fn client(
        sender: Arc<ScriptedSender>,
        correlations: Arc<Correlations>,
        wait: u64,
    ) -> DaoFactoryClient {
        DaoFactoryClient::new(
            sender,
            polygon(),
            DeployConfig {
                event_wait_secs: wait,
                ..Default::default()
            },
            correlations,
        )
    }

    fn super_app_event(call: &IDAOFactory::createDAOSuperAppCall) -> IDAOFactory::DAOSuperAppCreated {
        IDAOFactory::DAOSuperAppCreated {
            _owner: OWNER,
            superApp: Address::repeat_byte(0x5a),
            underlying: Address::repeat_byte(0xd0),
            superToken: call.accepted,
        }
    }

    fn governor_event(call: &IDAOFactory::createGoveranceCall) -> IDAOFactory::DAOGovernorCreated {
        IDAOFactory::DAOGovernorCreated {
            _owner: OWNER,
            _contract: Address::repeat_byte(0x60),
            _timelock: call.token,
        }
    }

    /// A DAO factory that announces every creation in the receipt.
    fn factory_chain(factory: Address) -> impl Fn(&SentTx) -> Outcome + Send + Sync {
        move |tx: &SentTx| {
            let data = if let Ok(call) = IDAOFactory::createDAOSuperAppCall::abi_decode(&tx.input) {
                super_app_event(&call).encode_log_data()
            } else {
                let call = IDAOFactory::createGoveranceCall::abi_decode(&tx.input).unwrap();
                governor_event(&call).encode_log_data()
            };
            Outcome::Mined {
                success: true,
                logs: vec![alloy::primitives::Log {
                    address: factory,
                    data,
                }],
            }
        }
    }

    #[tokio::test]
    async fn test_create_dao_from_receipt_logs() {
        let network = polygon();
        let factory = network.dao_factory().unwrap();
        let sender = Arc::new(ScriptedSender::new(factory_chain(factory)));
        let client = client(sender.clone(), Arc::new(Correlations::new()), 1);

        let dao = client
            .create_dao("The App", "APP", "DAI", true, 45818)
            .await
            .unwrap();
        assert_eq!(dao.super_app, Some(Address::repeat_byte(0x5a)));
        assert_eq!(dao.dao_token, Some(Address::repeat_byte(0xd0)));
        assert_eq!(dao.super_token, network.dai);
        assert_eq!(dao.governor, Some(Address::repeat_byte(0x60)));
        // governance is bound to the token created in step 1
        assert_eq!(dao.timelock, Some(Address::repeat_byte(0xd0)));
        assert_eq!(dao.token_block, Some(100));

        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|tx| tx.to == factory));
        let app = IDAOFactory::createDAOSuperAppCall::abi_decode(&sent[0].input).unwrap();
        assert_eq!(app.name, "The App");
        assert_eq!(app.symbol, "APP");
        assert_eq!(app.accepted, network.dai.unwrap());
        assert_eq!(app.host, network.host().unwrap());
        let gov = IDAOFactory::createGoveranceCall::abi_decode(&sent[1].input).unwrap();
        assert!(gov.vetoable);
        assert_eq!(gov.votingPeriod, U256::from(45818));
    }

    #[tokio::test]
    async fn test_creation_reported_before_receipt() {
        let correlations = Arc::new(Correlations::new());
        let listener = correlations.clone();
        // the poller delivers the event and the receipt comes back without logs
        let sender = Arc::new(ScriptedSender::new(move |tx| {
            let call = IDAOFactory::createGoveranceCall::abi_decode(&tx.input).unwrap();
            let event = governor_event(&call);
            listener.creations.resolve(
                tx.hash,
                Creation::Governor(GovernorCreated {
                    owner: event._owner,
                    governor: event._contract,
                    timelock: event._timelock,
                    block: Some(7),
                }),
            );
            Outcome::Mined {
                success: true,
                logs: vec![],
            }
        }));
        let client = client(sender, correlations.clone(), 0);

        let created = client
            .create_governance(Address::repeat_byte(0x77), false, 10)
            .await
            .unwrap();
        assert_eq!(created.governor, Address::repeat_byte(0x60));
        assert_eq!(created.timelock, Address::repeat_byte(0x77));
        assert_eq!(created.block, Some(7));
        assert_eq!(correlations.creations.tracked_count(), 0);
    }

    #[tokio::test]
    async fn test_creation_without_event_times_out() {
        let sender = Arc::new(ScriptedSender::new(|_| Outcome::Mined {
            success: true,
            logs: vec![],
        }));
        let client = client(sender, Arc::new(Correlations::new()), 0);
        assert!(matches!(
            client.create_super_app("The App", "APP", "DAI").await,
            Err(DaoError::EventTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_wrong_event_kind_is_rejected() {
        let network = polygon();
        let factory = network.dao_factory().unwrap();
        let sender = Arc::new(ScriptedSender::new(move |_| Outcome::Mined {
            success: true,
            logs: vec![alloy::primitives::Log {
                address: factory,
                data: IDAOFactory::DAOGovernorCreated {
                    _owner: OWNER,
                    _contract: Address::repeat_byte(1),
                    _timelock: Address::repeat_byte(2),
                }
                .encode_log_data(),
            }],
        }));
        let client = client(sender, Arc::new(Correlations::new()), 1);
        assert!(matches!(
            client.create_super_app("The App", "APP", "DAI").await,
            Err(DaoError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_input_sends_nothing() {
        let sender = Arc::new(ScriptedSender::new(|_| Outcome::Mined {
            success: true,
            logs: vec![],
        }));
        let client = client(sender.clone(), Arc::new(Correlations::new()), 0);
        assert!(client.create_super_app("", "APP", "DAI").await.is_err());
        assert!(client.create_super_app("The App", "APP", "NOPE").await.is_err());
        assert!(client
            .create_governance(Address::repeat_byte(1), true, 0)
            .await
            .is_err());
        assert!(sender.sent().is_empty());
    }

    #[test]
    fn test_validate_token_params() {
        assert!(validate_token_params("The App", "APP").is_ok());
        assert!(validate_token_params("", "APP").is_err());
        assert!(validate_token_params("The App", " ").is_err());
        assert!(validate_token_params("The App", "A PP").is_err());
    }

    #[test]
    fn test_validate_voting_period() {
        assert!(validate_voting_period(0).is_err());
        assert!(validate_voting_period(45818).is_ok());
    }
}
