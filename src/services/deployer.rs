use alloy::primitives::{Address, TxHash, B256};
use alloy::rpc::types::TransactionReceipt;
use alloy::sol_types::SolCall;
use futures::future::try_join_all;
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

use crate::config::DeployConfig;
use crate::contracts::{ICreate2Factory, IDAOFactory};
use crate::errors::{DaoError, Result};
use crate::models::artifact::{ArtifactKind, ArtifactStore};
use crate::models::deployment::{CompleteImplementations, ImplementationSet};
use crate::models::network::Network;
use crate::models::salt::{derive_salt, predict_create2_address, salt_as_uint};
use crate::providers::{check_status, TxSender};
use crate::services::listeners::{dispatch_logs, Correlations};
use crate::services::pending::PendingHandle;

/// Where one artifact will land for a given seed.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedDeployment {
    pub kind: ArtifactKind,
    pub contract_name: String,
    pub salt: B256,
    pub predicted: Address,
}

struct Submitted {
    kind: ArtifactKind,
    handle: PendingHandle<Address>,
    tx_hash: TxHash,
}

/// Places the DAO implementations and the factory through the CREATE2
/// factory, then links them with `initialize`.
///
/// There are no retries: the first failed RPC call or reverted transaction
/// ends the run.
pub struct Deployer {
    sender: Arc<dyn TxSender>,
    network: Network,
    artifacts: ArtifactStore,
    config: DeployConfig,
    correlations: Arc<Correlations>,
}

impl Deployer {
    pub fn new(
        sender: Arc<dyn TxSender>,
        network: Network,
        artifacts: ArtifactStore,
        config: DeployConfig,
        correlations: Arc<Correlations>,
    ) -> Self {
        Self {
            sender,
            network,
            artifacts,
            config,
            correlations,
        }
    }

    /// Salts and predicted addresses for every artifact, without touching the chain.
    pub fn plan(&self, seed: &str) -> Result<Vec<PlannedDeployment>> {
        plan(&self.network, &self.artifacts, seed)
    }

    /// Deploy one artifact and wait for the factory to report its address.
    pub async fn deploy_artifact(&self, kind: ArtifactKind, seed: &str) -> Result<Address> {
        let submitted = self.submit(kind, seed, None).await?;
        let (_, address) = self.finish(submitted).await?;
        Ok(address)
    }

    /// Deploy the four implementations, one by one or back-to-back
    /// depending on `DeployConfig::pipelined`.
    ///
    /// Back-to-back submissions carry explicit consecutive nonces; the
    /// node would otherwise hand the same pending nonce to each of them.
    pub async fn deploy_implementations(&self, seed: &str) -> Result<ImplementationSet> {
        let mut set = ImplementationSet::default();

        if self.config.pipelined {
            let first_nonce = self.sender.next_nonce().await?;
            info!("Submitting implementations back-to-back from nonce {}", first_nonce);
            let mut submitted = Vec::new();
            for (offset, kind) in ArtifactKind::implementations().into_iter().enumerate() {
                let nonce = first_nonce + offset as u64;
                submitted.push(self.submit(kind, seed, Some(nonce)).await?);
            }
            let placed = try_join_all(submitted.into_iter().map(|s| self.finish(s))).await?;
            for (kind, address) in placed {
                set.record(kind, address);
            }
        } else {
            for kind in ArtifactKind::implementations() {
                let address = self.deploy_artifact(kind, seed).await?;
                set.record(kind, address);
            }
        }

        Ok(set)
    }

    /// Link the factory to the implementations it clones.
    pub async fn initialize_factory(&self, set: &ImplementationSet) -> Result<TransactionReceipt> {
        if !set.implementations_ready() {
            return Err(DaoError::Internal(
                "Cannot initialize factory before all implementations are deployed".to_string(),
            ));
        }
        let factory = set
            .factory
            .ok_or_else(|| DaoError::Internal("Factory address unknown".to_string()))?;

        info!("Initializing DAOFactory at {}", factory);
        let input = IDAOFactory::initializeCall {
            tokenImplementation: set.token.unwrap_or_default(),
            appImplementation: set.app.unwrap_or_default(),
            governorImplementation: set.governor.unwrap_or_default(),
            executorImplementation: set.executor.unwrap_or_default(),
        }
        .abi_encode();
        let tx_hash = self.sender.send(factory, input.into(), None).await?;
        info!("initialize DAOFactory: submitted {}", tx_hash);
        check_status(self.sender.receipt(tx_hash).await?, "initialize DAOFactory")
    }

    /// The whole sequence: implementations, factory, initialize.
    pub async fn run(&self, seed: &str) -> Result<CompleteImplementations> {
        info!(
            "Deterministic deployment on {} with seed '{}'",
            self.network.name(),
            seed
        );
        let mut set = self.deploy_implementations(seed).await?;

        let factory = self.deploy_artifact(ArtifactKind::Factory, seed).await?;
        set.record(ArtifactKind::Factory, factory);

        self.initialize_factory(&set).await?;

        let complete = set.into_complete()?;
        info!("Deployment with seed '{}' complete", seed);
        Ok(complete)
    }

    /// Place only the factory, for upgrades against existing implementations.
    pub async fn deploy_factory_only(&self, seed: &str) -> Result<Address> {
        self.deploy_artifact(ArtifactKind::Factory, seed).await
    }

    async fn submit(
        &self,
        kind: ArtifactKind,
        seed: &str,
        nonce: Option<u64>,
    ) -> Result<Submitted> {
        let factory = self.network.create2_factory()?;
        let salt = derive_salt(seed, kind);
        let handle = self.correlations.deployments.register(salt)?;

        let code = self.artifacts.bytecode(kind)?.clone();
        info!("Deploying {} ({} bytes) with salt {}", kind, code.len(), salt);

        let input = ICreate2Factory::deployCall {
            code,
            salt: salt_as_uint(salt),
        }
        .abi_encode();
        let tx_hash = self.sender.send(factory, input.into(), nonce).await?;
        debug!("{} submitted as {}", kind, tx_hash);

        Ok(Submitted {
            kind,
            handle,
            tx_hash,
        })
    }

    async fn finish(&self, submitted: Submitted) -> Result<(ArtifactKind, Address)> {
        let Submitted {
            kind,
            handle,
            tx_hash,
        } = submitted;
        let receipt = check_status(
            self.sender.receipt(tx_hash).await?,
            &format!("deploy {}", kind),
        )?;

        // The receipt usually carries the notification already; the poller
        // covers endpoints that return receipts without logs.
        dispatch_logs(&self.correlations, receipt.inner.logs());

        let address = handle.wait(self.config.event_wait()).await?;
        info!("{} deployed at {}", kind, address);
        Ok((kind, address))
    }
}

pub fn plan(network: &Network, artifacts: &ArtifactStore, seed: &str) -> Result<Vec<PlannedDeployment>> {
    if seed.trim().is_empty() {
        return Err(DaoError::InvalidInput("Seed must not be empty".to_string()));
    }
    let factory = network.create2_factory()?;
    ArtifactKind::all()
        .into_iter()
        .map(|kind| {
            let salt = derive_salt(seed, kind);
            Ok(PlannedDeployment {
                kind,
                contract_name: kind.contract_name().to_string(),
                salt,
                predicted: predict_create2_address(factory, salt, artifacts.bytecode(kind)?),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::artifact::tests::write_artifacts;
    use crate::models::network::NetworkKind;
    use std::collections::HashSet;

    use crate::providers::sender::tests::{Outcome, ScriptedSender, SentTx};
    use alloy::sol_types::SolEvent;
    use std::sync::Mutex;
    use std::time::Duration;

    fn polygon() -> Network {
        Network::for_kind(NetworkKind::Polygon)
    }

    fn deploy_config(pipelined: bool) -> DeployConfig {
        DeployConfig {
            event_wait_secs: 1,
            pipelined,
            ..Default::default()
        }
    }

    /// A CREATE2 factory that places code at the predicted address and
    /// rejects a salt it has already seen.
    fn create2_chain(factory: Address) -> impl Fn(&SentTx) -> Outcome + Send + Sync {
        let used = Mutex::new(HashSet::new());
        move |tx: &SentTx| {
            if tx.to != factory {
                return Outcome::Mined {
                    success: true,
                    logs: vec![],
                };
            }
            let call = ICreate2Factory::deployCall::abi_decode(&tx.input).unwrap();
            if !used.lock().unwrap().insert(call.salt) {
                return Outcome::Reject("execution reverted: Create2: Failed on deploy".to_string());
            }
            let salt = crate::models::salt::uint_as_salt(call.salt);
            let event = ICreate2Factory::Deployed {
                addr: factory.create2_from_code(salt, &call.code),
                salt: call.salt,
            };
            Outcome::Mined {
                success: true,
                logs: vec![alloy::primitives::Log {
                    address: factory,
                    data: event.encode_log_data(),
                }],
            }
        }
    }

    fn deployer(sender: Arc<ScriptedSender>, pipelined: bool) -> Deployer {
        Deployer::new(
            sender,
            polygon(),
            store(),
            deploy_config(pipelined),
            Arc::new(Correlations::new()),
        )
    }

    #[tokio::test]
    async fn test_run_deploys_in_order_then_initializes() {
        let factory = polygon().create2_factory().unwrap();
        let sender = Arc::new(ScriptedSender::new(create2_chain(factory)));
        let deployer = deployer(sender.clone(), false);

        let complete = deployer.run("VERSION1").await.unwrap();
        let planned = deployer.plan("VERSION1").unwrap();
        for p in &planned {
            let placed = match p.kind {
                ArtifactKind::Token => complete.token,
                ArtifactKind::App => complete.app,
                ArtifactKind::Governor => complete.governor,
                ArtifactKind::Executor => complete.executor,
                ArtifactKind::Factory => complete.factory,
            };
            assert_eq!(placed, p.predicted, "{}", p.kind);
        }

        let sent = sender.sent();
        assert_eq!(sent.len(), 6);
        let salts: Vec<_> = sent[..5]
            .iter()
            .map(|tx| ICreate2Factory::deployCall::abi_decode(&tx.input).unwrap().salt)
            .collect();
        let expected: Vec<_> = [
            ArtifactKind::Token,
            ArtifactKind::App,
            ArtifactKind::Governor,
            ArtifactKind::Executor,
            ArtifactKind::Factory,
        ]
        .into_iter()
        .map(|kind| salt_as_uint(derive_salt("VERSION1", kind)))
        .collect();
        assert_eq!(salts, expected);
        assert!(sent.iter().all(|tx| tx.nonce.is_none()));

        let init = &sent[5];
        assert_eq!(init.to, complete.factory);
        let call = IDAOFactory::initializeCall::abi_decode(&init.input).unwrap();
        assert_eq!(call.tokenImplementation, complete.token);
        assert_eq!(call.appImplementation, complete.app);
        assert_eq!(call.governorImplementation, complete.governor);
        assert_eq!(call.executorImplementation, complete.executor);
    }

    #[tokio::test]
    async fn test_pipelined_matches_sequential_with_consecutive_nonces() {
        let factory = polygon().create2_factory().unwrap();

        let sequential = Arc::new(ScriptedSender::new(create2_chain(factory)));
        let one_by_one = deployer(sequential.clone(), false)
            .deploy_implementations("VERSION1")
            .await
            .unwrap();
        assert_eq!(sequential.nonce_queries(), 0);

        let pipelined = Arc::new(ScriptedSender::new(create2_chain(factory)));
        let back_to_back = deployer(pipelined.clone(), true)
            .deploy_implementations("VERSION1")
            .await
            .unwrap();
        assert_eq!(one_by_one, back_to_back);
        assert!(back_to_back.implementations_ready());

        assert_eq!(pipelined.nonce_queries(), 1);
        let first = pipelined.first_nonce();
        let nonces: Vec<_> = pipelined.sent().iter().map(|tx| tx.nonce).collect();
        assert_eq!(
            nonces,
            vec![Some(first), Some(first + 1), Some(first + 2), Some(first + 3)]
        );
    }

    #[tokio::test]
    async fn test_reused_seed_is_rejected_without_waiting() {
        let factory = polygon().create2_factory().unwrap();
        let sender = Arc::new(ScriptedSender::new(create2_chain(factory)));

        deployer(sender.clone(), false)
            .deploy_artifact(ArtifactKind::Token, "VERSION1")
            .await
            .unwrap();

        // a second run, as a fresh process would, against the same chain
        let again = deployer(sender.clone(), false);
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            again.deploy_artifact(ArtifactKind::Token, "VERSION1"),
        )
        .await
        .expect("rejected deployment must not hang");
        assert!(matches!(result, Err(DaoError::Rpc(ref m)) if m.contains("Create2")));
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_reverted_deploy_fails_the_run() {
        let sender = Arc::new(ScriptedSender::new(|_| Outcome::Mined {
            success: false,
            logs: vec![],
        }));
        let result = deployer(sender, false).run("VERSION1").await;
        match result {
            Err(DaoError::Reverted { context, .. }) => assert_eq!(context, "deploy NativeSuperTokenProxy"),
            other => panic!("unexpected {:?}", other.map(|c| c.factory)),
        }
    }

    #[tokio::test]
    async fn test_missing_notification_times_out() {
        let sender = Arc::new(ScriptedSender::new(|_| Outcome::Mined {
            success: true,
            logs: vec![],
        }));
        let deployer = Deployer::new(
            sender,
            polygon(),
            store(),
            DeployConfig {
                event_wait_secs: 0,
                ..Default::default()
            },
            Arc::new(Correlations::new()),
        );
        assert!(matches!(
            deployer.deploy_factory_only("VERSION1").await,
            Err(DaoError::EventTimeout { waited_secs: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_initialize_requires_all_implementations() {
        let sender = Arc::new(ScriptedSender::new(|_| Outcome::Mined {
            success: true,
            logs: vec![],
        }));
        let deployer = deployer(sender.clone(), false);
        let mut set = ImplementationSet::default();
        set.record(ArtifactKind::Token, Address::repeat_byte(1));
        set.record(ArtifactKind::Factory, Address::repeat_byte(5));
        assert!(matches!(
            deployer.initialize_factory(&set).await,
            Err(DaoError::Internal(_))
        ));
        assert!(sender.sent().is_empty());
    }

    fn store() -> ArtifactStore {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        ArtifactStore::load(dir.path()).unwrap()
    }

    #[test]
    fn test_plan_is_deterministic() {
        let network = Network::for_kind(NetworkKind::Polygon);
        let artifacts = store();

        let first = plan(&network, &artifacts, "VERSION1").unwrap();
        let second = plan(&network, &artifacts, "VERSION1").unwrap();
        assert_eq!(first.len(), 5);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.salt, b.salt);
            assert_eq!(a.predicted, b.predicted);
        }

        let predicted: HashSet<_> = first.iter().map(|p| p.predicted).collect();
        assert_eq!(predicted.len(), 5);
    }

    #[test]
    fn test_plan_changes_with_seed() {
        let network = Network::for_kind(NetworkKind::Polygon);
        let artifacts = store();
        let v1 = plan(&network, &artifacts, "VERSION1").unwrap();
        let v2 = plan(&network, &artifacts, "VERSION2").unwrap();
        for (a, b) in v1.iter().zip(v2.iter()) {
            assert_eq!(a.kind, b.kind);
            assert_ne!(a.predicted, b.predicted);
        }
    }

    #[test]
    fn test_plan_requires_factory_and_seed() {
        let artifacts = store();
        let kovan = Network::for_kind(NetworkKind::Kovan);
        assert!(matches!(
            plan(&kovan, &artifacts, "VERSION1"),
            Err(DaoError::MissingAddress { .. })
        ));

        let polygon = Network::for_kind(NetworkKind::Polygon);
        assert!(matches!(
            plan(&polygon, &artifacts, "  "),
            Err(DaoError::InvalidInput(_))
        ));
    }
}
