use alloy::primitives::{Address, B256};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::{Filter, Log};
use alloy::sol_types::SolEvent;
use futures::StreamExt;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::contracts::{ICreate2Factory, IDAOFactory};
use crate::errors::Result;
use crate::models::deployment::{GovernorCreated, SuperAppCreated};
use crate::models::salt::uint_as_salt;
use crate::providers::fetch_logs_in_ranges;
use crate::services::listeners::EventListener;
use crate::services::pending::PendingRegistry;

/// Largest block window requested per `eth_getLogs` call during catch-up.
pub const CATCH_UP_SPAN: u64 = 2_000;

/// A DAO factory announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Creation {
    SuperApp(SuperAppCreated),
    Governor(GovernorCreated),
}

/// Requests waiting on creation notifications.
///
/// CREATE2 deployments are keyed by salt because the factory reports the salt
/// back. DAO factory events carry no caller-chosen value, so they are keyed by
/// the hash of the transaction that emitted them.
#[derive(Default)]
pub struct Correlations {
    pub deployments: PendingRegistry<B256, Address>,
    pub creations: PendingRegistry<B256, Creation>,
}

impl Correlations {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn event_signatures() -> Vec<B256> {
    vec![
        ICreate2Factory::Deployed::SIGNATURE_HASH,
        IDAOFactory::DAOSuperAppCreated::SIGNATURE_HASH,
        IDAOFactory::DAOGovernorCreated::SIGNATURE_HASH,
    ]
}

pub fn decode_creation(log: &Log) -> Result<Option<Creation>> {
    let block = log.block_number;
    match log.topic0() {
        Some(&IDAOFactory::DAOSuperAppCreated::SIGNATURE_HASH) => {
            let data: IDAOFactory::DAOSuperAppCreated = log.log_decode()?.inner.data;
            Ok(Some(Creation::SuperApp(SuperAppCreated {
                owner: data._owner,
                super_app: data.superApp,
                underlying: data.underlying,
                super_token: data.superToken,
                block,
            })))
        }
        Some(&IDAOFactory::DAOGovernorCreated::SIGNATURE_HASH) => {
            let data: IDAOFactory::DAOGovernorCreated = log.log_decode()?.inner.data;
            Ok(Some(Creation::Governor(GovernorCreated {
                owner: data._owner,
                governor: data._contract,
                timelock: data._timelock,
                block,
            })))
        }
        _ => Ok(None),
    }
}

/// Route each recognised log to the request waiting for it. Returns how many
/// logs were recognised; anything else is logged and dropped.
pub fn dispatch_logs(correlations: &Correlations, logs: &[Log]) -> usize {
    let mut recognised = 0;
    for log in logs {
        let Some(topic0) = log.topic0() else {
            continue;
        };
        let resolution = match topic0 {
            &ICreate2Factory::Deployed::SIGNATURE_HASH => {
                match log.log_decode::<ICreate2Factory::Deployed>() {
                    Ok(decoded) => {
                        let data = decoded.inner.data;
                        let salt = uint_as_salt(data.salt);
                        debug!("Deployed {} for salt {}", data.addr, salt);
                        Some(correlations.deployments.resolve(salt, data.addr))
                    }
                    Err(e) => {
                        error!("Failed to decode Deployed log: {}", e);
                        None
                    }
                }
            }
            &IDAOFactory::DAOSuperAppCreated::SIGNATURE_HASH
            | &IDAOFactory::DAOGovernorCreated::SIGNATURE_HASH => {
                match (decode_creation(log), log.transaction_hash) {
                    (Ok(None), _) => None,
                    (Ok(Some(creation)), Some(tx_hash)) => {
                        debug!("{:?} in transaction {}", creation, tx_hash);
                        Some(correlations.creations.resolve(tx_hash, creation))
                    }
                    (Ok(Some(_)), None) => {
                        debug!("Creation log without transaction hash, skipping");
                        None
                    }
                    (Err(e), _) => {
                        error!("Failed to decode DAO factory log: {}", e);
                        None
                    }
                }
            }
            _ => {
                debug!("Ignoring log with topic {}", topic0);
                None
            }
        };
        if let Some(resolution) = resolution {
            debug!("Notification {:?}", resolution);
            recognised += 1;
        }
    }
    recognised
}

/// Polls the CREATE2 and DAO factories for creation events.
pub struct CreationListener {
    provider: DynProvider,
    addresses: Vec<Address>,
    poll_interval: Duration,
    correlations: Arc<Correlations>,
    running: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl CreationListener {
    pub fn new(
        provider: DynProvider,
        addresses: Vec<Address>,
        poll_interval: Duration,
        correlations: Arc<Correlations>,
    ) -> Self {
        Self {
            provider,
            addresses,
            poll_interval,
            correlations,
            running: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    pub fn correlations(&self) -> Arc<Correlations> {
        self.correlations.clone()
    }

    fn filter(&self) -> Filter {
        Filter::new()
            .address(self.addresses.clone())
            .event_signature(event_signatures())
    }

    /// Replay creation events from `from_block` to the chain head.
    pub async fn catch_up(&self, from_block: u64) -> Result<usize> {
        let latest = self.provider.get_block_number().await?;
        if from_block > latest {
            debug!("Catch-up start {} is past head {}", from_block, latest);
            return Ok(0);
        }
        let logs =
            fetch_logs_in_ranges(&self.provider, &self.filter(), from_block, latest, CATCH_UP_SPAN)
                .await?;
        Ok(dispatch_logs(&self.correlations, &logs))
    }
}

#[async_trait::async_trait]
impl EventListener for CreationListener {
    async fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        let poller = self
            .provider
            .watch_logs(&self.filter())
            .await?
            .with_poll_interval(self.poll_interval);

        info!(
            "Listening for creation events on {} contract(s) every {:?}",
            self.addresses.len(),
            self.poll_interval
        );
        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let correlations = self.correlations.clone();
        self.task = Some(tokio::spawn(async move {
            let mut stream = poller.into_stream();
            while let Some(logs) = stream.next().await {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let recognised = dispatch_logs(&correlations, &logs);
                debug!("Poll returned {} logs, {} recognised", logs.len(), recognised);
            }
            if running.swap(false, Ordering::SeqCst) {
                warn!("Creation event poller ended");
            }
        }));
        Ok(())
    }

    async fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        debug!("Creation listener stopped");
    }

    async fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for CreationListener {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
