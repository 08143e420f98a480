use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::errors::{DaoError, Result};
use crate::models::network::{Network, NetworkKind};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NetworkConfig {
    /// Key of the active address table, e.g. "polygon".
    pub active: String,
    #[serde(default)]
    pub dao_factory: Option<String>,
    #[serde(default)]
    pub create2_factory: Option<String>,
    #[serde(default)]
    pub gas_price_gwei: Option<u64>,
}

/// RPC endpoints per network key. Several URLs per network are used as
/// fallbacks.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RpcConfig {
    #[serde(default)]
    pub urls: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize, Deserialize, Clone, Default)]
pub struct WalletConfig {
    pub private_key: Option<String>,
    pub public_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeployConfig {
    pub artifacts_dir: PathBuf,
    pub confirmations: u64,
    /// Fixed wait for a creation notification after the receipt arrived.
    pub event_wait_secs: u64,
    pub poll_interval_ms: u64,
    /// Submit independent deployments back-to-back instead of one by one.
    pub pipelined: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            active: NetworkKind::Polygon.key().to_string(),
            dao_factory: None,
            create2_factory: None,
            gas_price_gwei: None,
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("artifacts"),
            confirmations: 1,
            event_wait_secs: 15,
            poll_interval_ms: 1000,
            pipelined: false,
        }
    }
}

// Keep the key out of debug output.
impl std::fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl NetworkConfig {
    pub fn kind(&self) -> Result<NetworkKind> {
        NetworkKind::from_str(&self.active)
    }

    /// The active network's address table with config overrides applied.
    pub fn resolve(&self) -> Result<Network> {
        Network::for_kind(self.kind()?).with_overrides(self)
    }
}

impl RpcConfig {
    /// Parsed endpoints for a network. Bare `host/path` entries get `https://`.
    pub fn urls_for(&self, kind: NetworkKind) -> Result<Vec<Url>> {
        let raw = self.urls.get(kind.key()).cloned().unwrap_or_default();
        if raw.is_empty() {
            return Err(DaoError::Config(format!(
                "No RPC URL configured for {}",
                kind
            )));
        }
        raw.iter().map(|u| normalize_url(u)).collect()
    }

    pub fn set(&mut self, kind: NetworkKind, url: String) {
        self.urls.insert(kind.key().to_string(), vec![url]);
    }
}

fn normalize_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    Url::parse(&with_scheme)
        .map_err(|e| DaoError::Config(format!("Invalid RPC URL '{}': {}", raw, e)))
}

impl WalletConfig {
    /// Local signer for script-driven transactions.
    pub fn signer(&self) -> Result<PrivateKeySigner> {
        let key = self
            .private_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| DaoError::Config("PRIVATE_KEY not configured".to_string()))?;
        let key = key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let signer = PrivateKeySigner::from_str(key)
            .map_err(|e| DaoError::Config(format!("Invalid private key: {}", e)))?;

        if let Some(expected) = self.public_address()? {
            if expected != signer.address() {
                return Err(DaoError::Config(format!(
                    "PUBLIC_KEY {} does not match private key address {}",
                    expected,
                    signer.address()
                )));
            }
        }
        Ok(signer)
    }

    pub fn public_address(&self) -> Result<Option<Address>> {
        match self.public_key.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Address::from_str(raw)
                .map(Some)
                .map_err(|e| DaoError::Config(format!("Invalid PUBLIC_KEY '{}': {}", raw, e))),
        }
    }
}

impl DeployConfig {
    pub fn event_wait(&self) -> Duration {
        Duration::from_secs(self.event_wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.confirmations == 0 {
            return Err(DaoError::Config(
                "deploy.confirmations must be at least 1".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(DaoError::Config(
                "deploy.poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        info!("Loading config from {}", path.display());
        let config = match Self::load_from_file(path) {
            Ok(config) => {
                info!("Config loaded from file");
                config.with_env_overrides()
            }
            Err(e) => {
                error!("Failed to load config from file: {}", e);
                info!("Falling back to environment variables or defaults");
                Self::from_env()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| DaoError::Config(e.to_string()))
    }

    pub fn from_env() -> Self {
        Config::default().with_env_overrides()
    }

    /// Environment (and `.env`) values win over the file, matching the
    /// Hardhat setup the scripts were run with.
    pub fn with_env_overrides(mut self) -> Self {
        dotenvy::dotenv().ok();

        let rpc_vars = [
            ("API_URL", NetworkKind::Rinkeby),
            ("KOVAN_API_URL", NetworkKind::Kovan),
            ("MUMBAI_API_URL", NetworkKind::Mumbai),
            ("POLYGON_API_URL", NetworkKind::Polygon),
            ("LOCAL_API_URL", NetworkKind::Localhost),
        ];
        for (var, kind) in rpc_vars {
            if let Ok(url) = std::env::var(var) {
                if !url.trim().is_empty() {
                    self.rpc.set(kind, url);
                }
            }
        }

        if let Ok(key) = std::env::var("PRIVATE_KEY") {
            self.wallet.private_key = Some(key);
        }

        if let Ok(public) = std::env::var("PUBLIC_KEY") {
            self.wallet.public_key = Some(public);
        }

        if let Ok(network) = std::env::var("DAOIT_NETWORK") {
            self.network.active = network;
        }

        if let Ok(dir) = std::env::var("DAOIT_ARTIFACTS_DIR") {
            self.deploy.artifacts_dir = PathBuf::from(dir);
        }

        self
    }

    pub fn validate(&self) -> Result<()> {
        self.network.kind()?;
        self.deploy.validate()
    }
}
