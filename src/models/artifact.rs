use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{DaoError, Result};

/// Contracts placed by the deterministic deployment sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Token,
    App,
    Governor,
    Executor,
    Factory,
}

impl ArtifactKind {
    pub fn all() -> [ArtifactKind; 5] {
        [
            ArtifactKind::Token,
            ArtifactKind::App,
            ArtifactKind::Governor,
            ArtifactKind::Executor,
            ArtifactKind::Factory,
        ]
    }

    /// Implementations the factory clones; the factory itself is excluded.
    pub fn implementations() -> [ArtifactKind; 4] {
        [
            ArtifactKind::Token,
            ArtifactKind::App,
            ArtifactKind::Governor,
            ArtifactKind::Executor,
        ]
    }

    pub fn contract_name(&self) -> &'static str {
        match self {
            ArtifactKind::Token => "NativeSuperTokenProxy",
            ArtifactKind::App => "DAOSuperApp",
            ArtifactKind::Governor => "DAOGovernor",
            ArtifactKind::Executor => "DAOExecutor",
            ArtifactKind::Factory => "DAOFactory",
        }
    }

    /// Location under the Hardhat `artifacts/` directory.
    pub fn relative_path(&self) -> PathBuf {
        let source = match self {
            ArtifactKind::Token => "contracts/token/NativeSuperTokenProxy.sol",
            ArtifactKind::App => "contracts/DAOSuperApp.sol",
            ArtifactKind::Governor => "contracts/governance/Governor.sol",
            ArtifactKind::Executor => "contracts/DAOit.sol",
            ArtifactKind::Factory => "contracts/DAOit.sol",
        };
        Path::new(source).join(format!("{}.json", self.contract_name()))
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.contract_name())
    }
}

/// Hardhat compilation artifact. Only the fields we use are decoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    #[serde(default)]
    pub source_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl Artifact {
    pub fn from_json(contents: &str) -> Result<Self> {
        let artifact: Artifact = serde_json::from_str(contents)?;
        if artifact.bytecode.is_empty() {
            return Err(DaoError::Artifact(format!(
                "{} has no bytecode (abstract contract or interface?)",
                artifact.contract_name
            )));
        }
        Ok(artifact)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            DaoError::Artifact(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.abi.function(name).is_some_and(|f| !f.is_empty())
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.abi.event(name).is_some_and(|e| !e.is_empty())
    }
}

/// All artifacts of a deployment run, read once at start-up.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    artifacts: HashMap<ArtifactKind, Artifact>,
}

impl ArtifactStore {
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        info!("Loading artifacts from {}", dir.display());
        let mut artifacts = HashMap::new();
        for kind in ArtifactKind::all() {
            let artifact = Artifact::load(dir.join(kind.relative_path()))?;
            if artifact.contract_name != kind.contract_name() {
                return Err(DaoError::Artifact(format!(
                    "Expected {} but artifact declares {}",
                    kind.contract_name(),
                    artifact.contract_name
                )));
            }
            debug!("{}: {} bytes of bytecode", kind, artifact.bytecode.len());
            artifacts.insert(kind, artifact);
        }
        let store = Self { artifacts };
        store.validate()?;
        Ok(store)
    }

    pub fn from_artifacts(artifacts: HashMap<ArtifactKind, Artifact>) -> Self {
        Self { artifacts }
    }

    pub fn get(&self, kind: ArtifactKind) -> Result<&Artifact> {
        self.artifacts
            .get(&kind)
            .ok_or_else(|| DaoError::Artifact(format!("{} not loaded", kind)))
    }

    pub fn bytecode(&self, kind: ArtifactKind) -> Result<&Bytes> {
        Ok(&self.get(kind)?.bytecode)
    }

    /// The factory must expose `initialize` for the linking step.
    pub fn validate(&self) -> Result<()> {
        let factory = self.get(ArtifactKind::Factory)?;
        if !factory.has_function("initialize") {
            return Err(DaoError::Artifact(
                "DAOFactory artifact has no initialize function".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;

    pub(crate) fn artifact_json(name: &str, bytecode: &str, with_initialize: bool) -> String {
        let abi = if with_initialize {
            r#"[{"type":"function","name":"initialize","inputs":[{"name":"a","type":"address","internalType":"address"}],"outputs":[],"stateMutability":"nonpayable"}]"#
        } else {
            "[]"
        };
        format!(
            r#"{{"_format":"hh-sol-artifact-1","contractName":"{}","sourceName":"contracts/X.sol","abi":{},"bytecode":"{}","deployedBytecode":"0x","linkReferences":{{}},"deployedLinkReferences":{{}}}}"#,
            name, abi, bytecode
        )
    }

    pub(crate) fn write_artifacts(dir: &Path) {
        for kind in ArtifactKind::all() {
            let path = dir.join(kind.relative_path());
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            let code = format!("0x6080{:02x}", kind as u8);
            fs::write(
                path,
                artifact_json(kind.contract_name(), &code, kind == ArtifactKind::Factory),
            )
            .unwrap();
        }
    }

    #[test]
    fn test_parse_artifact() {
        let artifact =
            Artifact::from_json(&artifact_json("DAOFactory", "0x60806040", true)).unwrap();
        assert_eq!(artifact.contract_name, "DAOFactory");
        assert_eq!(artifact.bytecode.len(), 4);
        assert!(artifact.has_function("initialize"));
        assert!(!artifact.has_function("deploy"));
    }

    #[test]
    fn test_empty_bytecode_rejected() {
        let err = Artifact::from_json(&artifact_json("IERC20", "0x", false)).unwrap_err();
        assert!(matches!(err, DaoError::Artifact(_)));
    }

    #[test]
    fn test_store_load() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        let store = ArtifactStore::load(dir.path()).unwrap();
        for kind in ArtifactKind::all() {
            assert_eq!(store.get(kind).unwrap().contract_name, kind.contract_name());
        }
        // distinct bytecode per kind
        assert_ne!(
            store.bytecode(ArtifactKind::Token).unwrap(),
            store.bytecode(ArtifactKind::App).unwrap()
        );
    }

    #[test]
    fn test_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactStore::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("NativeSuperTokenProxy"));
    }

    #[test]
    fn test_store_requires_factory_initialize() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        let factory = dir.path().join(ArtifactKind::Factory.relative_path());
        fs::write(&factory, artifact_json("DAOFactory", "0x6080", false)).unwrap();
        assert!(ArtifactStore::load(dir.path()).is_err());
    }
}
