use alloy::contract::Error as ContractError;
use alloy::providers::PendingTransactionError;
use alloy::transports::TransportError;
use derive_more::Display;

pub type Result<T> = std::result::Result<T, DaoError>;

#[derive(Debug, Display)]
pub enum DaoError {
    #[display(fmt = "Configuration error: {}", _0)]
    Config(String),

    #[display(fmt = "Unknown network: {}", _0)]
    UnknownNetwork(String),

    #[display(fmt = "No {} address configured for {}", name, network)]
    MissingAddress { network: String, name: String },

    #[display(fmt = "Accepted token {} for {} not found", symbol, network)]
    UnknownToken { network: String, symbol: String },

    #[display(
        fmt = "Provider is on chain {} but network expects chain {}",
        actual,
        expected
    )]
    WrongChain { expected: u64, actual: u64 },

    #[display(fmt = "Artifact error: {}", _0)]
    Artifact(String),

    #[display(fmt = "RPC error: {}", _0)]
    Rpc(String),

    #[display(fmt = "Transaction {} reverted: {}", tx_hash, context)]
    Reverted { tx_hash: String, context: String },

    #[display(fmt = "No {} notification after {}s", what, waited_secs)]
    EventTimeout { what: String, waited_secs: u64 },

    #[display(fmt = "Duplicate address in deployment: {}", _0)]
    DuplicateAddress(String),

    #[display(fmt = "Flow rate mismatch: expected {}, got {}", expected, actual)]
    FlowMismatch { expected: String, actual: String },

    #[display(fmt = "Invalid input: {}", _0)]
    InvalidInput(String),

    #[display(fmt = "Internal error: {}", _0)]
    Internal(String),
}

impl std::error::Error for DaoError {}

impl From<ContractError> for DaoError {
    fn from(error: ContractError) -> Self {
        log::error!("Contract call failed: {}", error);
        DaoError::Rpc(error.to_string())
    }
}

impl From<TransportError> for DaoError {
    fn from(error: TransportError) -> Self {
        log::error!("Transport error: {}", error);
        DaoError::Rpc(error.to_string())
    }
}

impl From<PendingTransactionError> for DaoError {
    fn from(error: PendingTransactionError) -> Self {
        log::error!("Pending transaction error: {}", error);
        DaoError::Rpc(error.to_string())
    }
}

impl From<alloy::sol_types::Error> for DaoError {
    fn from(error: alloy::sol_types::Error) -> Self {
        DaoError::Rpc(format!("ABI decode failed: {}", error))
    }
}

impl From<std::io::Error> for DaoError {
    fn from(error: std::io::Error) -> Self {
        DaoError::Internal(error.to_string())
    }
}

impl From<serde_json::Error> for DaoError {
    fn from(error: serde_json::Error) -> Self {
        DaoError::Artifact(error.to_string())
    }
}

impl From<anyhow::Error> for DaoError {
    fn from(error: anyhow::Error) -> Self {
        log::error!("Anyhow error: {}", error);
        DaoError::Internal(error.to_string())
    }
}
