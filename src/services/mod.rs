pub mod dao_factory;
pub mod deployer;
pub mod fork;
pub mod governance;
pub mod listeners;
pub mod pending;
pub mod streams;
pub mod super_app;

pub use dao_factory::DaoFactoryClient;
pub use deployer::{Deployer, PlannedDeployment};
pub use fork::ForkHelper;
pub use governance::{GovernorClient, Proposal, ProposalState};
pub use listeners::{Correlations, CreationListener, EventListener};
pub use pending::{PendingHandle, PendingRegistry, Resolution};
pub use streams::{FlowInfo, FlowRate, StreamClient};
pub use super_app::{SuperAppClient, SuperAppInfo, TokenClient};
