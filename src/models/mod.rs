pub mod artifact;
pub mod deployment;
pub mod network;
pub mod salt;
pub mod token_book;

// Re-export commonly used types
pub use artifact::{Artifact, ArtifactKind, ArtifactStore};
pub use deployment::{
    CompleteImplementations, DaoDeployment, GovernorCreated, ImplementationSet, SuperAppCreated,
};
pub use network::{Network, NetworkKind};
pub use token_book::TokenBook;
