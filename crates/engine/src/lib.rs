//! `engine` crate — the host runtime that configures and runs nodes.

pub mod credentials;
pub mod error;
pub mod executor;
pub mod models;
pub mod parameters;

pub use credentials::CredentialStore;
pub use error::EngineError;
pub use executor::{default_registry, ExecutionResult, ExecutorConfig, NodeExecutor, NodeRegistry};
pub use models::{InputItem, NodeDefinition};
pub use parameters::JsonParameters;
