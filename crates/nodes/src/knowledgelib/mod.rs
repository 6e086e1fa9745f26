//! The Knowledgelib node: search, fetch and list cited knowledge units from
//! a knowledgelib.io catalog service.

pub mod api;
pub mod credentials;
pub mod description;
pub mod node;
pub mod params;

pub use api::{test_credentials, CatalogApi};
pub use credentials::KnowledgelibCredentials;
pub use description::{credential_description, node_description, CREDENTIAL_TYPE, NODE_NAME};
pub use node::KnowledgelibNode;
pub use params::{Operation, OperationParameters, UnitFormat};
