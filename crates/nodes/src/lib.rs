//! `nodes` crate — the `ExecutableNode` contract, host capability traits and
//! the Knowledgelib node.
//!
//! A node receives an explicit [`ExecutionContext`] carrying the parameter
//! source, credential source and HTTP client for the batch. The engine crate
//! dispatches execution through the [`ExecutableNode`] trait object.

pub mod error;
pub mod http;
pub mod knowledgelib;
pub mod mock;
pub mod traits;

pub use error::{HttpError, NodeError};
pub use http::ReqwestClient;
pub use traits::{
    CredentialData, CredentialSource, ExecutableNode, ExecutionContext, HttpClient, HttpRequest,
    HttpResponse, OutputItem, ParameterSource, ResponseFormat,
};
