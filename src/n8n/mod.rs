//! # n8n REST API Access
//!
//! The gateway client, its normalized error and the resource models it exchanges.

pub mod client;
pub mod error;
pub mod models;

pub use client::{N8nClient, API_KEY_HEADER};
pub use error::{N8nApiError, N8nErrorKind};
pub use models::{
    CreateWorkflowRequest, Credential, Execution, ExecutionFilter, Tag, User, Workflow,
    WorkflowPatch,
};
