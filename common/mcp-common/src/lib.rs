//! MCP Common - Shared utilities for MCP servers
//!
//! - **Initialization**: [`init_tracing`] for stderr logging (stdout carries the protocol)
//! - **Results**: [`json_success`] for pretty JSON tool responses
//! - **Errors**: [`IntoMcpError`] / [`ResultExt`] for mapping domain errors onto MCP errors
//!
//! # Example
//!
//! ```rust,ignore
//! use mcp_common::{json_success, ResultExt};
//!
//! async fn my_tool(&self) -> Result<CallToolResult, McpError> {
//!     let data = self.service.run().await.to_mcp_err()?;
//!     json_success(&data)
//! }
//! ```

pub mod error;
pub mod init;
pub mod result;

// Re-export commonly used items at crate root
pub use error::{internal_error, invalid_params, IntoMcpError, McpResult, ResultExt};
pub use init::{init_tracing, LogFormat};
pub use result::json_success;

// Re-export rmcp types that are commonly needed
pub use rmcp::{model::CallToolResult, ErrorData as McpError};
