//! Error conversion for MCP tool handlers

use rmcp::ErrorData as McpError;

/// Type alias for MCP tool results
pub type McpResult<T> = Result<T, McpError>;

/// Conversion of a domain error into an MCP error
///
/// Implement this for a server's own error types to choose between
/// `invalid_params` (caller mistake) and `internal_error` (server side).
pub trait IntoMcpError {
    fn into_mcp_error(self) -> McpError;
}

impl IntoMcpError for anyhow::Error {
    fn into_mcp_error(self) -> McpError {
        McpError::internal_error(self.to_string(), None)
    }
}

impl IntoMcpError for serde_json::Error {
    fn into_mcp_error(self) -> McpError {
        McpError::internal_error(format!("JSON error: {}", self), None)
    }
}

/// Extension trait adding `to_mcp_err()` to any `Result` whose error implements [`IntoMcpError`]
pub trait ResultExt<T> {
    fn to_mcp_err(self) -> McpResult<T>;
}

impl<T, E: IntoMcpError> ResultExt<T> for Result<T, E> {
    fn to_mcp_err(self) -> McpResult<T> {
        self.map_err(IntoMcpError::into_mcp_error)
    }
}

/// MCP internal error with a message
pub fn internal_error(message: impl Into<String>) -> McpError {
    McpError::internal_error(message.into(), None)
}

/// MCP invalid-params error with a message
pub fn invalid_params(message: impl Into<String>) -> McpError {
    McpError::invalid_params(message.into(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_ext_maps_anyhow() {
        let result: Result<(), anyhow::Error> = Err(anyhow::anyhow!("backend down"));
        let err = result.to_mcp_err().unwrap_err();
        assert!(err.message.contains("backend down"));
    }

    #[test]
    fn test_invalid_params() {
        let err = invalid_params("query must not be empty");
        assert!(err.message.contains("query must not be empty"));
    }

    #[test]
    fn test_internal_error() {
        let err = internal_error("boom");
        assert!(err.message.contains("boom"));
    }
}
