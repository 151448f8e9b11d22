use thiserror::Error;

/// Errors that can occur during tool execution.
///
/// Never escapes the executor: every variant is folded into a failed
/// [`ToolOutcome`](crate::ToolOutcome).
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("timeout after {0}ms")]
    Timeout(u64),
    #[error("execution failed: {0}")]
    Execution(String),
}
