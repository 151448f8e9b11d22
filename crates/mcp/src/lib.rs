//! Client for stateless MCP tool servers spoken over plain HTTP.
//!
//! A server exposes three endpoints relative to its base URL:
//!
//! - `GET /` returns protocol information,
//! - `GET /tools` lists the tools it can execute,
//! - `POST /execute` runs one tool with `{name, parameters}`.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{ExecuteOutcome, McpClient, ServerUrl};
//!
//! # async fn example() -> mcp::Result<()> {
//! let server = ServerUrl::parse("localhost:4000/auto-mcp-server")?;
//! let client = McpClient::new(reqwest::Client::new(), server);
//!
//! for tool in client.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//!
//! match client.execute("weather", serde_json::json!({"city": "Paris"})).await? {
//!     ExecuteOutcome::Success(value) => println!("{value}"),
//!     ExecuteOutcome::Failure(text) => eprintln!("tool failed: {text}"),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod protocol;

pub use client::{DEFAULT_TIMEOUT, McpClient, ServerUrl};
pub use error::{Error, Result};
pub use protocol::{
    ExecuteOutcome, ExecuteRequest, ListToolsResponse, PROTOCOL_VERSION, ServerInfo, ToolContent,
    ToolDescriptor,
};
