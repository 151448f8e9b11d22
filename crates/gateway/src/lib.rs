//! Toolgate gateway: tool calling between chat models and tool backends.
//!
//! One conversation turn flows through these pieces:
//!
//! - **Catalog**: an immutable, per-turn snapshot of every tool the model may
//!   call, assembled from declared, discovered and built-in sources.
//! - **Resolver**: maps provider-safe tool names back to catalog names.
//! - **Schema**: translates catalog tools into each provider's function
//!   schema, and third-party schemas into catalog parameters.
//! - **Executor**: runs tool calls remotely or in-process, concurrently,
//!   without ever failing the turn.
//! - **Providers**: OpenAI-style and Anthropic-style completion adapters.
//! - **Orchestrator**: the two-round state machine tying them together.
//!
//! # Example
//!
//! ```no_run
//! use gateway::{Gateway, GatewaySettings, Message, ProviderConfig, ProviderKind, TurnRequest};
//!
//! # async fn example() -> gateway::Result<()> {
//! let gateway = Gateway::new(GatewaySettings::default());
//! let request = TurnRequest::new(
//!     vec![Message::user("What's the weather in Paris?")],
//!     "localhost:3000",
//!     ProviderConfig::new(ProviderKind::Anthropic, "sk-ant-..."),
//! );
//! let outcome = gateway.run(request).await?;
//! println!("{}", outcome.message.text());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
mod config;
mod error;
pub mod executor;
mod gateway;
pub mod model;
mod orchestrator;
pub mod providers;
pub mod resolver;
pub mod schema;

pub use catalog::{
    Catalog, HandlerId, ParamSpec, ParamType, SourceKind, Tool, ToolExecution, ToolSource,
};
pub use config::{DEFAULT_FORECAST_URL, DEFAULT_GEOCODING_URL, GatewaySettings};
pub use error::{Error, ErrorBody, Result};
pub use executor::{PARALLEL_TOOL, ToolExecutor};
pub use gateway::{Discovery, Gateway, TurnRequest};
pub use model::{
    Content, Message, ProviderError, Role, ToolCallRequest, ToolCallResult, ToolOutcome, Usage,
};
pub use orchestrator::{Orchestrator, TurnOutcome, TurnState, replay};
pub use providers::{Adapter, Provider, ProviderConfig, ProviderKind};
