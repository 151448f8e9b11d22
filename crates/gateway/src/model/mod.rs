//! Provider-neutral conversation types.

pub mod errors;
pub mod types;

pub use errors::ProviderError;
pub use types::{Content, Message, Role, ToolCallRequest, ToolCallResult, ToolOutcome, Usage};
