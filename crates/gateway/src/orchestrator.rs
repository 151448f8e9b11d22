//! The per-turn conversation driver.
//!
//! A turn is at most two provider rounds: the first offers the tool set, and
//! if the model asks for tools they are executed and a second round turns the
//! results into the final answer.

use tracing::{debug, info, instrument, warn};

use crate::catalog::Catalog;
use crate::executor::{PARALLEL_TOOL, ToolExecutor};
use crate::model::{Message, ToolCallResult, Usage};
use crate::providers::{CompletionRequest, Provider, Round};
use crate::resolver::NameResolver;
use crate::schema::tool_definitions;
use crate::{Error, Result};

/// Where a turn currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Init,
    Round1Pending,
    Executing,
    Round2Pending,
    Done,
    Failed,
}

/// The result of one completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The final assistant message.
    pub message: Message,
    /// Results of every tool call made during the turn, in request order.
    pub tool_results: Vec<ToolCallResult>,
    /// Provider rounds used: 1 without tool calls, 2 with.
    pub rounds: u8,
    pub usage: Usage,
}

struct Turn {
    state: TurnState,
}

impl Turn {
    fn advance(&mut self, next: TurnState) {
        debug!(from = ?self.state, to = ?next, "turn state");
        self.state = next;
    }
}

/// Drives the two-round state machine for one provider.
pub struct Orchestrator<P> {
    provider: P,
    executor: ToolExecutor,
}

impl<P: Provider> Orchestrator<P> {
    pub fn new(provider: P, executor: ToolExecutor) -> Self {
        Self { provider, executor }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run one turn over `messages` with `catalog` as the tool set.
    ///
    /// Tool failures are handed to the model; only configuration, unknown
    /// tool names and provider failures are returned as errors.
    #[instrument(skip_all, fields(tools = catalog.len(), messages = messages.len()))]
    pub async fn run(&self, catalog: &Catalog, messages: &[Message]) -> Result<TurnOutcome> {
        let mut turn = Turn {
            state: TurnState::Init,
        };

        let outcome = self.drive(&mut turn, catalog, messages).await;
        if let Err(e) = &outcome {
            turn.advance(TurnState::Failed);
            warn!(code = e.code(), error = %e, "turn failed");
        }
        outcome
    }

    async fn drive(
        &self,
        turn: &mut Turn,
        catalog: &Catalog,
        messages: &[Message],
    ) -> Result<TurnOutcome> {
        if catalog.is_empty() {
            return Err(Error::Configuration("tool catalog is empty".into()));
        }
        if messages.is_empty() {
            return Err(Error::Configuration("no messages supplied".into()));
        }

        let tools = tool_definitions(catalog);
        let system = self.executor.settings().system_prompt.as_deref();

        turn.advance(TurnState::Round1Pending);
        let first = self
            .provider
            .complete(CompletionRequest {
                messages,
                tools: &tools,
                round: Round::Initial,
                system,
            })
            .await?;
        let mut usage = first.usage;

        if !first.message.has_tool_calls() {
            turn.advance(TurnState::Done);
            return Ok(TurnOutcome {
                message: first.message,
                tool_results: Vec::new(),
                rounds: 1,
                usage,
            });
        }

        turn.advance(TurnState::Executing);
        let resolver = NameResolver::new(catalog);
        let unknown = first.tool_calls().iter().find(|call| {
            !resolver.is_known(&call.tool_name) && resolver.resolve(&call.tool_name) != PARALLEL_TOOL
        });
        if let Some(call) = unknown {
            return Err(Error::ToolNotFound(call.tool_name.clone()));
        }

        let results = self.executor.execute_all(catalog, first.tool_calls()).await;
        info!(
            calls = results.len(),
            failed = results.iter().filter(|r| !r.is_ok()).count(),
            "tool calls executed"
        );

        let history = replay(messages, &first.message, &results);

        turn.advance(TurnState::Round2Pending);
        let second = self
            .provider
            .complete(CompletionRequest {
                messages: &history,
                tools: &tools,
                round: Round::Final,
                system,
            })
            .await?;
        usage += second.usage;

        let mut message = second.message;
        if message.has_tool_calls() {
            debug!(
                calls = message.tool_calls.len(),
                "dropping tool calls requested in the final round"
            );
            message.tool_calls.clear();
        }

        turn.advance(TurnState::Done);
        Ok(TurnOutcome {
            message,
            tool_results: results,
            rounds: 2,
            usage,
        })
    }
}

/// Build the round-two history.
///
/// The original messages, then the assistant's tool-calling message, then
/// one tool-result message per call, matched by call id. Each result is
/// consumed once, so calls sharing an id pair up in order.
pub fn replay(
    messages: &[Message],
    assistant: &Message,
    results: &[ToolCallResult],
) -> Vec<Message> {
    let mut history = Vec::with_capacity(messages.len() + 1 + results.len());
    history.extend_from_slice(messages);
    history.push(assistant.clone());

    let mut used = vec![false; results.len()];
    for call in &assistant.tool_calls {
        let matched = results
            .iter()
            .zip(&used)
            .position(|(r, &taken)| !taken && r.id == call.id);
        if let Some(i) = matched {
            used[i] = true;
            history.push(Message::tool_result(call, &results[i]));
        }
    }
    history
}
