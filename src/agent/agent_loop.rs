//! Core agent loop implementation.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::Config;
use crate::llm::{ChatMessage, ChatResponse, LlmClient, LlmError, ToolCall, ToolSchema};
use crate::tools::ToolRegistry;

use super::conversation::Conversation;
use super::prompt::build_system_prompt;

/// Answer given when a turn runs out of iterations.
pub const ITERATION_CAP_FALLBACK: &str =
    "Sorry, I could not finish handling that request. Please try again or rephrase it.";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Model did not answer within {0:?}")]
    ModelTimeout(Duration),

    #[error("Model backend failed: {0}")]
    ModelBackend(#[from] LlmError),
}

/// Per-session settings of the agent loop.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub restaurant_name: String,
    /// Model invocations allowed per turn
    pub max_iterations: usize,
    /// Deadline shared by all model calls of one turn
    pub turn_timeout: Duration,
}

impl From<&Config> for AgentConfig {
    fn from(config: &Config) -> Self {
        Self {
            model: config.default_model.clone(),
            restaurant_name: config.restaurant_name.clone(),
            max_iterations: config.max_iterations,
            turn_timeout: config.turn_timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// The model produced a final answer.
    Completed,
    /// The iteration cap was hit; the answer is a fallback message.
    IterationCapReached,
}

/// Result of one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub answer: String,
    pub status: TurnStatus,
    /// Model invocations made during the turn
    pub iterations: usize,
    /// Tool calls executed during the turn
    pub tool_calls: usize,
}

enum LoopState {
    Start,
    InvokeModel,
    Route(ChatResponse),
    ExecuteTools(Vec<ToolCall>),
    Done(String, TurnStatus),
}

/// One reservation assistant session.
pub struct Agent {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    tool_schemas: Vec<ToolSchema>,
    conversation: Conversation,
}

impl Agent {
    /// Create a new session with an empty conversation.
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        let tool_schemas = tools.get_tool_schemas();
        Self {
            config,
            llm,
            tools,
            tool_schemas,
            conversation: Conversation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Handle one user utterance and return the final answer text.
    pub async fn respond(&mut self, utterance: &str) -> Result<String, AgentError> {
        Ok(self.run_turn(utterance).await?.answer)
    }

    /// Drive the model/tool loop for one user utterance until the model answers.
    ///
    /// Model failures end the turn with an error; the conversation keeps every
    /// message appended so far and the session stays usable.
    pub async fn run_turn(&mut self, utterance: &str) -> Result<TurnOutcome, AgentError> {
        let deadline = Instant::now() + self.config.turn_timeout;
        let mut iterations = 0;
        let mut tool_calls = 0;
        let mut state = LoopState::Start;

        loop {
            state = match state {
                LoopState::Start => {
                    self.conversation.push_user(utterance);
                    LoopState::InvokeModel
                }
                LoopState::InvokeModel => {
                    if iterations >= self.config.max_iterations {
                        tracing::warn!(
                            "Max iterations ({}) reached without a final answer",
                            self.config.max_iterations
                        );
                        LoopState::Done(
                            ITERATION_CAP_FALLBACK.to_string(),
                            TurnStatus::IterationCapReached,
                        )
                    } else {
                        iterations += 1;
                        tracing::debug!("Agent iteration {}", iterations);
                        let response = self.invoke_model(deadline).await?;
                        self.conversation.push_response(&response);
                        LoopState::Route(response)
                    }
                }
                LoopState::Route(response) => {
                    if response.tool_calls.is_empty() {
                        LoopState::Done(response.content.unwrap_or_default(), TurnStatus::Completed)
                    } else {
                        LoopState::ExecuteTools(response.tool_calls)
                    }
                }
                LoopState::ExecuteTools(calls) => {
                    for call in &calls {
                        let result = self.execute_tool_call(call).await;
                        self.conversation.push_tool_result(call, result);
                        tool_calls += 1;
                    }
                    LoopState::InvokeModel
                }
                LoopState::Done(answer, status) => {
                    return Ok(TurnOutcome {
                        answer,
                        status,
                        iterations,
                        tool_calls,
                    });
                }
            };
        }
    }

    async fn invoke_model(&self, deadline: Instant) -> Result<ChatResponse, AgentError> {
        let system_prompt = build_system_prompt(
            &self.config.restaurant_name,
            Local::now(),
            &self.tools,
            self.tools.book(),
        );
        let messages = self.conversation.with_system(ChatMessage::system(system_prompt));

        let response = tokio::time::timeout_at(
            deadline,
            self.llm.chat_completion(
                &self.config.model,
                &messages,
                Some(self.tool_schemas.as_slice()),
            ),
        )
        .await
        .map_err(|_| AgentError::ModelTimeout(self.config.turn_timeout))??;

        Ok(response)
    }

    /// Execute a single tool call; failures become the tool result text.
    async fn execute_tool_call(&self, call: &ToolCall) -> String {
        tracing::info!(
            "Calling tool: {} with args: {}",
            call.function.name,
            call.function.arguments
        );

        match self
            .tools
            .execute(&call.function.name, call.function.arguments.clone())
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", call.function.name, e);
                format!("Error: {}", e)
            }
        }
    }
}
