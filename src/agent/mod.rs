//! Agent module - the reservation assistant loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Append the user utterance to the conversation
//! 2. Call the LLM with the system prompt, history and tool schemas
//! 3. If the LLM requests tool calls, execute them in order and feed results back
//! 4. Repeat until the LLM produces a final answer or the iteration cap is reached

mod agent_loop;
mod conversation;
mod prompt;

pub use agent_loop::{
    Agent, AgentConfig, AgentError, TurnOutcome, TurnStatus, ITERATION_CAP_FALLBACK,
};
pub use conversation::Conversation;
pub use prompt::build_system_prompt;
