//! Append-only message history of one session.

use crate::llm::{ChatMessage, ChatResponse, ToolCall};

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, utterance: &str) {
        self.messages.push(ChatMessage::user(utterance));
    }

    pub fn push_response(&mut self, response: &ChatResponse) {
        self.messages.push(ChatMessage::assistant(
            response.content.clone(),
            response.tool_calls.clone(),
        ));
    }

    pub fn push_tool_result(&mut self, call: &ToolCall, result: impl Into<String>) {
        self.messages.push(ChatMessage::tool_result(call, result));
    }

    /// Messages as sent to the model: `system` first, then the history.
    pub fn with_system(&self, system: ChatMessage) -> Vec<ChatMessage> {
        std::iter::once(system)
            .chain(self.messages.iter().cloned())
            .collect()
    }
}
