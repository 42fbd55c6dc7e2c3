//! Ollama `/api/chat` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{
    ChatMessage, ChatResponse, FunctionCall, LlmClient, LlmError, Role, ToolCall, ToolSchema,
};

/// Chat client for a local or remote Ollama server.
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSchema]>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    message: Option<WireMessage>,
    #[serde(default)]
    error: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone().unwrap_or_default(),
            tool_calls: msg
                .tool_calls
                .iter()
                .flatten()
                .map(|call| WireToolCall {
                    function: WireFunction {
                        name: call.function.name.clone(),
                        arguments: call.function.arguments.clone(),
                    },
                })
                .collect(),
            tool_name: msg.tool_name.clone(),
        }
    }
}

/// Turn a backend message into a response, assigning call ids.
fn into_response(message: WireMessage) -> ChatResponse {
    let tool_calls = message
        .tool_calls
        .into_iter()
        .map(|call| ToolCall {
            id: format!("call_{}", Uuid::new_v4().simple()),
            function: FunctionCall {
                name: call.function.name,
                arguments: decode_arguments(call.function.arguments),
            },
        })
        .collect();

    ChatResponse {
        content: Some(message.content).filter(|c| !c.trim().is_empty()),
        tool_calls,
    }
}

/// Some models emit arguments as a JSON-encoded string instead of an object.
fn decode_arguments(arguments: Value) -> Value {
    match arguments {
        Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        other => other,
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResponse, LlmError> {
        let request = ChatRequest {
            model,
            messages: messages.iter().map(WireMessage::from).collect(),
            tools: tools.filter(|t| !t.is_empty()),
            stream: false,
        };

        tracing::debug!(
            "Calling {} with {} messages",
            model,
            request.messages.len()
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatReply = response.json().await?;
        if let Some(error) = reply.error {
            return Err(LlmError::InvalidResponse(error));
        }
        let message = reply
            .message
            .ok_or_else(|| LlmError::InvalidResponse("missing message".to_string()))?;

        Ok(into_response(message))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::tools::ToolKind;

    fn cancel_call() -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            function: FunctionCall {
                name: "cancel".to_string(),
                arguments: json!({"date": "2024-01-01", "time": "19:00"}),
            },
        }
    }

    async fn backend_replying(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    async fn sent_body(server: &MockServer) -> Value {
        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 1);
        serde_json::from_slice(&requests[0].body).expect("json body")
    }

    #[test]
    fn reply_with_tool_calls_gets_ids_and_decoded_arguments() {
        let message: WireMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": "",
            "tool_calls": [
                {"function": {"name": "list_slots", "arguments": {"date": "2024-01-01"}}},
                {
                    "function": {
                        "name": "cancel",
                        "arguments": "{\"date\":\"2024-01-01\",\"time\":\"19:00\"}"
                    }
                }
            ]
        }))
        .expect("wire message");

        let response = into_response(message);
        assert_eq!(response.content, None);
        assert_eq!(response.tool_calls.len(), 2);
        assert_ne!(response.tool_calls[0].id, response.tool_calls[1].id);
        assert!(response.tool_calls[0].id.starts_with("call_"));
        assert_eq!(
            response.tool_calls[1].function.arguments,
            json!({"date": "2024-01-01", "time": "19:00"})
        );
    }

    #[test]
    fn tool_result_messages_carry_tool_name() {
        let message = ChatMessage::tool_result(&cancel_call(), "true");
        let wire = serde_json::to_value(WireMessage::from(&message)).expect("serialize");
        assert_eq!(
            wire,
            json!({"role": "tool", "content": "true", "tool_name": "cancel"})
        );
    }

    #[test]
    fn assistant_tool_calls_are_sent_back_without_ids() {
        let message = ChatMessage::assistant(None, vec![cancel_call()]);
        let wire = serde_json::to_value(WireMessage::from(&message)).expect("serialize");
        assert_eq!(
            wire,
            json!({
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "function": {
                        "name": "cancel",
                        "arguments": {"date": "2024-01-01", "time": "19:00"}
                    }
                }]
            })
        );
    }

    #[tokio::test]
    async fn chat_completion_posts_non_streaming_request_with_tools() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({"model": "llama3.2", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.2",
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [
                        {"function": {"name": "list_slots", "arguments": {"date": "2024-01-01"}}}
                    ]
                },
                "done": true
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::new(format!("{}/", server.uri()));
        let schemas: Vec<ToolSchema> = ToolKind::ALL.iter().map(ToolKind::schema).collect();
        let response = client
            .chat_completion(
                "llama3.2",
                &[ChatMessage::user("Any table?")],
                Some(schemas.as_slice()),
            )
            .await
            .expect("chat completion");

        assert_eq!(response.content, None);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].function.name, "list_slots");

        let body = sent_body(&server).await;
        assert_eq!(body["messages"], json!([{"role": "user", "content": "Any table?"}]));
        assert_eq!(body["tools"].as_array().map(|t| t.len()), Some(3));
        assert_eq!(body["tools"][0]["function"]["name"], "list_slots");
    }

    #[tokio::test]
    async fn empty_tool_list_is_omitted_from_request() {
        let server = backend_replying(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "Hello!"},
            "done": true
        })))
        .await;

        let client = OllamaClient::new(server.uri());
        let no_tools: Vec<ToolSchema> = Vec::new();
        let response = client
            .chat_completion("llama3.2", &[ChatMessage::user("Hi")], Some(no_tools.as_slice()))
            .await
            .expect("chat completion");

        assert_eq!(response.content.as_deref(), Some("Hello!"));
        assert!(response.tool_calls.is_empty());
        let body = sent_body(&server).await;
        assert!(body.get("tools").is_none());
        assert_eq!(body["stream"], false);
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let server =
            backend_replying(ResponseTemplate::new(503).set_body_string("model is loading")).await;

        let err = OllamaClient::new(server.uri())
            .chat_completion("llama3.2", &[ChatMessage::user("Hi")], None)
            .await
            .unwrap_err();

        match err {
            LlmError::Api { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model is loading");
            }
            other => panic!("expected an API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn error_field_in_success_reply_is_invalid_response() {
        let server = backend_replying(
            ResponseTemplate::new(200).set_body_json(json!({"error": "model 'x' not found"})),
        )
        .await;

        let err = OllamaClient::new(server.uri())
            .chat_completion("x", &[ChatMessage::user("Hi")], None)
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::InvalidResponse(ref m) if m == "model 'x' not found"));
    }

    #[tokio::test]
    async fn reply_without_message_is_invalid_response() {
        let server =
            backend_replying(ResponseTemplate::new(200).set_body_json(json!({"done": true}))).await;

        let err = OllamaClient::new(server.uri())
            .chat_completion("llama3.2", &[ChatMessage::user("Hi")], None)
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::InvalidResponse(ref m) if m == "missing message"));
    }
}
