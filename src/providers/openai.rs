//! OpenAI-compatible streaming client.
//!
//! Ollama exposes the OpenAI chat-completions API, so one client covers
//! the supported engine.

use super::sse::{SseFrame, SseParser};
use super::{
    user_message_content, ChatParams, ChatRequest, CompletionClient, Message, StreamError,
    StreamEvent,
};
use crate::logging::WorkerLog;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;

/// Client bound to one resolved base URL.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Streaming chunk from the backend.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// In-band error payload.
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Map one decoded chunk onto consumer events, preserving stream order.
/// Deltas for choices other than the first carry no content we return, so
/// they are dropped here.
fn chunk_events(chunk: StreamChunk) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    if let Some(err) = chunk.error {
        events.push(StreamEvent::Error(err.message));
    }

    for choice in chunk.choices {
        if choice.index != 0 {
            continue;
        }
        if let Some(content) = choice.delta.content {
            if !content.is_empty() {
                events.push(StreamEvent::ContentDelta(content));
            }
        }
    }

    events
}

impl OpenAiClient {
    /// Create a client bound to `base_url`.
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    /// Base URL this client is bound to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completions endpoint URL.
    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn stream_chat(
        &self,
        params: &ChatParams,
        sink: &WorkerLog,
    ) -> Result<String, StreamError> {
        let request = ChatRequest {
            model: params.model.as_str().to_string(),
            messages: vec![
                Message {
                    role: "system".into(),
                    content: params.system_prompt.clone(),
                },
                Message {
                    role: "user".into(),
                    content: user_message_content(
                        params.model,
                        &params.user_prompt,
                        params.enable_thinking,
                    ),
                },
            ],
            temperature: params.temperature,
            top_p: params.top_p,
            stream: true,
        };

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StreamError::from_status(status.as_u16(), body));
        }

        let mut parser = SseParser::new();
        let mut assembled = String::new();
        let mut stream = response.bytes_stream();

        'receive: while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            for frame in parser.feed(&bytes) {
                let data = match frame {
                    SseFrame::Done => break 'receive,
                    SseFrame::Data(data) => data,
                };
                let chunk: StreamChunk = match serde_json::from_str(&data) {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        sink.debug(format!("skipping undecodable stream chunk: {err}"));
                        continue;
                    }
                };
                for event in chunk_events(chunk) {
                    match event {
                        // Backend-reported errors do not abort the stream.
                        StreamEvent::Error(message) => sink.error(format!("error: {message}")),
                        StreamEvent::ContentDelta(text) => {
                            sink.info(&text);
                            assembled.push_str(&text);
                        }
                    }
                }
            }
        }

        Ok(assembled)
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_url_joins_base_and_path() {
        let client = OpenAiClient::new("http://localhost:11434/v1".into(), "ollama".into());
        assert_eq!(client.chat_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn chat_url_tolerates_trailing_slash() {
        let client = OpenAiClient::new("http://localhost:11434/v1/".into(), "ollama".into());
        assert_eq!(client.chat_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn content_delta_is_extracted_from_first_choice() {
        let chunk: StreamChunk = serde_json::from_str(
            r#"{"choices": [{"index": 0, "delta": {"content": "Hel"}}]}"#,
        )
        .unwrap();
        assert_eq!(chunk_events(chunk), vec![StreamEvent::ContentDelta("Hel".into())]);
    }

    #[test]
    fn error_payload_becomes_an_error_event() {
        let chunk: StreamChunk =
            serde_json::from_str(r#"{"error": {"message": "model overloaded"}}"#).unwrap();
        assert_eq!(
            chunk_events(chunk),
            vec![StreamEvent::Error("model overloaded".into())]
        );
    }

    #[test]
    fn non_first_choices_are_ignored() {
        let chunk: StreamChunk = serde_json::from_str(
            r#"{"choices": [{"index": 1, "delta": {"content": "ignored"}}]}"#,
        )
        .unwrap();
        assert!(chunk_events(chunk).is_empty());
    }

    #[test]
    fn empty_and_missing_deltas_yield_no_events() {
        let empty: StreamChunk = serde_json::from_str(
            r#"{"choices": [{"index": 0, "delta": {"content": ""}}]}"#,
        )
        .unwrap();
        assert!(chunk_events(empty).is_empty());

        let finish_only: StreamChunk = serde_json::from_str(
            r#"{"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]}"#,
        )
        .unwrap();
        assert!(chunk_events(finish_only).is_empty());
    }
}
