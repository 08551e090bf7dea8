//! Chat-completion clients for OpenAI-compatible backends.
//!
//! The worker drives exactly one streaming call through the
//! [`CompletionClient`] seam; [`openai`] holds the HTTP implementation and
//! [`sse`] the wire-level event framing.

pub mod openai;
pub mod sse;

use crate::config::{Config, ModelId};
use crate::logging::WorkerLog;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directive appended to the user prompt to make a compatible model skip
/// extended reasoning before answering.
pub const NO_THINK_SUFFIX: &str = " /no_think";

/// Parameters for one streaming chat completion.
#[derive(Debug, Clone)]
pub struct ChatParams {
    /// Model to request.
    pub model: ModelId,
    /// System message, sent verbatim.
    pub system_prompt: String,
    /// User prompt, subject to the directive-suffix policy.
    pub user_prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling parameter.
    pub top_p: f32,
    /// Allow the model its extended reasoning phase.
    pub enable_thinking: bool,
}

impl ChatParams {
    /// Parameters for the single completion a worker runs, taken from the
    /// shared config. Extended reasoning stays disabled.
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.model,
            system_prompt: config.system_prompt.clone(),
            user_prompt: config.user_prompt.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            enable_thinking: false,
        }
    }
}

/// Content of the transmitted user message.
///
/// The directive is appended only when extended reasoning is disabled and
/// the model understands it. In every other case the user prompt is
/// dropped entirely and the empty string is sent — not the unsuffixed
/// prompt. Downstream behavior depends on the empty-message form, so both
/// branches are kept as-is.
pub fn user_message_content(model: ModelId, user_prompt: &str, enable_thinking: bool) -> String {
    if !enable_thinking && model.supports_no_think() {
        format!("{user_prompt}{NO_THINK_SUFFIX}")
    } else {
        String::new()
    }
}

/// Streaming client seam between the worker and the transport.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one streaming chat completion to exhaustion, forwarding
    /// incremental tokens to `sink`, and return the assembled final
    /// message.
    async fn stream_chat(&self, params: &ChatParams, sink: &WorkerLog)
        -> Result<String, StreamError>;

    /// Provider identifier.
    fn provider_name(&self) -> &str;
}

/// OpenAI-compatible chat request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Backend model identifier.
    pub model: String,
    /// Conversation messages, system first.
    pub messages: Vec<Message>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling parameter.
    pub top_p: f32,
    /// Always true for this harness.
    pub stream: bool,
}

/// Chat message (OpenAI-compatible format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message role (`system`, `user`, `assistant`).
    pub role: String,
    /// Message text.
    pub content: String,
}

/// Event decoded from the response stream.
///
/// Only these two tags trigger action; any other payload shape the
/// transport emits is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental completion text.
    ContentDelta(String),
    /// In-band error reported by the backend; the stream keeps going.
    Error(String),
}

/// Failures raised by a streaming chat-completion call.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Credentials rejected (401/403).
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// Backend rate limit hit (429).
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// Request rejected as malformed (400).
    #[error("malformed request: {0}")]
    InvalidRequest(String),

    /// Transport-level connection failure.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Backend internal error (500).
    #[error("backend internal error: {0}")]
    Server(String),

    /// Transport-enforced timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Any other non-success HTTP status.
    #[error("backend returned status {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Response body text.
        message: String,
    },

    /// Backend error without a more specific classification.
    #[error("backend error: {0}")]
    Api(String),

    /// Anything the taxonomy does not cover.
    #[error("{0}")]
    Other(String),
}

impl StreamError {
    /// Classify a non-success HTTP status plus body text.
    pub fn from_status(code: u16, message: String) -> Self {
        match code {
            401 | 403 => StreamError::Auth(message),
            429 => StreamError::RateLimited(message),
            400 => StreamError::InvalidRequest(message),
            500 => StreamError::Server(message),
            _ => StreamError::Status { code, message },
        }
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StreamError::Timeout(err.to_string())
        } else if err.is_body() || err.is_decode() {
            StreamError::Api(err.to_string())
        } else {
            StreamError::Connection(err.to_string())
        }
    }
}
