//! Run configuration shared by all workers.
//!
//! The engine and model identifiers are closed enums with explicit string
//! mappings so an unsupported value is impossible to construct, rather
//! than open string fields validated at use sites.

use serde::Serialize;
use std::path::PathBuf;

/// Supported inference backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Local Ollama server speaking the OpenAI-compatible API.
    Ollama,
}

impl EngineKind {
    /// Lowercase engine identifier. Keys the environment-variable lookup
    /// and doubles as the placeholder API credential.
    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Supported model identifiers.
///
/// The `Cm` variants are custom builds with the maximum context window;
/// their identifier carries a `-cm` suffix but is otherwise the same model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelId {
    #[serde(rename = "qwen3:32b-fp16")]
    Qwen3_32b,
    #[serde(rename = "qwen3:14b-fp16")]
    Qwen3_14b,
    #[serde(rename = "qwen3:30b-a3b-fp16")]
    Qwen3A3b,
    #[serde(rename = "qwen3:30b-a3b-instruct-2507-fp16")]
    Qwen3A3b2507,
    #[serde(rename = "gpt-oss:20b")]
    GptOss20b,
    #[serde(rename = "gpt-oss:120b")]
    GptOss120b,

    #[serde(rename = "qwen3:32b-fp16-cm")]
    Qwen3_32bCm,
    #[serde(rename = "qwen3:14b-fp16-cm")]
    Qwen3_14bCm,
    #[serde(rename = "qwen3:30b-a3b-fp16-cm")]
    Qwen3A3bCm,
    #[serde(rename = "qwen3:30b-a3b-instruct-2507-fp16-cm")]
    Qwen3A3b2507Cm,
    #[serde(rename = "gpt-oss:20b-cm")]
    GptOss20bCm,
    #[serde(rename = "gpt-oss:120b-cm")]
    GptOss120bCm,
}

impl ModelId {
    /// The identifier the backend expects, verbatim.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Qwen3_32b => "qwen3:32b-fp16",
            ModelId::Qwen3_14b => "qwen3:14b-fp16",
            ModelId::Qwen3A3b => "qwen3:30b-a3b-fp16",
            ModelId::Qwen3A3b2507 => "qwen3:30b-a3b-instruct-2507-fp16",
            ModelId::GptOss20b => "gpt-oss:20b",
            ModelId::GptOss120b => "gpt-oss:120b",
            ModelId::Qwen3_32bCm => "qwen3:32b-fp16-cm",
            ModelId::Qwen3_14bCm => "qwen3:14b-fp16-cm",
            ModelId::Qwen3A3bCm => "qwen3:30b-a3b-fp16-cm",
            ModelId::Qwen3A3b2507Cm => "qwen3:30b-a3b-instruct-2507-fp16-cm",
            ModelId::GptOss20bCm => "gpt-oss:20b-cm",
            ModelId::GptOss120bCm => "gpt-oss:120b-cm",
        }
    }

    /// Whether the model family understands the `/no_think` directive.
    pub fn supports_no_think(&self) -> bool {
        self.as_str().starts_with("qwen3")
    }

    /// Whether this is a custom max-context build.
    pub fn is_custom_context(&self) -> bool {
        self.as_str().ends_with("-cm")
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable run configuration, built once by the dispatcher and shared
/// read-only across all workers.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Backend to target.
    pub engine: EngineKind,
    /// Model every worker requests.
    pub model: ModelId,
    /// When true, worker `i` targets `base_port + i`.
    pub multiport: bool,
    /// System message, sent verbatim.
    pub system_prompt: String,
    /// User prompt (subject to the directive-suffix policy at send time).
    pub user_prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling parameter.
    pub top_p: f32,
    /// Folder receiving the per-worker log files.
    pub log_folder: PathBuf,
}
