//! Fan-out dispatch: build the shared config once, launch N workers, and
//! join them all before returning.

use crate::config::{Config, EngineKind, ModelId};
use crate::endpoint::EngineEndpoint;
use crate::worker;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// System prompt file, read once at startup.
pub const SYSTEM_PROMPT_PATH: &str = "./prompts/system.txt";
/// User prompt file, read once at startup.
pub const USER_PROMPT_PATH: &str = "./prompts/user.txt";

/// Read a prompt file verbatim.
pub fn load_prompt(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read prompt file: {}", path.display()))
}

/// Load the prompts, build the one shared [`Config`], and dispatch.
pub async fn run(num_workers: usize, multiport: bool) -> Result<()> {
    let system_prompt = load_prompt(SYSTEM_PROMPT_PATH)?;
    let user_prompt = load_prompt(USER_PROMPT_PATH)?;

    let config = Config {
        engine: EngineKind::Ollama,
        model: ModelId::Qwen3_32bCm,
        multiport,
        system_prompt,
        user_prompt,
        temperature: 0.0,
        top_p: 0.0,
        log_folder: PathBuf::from("./logs"),
    };

    dispatch(config, num_workers).await
}

/// Spawn one task per worker and wait for every one of them.
///
/// Worker outcomes are not aggregated; they are visible only in the
/// per-worker logs.
pub async fn dispatch(config: Config, num_workers: usize) -> Result<()> {
    // Endpoint configuration is a precondition shared by every worker;
    // check it before anything is spawned.
    EngineEndpoint::from_env(config.engine).context("endpoint configuration invalid")?;

    tracing::info!(
        num_workers,
        multiport = config.multiport,
        model = %config.model,
        "Dispatching workers"
    );

    let config = Arc::new(config);
    let mut handles = Vec::with_capacity(num_workers);
    for id in 0..num_workers {
        let config = Arc::clone(&config);
        handles.push(tokio::spawn(worker::run_job(id, config)));
    }

    for (id, handle) in handles.into_iter().enumerate() {
        if let Err(err) = handle.await {
            tracing::error!(worker = id, error = %err, "worker task panicked");
        }
    }

    tracing::info!("All workers finished");
    Ok(())
}
