//! Worker job: one end-to-end streaming completion per worker.
//!
//! A worker owns its logger and client exclusively. Every failure is
//! caught, classified, and logged in the worker's own file; nothing
//! propagates to the dispatcher or to sibling workers. The terminal
//! "Exiting" record is written on every exit path.

use crate::config::Config;
use crate::endpoint::resolve_client;
use crate::logging::WorkerLog;
use crate::providers::{ChatParams, CompletionClient, StreamError};
use std::sync::Arc;

/// Failure classification for a streaming call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Credentials rejected.
    Authentication,
    /// Backend rate limit hit.
    RateLimit,
    /// Request rejected as malformed.
    BadRequest,
    /// Transport-level connection failure.
    Connection,
    /// Backend internal error.
    InternalServer,
    /// Transport-enforced timeout.
    Timeout,
    /// Other non-success HTTP status.
    Status,
    /// Backend error without a more specific classification.
    Api,
    /// Unclassified fallback.
    Unknown,
}

/// Map a stream failure onto its taxonomy kind.
pub fn classify(err: &StreamError) -> FailureKind {
    match err {
        StreamError::Auth(_) => FailureKind::Authentication,
        StreamError::RateLimited(_) => FailureKind::RateLimit,
        StreamError::InvalidRequest(_) => FailureKind::BadRequest,
        StreamError::Connection(_) => FailureKind::Connection,
        StreamError::Server(_) => FailureKind::InternalServer,
        StreamError::Timeout(_) => FailureKind::Timeout,
        StreamError::Status { .. } => FailureKind::Status,
        StreamError::Api(_) => FailureKind::Api,
        StreamError::Other(_) => FailureKind::Unknown,
    }
}

/// Deterministic label for a worker id; also names its log file.
pub fn worker_label(id: usize) -> String {
    format!("W{id:02}")
}

/// Writes the terminal "Exiting" record when dropped, so it runs on every
/// exit path.
struct ExitGuard {
    log: Arc<WorkerLog>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.log.info("Exiting");
    }
}

/// Run one worker end to end. Never returns an error; every failure is
/// logged and swallowed.
pub async fn run_job(id: usize, config: Arc<Config>) {
    let label = worker_label(id);

    let log = match WorkerLog::get_or_create(&label, &config.log_folder) {
        Ok(log) => log,
        Err(err) => {
            tracing::error!(worker = %label, error = %err, "failed to open log sink");
            return;
        }
    };
    let _exit = ExitGuard {
        log: Arc::clone(&log),
    };

    log.info("Created logger");
    log.info(format!("Worker ID: {id}"));
    if let Ok(dump) = serde_json::to_string_pretty(config.as_ref()) {
        log.info(format!("Config:\n{dump}"));
    }

    let client = match resolve_client(config.engine, id, config.multiport) {
        Ok(client) => client,
        Err(err) => {
            log.error(format!("Invalid endpoint configuration. ({err})"));
            return;
        }
    };
    log.info("Created client");

    let params = ChatParams::from_config(&config);
    complete_and_log(&client, &params, &log).await;
}

/// Drive the streaming call and write the terminal success or failure
/// record. Split from [`run_job`] so tests can substitute the client.
pub async fn complete_and_log(
    client: &dyn CompletionClient,
    params: &ChatParams,
    log: &WorkerLog,
) {
    match client.stream_chat(params, log).await {
        Ok(output) => {
            log.info(format!("LLM response:\n{output}"));
            log.info("Finished successfully.");
        }
        Err(err) => log_failure(log, &err),
    }
}

/// One failure record per taxonomy kind, with the original error detail
/// attached.
fn log_failure(log: &WorkerLog, err: &StreamError) {
    log.debug(format!("failure kind: {:?}", classify(err)));
    let message = match err {
        StreamError::Auth(_) => "Authentication failed.".to_string(),
        StreamError::RateLimited(_) => "Rate limit exceeded.".to_string(),
        StreamError::InvalidRequest(_) => "Bad request.".to_string(),
        StreamError::Connection(_) => {
            "Failed to connect to the API. Check network connection.".to_string()
        }
        StreamError::Server(_) => "Internal server error.".to_string(),
        StreamError::Timeout(_) => "API timed out.".to_string(),
        StreamError::Status { code, .. } => {
            format!("API Status Error: Received status {code}.")
        }
        StreamError::Api(_) => "An unexpected error occurred in the API.".to_string(),
        StreamError::Other(_) => "An unexpected error occurred.".to_string(),
    };
    log.error(format!("{message} ({err})"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelId;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted client: either forwards deltas and returns their
    /// concatenation, or fails with the scripted error.
    struct MockClient {
        outcome: Mutex<Option<Result<Vec<&'static str>, StreamError>>>,
    }

    impl MockClient {
        fn deltas(deltas: Vec<&'static str>) -> Self {
            Self {
                outcome: Mutex::new(Some(Ok(deltas))),
            }
        }

        fn failing(err: StreamError) -> Self {
            Self {
                outcome: Mutex::new(Some(Err(err))),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for MockClient {
        async fn stream_chat(
            &self,
            _params: &ChatParams,
            sink: &WorkerLog,
        ) -> Result<String, StreamError> {
            let outcome = self
                .outcome
                .lock()
                .expect("outcome mutex poisoned")
                .take()
                .expect("mock client driven twice");
            match outcome {
                Ok(deltas) => {
                    let mut assembled = String::new();
                    for delta in deltas {
                        sink.info(delta);
                        assembled.push_str(delta);
                    }
                    Ok(assembled)
                }
                Err(err) => Err(err),
            }
        }

        fn provider_name(&self) -> &str {
            "mock"
        }
    }

    fn params() -> ChatParams {
        ChatParams {
            model: ModelId::Qwen3_32bCm,
            system_prompt: "sys".into(),
            user_prompt: "user".into(),
            temperature: 0.0,
            top_p: 0.0,
            enable_thinking: false,
        }
    }

    fn error_lines(contents: &str) -> Vec<&str> {
        contents.lines().filter(|l| l.contains("ERROR")).collect()
    }

    #[test]
    fn labels_are_deterministic_and_distinct() {
        assert_eq!(worker_label(0), "W00");
        assert_eq!(worker_label(7), "W07");
        assert_eq!(worker_label(12), "W12");
        assert_ne!(worker_label(1), worker_label(2));
    }

    #[test]
    fn classification_covers_every_kind() {
        assert_eq!(classify(&StreamError::Auth("x".into())), FailureKind::Authentication);
        assert_eq!(classify(&StreamError::RateLimited("x".into())), FailureKind::RateLimit);
        assert_eq!(classify(&StreamError::InvalidRequest("x".into())), FailureKind::BadRequest);
        assert_eq!(classify(&StreamError::Connection("x".into())), FailureKind::Connection);
        assert_eq!(classify(&StreamError::Server("x".into())), FailureKind::InternalServer);
        assert_eq!(classify(&StreamError::Timeout("x".into())), FailureKind::Timeout);
        assert_eq!(
            classify(&StreamError::Status { code: 503, message: "x".into() }),
            FailureKind::Status
        );
        assert_eq!(classify(&StreamError::Api("x".into())), FailureKind::Api);
        assert_eq!(classify(&StreamError::Other("x".into())), FailureKind::Unknown);
    }

    #[tokio::test]
    async fn successful_stream_logs_deltas_and_final_message() {
        let dir = tempfile::tempdir().unwrap();
        let log = WorkerLog::get_or_create("t-worker-ok", dir.path()).unwrap();

        let client = MockClient::deltas(vec!["Hel", "lo"]);
        {
            let _exit = ExitGuard {
                log: Arc::clone(&log),
            };
            complete_and_log(&client, &params(), &log).await;
        }

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains("[t-worker-ok] Hel"));
        assert!(contents.contains("[t-worker-ok] lo"));
        assert!(contents.contains("LLM response:\nHello"));
        assert!(contents.contains("Finished successfully."));
        assert!(error_lines(&contents).is_empty());
        assert!(contents.lines().last().unwrap().contains("Exiting"));
    }

    #[tokio::test]
    async fn rate_limited_stream_logs_one_failure_then_exits() {
        let dir = tempfile::tempdir().unwrap();
        let log = WorkerLog::get_or_create("t-worker-rl", dir.path()).unwrap();

        let client = MockClient::failing(StreamError::RateLimited("slow down".into()));
        {
            let _exit = ExitGuard {
                log: Arc::clone(&log),
            };
            complete_and_log(&client, &params(), &log).await;
        }

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let errors = error_lines(&contents);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Rate limit exceeded."));
        assert!(errors[0].contains("slow down"));
        assert!(!contents.contains("Finished successfully."));
        assert!(contents.lines().last().unwrap().contains("Exiting"));
    }

    #[tokio::test]
    async fn status_failure_record_carries_the_code() {
        let dir = tempfile::tempdir().unwrap();
        let log = WorkerLog::get_or_create("t-worker-status", dir.path()).unwrap();

        let client = MockClient::failing(StreamError::Status {
            code: 503,
            message: "unavailable".into(),
        });
        complete_and_log(&client, &params(), &log).await;

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains("API Status Error: Received status 503."));
        assert!(contents.contains("unavailable"));
    }
}
