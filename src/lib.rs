//! fanout-bench: concurrent load-testing harness for local LLM inference
//! servers.
//!
//! Dispatches N independent chat-completion requests in parallel, each
//! against a potentially distinct endpoint port, streams the response
//! tokens, and records per-worker outcomes in dedicated log files. Workers
//! are isolated: one worker's failure is classified and logged in its own
//! file and never reaches the dispatcher or its siblings.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod logging;
pub mod providers;
pub mod worker;
