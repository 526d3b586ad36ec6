//! Automation hub API client
//!
//! `CommandBackend` is the narrow seam the dispatcher talks through;
//! `HubClient` is the production implementation over the hub's HTTP API.
//! Key resolution can fail as an error (the caller decides what to tell
//! the user), but a command run never does: every failure mode maps to
//! an [`ExecOutcome`] variant so reporting stays exhaustive.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::error::{Error, Result};

/// Extra HTTP budget on top of the hub-side wait for a command run.
const RUN_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Classified result of one command run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Exit code 0. `out` carries the command output when there was any.
    Completed { out: Option<String> },

    /// Nonzero exit code.
    Failed { exitcode: i64 },

    /// The wait budget elapsed with the command still running.
    Pending,

    /// The acting key may not run this command.
    AccessDenied,

    /// No such command on the hub.
    NotFound,

    /// Everything else (transport trouble, hub errors, bad payloads).
    Other(String),
}

/// Command-execution backend consumed by the dispatcher.
#[async_trait]
pub trait CommandBackend: Send + Sync {
    /// Resolve a raw API key to its key id. `Ok(None)` means the hub does
    /// not know the key.
    async fn resolve_key(&self, raw_key: &str) -> Result<Option<String>>;

    /// Run a command as `key_id`, waiting up to the configured budget,
    /// and classify whatever came back.
    async fn run(&self, key_id: &str, name: &str, args: &str, chat_id: &str) -> ExecOutcome;
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    key_id: String,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    exitcode: Option<i64>,
    out: Option<String>,
}

/// HTTP client for the automation hub API.
#[derive(Clone)]
pub struct HubClient {
    client: Client,
    base_url: String,
    service_key: String,
    wait: f64,
}

impl HubClient {
    /// Create a new hub client.
    ///
    /// `timeout` bounds every call except command runs, which get their
    /// own per-request budget of `wait` plus a fixed margin because the
    /// hub holds the request open while the command executes.
    pub fn new(base_url: &str, service_key: &str, timeout: Duration, wait: f64) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            wait,
        })
    }

    /// Add authorization header
    fn add_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(&self.service_key)
    }
}

#[async_trait]
impl CommandBackend for HubClient {
    async fn resolve_key(&self, raw_key: &str) -> Result<Option<String>> {
        let url = format!("{}/v1/key/resolve", self.base_url);

        debug!("Resolving API key against hub");

        let response = self
            .add_auth(self.client.post(&url).json(&json!({ "key": raw_key })))
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("Hub does not know this key");
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Key resolve failed: {} - {}", status, error_text);
            return Err(Error::Hub(format!("{}: {}", status, error_text)));
        }

        let resolved: ResolveResponse = response.json().await.map_err(Error::Http)?;
        Ok(Some(resolved.key_id))
    }

    async fn run(&self, key_id: &str, name: &str, args: &str, chat_id: &str) -> ExecOutcome {
        let url = format!("{}/v1/run", self.base_url);
        let body = json!({
            "key_id": key_id,
            "command": name,
            "args": args,
            "context": { "chat_id": chat_id },
            "wait": self.wait,
        });

        debug!("Running command {} as {}", name, key_id);

        let request_timeout = Duration::from_secs_f64(self.wait) + RUN_TIMEOUT_MARGIN;

        let response = match self
            .add_auth(self.client.post(&url).timeout(request_timeout).json(&body))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Command run request failed: {}", e);
                return ExecOutcome::Other(e.to_string());
            }
        };

        let status = response.status();
        match status {
            StatusCode::FORBIDDEN => return ExecOutcome::AccessDenied,
            StatusCode::NOT_FOUND => return ExecOutcome::NotFound,
            status if !status.is_success() => {
                let error_text = response.text().await.unwrap_or_default();
                error!("Command run failed: {} - {}", status, error_text);
                return ExecOutcome::Other(format!("{}: {}", status, error_text));
            }
            _ => {}
        }

        let run: RunResponse = match response.json().await {
            Ok(run) => run,
            Err(e) => {
                error!("Command run response unreadable: {}", e);
                return ExecOutcome::Other(e.to_string());
            }
        };

        debug!("Command {} finished with exitcode {:?}", name, run.exitcode);

        match run.exitcode {
            None => ExecOutcome::Pending,
            Some(0) => ExecOutcome::Completed {
                out: run.out.filter(|out| !out.is_empty()),
            },
            Some(code) => ExecOutcome::Failed { exitcode: code },
        }
    }
}
