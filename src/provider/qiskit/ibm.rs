// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! IBM Quantum runtime via the REST API.
//!
//! # Architecture
//!
//! [`IbmRuntimeService`] is generic over [`IbmHttpClient`], so the backend
//! lookup, job submission and polling run against [`MockIbmClient`] in tests
//! and [`ReqwestIbmClient`] in production. [`IbmRuntimeFactory`] wires the
//! production client from [`RuntimeConfig`].
//!
//! Endpoints, relative to the channel base URL:
//!
//! - `GET  /backends/{name}/status`
//! - `POST /jobs` (sampler program, OpenQASM 3.0 circuit)
//! - `GET  /jobs/{id}/results`

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::circuit::Circuit;
use super::runtime::{RuntimeBackend, RuntimeService, RuntimeServiceFactory};
use crate::config::RuntimeConfig;
use crate::error::ProviderClientError;
use crate::provider::normalize::RawCounts;

/// IBM job request (sampler primitive).
#[derive(Debug, Clone, Serialize)]
pub struct IbmJobRequest {
    /// Program ID ("sampler").
    pub program_id: String,
    /// Backend name.
    pub backend: String,
    /// Input parameters.
    pub params: IbmJobParams,
    /// Job tags.
    pub tags: Vec<String>,
}

/// IBM job input parameters.
#[derive(Debug, Clone, Serialize)]
pub struct IbmJobParams {
    /// OpenQASM 3.0 circuits.
    pub circuits: Vec<String>,
    /// Number of shots.
    pub shots: u32,
    /// Optimization level (0-3).
    pub optimization_level: u32,
}

/// IBM job submission response.
#[derive(Debug, Deserialize)]
pub struct IbmJobResponse {
    /// Job ID.
    pub id: String,
}

/// IBM job result.
#[derive(Debug, Clone, Deserialize)]
pub struct IbmJobResult {
    /// Job status.
    pub status: String,
    /// Result data.
    #[serde(default)]
    pub results: Option<Vec<IbmCircuitResult>>,
}

/// Result of a single circuit execution.
#[derive(Debug, Clone, Deserialize)]
pub struct IbmCircuitResult {
    /// Measurement counts, keyed by bitstring or hex value.
    pub counts: HashMap<String, u64>,
    /// Shots executed.
    #[serde(default)]
    pub shots: Option<u64>,
}

/// IBM backend status.
#[derive(Debug, Clone, Deserialize)]
pub struct IbmBackendStatus {
    /// Whether the backend accepts jobs.
    #[serde(default)]
    pub state: Option<bool>,
    /// Free-form status text.
    #[serde(default)]
    pub status: Option<String>,
}

impl IbmJobResult {
    /// Whether the job reached a successful terminal state.
    pub fn is_done(&self) -> bool {
        matches!(self.status.as_str(), "DONE" | "Completed")
    }

    /// Whether the job reached a failed terminal state.
    pub fn is_failed(&self) -> bool {
        matches!(
            self.status.as_str(),
            "FAILED" | "Failed" | "CANCELLED" | "Cancelled" | "ERROR"
        )
    }
}

/// Error for a non-success HTTP status returned by `operation`.
pub fn http_status_error(operation: &str, status: u16, body: &str) -> ProviderClientError {
    match status {
        401 | 403 => ProviderClientError::ExecutionFailed(format!(
            "{operation} rejected credentials ({status}): {body}"
        )),
        _ => ProviderClientError::ExecutionFailed(format!("{operation} returned {status}: {body}")),
    }
}

/// Error for a failed backend status lookup; 404 means the name is unknown.
pub fn backend_status_error(backend: &str, status: u16, body: &str) -> ProviderClientError {
    if status == 404 {
        ProviderClientError::BackendNotFound(backend.to_string())
    } else {
        http_status_error(&format!("backend lookup for {backend}"), status, body)
    }
}

/// HTTP operations against the IBM Quantum runtime API.
#[async_trait]
pub trait IbmHttpClient: Send + Sync {
    /// Fetch the status of a backend.
    async fn backend_status(&self, backend: &str) -> Result<IbmBackendStatus, ProviderClientError>;

    /// Submit a job and return its ID.
    async fn submit_job(&self, request: &IbmJobRequest) -> Result<String, ProviderClientError>;

    /// Get the current result of a submitted job.
    async fn get_job_result(&self, job_id: &str) -> Result<IbmJobResult, ProviderClientError>;
}

#[cfg(feature = "runtime")]
mod http {
    use super::*;
    use secrecy::{ExposeSecret, SecretString};

    /// Production HTTP client using reqwest.
    pub struct ReqwestIbmClient {
        http: reqwest::Client,
        base_url: String,
        token: SecretString,
        instance: Option<String>,
    }

    impl ReqwestIbmClient {
        /// Client for `base_url`, authenticating with `token` and, when set,
        /// routing to `instance` through the `Service-CRN` header.
        pub fn new(
            http: reqwest::Client,
            base_url: impl Into<String>,
            token: &str,
            instance: Option<String>,
        ) -> Self {
            Self {
                http,
                base_url: base_url.into().trim_end_matches('/').to_string(),
                token: SecretString::from(token.to_string()),
                instance,
            }
        }

        fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
            let builder = builder.bearer_auth(self.token.expose_secret());
            match &self.instance {
                Some(crn) => builder.header("Service-CRN", crn),
                None => builder,
            }
        }

        async fn send(
            &self,
            operation: &str,
            builder: reqwest::RequestBuilder,
        ) -> Result<reqwest::Response, ProviderClientError> {
            self.authorized(builder).send().await.map_err(|e| {
                if e.is_timeout() {
                    ProviderClientError::Timeout(format!("{operation}: {e}"))
                } else {
                    ProviderClientError::Transport(format!("{operation}: {e}"))
                }
            })
        }

        async fn parse<T: serde::de::DeserializeOwned>(
            operation: &str,
            response: reqwest::Response,
        ) -> Result<T, ProviderClientError> {
            response.json::<T>().await.map_err(|e| {
                ProviderClientError::ExecutionFailed(format!(
                    "Failed to parse {operation} response: {e}"
                ))
            })
        }
    }

    impl std::fmt::Debug for ReqwestIbmClient {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ReqwestIbmClient")
                .field("base_url", &self.base_url)
                .field("token", &"[REDACTED]")
                .field("instance", &self.instance)
                .finish()
        }
    }

    #[async_trait]
    impl IbmHttpClient for ReqwestIbmClient {
        async fn backend_status(
            &self,
            backend: &str,
        ) -> Result<IbmBackendStatus, ProviderClientError> {
            let url = format!("{}/backends/{}/status", self.base_url, backend);
            let response = self.send("backend lookup", self.http.get(&url)).await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(backend_status_error(backend, status.as_u16(), &body));
            }
            Self::parse("backend status", response).await
        }

        async fn submit_job(&self, request: &IbmJobRequest) -> Result<String, ProviderClientError> {
            let url = format!("{}/jobs", self.base_url);
            let response = self
                .send("submit_job", self.http.post(&url).json(request))
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(http_status_error("submit_job", status.as_u16(), &body));
            }
            let job: IbmJobResponse = Self::parse("submit_job", response).await?;
            Ok(job.id)
        }

        async fn get_job_result(&self, job_id: &str) -> Result<IbmJobResult, ProviderClientError> {
            let url = format!("{}/jobs/{}/results", self.base_url, job_id);
            let response = self.send("get_job_result", self.http.get(&url)).await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(http_status_error("get_job_result", status.as_u16(), &body));
            }
            Self::parse("get_job_result", response).await
        }
    }

    /// Production factory talking to the IBM Quantum runtime REST API.
    ///
    /// The HTTP client is built once here and shared by every service the
    /// factory hands out.
    pub struct IbmRuntimeFactory {
        http: Result<reqwest::Client, String>,
    }

    impl IbmRuntimeFactory {
        /// Create the factory and its HTTP client.
        pub fn new() -> Self {
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| format!("Failed to create HTTP client: {e}"));
            Self { http }
        }
    }

    impl Default for IbmRuntimeFactory {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RuntimeServiceFactory for IbmRuntimeFactory {
        fn connect(
            &self,
            config: &RuntimeConfig,
        ) -> Result<Arc<dyn RuntimeService>, ProviderClientError> {
            let http = self
                .http
                .clone()
                .map_err(ProviderClientError::DependencyUnavailable)?;

            let token = config.token().ok_or_else(|| {
                ProviderClientError::MissingCredentials("IBM runtime token not configured".into())
            })?;

            let base_url = config.base_url().map_err(|e| {
                ProviderClientError::InvalidRequest(format!("Runtime configuration: {e}"))
            })?;

            let client = ReqwestIbmClient::new(http, base_url, token, config.instance.clone());
            let service: Arc<dyn RuntimeService> = Arc::new(IbmRuntimeService::new(
                Arc::new(client),
                Duration::from_millis(config.poll_interval_ms),
            ));
            Ok(service)
        }
    }
}

#[cfg(feature = "runtime")]
pub use http::{IbmRuntimeFactory, ReqwestIbmClient};

/// Placeholder when the `runtime` feature is not compiled in.
#[cfg(not(feature = "runtime"))]
#[derive(Debug, Default)]
pub struct IbmRuntimeFactory;

#[cfg(not(feature = "runtime"))]
impl IbmRuntimeFactory {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(feature = "runtime"))]
impl RuntimeServiceFactory for IbmRuntimeFactory {
    fn connect(
        &self,
        _config: &RuntimeConfig,
    ) -> Result<Arc<dyn RuntimeService>, ProviderClientError> {
        Err(ProviderClientError::DependencyUnavailable(
            "IBM runtime requires the 'runtime' feature flag".into(),
        ))
    }
}

/// Runtime service session over an [`IbmHttpClient`].
pub struct IbmRuntimeService<C> {
    client: Arc<C>,
    poll_interval: Duration,
}

impl<C: IbmHttpClient> IbmRuntimeService<C> {
    /// Session polling job results every `poll_interval`.
    pub fn new(client: Arc<C>, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }
}

#[async_trait]
impl<C: IbmHttpClient + 'static> RuntimeService for IbmRuntimeService<C> {
    async fn backend(&self, name: &str) -> Result<Arc<dyn RuntimeBackend>, ProviderClientError> {
        let status = self.client.backend_status(name).await?;
        if status.state == Some(false) {
            return Err(ProviderClientError::ExecutionFailed(format!(
                "Backend {} is not accepting jobs (status: {})",
                name,
                status.status.as_deref().unwrap_or("unknown")
            )));
        }

        debug!(backend = %name, status = ?status.status, "Resolved IBM backend");
        Ok(Arc::new(IbmRuntimeBackend {
            client: self.client.clone(),
            name: name.to_string(),
            poll_interval: self.poll_interval,
        }))
    }
}

/// A resolved IBM backend.
pub struct IbmRuntimeBackend<C> {
    client: Arc<C>,
    name: String,
    poll_interval: Duration,
}

#[async_trait]
impl<C: IbmHttpClient + 'static> RuntimeBackend for IbmRuntimeBackend<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn sample(
        &self,
        circuit: &Circuit,
        shots: u32,
    ) -> Result<RawCounts, ProviderClientError> {
        let request = IbmJobRequest {
            program_id: "sampler".to_string(),
            backend: self.name.clone(),
            params: IbmJobParams {
                circuits: vec![circuit.to_qasm()],
                shots,
                optimization_level: 1,
            },
            tags: vec![circuit.name().to_string()],
        };

        let job_id = self.client.submit_job(&request).await?;
        info!(job_id = %job_id, backend = %self.name, shots, "IBM job submitted");

        // The caller bounds the whole run, so polling has no deadline of its own.
        loop {
            let result = self.client.get_job_result(&job_id).await?;

            if result.is_done() {
                let circuit_result = result
                    .results
                    .and_then(|r| r.into_iter().next())
                    .ok_or_else(|| {
                        ProviderClientError::ExecutionFailed(format!(
                            "No circuit results in IBM job {job_id}"
                        ))
                    })?;
                return Ok(circuit_result.counts);
            }

            if result.is_failed() {
                return Err(ProviderClientError::ExecutionFailed(format!(
                    "IBM job {job_id} failed with status: {}",
                    result.status
                )));
            }

            debug!(job_id = %job_id, status = %result.status, "IBM job still running");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Mock IBM client for testing.
///
/// Job results are handed out in order; the last one repeats.
pub struct MockIbmClient {
    pub status_response: Result<IbmBackendStatus, ProviderClientError>,
    pub submit_response: Result<String, ProviderClientError>,
    result_responses: Mutex<VecDeque<Result<IbmJobResult, ProviderClientError>>>,
    submitted: Mutex<Vec<IbmJobRequest>>,
    polls: AtomicUsize,
}

impl MockIbmClient {
    /// Mock answering job polls with `results` in sequence.
    pub fn with_results(results: Vec<Result<IbmJobResult, ProviderClientError>>) -> Self {
        Self {
            result_responses: Mutex::new(results.into()),
            ..Default::default()
        }
    }

    /// Requests passed to `submit_job` so far.
    pub fn submitted(&self) -> Vec<IbmJobRequest> {
        self.submitted.lock().clone()
    }

    /// Number of result polls so far.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl Default for MockIbmClient {
    fn default() -> Self {
        Self {
            status_response: Ok(IbmBackendStatus {
                state: Some(true),
                status: Some("active".to_string()),
            }),
            submit_response: Ok("mock-job-id".to_string()),
            result_responses: Mutex::new(VecDeque::from([Ok(IbmJobResult {
                status: "DONE".to_string(),
                results: Some(vec![]),
            })])),
            submitted: Mutex::new(Vec::new()),
            polls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IbmHttpClient for MockIbmClient {
    async fn backend_status(
        &self,
        _backend: &str,
    ) -> Result<IbmBackendStatus, ProviderClientError> {
        self.status_response.clone()
    }

    async fn submit_job(&self, request: &IbmJobRequest) -> Result<String, ProviderClientError> {
        self.submitted.lock().push(request.clone());
        self.submit_response.clone()
    }

    async fn get_job_result(&self, _job_id: &str) -> Result<IbmJobResult, ProviderClientError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.result_responses.lock();
        if queue.len() > 1 {
            if let Some(next) = queue.pop_front() {
                return next;
            }
        }
        queue.front().cloned().unwrap_or_else(|| {
            Err(ProviderClientError::ExecutionFailed(
                "No job result queued".into(),
            ))
        })
    }
}
