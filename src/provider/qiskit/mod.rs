// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! Qiskit-family provider client.
//!
//! One client is bound to one backend name. Each `run` resolves where that
//! name lives:
//!
//! - names the bundled simulator answers to (`aer_simulator`, `aer`, ...) run
//!   in-process and report fidelity against the ideal distribution plus the
//!   execution latency;
//! - every other name goes to the remote runtime through the injected
//!   [`RuntimeServiceFactory`], and only counts come back.
//!
//! # Architecture
//!
//! The runtime seam is a factory handed over at construction, so tests swap
//! in [`StubRuntimeFactory`] instead of reaching the network. The simulator
//! handle is built once and reused; the remote backend is re-resolved on
//! every call.

pub mod circuit;
pub mod ibm;
pub mod runtime;
pub mod simulator;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{RuntimeConfig, SimulatorConfig};
use crate::error::ProviderClientError;
use crate::provider::capability::Capabilities;
use crate::provider::normalize::{hellinger_fidelity, normalize_counts, RawCounts};
use crate::provider::{ClientKind, ExperimentPreset, ExperimentResult, ProviderClient};

use circuit::Circuit;
use ibm::IbmRuntimeFactory;
use runtime::RuntimeServiceFactory;
use simulator::LocalSimulator;

pub use runtime::StubRuntimeFactory;

/// Where a backend name is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendRoute {
    /// Bundled state-vector simulator
    LocalSimulator,
    /// Authenticated remote runtime service
    Runtime,
}

/// Provider client for Qiskit-style backends.
pub struct QiskitProviderClient {
    backend_name: String,
    runtime: RuntimeConfig,
    capabilities: Capabilities,
    simulator: LocalSimulator,
    runtime_factory: Arc<dyn RuntimeServiceFactory>,
}

impl QiskitProviderClient {
    /// Client for `backend_name`, configured from the process environment.
    pub fn new(backend_name: impl Into<String>) -> Self {
        Self::from_config(
            backend_name,
            &RuntimeConfig::from_env(),
            &SimulatorConfig::default(),
        )
    }

    /// Client for `backend_name` with explicit settings and the production runtime.
    pub fn from_config(
        backend_name: impl Into<String>,
        runtime: &RuntimeConfig,
        simulator: &SimulatorConfig,
    ) -> Self {
        Self::with_factory(
            backend_name,
            runtime,
            simulator,
            Arc::new(IbmRuntimeFactory::new()),
        )
    }

    /// Client for `backend_name` sharing an existing runtime service factory.
    pub fn with_factory(
        backend_name: impl Into<String>,
        runtime: &RuntimeConfig,
        simulator: &SimulatorConfig,
        runtime_factory: Arc<dyn RuntimeServiceFactory>,
    ) -> Self {
        Self {
            backend_name: backend_name.into(),
            runtime: runtime.clone(),
            capabilities: Capabilities::detect(),
            simulator: LocalSimulator::new(simulator.clone()),
            runtime_factory,
        }
    }

    /// Override the capability flags taken at construction.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Replace the runtime service factory.
    pub fn with_runtime_factory(mut self, factory: Arc<dyn RuntimeServiceFactory>) -> Self {
        self.runtime_factory = factory;
        self
    }

    /// Capability flags in effect.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Runtime settings snapshot.
    pub fn runtime_config(&self) -> &RuntimeConfig {
        &self.runtime
    }

    /// Route the configured backend name resolves to.
    pub fn route(&self) -> BackendRoute {
        if LocalSimulator::handles(&self.backend_name) {
            BackendRoute::LocalSimulator
        } else {
            BackendRoute::Runtime
        }
    }

    fn check_shots(&self, shots: u32) -> Result<(), ProviderClientError> {
        if shots == 0 {
            return Err(ProviderClientError::InvalidRequest(
                "shots must be a positive integer".into(),
            ));
        }
        let max = self.simulator.config().max_shots;
        if shots > max {
            return Err(ProviderClientError::InvalidRequest(format!(
                "{} shots exceeds the limit of {}",
                shots, max
            )));
        }
        Ok(())
    }

    async fn run_local(
        &self,
        circuit: Circuit,
        shots: u32,
    ) -> Result<ExperimentResult, ProviderClientError> {
        let simulator = self.simulator.clone();
        let outcome = tokio::task::spawn_blocking(move || simulator.sample(&circuit, shots))
            .await
            .map_err(|e| {
                ProviderClientError::ExecutionFailed(format!("Simulation task failed: {e}"))
            })??;

        let fidelity = hellinger_fidelity(&outcome.counts, &outcome.ideal);
        let latency_us = outcome.elapsed.as_secs_f64() * 1e6;

        Ok(ExperimentResult::with_telemetry(
            outcome.counts,
            shots,
            fidelity,
            latency_us,
        ))
    }

    async fn run_remote(
        &self,
        circuit: Circuit,
        shots: u32,
    ) -> Result<ExperimentResult, ProviderClientError> {
        if !self.capabilities.runtime {
            return Err(ProviderClientError::DependencyUnavailable(
                "Remote runtime support is not available in this build".into(),
            ));
        }

        if self.runtime_factory.requires_token() && self.runtime.token().is_none() {
            return Err(ProviderClientError::MissingCredentials(format!(
                "No runtime token configured for backend '{}'",
                self.backend_name
            )));
        }

        let timeout = Duration::from_secs(self.runtime.timeout_sec);
        let raw = tokio::time::timeout(timeout, self.execute_remote(&circuit, shots))
            .await
            .map_err(|_| {
                ProviderClientError::Timeout(format!(
                    "Backend '{}' did not complete within {}s",
                    self.backend_name, self.runtime.timeout_sec
                ))
            })??;

        let counts = normalize_counts(raw, circuit.num_clbits(), shots)?;
        Ok(ExperimentResult::counts_only(counts, shots))
    }

    async fn execute_remote(
        &self,
        circuit: &Circuit,
        shots: u32,
    ) -> Result<RawCounts, ProviderClientError> {
        let service = self.runtime_factory.connect(&self.runtime)?;
        let backend = service.backend(&self.backend_name).await?;
        debug!(backend = %backend.name(), "Runtime backend resolved");
        backend.sample(circuit, shots).await
    }
}

impl std::fmt::Debug for QiskitProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QiskitProviderClient")
            .field("backend_name", &self.backend_name)
            .field("route", &self.route())
            .field("capabilities", &self.capabilities)
            .field("runtime", &self.runtime)
            .finish()
    }
}

#[async_trait]
impl ProviderClient for QiskitProviderClient {
    fn backend_name(&self) -> &str {
        &self.backend_name
    }

    fn kind(&self) -> ClientKind {
        ClientKind::Qiskit
    }

    async fn run(
        &self,
        preset: ExperimentPreset,
        shots: u32,
    ) -> Result<ExperimentResult, ProviderClientError> {
        self.check_shots(shots)?;

        if !self.capabilities.simulator {
            return Err(ProviderClientError::DependencyUnavailable(
                "Qiskit simulation support is not available in this build".into(),
            ));
        }

        let run_id = uuid::Uuid::new_v4();
        let route = self.route();
        info!(
            run_id = %run_id,
            backend = %self.backend_name,
            preset = %preset,
            shots,
            route = ?route,
            "Running experiment"
        );

        let circuit = Circuit::for_preset(preset);
        let result = match route {
            BackendRoute::LocalSimulator => self.run_local(circuit, shots).await,
            BackendRoute::Runtime => self.run_remote(circuit, shots).await,
        };

        match &result {
            Ok(r) => info!(
                run_id = %run_id,
                outcomes = r.raw_counts.len(),
                fidelity = ?r.fidelity,
                "Experiment complete"
            ),
            Err(e) => warn!(run_id = %run_id, code = e.code(), error = %e, "Experiment failed"),
        }

        result
    }
}
