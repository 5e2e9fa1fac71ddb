// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! Remote runtime service abstraction.
//!
//! A [`RuntimeServiceFactory`] is handed to the client at construction. The
//! client asks it for a [`RuntimeService`] on every remote run, resolves the
//! backend name through the service, and submits the circuit to the returned
//! [`RuntimeBackend`].
//!
//! - [`IbmRuntimeFactory`](super::ibm::IbmRuntimeFactory): IBM Quantum runtime
//!   REST API (requires `runtime` feature)
//! - [`StubRuntimeFactory`]: in-process double backed by the bundled simulator

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::circuit::Circuit;
use super::simulator::LocalSimulator;
use crate::config::RuntimeConfig;
use crate::error::ProviderClientError;
use crate::provider::normalize::RawCounts;

/// A backend resolved through a runtime service.
#[async_trait]
pub trait RuntimeBackend: Send + Sync {
    /// Name the service resolved.
    fn name(&self) -> &str;

    /// Execute `circuit` for `shots` repetitions and return raw counts.
    async fn sample(
        &self,
        circuit: &Circuit,
        shots: u32,
    ) -> Result<RawCounts, ProviderClientError>;
}

/// An authenticated session with a runtime service.
#[async_trait]
pub trait RuntimeService: Send + Sync {
    /// Resolve `name` to a concrete backend.
    async fn backend(&self, name: &str) -> Result<Arc<dyn RuntimeBackend>, ProviderClientError>;
}

/// Produces runtime services from runtime configuration.
pub trait RuntimeServiceFactory: Send + Sync {
    /// Whether a configured access token is needed before connecting.
    fn requires_token(&self) -> bool {
        true
    }

    /// Open a service session.
    fn connect(
        &self,
        config: &RuntimeConfig,
    ) -> Result<Arc<dyn RuntimeService>, ProviderClientError>;
}

/// Factory for [`StubRuntimeService`]. Needs no token.
pub struct StubRuntimeFactory {
    service: Arc<StubRuntimeService>,
}

impl StubRuntimeFactory {
    /// Stub whose backends all run on `simulator`.
    pub fn new(simulator: LocalSimulator) -> Self {
        Self {
            service: Arc::new(StubRuntimeService {
                simulator,
                last_backend_name: Mutex::new(None),
                connections: AtomicUsize::new(0),
            }),
        }
    }

    /// Backend name most recently requested through any session.
    pub fn last_backend_name(&self) -> Option<String> {
        self.service.last_backend_name.lock().clone()
    }

    /// Number of sessions opened so far.
    pub fn connections(&self) -> usize {
        self.service.connections.load(Ordering::SeqCst)
    }
}

impl Default for StubRuntimeFactory {
    fn default() -> Self {
        Self::new(LocalSimulator::default())
    }
}

impl RuntimeServiceFactory for StubRuntimeFactory {
    fn requires_token(&self) -> bool {
        false
    }

    fn connect(
        &self,
        _config: &RuntimeConfig,
    ) -> Result<Arc<dyn RuntimeService>, ProviderClientError> {
        self.service.connections.fetch_add(1, Ordering::SeqCst);
        let service: Arc<dyn RuntimeService> = self.service.clone();
        Ok(service)
    }
}

/// Runtime service that resolves every name to the bundled simulator and
/// remembers which name it was asked for.
pub struct StubRuntimeService {
    simulator: LocalSimulator,
    last_backend_name: Mutex<Option<String>>,
    connections: AtomicUsize,
}

#[async_trait]
impl RuntimeService for StubRuntimeService {
    async fn backend(&self, name: &str) -> Result<Arc<dyn RuntimeBackend>, ProviderClientError> {
        *self.last_backend_name.lock() = Some(name.to_string());
        Ok(Arc::new(SimulatorRuntimeBackend {
            name: name.to_string(),
            simulator: self.simulator.clone(),
        }))
    }
}

/// Runtime backend executing on the bundled simulator.
pub struct SimulatorRuntimeBackend {
    name: String,
    simulator: LocalSimulator,
}

#[async_trait]
impl RuntimeBackend for SimulatorRuntimeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn sample(
        &self,
        circuit: &Circuit,
        shots: u32,
    ) -> Result<RawCounts, ProviderClientError> {
        let simulator = self.simulator.clone();
        let circuit = circuit.clone();
        let outcome = tokio::task::spawn_blocking(move || simulator.sample(&circuit, shots))
            .await
            .map_err(|e| {
                ProviderClientError::ExecutionFailed(format!("Simulation task failed: {e}"))
            })??;

        Ok(outcome
            .counts
            .into_iter()
            .map(|(label, count)| (label, u64::from(count)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ExperimentPreset;

    #[tokio::test]
    async fn test_stub_records_backend_name() {
        let factory = StubRuntimeFactory::default();
        assert!(!factory.requires_token());
        assert_eq!(factory.last_backend_name(), None);

        let service = factory.connect(&RuntimeConfig::default()).unwrap();
        let backend = service.backend("ibm_stub_backend").await.unwrap();
        assert_eq!(backend.name(), "ibm_stub_backend");
        assert_eq!(
            factory.last_backend_name().as_deref(),
            Some("ibm_stub_backend")
        );
        assert_eq!(factory.connections(), 1);
    }

    #[tokio::test]
    async fn test_stub_backend_samples() {
        let factory = StubRuntimeFactory::default();
        let service = factory.connect(&RuntimeConfig::default()).unwrap();
        let backend = service.backend("anything").await.unwrap();

        let counts = backend
            .sample(&Circuit::for_preset(ExperimentPreset::Latency), 25)
            .await
            .unwrap();
        assert_eq!(counts.get("1"), Some(&25));
    }
}
