// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end behaviour of provider clients through the public API.

use std::collections::HashMap;
use std::io::Write as _;
use std::sync::Arc;

use parking_lot::{const_mutex, Mutex, MutexGuard};
use synqc_providers::config::{Config, RuntimeConfig, SimulatorConfig};
use synqc_providers::provider::qiskit::{BackendRoute, QiskitProviderClient, StubRuntimeFactory};
use synqc_providers::provider::{Capabilities, ExperimentPreset, ProviderClient, ProviderRegistry};
use synqc_providers::{load_provider_clients, Error, ProviderClientError};

/// Serializes tests that touch the process environment.
static ENV_LOCK: Mutex<()> = const_mutex(());

/// Sets environment variables for the lifetime of the guard.
struct EnvGuard {
    keys: Vec<String>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    fn set(vars: &[(&str, &str)]) -> Self {
        let lock = ENV_LOCK.lock();
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
        Self {
            keys: vars.iter().map(|(k, _)| k.to_string()).collect(),
            _lock: lock,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in &self.keys {
            std::env::remove_var(key);
        }
    }
}

fn config_from(pairs: &[(&str, &str)]) -> Config {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(move |key| map.get(key).cloned())
}

fn stub_client(backend_name: &str) -> (QiskitProviderClient, Arc<StubRuntimeFactory>) {
    let stub = Arc::new(StubRuntimeFactory::default());
    let client = QiskitProviderClient::with_factory(
        backend_name,
        &RuntimeConfig::default(),
        &SimulatorConfig::default(),
        stub.clone(),
    )
    .with_capabilities(Capabilities::all());
    (client, stub)
}

#[test]
fn registry_contains_configured_provider() {
    let config = config_from(&[("SYNQC_QISKIT_BACKEND_IBM_QUANTUM", "aer_simulator")]);
    let registry = ProviderRegistry::from_config(&config).unwrap();

    let client = registry.get("ibm_quantum").unwrap();
    assert_eq!(client.backend_name(), "aer_simulator");
}

#[test]
fn registry_omits_unset_providers() {
    let config = config_from(&[("SYNQC_QISKIT_BACKEND_IONQ", "aer_simulator")]);
    let registry = ProviderRegistry::from_config(&config).unwrap();

    assert!(registry.contains("ionq"));
    for id in ["local_simulator", "ibm_quantum", "ibm_cloud", "aws_braket", "azure_quantum"] {
        assert!(!registry.contains(id), "{id} should not be registered");
    }
}

#[test]
fn registry_from_yaml_with_env_payload() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        f,
        r#"
providers:
  ibm_quantum:
    backend_name: aer_simulator
  lab_rig:
    backend_name: ibm_torino
"#
    )
    .unwrap();

    let mut config = Config::load(Some(f.path())).unwrap();
    config.apply_overrides(|key| match key {
        "SYNQC_PROVIDER_PAYLOAD_IBM_QUANTUM" => {
            Some(r#"{"backend_name": "ibm_brisbane"}"#.to_string())
        }
        _ => None,
    });

    let registry = ProviderRegistry::from_config(&config).unwrap();
    assert_eq!(registry.get("ibm_quantum").unwrap().backend_name(), "ibm_brisbane");
    assert_eq!(registry.get("lab_rig").unwrap().backend_name(), "ibm_torino");
}

#[tokio::test]
async fn local_simulator_run_reports_fidelity_and_latency() {
    let client = QiskitProviderClient::from_config(
        "aer_simulator",
        &RuntimeConfig::default(),
        &SimulatorConfig::default(),
    )
    .with_capabilities(Capabilities::all());
    assert_eq!(client.route(), BackendRoute::LocalSimulator);

    for preset in ExperimentPreset::ALL {
        for shots in [1, 17, 1024] {
            let result = client.run(preset, shots).await.unwrap();
            assert_eq!(result.shots_used, shots);
            assert!(!result.raw_counts.is_empty());
            assert!(result.fidelity.is_some());
            assert!(result.latency_us.is_some());
        }
    }
}

#[tokio::test]
async fn stub_runtime_observes_constructed_backend_name() {
    let (client, stub) = stub_client("ibm_stub_backend");
    assert_eq!(client.route(), BackendRoute::Runtime);

    client.run(ExperimentPreset::Health, 10).await.unwrap();
    assert_eq!(stub.last_backend_name().as_deref(), Some("ibm_stub_backend"));
}

#[tokio::test]
async fn stub_runtime_latency_and_dpd_demo() {
    let (client, _stub) = stub_client("ibm_stub_backend");

    let latency = client.run(ExperimentPreset::Latency, 5).await.unwrap();
    assert_eq!(latency.shots_used, 5);
    assert!(!latency.raw_counts.is_empty());
    assert!(latency.fidelity.is_none());
    assert!(latency.latency_us.is_none());

    let dpd = client.run(ExperimentPreset::DpdDemo, 8).await.unwrap();
    assert_eq!(dpd.shots_used, 8);
    assert_eq!(dpd.raw_counts.values().sum::<u32>(), 8);
    assert!(dpd.fidelity.is_none());
    assert!(dpd.latency_us.is_none());
}

#[tokio::test]
async fn runtime_unavailable_always_fails() {
    let (client, _stub) = stub_client("ibm_stub_backend");
    let client = client.with_capabilities(Capabilities::simulator_only());

    for preset in ExperimentPreset::ALL {
        for shots in [1, 100] {
            let err = client.run(preset, shots).await.unwrap_err();
            assert!(matches!(err, ProviderClientError::DependencyUnavailable(_)));
        }
    }
}

#[tokio::test]
async fn empty_token_without_double_fails() {
    let config = config_from(&[("SYNQC_QISKIT_RUNTIME_TOKEN", "")]);
    let client = QiskitProviderClient::from_config(
        "ibm_fake_backend",
        &config.runtime,
        &config.simulator,
    );

    let err = client.run(ExperimentPreset::Health, 10).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderClientError::MissingCredentials(_) | ProviderClientError::DependencyUnavailable(_)
    ));
}

#[tokio::test]
async fn registry_clients_share_stub_runtime() {
    let config = config_from(&[
        ("SYNQC_QISKIT_BACKEND_IBM_QUANTUM", "ibm_kyiv"),
        ("SYNQC_QISKIT_BACKEND_IBM_CLOUD", "ibm_torino"),
    ]);
    let stub = Arc::new(StubRuntimeFactory::default());
    let registry =
        ProviderRegistry::from_config_with(&config, Capabilities::all(), stub.clone()).unwrap();

    registry
        .get("ibm_cloud")
        .unwrap()
        .run(ExperimentPreset::Health, 4)
        .await
        .unwrap();
    assert_eq!(stub.last_backend_name().as_deref(), Some("ibm_torino"));

    registry
        .get("ibm_quantum")
        .unwrap()
        .run(ExperimentPreset::Latency, 4)
        .await
        .unwrap();
    assert_eq!(stub.last_backend_name().as_deref(), Some("ibm_kyiv"));
    assert_eq!(stub.connections(), 2);
}

#[test]
fn load_provider_clients_reads_process_env() {
    let _env = EnvGuard::set(&[("SYNQC_QISKIT_BACKEND_AZURE_QUANTUM", "aer_simulator")]);

    let registry = load_provider_clients().unwrap();
    assert!(registry.contains("azure_quantum"));
    assert_eq!(
        registry.get("azure_quantum").unwrap().backend_name(),
        "aer_simulator"
    );
}

#[test]
fn load_provider_clients_rejects_invalid_env() {
    let _env = EnvGuard::set(&[
        ("SYNQC_QISKIT_BACKEND_AZURE_QUANTUM", "aer_simulator"),
        ("SYNQC_AER_READOUT_ERROR", "1.0"),
    ]);

    let err = load_provider_clients().unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
