// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management for provider clients.
//!
//! Configuration is loaded from multiple sources with the following priority
//! (later sources override earlier ones):
//!
//! 1. Built-in defaults
//! 2. synqc.yaml file
//! 3. Environment variables (SYNQC_*)
//!
//! Environment lookups go through a caller-supplied function so tests can feed
//! a fixed map instead of touching the process environment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// Provider identifiers the loader probes in the environment.
pub const KNOWN_PROVIDERS: &[&str] = &[
    "local_simulator",
    "ibm_quantum",
    "ibm_cloud",
    "aws_braket",
    "azure_quantum",
    "ionq",
];

/// Prefix of the plain backend-name variable, followed by the upper-cased provider id.
pub const BACKEND_ENV_PREFIX: &str = "SYNQC_QISKIT_BACKEND_";

/// Prefix of the structured payload variable, followed by the upper-cased provider id.
pub const PAYLOAD_ENV_PREFIX: &str = "SYNQC_PROVIDER_PAYLOAD_";

/// Runtime access token.
pub const RUNTIME_TOKEN_ENV: &str = "SYNQC_QISKIT_RUNTIME_TOKEN";
/// Runtime channel.
pub const RUNTIME_CHANNEL_ENV: &str = "SYNQC_QISKIT_RUNTIME_CHANNEL";
/// Runtime instance (CRN or hub/group/project).
pub const RUNTIME_INSTANCE_ENV: &str = "SYNQC_QISKIT_RUNTIME_INSTANCE";
/// Runtime API base URL override.
pub const RUNTIME_URL_ENV: &str = "SYNQC_QISKIT_RUNTIME_URL";
/// Runtime timeout in seconds.
pub const RUNTIME_TIMEOUT_ENV: &str = "SYNQC_QISKIT_RUNTIME_TIMEOUT_SECS";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Bundled simulator settings
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// Remote runtime settings
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Per-provider backend selection
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderEntry>,
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                config = serde_yml::from_str(&content)?;
            }
        } else {
            for path in &["synqc.yaml", "synqc.yml", "/etc/synqc/config.yaml"] {
                let path = Path::new(path);
                if path.exists() {
                    let content = std::fs::read_to_string(path)?;
                    config = serde_yml::from_str(&content)?;
                    break;
                }
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Build a configuration from defaults plus the given lookup only.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        config.apply_overrides(lookup);
        config
    }

    /// Apply process environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("SYNQC_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = lookup("SYNQC_LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Some(val) = lookup("SYNQC_AER_SEED") {
            if let Ok(seed) = val.trim().parse() {
                self.simulator.seed = Some(seed);
            }
        }
        if let Some(val) = lookup("SYNQC_AER_READOUT_ERROR") {
            if let Ok(p) = val.trim().parse() {
                self.simulator.readout_error = p;
            }
        }

        self.runtime.apply_overrides(&lookup);

        // Known providers plus anything the file already declared.
        let mut ids: Vec<String> = KNOWN_PROVIDERS.iter().map(|s| s.to_string()).collect();
        for id in self.providers.keys() {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }

        for id in ids {
            let suffix = id.to_uppercase();
            let backend = non_empty(lookup(&format!("{BACKEND_ENV_PREFIX}{suffix}")));
            let payload = non_empty(lookup(&format!("{PAYLOAD_ENV_PREFIX}{suffix}")));
            if backend.is_none() && payload.is_none() {
                continue;
            }

            let entry = self.providers.entry(id).or_default();
            if let Some(name) = backend {
                entry.backend_name = Some(name);
            }
            if let Some(raw) = payload {
                entry.payload = Some(serde_json::Value::String(raw));
            }
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        self.simulator.validate()?;
        self.runtime.validate()?;
        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(Error::Config(format!(
                    "Unknown log format '{}' (expected 'pretty' or 'json')",
                    other
                )))
            }
        }
        Ok(())
    }
}

/// Backend selection for a single provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// Plain backend name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_name: Option<String>,

    /// Structured payload, either an inline mapping or a JSON string.
    /// Takes precedence over `backend_name` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl ProviderEntry {
    /// Entry with only a backend name.
    pub fn backend(name: impl Into<String>) -> Self {
        Self {
            backend_name: Some(name.into()),
            payload: None,
        }
    }
}

/// Bundled simulator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Fixed RNG seed for reproducible sampling
    #[serde(default)]
    pub seed: Option<u64>,

    /// Symmetric per-bit readout flip probability (0 = noiseless)
    #[serde(default)]
    pub readout_error: f64,

    /// Widest circuit the simulator accepts
    #[serde(default = "default_max_qubits")]
    pub max_qubits: u32,

    /// Maximum shots per run
    #[serde(default = "default_max_shots")]
    pub max_shots: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            readout_error: 0.0,
            max_qubits: default_max_qubits(),
            max_shots: default_max_shots(),
        }
    }
}

impl SimulatorConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..0.5).contains(&self.readout_error) {
            return Err(Error::Config(format!(
                "simulator.readout_error must be in [0, 0.5), got {}",
                self.readout_error
            )));
        }
        if self.max_qubits == 0 || self.max_qubits > 24 {
            return Err(Error::Config(format!(
                "simulator.max_qubits must be in 1..=24, got {}",
                self.max_qubits
            )));
        }
        if self.max_shots == 0 {
            return Err(Error::Config("simulator.max_shots cannot be 0".into()));
        }
        Ok(())
    }
}

fn default_max_qubits() -> u32 {
    16
}

fn default_max_shots() -> u32 {
    100_000
}

/// Remote runtime configuration.
///
/// Read once when a client is constructed; later environment changes do not
/// reach clients that already exist.
#[derive(Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Access token. Never serialized.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Service channel (ibm_quantum, ibm_cloud)
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Instance identifier
    #[serde(default)]
    pub instance: Option<String>,

    /// API base URL override
    #[serde(default)]
    pub url: Option<String>,

    /// Upper bound on one remote run in seconds
    #[serde(default = "default_runtime_timeout")]
    pub timeout_sec: u64,

    /// Delay between job status polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            token: None,
            channel: default_channel(),
            instance: None,
            url: None,
            timeout_sec: default_runtime_timeout(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("channel", &self.channel)
            .field("instance", &self.instance)
            .field("url", &self.url)
            .field("timeout_sec", &self.timeout_sec)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish()
    }
}

impl RuntimeConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(&|key: &str| env::var(key).ok());
        config
    }

    fn apply_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(RUNTIME_TOKEN_ENV) {
            self.token = Some(val);
        }
        if let Some(val) = non_empty(lookup(RUNTIME_CHANNEL_ENV)) {
            self.channel = val;
        }
        if let Some(val) = non_empty(lookup(RUNTIME_INSTANCE_ENV)) {
            self.instance = Some(val);
        }
        if let Some(val) = non_empty(lookup(RUNTIME_URL_ENV)) {
            self.url = Some(val);
        }
        if let Some(val) = lookup(RUNTIME_TIMEOUT_ENV) {
            if let Ok(secs) = val.trim().parse() {
                self.timeout_sec = secs;
            }
        }
    }

    /// The configured token, or `None` when unset, empty or blank.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// API base URL for the configured channel, honouring the override.
    pub fn base_url(&self) -> Result<String> {
        if let Some(url) = &self.url {
            return Ok(url.trim_end_matches('/').to_string());
        }
        match self.channel.as_str() {
            "ibm_quantum" => Ok("https://api.quantum-computing.ibm.com/runtime".into()),
            "ibm_cloud" => Ok("https://us-east.quantum-computing.cloud.ibm.com".into()),
            other => Err(Error::Config(format!("Unknown runtime channel '{}'", other))),
        }
    }

    fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.timeout_sec == 0 {
            return Err(Error::Config("runtime.timeout_sec cannot be 0".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("runtime.poll_interval_ms cannot be 0".into()));
        }
        Ok(())
    }
}

fn default_channel() -> String {
    "ibm_quantum".into()
}

fn default_runtime_timeout() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write as _;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.runtime.channel, "ibm_quantum");
        assert_eq!(config.runtime.timeout_sec, 300);
        assert!(config.providers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
logging:
  level: debug
simulator:
  seed: 7
  readout_error: 0.02
providers:
  ibm_quantum:
    backend_name: aer_simulator
"#
        )
        .unwrap();

        let config = Config::load(Some(f.path())).unwrap();
        assert_eq!(config.simulator.seed, Some(7));
        assert!((config.simulator.readout_error - 0.02).abs() < 1e-12);
        assert_eq!(
            config.providers["ibm_quantum"].backend_name.as_deref(),
            Some("aer_simulator")
        );
    }

    #[test]
    fn test_config_load_inline_payload() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
providers:
  ionq:
    payload:
      backend_name: aer_simulator
"#
        )
        .unwrap();

        let config = Config::load(Some(f.path())).unwrap();
        let payload = config.providers["ionq"].payload.as_ref().unwrap();
        assert_eq!(payload["backend_name"], "aer_simulator");
    }

    #[test]
    fn test_config_load_invalid_yaml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{{{{not: valid: yaml::::").unwrap();

        let result = Config::load(Some(f.path()));
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_backend_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[(
            "SYNQC_QISKIT_BACKEND_IBM_QUANTUM",
            "aer_simulator",
        )]));
        assert_eq!(
            config.providers.get("ibm_quantum"),
            Some(&ProviderEntry::backend("aer_simulator"))
        );
        assert_eq!(config.providers.len(), 1);
    }

    #[test]
    fn test_provider_blank_backend_ignored() {
        let config =
            Config::from_lookup(lookup_from(&[("SYNQC_QISKIT_BACKEND_IBM_QUANTUM", "  ")]));
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_provider_payload_kept_raw() {
        let config = Config::from_lookup(lookup_from(&[(
            "SYNQC_PROVIDER_PAYLOAD_IONQ",
            r#"{"backend_name": "ibm_brisbane"}"#,
        )]));
        let entry = &config.providers["ionq"];
        assert!(entry.backend_name.is_none());
        assert!(matches!(entry.payload, Some(serde_json::Value::String(_))));
    }

    #[test]
    fn test_env_overrides_file_declared_provider() {
        let mut config = Config::default();
        config
            .providers
            .insert("lab_rig".into(), ProviderEntry::backend("aer_simulator"));
        config.apply_overrides(lookup_from(&[("SYNQC_QISKIT_BACKEND_LAB_RIG", "ibm_torino")]));
        assert_eq!(
            config.providers["lab_rig"].backend_name.as_deref(),
            Some("ibm_torino")
        );
    }

    #[test]
    fn test_runtime_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (RUNTIME_TOKEN_ENV, "secret"),
            (RUNTIME_CHANNEL_ENV, "ibm_cloud"),
            (RUNTIME_INSTANCE_ENV, "crn:v1:abc"),
            (RUNTIME_TIMEOUT_ENV, "45"),
        ]));
        assert_eq!(config.runtime.token(), Some("secret"));
        assert_eq!(config.runtime.channel, "ibm_cloud");
        assert_eq!(config.runtime.instance.as_deref(), Some("crn:v1:abc"));
        assert_eq!(config.runtime.timeout_sec, 45);
    }

    #[test]
    fn test_empty_token_is_absent() {
        let config = Config::from_lookup(lookup_from(&[(RUNTIME_TOKEN_ENV, "")]));
        assert_eq!(config.runtime.token(), None);

        let config = Config::from_lookup(lookup_from(&[(RUNTIME_TOKEN_ENV, "   ")]));
        assert_eq!(config.runtime.token(), None);
    }

    #[test]
    fn test_runtime_base_url() {
        let mut runtime = RuntimeConfig::default();
        assert!(runtime.base_url().unwrap().contains("quantum-computing.ibm.com"));

        runtime.url = Some("http://localhost:9000/".into());
        assert_eq!(runtime.base_url().unwrap(), "http://localhost:9000");

        runtime.url = None;
        runtime.channel = "carrier_pigeon".into();
        assert!(runtime.base_url().is_err());
    }

    #[test]
    fn test_token_never_serialized_or_debugged() {
        let mut config = Config::default();
        config.runtime.token = Some("hunter2".into());

        let yaml = serde_yml::to_string(&config).unwrap();
        assert!(!yaml.contains("hunter2"));

        let debug = format!("{:?}", config.runtime);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_validate_readout_error_range() {
        let mut config = Config::default();
        config.simulator.readout_error = 0.5;
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("readout_error"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.runtime.timeout_sec = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".into();
        assert!(config.validate().is_err());
    }
}
