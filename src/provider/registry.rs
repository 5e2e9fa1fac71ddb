// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! Provider registry.
//!
//! Maps provider ids to ready-to-use clients, one entry per provider the
//! configuration enables. Providers without a backend setting are left out
//! entirely. Building the registry never touches the network and never checks
//! that a backend exists; that happens on the first `run`.
//!
//! The registry is immutable once built and can be shared behind an `Arc`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::capability::Capabilities;
use super::qiskit::ibm::IbmRuntimeFactory;
use super::qiskit::runtime::RuntimeServiceFactory;
use super::qiskit::QiskitProviderClient;
use super::{ClientKind, ProviderClient};
use crate::config::{Config, ProviderEntry, RuntimeConfig};
use crate::error::{Error, ProviderClientError, Result};

/// Immutable map of provider id to client.
pub struct ProviderRegistry {
    clients: BTreeMap<String, Arc<dyn ProviderClient>>,
}

impl ProviderRegistry {
    /// Build from configuration with the production runtime.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_config_with(
            config,
            Capabilities::detect(),
            Arc::new(IbmRuntimeFactory::new()),
        )
    }

    /// Build from configuration with explicit capabilities and runtime factory.
    ///
    /// Every client shares `factory`. The configuration is validated first.
    pub fn from_config_with(
        config: &Config,
        capabilities: Capabilities,
        factory: Arc<dyn RuntimeServiceFactory>,
    ) -> Result<Self> {
        config.validate()?;

        let mut clients: BTreeMap<String, Arc<dyn ProviderClient>> = BTreeMap::new();

        for (id, entry) in &config.providers {
            let Some(resolved) = resolve_entry(id, entry, &config.runtime)? else {
                debug!(provider = %id, "Provider has no backend configured, skipping");
                continue;
            };

            let client = match resolved.kind {
                ClientKind::Qiskit => QiskitProviderClient::with_factory(
                    resolved.backend_name.clone(),
                    &resolved.runtime,
                    &config.simulator,
                    factory.clone(),
                )
                .with_capabilities(capabilities),
            };

            info!(
                provider = %id,
                backend = %resolved.backend_name,
                kind = %resolved.kind,
                "Registered provider client"
            );
            clients.insert(id.clone(), Arc::new(client));
        }

        Ok(Self { clients })
    }

    /// Registry with no providers.
    pub fn empty() -> Self {
        Self {
            clients: BTreeMap::new(),
        }
    }

    /// Get a client by provider id.
    pub fn get(&self, id: &str) -> Result<Arc<dyn ProviderClient>> {
        self.clients.get(id).cloned().ok_or_else(|| {
            Error::Provider(ProviderClientError::BackendNotFound(format!(
                "Provider '{}' is not configured",
                id
            )))
        })
    }

    /// Check if a provider is configured.
    pub fn contains(&self, id: &str) -> bool {
        self.clients.contains_key(id)
    }

    /// Configured provider ids, sorted.
    pub fn list(&self) -> Vec<String> {
        self.clients.keys().cloned().collect()
    }

    /// Configured provider ids with their backend names.
    pub fn list_with_backends(&self) -> Vec<(String, String)> {
        self.clients
            .iter()
            .map(|(id, client)| (id.clone(), client.backend_name().to_string()))
            .collect()
    }

    /// Number of configured providers.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Check if no provider is configured.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Iterate over `(id, client)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ProviderClient>)> {
        self.clients.iter().map(|(id, client)| (id.as_str(), client))
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.clients.iter().map(|(id, c)| (id, c.backend_name())))
            .finish()
    }
}

/// Build the registry from the configuration file and process environment.
pub fn load_provider_clients() -> Result<ProviderRegistry> {
    let config = Config::load(None)?;
    ProviderRegistry::from_config(&config)
}

/// Structured provider payload.
///
/// Unknown fields are ignored so other client families can carry their own
/// settings in the same variable.
#[derive(Debug, Deserialize)]
struct ProviderPayload {
    #[serde(default = "default_client")]
    client: String,
    #[serde(default)]
    backend_name: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    instance: Option<String>,
}

fn default_client() -> String {
    "qiskit".into()
}

#[derive(Debug)]
struct ResolvedProvider {
    kind: ClientKind,
    backend_name: String,
    runtime: RuntimeConfig,
}

/// Turn one provider entry into client settings. Payload wins over the plain
/// backend name; an entry with neither yields `None`.
fn resolve_entry(
    id: &str,
    entry: &ProviderEntry,
    runtime: &RuntimeConfig,
) -> Result<Option<ResolvedProvider>> {
    if let Some(payload) = &entry.payload {
        return parse_payload(id, payload, runtime).map(Some);
    }

    let backend_name = entry
        .backend_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    Ok(backend_name.map(|name| ResolvedProvider {
        kind: ClientKind::Qiskit,
        backend_name: name.to_string(),
        runtime: runtime.clone(),
    }))
}

fn parse_payload(
    id: &str,
    payload: &serde_json::Value,
    runtime: &RuntimeConfig,
) -> Result<ResolvedProvider> {
    let value = match payload {
        serde_json::Value::String(raw) => serde_json::from_str(raw).map_err(|e| {
            Error::Config(format!("Invalid payload for provider '{}': {}", id, e))
        })?,
        other => other.clone(),
    };

    let payload: ProviderPayload = serde_json::from_value(value).map_err(|e| {
        Error::Config(format!("Malformed payload for provider '{}': {}", id, e))
    })?;

    let kind = match payload.client.trim().to_ascii_lowercase().as_str() {
        "qiskit" => ClientKind::Qiskit,
        other => {
            return Err(Error::Config(format!(
                "Unsupported client '{}' for provider '{}'",
                other, id
            )))
        }
    };

    let backend_name = payload
        .backend_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            Error::Config(format!("Payload for provider '{}' has no backend_name", id))
        })?;

    let mut runtime = runtime.clone();
    if let Some(channel) = payload.channel {
        runtime.channel = channel;
    }
    if payload.instance.is_some() {
        runtime.instance = payload.instance;
    }

    Ok(ResolvedProvider {
        kind,
        backend_name,
        runtime,
    })
}
