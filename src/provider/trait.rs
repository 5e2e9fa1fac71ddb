// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! Provider client trait definition and the data it exchanges.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ProviderClientError;

/// Closed set of experiments a caller may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperimentPreset {
    /// Two-qubit Bell pair
    Health,
    /// Single-qubit flip, used as a round-trip probe
    Latency,
    /// Drive-probe-drive sequence with an entangling readout
    DpdDemo,
}

impl ExperimentPreset {
    /// Every preset, in declaration order.
    pub const ALL: [ExperimentPreset; 3] = [
        ExperimentPreset::Health,
        ExperimentPreset::Latency,
        ExperimentPreset::DpdDemo,
    ];

    /// Canonical upper-snake name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperimentPreset::Health => "HEALTH",
            ExperimentPreset::Latency => "LATENCY",
            ExperimentPreset::DpdDemo => "DPD_DEMO",
        }
    }

    /// One-line description for listings.
    pub fn description(&self) -> &'static str {
        match self {
            ExperimentPreset::Health => "Bell-pair health check (2 qubits)",
            ExperimentPreset::Latency => "Single-qubit flip latency probe (1 qubit)",
            ExperimentPreset::DpdDemo => "Drive-probe-drive demo with entangled readout (2 qubits)",
        }
    }
}

impl fmt::Display for ExperimentPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperimentPreset {
    type Err = ProviderClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "HEALTH" => Ok(ExperimentPreset::Health),
            "LATENCY" => Ok(ExperimentPreset::Latency),
            "DPD_DEMO" => Ok(ExperimentPreset::DpdDemo),
            _ => Err(ProviderClientError::InvalidRequest(format!(
                "Unknown experiment preset '{}'",
                s
            ))),
        }
    }
}

/// Normalized outcome of one `run` call.
///
/// `fidelity` and `latency_us` are populated together on the bundled
/// simulator path and left out together on the remote runtime path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentResult {
    /// Bitstring counts (e.g., {"00": 512, "11": 512})
    pub raw_counts: BTreeMap<String, u32>,
    /// Shots executed; always the requested amount
    pub shots_used: u32,
    /// Hellinger fidelity against the ideal distribution
    pub fidelity: Option<f64>,
    /// Execution latency in microseconds
    pub latency_us: Option<f64>,
}

impl ExperimentResult {
    /// Result from a backend that can score itself against the ideal distribution.
    pub fn with_telemetry(
        raw_counts: BTreeMap<String, u32>,
        shots_used: u32,
        fidelity: f64,
        latency_us: f64,
    ) -> Self {
        Self {
            raw_counts,
            shots_used,
            fidelity: Some(fidelity),
            latency_us: Some(latency_us),
        }
    }

    /// Result from a backend that only reports counts.
    pub fn counts_only(raw_counts: BTreeMap<String, u32>, shots_used: u32) -> Self {
        Self {
            raw_counts,
            shots_used,
            fidelity: None,
            latency_us: None,
        }
    }

    /// Most frequently observed bitstring.
    pub fn most_frequent(&self) -> Option<&str> {
        self.raw_counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(label, _)| label.as_str())
    }
}

/// Family of a concrete provider client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    /// Qiskit-family client (bundled simulator or IBM runtime)
    Qiskit,
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientKind::Qiskit => write!(f, "qiskit"),
        }
    }
}

/// The capability every provider client offers.
///
/// `run` completes only once the backend has answered; there is no partial
/// result. Implementations must fold every lower-level failure into
/// [`ProviderClientError`].
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Backend name the client was constructed with.
    fn backend_name(&self) -> &str;

    /// Client family.
    fn kind(&self) -> ClientKind;

    /// Run `preset` for `shots` repetitions.
    async fn run(
        &self,
        preset: ExperimentPreset,
        shots: u32,
    ) -> Result<ExperimentResult, ProviderClientError>;
}
