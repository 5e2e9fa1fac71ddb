// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! SynQc provider clients
//!
//! This crate runs the SynQc experiment presets on quantum backends through a
//! single client interface, and builds the set of clients an operator has
//! configured.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Provider Registry             │
//! │   (SYNQC_QISKIT_BACKEND_* / PAYLOAD_*)   │
//! ├─────────────────────────────────────────┤
//! │          Qiskit Provider Client          │
//! ├────────────────┬────────────────────────┤
//! │ Local Simulator│  Runtime Service       │
//! │ (state vector) │  (reqwest / stub)      │
//! └────────────────┴────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`provider`]: Provider client trait, registry and implementations
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod provider;

pub use config::Config;
pub use error::{Error, ProviderClientError, Result};
pub use provider::{
    load_provider_clients, ExperimentPreset, ExperimentResult, ProviderClient, ProviderRegistry,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
