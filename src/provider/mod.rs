// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! Provider clients.
//!
//! This module provides the [`ProviderClient`] trait, the [`ProviderRegistry`]
//! built from configuration, and the client implementations:
//!
//! - `qiskit::QiskitProviderClient`: bundled simulator or IBM Quantum runtime

pub mod capability;
pub mod normalize;
pub mod qiskit;
pub mod registry;
pub mod r#trait;

pub use capability::Capabilities;
pub use r#trait::{ClientKind, ExperimentPreset, ExperimentResult, ProviderClient};
pub use registry::{load_provider_clients, ProviderRegistry};
