// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! Circuit model for the experiment presets.
//!
//! Circuits only use IBM's native single-qubit set (`sx`, `rz`, `x`) plus `h`
//! and `cx`, so the same circuit runs on the bundled simulator and is
//! accepted by the runtime as OpenQASM 3.0 without transpilation hints.
//! Every qubit is measured at the end into a classical bit of the same index.

use std::f64::consts::FRAC_PI_4;

use crate::provider::ExperimentPreset;

/// A gate acting on qubit indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gate {
    /// Hadamard
    H(usize),
    /// Pauli X
    X(usize),
    /// √X
    Sx(usize),
    /// Z rotation by an angle in radians
    Rz(usize, f64),
    /// CNOT (control, target)
    Cx(usize, usize),
}

/// A measured circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    name: String,
    num_qubits: usize,
    gates: Vec<Gate>,
}

impl Circuit {
    /// Empty circuit over `num_qubits` qubits.
    pub fn new(name: impl Into<String>, num_qubits: usize) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            gates: Vec::new(),
        }
    }

    /// Circuit implementing `preset`.
    pub fn for_preset(preset: ExperimentPreset) -> Self {
        match preset {
            ExperimentPreset::Health => {
                let mut c = Self::new("synqc_health", 2);
                c.h(0).cx(0, 1);
                c
            }
            ExperimentPreset::Latency => {
                let mut c = Self::new("synqc_latency", 1);
                c.x(0);
                c
            }
            ExperimentPreset::DpdDemo => {
                let mut c = Self::new("synqc_dpd_demo", 2);
                c.sx(0).rz(0, FRAC_PI_4).sx(0).cx(0, 1);
                c
            }
        }
    }

    pub fn h(&mut self, q: usize) -> &mut Self {
        self.push(Gate::H(q))
    }

    pub fn x(&mut self, q: usize) -> &mut Self {
        self.push(Gate::X(q))
    }

    pub fn sx(&mut self, q: usize) -> &mut Self {
        self.push(Gate::Sx(q))
    }

    pub fn rz(&mut self, q: usize, theta: f64) -> &mut Self {
        self.push(Gate::Rz(q, theta))
    }

    pub fn cx(&mut self, control: usize, target: usize) -> &mut Self {
        self.push(Gate::Cx(control, target))
    }

    fn push(&mut self, gate: Gate) -> &mut Self {
        self.gates.push(gate);
        self
    }

    /// Circuit name, used as the job tag on remote backends.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of classical bits (one per qubit).
    pub fn num_clbits(&self) -> usize {
        self.num_qubits
    }

    /// Gate sequence.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Check every gate addresses a qubit inside the register.
    pub fn validate(&self) -> Result<(), String> {
        for gate in &self.gates {
            let in_range = match *gate {
                Gate::H(q) | Gate::X(q) | Gate::Sx(q) | Gate::Rz(q, _) => q < self.num_qubits,
                Gate::Cx(c, t) => c < self.num_qubits && t < self.num_qubits && c != t,
            };
            if !in_range {
                return Err(format!(
                    "{:?} is invalid on a {}-qubit circuit",
                    gate, self.num_qubits
                ));
            }
        }
        Ok(())
    }

    /// Render as OpenQASM 3.0.
    pub fn to_qasm(&self) -> String {
        let n = self.num_qubits;
        let mut qasm = String::from("OPENQASM 3.0;\n");
        qasm.push_str("include \"stdgates.inc\";\n");
        qasm.push_str(&format!("qubit[{n}] q;\n"));
        qasm.push_str(&format!("bit[{n}] c;\n\n"));

        for gate in &self.gates {
            let line = match *gate {
                Gate::H(q) => format!("h q[{q}];\n"),
                Gate::X(q) => format!("x q[{q}];\n"),
                Gate::Sx(q) => format!("sx q[{q}];\n"),
                Gate::Rz(q, theta) => format!("rz({theta:.8}) q[{q}];\n"),
                Gate::Cx(c, t) => format!("cx q[{c}], q[{t}];\n"),
            };
            qasm.push_str(&line);
        }

        qasm.push('\n');
        for i in 0..n {
            qasm.push_str(&format!("c[{i}] = measure q[{i}];\n"));
        }

        qasm
    }
}
