// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bundled state-vector simulator.
//!
//! Evolves the full state vector for the circuit, derives the ideal outcome
//! distribution from it, and samples measurement shots. An optional symmetric
//! readout error flips each measured bit independently, which is what the
//! "noisy" simulator mode amounts to.
//!
//! Bitstrings follow Qiskit's ordering: qubit 0 is the rightmost character.
//!
//! The simulator holds no mutable state, so one instance is shared by every
//! run of a client.

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap};
use std::f64::consts::FRAC_1_SQRT_2;
use std::time::{Duration, Instant};
use tracing::debug;

use super::circuit::{Circuit, Gate};
use crate::config::SimulatorConfig;
use crate::error::ProviderClientError;

/// Backend names routed to the bundled simulator.
const SIMULATOR_NAMES: &[&str] = &[
    "aer_simulator",
    "aer",
    "qasm_simulator",
    "statevector_simulator",
    "local_simulator",
];

/// Amplitudes below this probability are treated as exactly zero.
const PROBABILITY_EPSILON: f64 = 1e-12;

/// Outcome of one sampled simulation.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    /// Sampled bitstring counts
    pub counts: BTreeMap<String, u32>,
    /// Noiseless outcome distribution
    pub ideal: BTreeMap<String, f64>,
    /// Wall-clock execution time
    pub elapsed: Duration,
}

/// Local state-vector simulator.
#[derive(Debug, Clone)]
pub struct LocalSimulator {
    config: SimulatorConfig,
}

impl LocalSimulator {
    /// Create a simulator.
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Whether `backend_name` designates the bundled simulator.
    pub fn handles(backend_name: &str) -> bool {
        let name = backend_name.trim().to_ascii_lowercase();
        SIMULATOR_NAMES.contains(&name.as_str()) || name.starts_with("aer_simulator_")
    }

    /// Simulator settings.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Final state vector of `circuit`, before measurement.
    pub fn statevector(&self, circuit: &Circuit) -> Result<Vec<Complex64>, ProviderClientError> {
        circuit
            .validate()
            .map_err(ProviderClientError::InvalidRequest)?;

        let n = circuit.num_qubits();
        if n == 0 || n > self.config.max_qubits as usize {
            return Err(ProviderClientError::InvalidRequest(format!(
                "Circuit '{}' has {} qubits; the simulator accepts 1 to {}",
                circuit.name(),
                n,
                self.config.max_qubits
            )));
        }

        let mut state = vec![Complex64::new(0.0, 0.0); 1 << n];
        state[0] = Complex64::new(1.0, 0.0);

        for gate in circuit.gates() {
            match *gate {
                Gate::H(q) => apply_single(&mut state, q, &hadamard()),
                Gate::X(q) => apply_single(&mut state, q, &pauli_x()),
                Gate::Sx(q) => apply_single(&mut state, q, &sqrt_x()),
                Gate::Rz(q, theta) => apply_single(&mut state, q, &rz(theta)),
                Gate::Cx(c, t) => apply_cx(&mut state, c, t),
            }
        }

        Ok(state)
    }

    /// Run `circuit` for `shots` repetitions.
    pub fn sample(
        &self,
        circuit: &Circuit,
        shots: u32,
    ) -> Result<SimulationOutcome, ProviderClientError> {
        let start = Instant::now();

        let state = self.statevector(circuit)?;
        let width = circuit.num_clbits();

        // Cumulative distribution over the non-zero outcomes only.
        let mut cumulative: Vec<(usize, f64)> = Vec::new();
        let mut ideal = BTreeMap::new();
        let mut running = 0.0;
        for (idx, amp) in state.iter().enumerate() {
            let p = amp.norm_sqr();
            if p > PROBABILITY_EPSILON {
                running += p;
                cumulative.push((idx, running));
                ideal.insert(bitstring(idx, width), p);
            }
        }

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let readout_error = self.config.readout_error;
        let mut hits: HashMap<usize, u32> = HashMap::new();
        for _ in 0..shots {
            let r = rng.gen::<f64>() * running;
            let pos = cumulative
                .partition_point(|&(_, c)| c <= r)
                .min(cumulative.len() - 1);
            let mut outcome = cumulative[pos].0;

            if readout_error > 0.0 {
                for bit in 0..width {
                    if rng.gen::<f64>() < readout_error {
                        outcome ^= 1 << bit;
                    }
                }
            }

            *hits.entry(outcome).or_insert(0) += 1;
        }

        let counts = hits
            .into_iter()
            .map(|(idx, count)| (bitstring(idx, width), count))
            .collect();
        let elapsed = start.elapsed();

        debug!(
            circuit = %circuit.name(),
            shots,
            elapsed_us = elapsed.as_micros() as u64,
            "Simulation complete"
        );

        Ok(SimulationOutcome {
            counts,
            ideal,
            elapsed,
        })
    }
}

impl Default for LocalSimulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

type Matrix2 = [[Complex64; 2]; 2];

fn hadamard() -> Matrix2 {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    [[h, h], [h, -h]]
}

fn pauli_x() -> Matrix2 {
    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);
    [[zero, one], [one, zero]]
}

fn sqrt_x() -> Matrix2 {
    let a = Complex64::new(0.5, 0.5);
    let b = Complex64::new(0.5, -0.5);
    [[a, b], [b, a]]
}

fn rz(theta: f64) -> Matrix2 {
    let zero = Complex64::new(0.0, 0.0);
    [
        [Complex64::from_polar(1.0, -theta / 2.0), zero],
        [zero, Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

fn apply_single(state: &mut [Complex64], qubit: usize, m: &Matrix2) {
    let mask = 1 << qubit;
    for idx in 0..state.len() {
        if idx & mask == 0 {
            let j = idx | mask;
            let (a, b) = (state[idx], state[j]);
            state[idx] = m[0][0] * a + m[0][1] * b;
            state[j] = m[1][0] * a + m[1][1] * b;
        }
    }
}

fn apply_cx(state: &mut [Complex64], control: usize, target: usize) {
    let cmask = 1 << control;
    let tmask = 1 << target;
    for idx in 0..state.len() {
        if idx & cmask != 0 && idx & tmask == 0 {
            state.swap(idx, idx | tmask);
        }
    }
}

fn bitstring(idx: usize, width: usize) -> String {
    format!("{:0width$b}", idx, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ExperimentPreset;

    fn seeded(seed: u64) -> LocalSimulator {
        LocalSimulator::new(SimulatorConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    #[test]
    fn test_handles_simulator_names() {
        assert!(LocalSimulator::handles("aer_simulator"));
        assert!(LocalSimulator::handles("AER_SIMULATOR"));
        assert!(LocalSimulator::handles("aer_simulator_statevector"));
        assert!(LocalSimulator::handles("qasm_simulator"));
        assert!(!LocalSimulator::handles("ibm_brisbane"));
        assert!(!LocalSimulator::handles("ibm_fake_backend"));
        assert!(!LocalSimulator::handles("aerial"));
    }

    fn ideal(circuit: &Circuit) -> BTreeMap<String, f64> {
        LocalSimulator::default().sample(circuit, 1).unwrap().ideal
    }

    #[test]
    fn test_health_probabilities_are_bell() {
        let probs = ideal(&Circuit::for_preset(ExperimentPreset::Health));
        assert_eq!(probs.len(), 2);
        assert!((probs["00"] - 0.5).abs() < 1e-9);
        assert!((probs["11"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_latency_probabilities() {
        let probs = ideal(&Circuit::for_preset(ExperimentPreset::Latency));
        assert_eq!(probs.len(), 1);
        assert!((probs["1"] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_dpd_demo_probabilities() {
        let probs = ideal(&Circuit::for_preset(ExperimentPreset::DpdDemo));
        let expected_one = (1.0 + FRAC_1_SQRT_2) / 2.0;
        assert_eq!(probs.len(), 2);
        assert!((probs["11"] - expected_one).abs() < 1e-9);
        assert!((probs["00"] - (1.0 - expected_one)).abs() < 1e-9);
    }

    #[test]
    fn test_qubit_ordering_is_little_endian() {
        let mut c = Circuit::new("x_on_q0", 2);
        c.x(0);
        let probs = ideal(&c);
        assert!((probs["01"] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_statevector_is_normalized() {
        let sim = LocalSimulator::default();
        for preset in ExperimentPreset::ALL {
            let state = sim.statevector(&Circuit::for_preset(preset)).unwrap();
            let norm: f64 = state.iter().map(|a| a.norm_sqr()).sum();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sample_total_equals_shots() {
        let sim = seeded(11);
        let outcome = sim
            .sample(&Circuit::for_preset(ExperimentPreset::Health), 1000)
            .unwrap();
        let total: u32 = outcome.counts.values().sum();
        assert_eq!(total, 1000);
        assert!(outcome
            .counts
            .keys()
            .all(|k| k == "00" || k == "11"));
    }

    #[test]
    fn test_sample_is_reproducible_with_seed() {
        let circuit = Circuit::for_preset(ExperimentPreset::DpdDemo);
        let a = seeded(42).sample(&circuit, 500).unwrap();
        let b = seeded(42).sample(&circuit, 500).unwrap();
        assert_eq!(a.counts, b.counts);
    }

    #[test]
    fn test_readout_error_produces_off_ideal_outcomes() {
        let sim = LocalSimulator::new(SimulatorConfig {
            seed: Some(3),
            readout_error: 0.2,
            ..Default::default()
        });
        let outcome = sim
            .sample(&Circuit::for_preset(ExperimentPreset::Latency), 2000)
            .unwrap();
        assert!(outcome.counts.contains_key("0"));
        assert!(outcome.counts.contains_key("1"));
        assert_eq!(outcome.ideal.len(), 1);
    }

    #[test]
    fn test_rejects_too_wide_circuit() {
        let sim = LocalSimulator::new(SimulatorConfig {
            max_qubits: 1,
            ..Default::default()
        });
        let err = sim
            .sample(&Circuit::for_preset(ExperimentPreset::Health), 10)
            .unwrap_err();
        assert!(matches!(err, ProviderClientError::InvalidRequest(_)));
    }
}
