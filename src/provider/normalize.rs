// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! Result normalization shared by every backend path.
//!
//! Backends report outcome labels in different shapes: plain bitstrings,
//! bitstrings with register separators (`"01 1"`), or hexadecimal memory
//! values (`"0x3"`). Everything is folded into fixed-width bitstrings here,
//! zero-count outcomes are dropped, and the shot total is checked against the
//! request.

use std::collections::{BTreeMap, HashMap};

use crate::error::ProviderClientError;

/// Counts as a backend hands them over, before normalization.
pub type RawCounts = HashMap<String, u64>;

/// Convert one outcome label into a bitstring of exactly `width` characters.
pub fn normalize_label(label: &str, width: usize) -> Result<String, ProviderClientError> {
    let compact: String = label.chars().filter(|c| !c.is_whitespace()).collect();

    let bits = if let Some(hex) = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
    {
        let value = u64::from_str_radix(hex, 16).map_err(|_| {
            ProviderClientError::ExecutionFailed(format!("Unrecognized outcome label '{}'", label))
        })?;
        format!("{:0width$b}", value, width = width)
    } else if !compact.is_empty() && compact.chars().all(|c| c == '0' || c == '1') {
        format!("{:0>width$}", compact, width = width)
    } else {
        return Err(ProviderClientError::ExecutionFailed(format!(
            "Unrecognized outcome label '{}'",
            label
        )));
    };

    if bits.len() > width {
        return Err(ProviderClientError::ExecutionFailed(format!(
            "Outcome '{}' does not fit in {} classical bits",
            label, width
        )));
    }

    Ok(bits)
}

/// Normalize raw counts and check they account for exactly `shots` repetitions.
pub fn normalize_counts<I>(
    raw: I,
    width: usize,
    shots: u32,
) -> Result<BTreeMap<String, u32>, ProviderClientError>
where
    I: IntoIterator<Item = (String, u64)>,
{
    let mut merged: BTreeMap<String, u64> = BTreeMap::new();
    for (label, count) in raw {
        if count == 0 {
            continue;
        }
        *merged.entry(normalize_label(&label, width)?).or_insert(0) += count;
    }

    if merged.is_empty() {
        return Err(ProviderClientError::ExecutionFailed(
            "Backend returned no measurement outcomes".into(),
        ));
    }

    let total: u64 = merged.values().sum();
    if total != u64::from(shots) {
        return Err(ProviderClientError::ExecutionFailed(format!(
            "Backend reported {} outcomes for {} requested shots",
            total, shots
        )));
    }

    // total == shots, so every count fits in u32
    Ok(merged
        .into_iter()
        .map(|(label, count)| (label, count as u32))
        .collect())
}

/// Hellinger fidelity `(Σ √(p·q))²` between observed counts and an ideal distribution.
pub fn hellinger_fidelity(counts: &BTreeMap<String, u32>, ideal: &BTreeMap<String, f64>) -> f64 {
    let total: u64 = counts.values().map(|&c| u64::from(c)).sum();
    if total == 0 {
        return 0.0;
    }

    let overlap: f64 = ideal
        .iter()
        .filter_map(|(label, &p)| {
            counts
                .get(label)
                .map(|&c| ((c as f64 / total as f64) * p).sqrt())
        })
        .sum();

    (overlap * overlap).clamp(0.0, 1.0)
}
