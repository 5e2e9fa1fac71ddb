// Copyright 2026 SynQc Contributors
// SPDX-License-Identifier: Apache-2.0

//! Optional backend capabilities of this build.

/// Which optional execution capabilities are present.
///
/// Computed once from cargo features; clients keep a copy taken at
/// construction and consult it during backend resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Bundled state-vector simulator (`aer` feature)
    pub simulator: bool,
    /// Authenticated remote runtime (`runtime` feature)
    pub runtime: bool,
}

impl Capabilities {
    /// Capabilities compiled into this binary.
    pub const fn detect() -> Self {
        Self {
            simulator: cfg!(feature = "aer"),
            runtime: cfg!(feature = "runtime"),
        }
    }

    /// Everything available.
    pub const fn all() -> Self {
        Self {
            simulator: true,
            runtime: true,
        }
    }

    /// Simulator only, no remote runtime.
    pub const fn simulator_only() -> Self {
        Self {
            simulator: true,
            runtime: false,
        }
    }

    /// Nothing available.
    pub const fn none() -> Self {
        Self {
            simulator: false,
            runtime: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_matches_features() {
        let caps = Capabilities::detect();
        assert_eq!(caps.simulator, cfg!(feature = "aer"));
        assert_eq!(caps.runtime, cfg!(feature = "runtime"));
        assert_eq!(Capabilities::default(), caps);
    }

    #[test]
    fn test_presets() {
        assert!(Capabilities::all().runtime);
        assert!(!Capabilities::simulator_only().runtime);
        assert!(!Capabilities::none().simulator);
    }
}
