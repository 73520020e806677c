//! Immutable id maps tying circuit detectors and errors to lattice
//! positions.
//!
//! Both maps are produced once per distance by the circuit-generation
//! tooling and cached on disk as JSON next to the circuit files:
//!
//! - `detectors_to_syndromes.json`: detector id to `(round, row-major
//!   syndrome index)`. Only Z-error detectors appear; ids belonging to the
//!   other basis are absent and their detector bits are ignored.
//! - `errors_to_qubits.json`: error mechanism id to the list of
//!   `(round, data-qubit index)` flips it causes.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use pinball_core::{BitGrid, Lattice};

/// Detector id to `(round, syndrome index)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorMap(pub HashMap<u32, (u16, u16)>);

/// Error mechanism id to `(round, data-qubit index)` flips.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorMap(pub HashMap<u32, Vec<(u16, u16)>>);

impl DetectorMap {
    /// Load the map from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading detector map {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing detector map {}", path.display()))
    }

    /// Reshape a packed detector shot into per-round syndrome grids.
    ///
    /// Detector ids without a map entry belong to the other decoding basis
    /// and are skipped, as are entries beyond `num_rounds`.
    pub fn syndrome_rounds(
        &self,
        detectors: &[u64],
        lattice: &Lattice,
        num_rounds: usize,
    ) -> Vec<BitGrid> {
        let mut rounds = vec![BitGrid::new(lattice.rows(), lattice.cols()); num_rounds];
        for (word_idx, &word) in detectors.iter().enumerate() {
            let mut w = word;
            while w != 0 {
                let bit = w.trailing_zeros() as usize;
                w &= w - 1;
                let id = (word_idx * 64 + bit) as u32;
                if let Some(&(round, index)) = self.0.get(&id) {
                    if (round as usize) < num_rounds && (index as usize) < lattice.num_syndromes()
                    {
                        rounds[round as usize].set(index as usize, true);
                    }
                }
            }
        }
        rounds
    }
}

impl ErrorMap {
    /// Load the map from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading error map {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing error map {}", path.display()))
    }

    /// Expand fired mechanism ids into per-round data error grids.
    ///
    /// Flips accumulate by XOR so repeated errors on a qubit cancel.
    /// Mechanisms without a map entry are not data errors and are skipped.
    pub fn error_rounds(
        &self,
        triggered: &[u32],
        distance: usize,
        num_rounds: usize,
    ) -> Vec<BitGrid> {
        let mut rounds = vec![BitGrid::new(distance, distance); num_rounds];
        for id in triggered {
            if let Some(flips) = self.0.get(id) {
                for &(round, qubit) in flips {
                    if (round as usize) < num_rounds && (qubit as usize) < distance * distance {
                        rounds[round as usize].toggle(qubit as usize);
                    }
                }
            }
        }
        rounds
    }
}
