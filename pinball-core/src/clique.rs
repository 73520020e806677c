//! The single-stage local clique predecoder.
//!
//! A coarser baseline sharing the Pinball interface. One decoding clique is
//! centered over every ancilla; a center that fires with exactly one fired
//! arm (or any odd number) corrects the data qubit under each fired arm,
//! edge ancillas with an even count fall back to a boundary qubit, and a
//! bulk ancilla with an even count is ambiguous: the round is flagged
//! complex for the downstream decoder and decoding stops immediately.

use std::sync::Arc;

use crate::bits::BitGrid;
use crate::error::PredecodeError;
use crate::geometry::GeometryCatalog;
use crate::predecoder::{BlockTail, Predecoder, RoundResult};
use crate::verification;

/// The Clique predecoder.
#[derive(Debug, Clone)]
pub struct Clique {
    geometry: Arc<GeometryCatalog>,
}

impl Clique {
    /// Create a predecoder for the given odd code distance.
    pub fn new(distance: usize) -> Result<Self, PredecodeError> {
        Ok(Self {
            geometry: GeometryCatalog::shared(distance)?,
        })
    }

    /// Create a predecoder over an existing geometry catalog.
    pub fn with_geometry(geometry: Arc<GeometryCatalog>) -> Self {
        Self { geometry }
    }
}

impl Predecoder for Clique {
    fn geometry(&self) -> &GeometryCatalog {
        &self.geometry
    }

    fn decode_round(&self, prev: &BitGrid, curr: &BitGrid) -> RoundResult {
        let d = self.geometry.lattice().distance();
        let mut corrections = BitGrid::new(d, d);

        // An ancilla set in both rounds is a measurement error, not a data
        // defect; filter those out before forming cliques.
        let fires = |idx: usize| !prev.get(idx) && curr.get(idx);

        for cell in self.geometry.clique_cells() {
            if !fires(cell.center) {
                continue;
            }
            let fired_arms = cell
                .arms
                .iter()
                .flatten()
                .filter(|arm| fires(arm.ancilla))
                .count();
            if fired_arms % 2 == 1 {
                for arm in cell.arms.iter().flatten() {
                    if fires(arm.ancilla) {
                        corrections.set(arm.data, true);
                    }
                }
            } else if let Some(edge_data) = cell.edge {
                // Boundary data error: either boundary qubit choice differs
                // only by a stabilizer.
                corrections.set(edge_data, true);
            } else {
                // Ambiguous bulk clique; hand the round to the downstream
                // decoder as is.
                return RoundResult {
                    corrections,
                    next_prev: curr.clone(),
                    complex: true,
                };
            }
        }

        RoundResult {
            corrections,
            next_prev: curr.clone(),
            complex: false,
        }
    }

    fn finish_block(&self, _last: &BitGrid) -> BlockTail {
        let lattice = self.geometry.lattice();
        // No terminal pass; deferral is signalled through the complex flag
        // alone.
        BlockTail {
            corrections: BitGrid::new(lattice.distance(), lattice.distance()),
            residual: BitGrid::new(lattice.rows(), lattice.cols()),
        }
    }

    fn is_logical_error(
        &self,
        errors: &[BitGrid],
        corrections: &BitGrid,
        _observable_flip: bool,
    ) -> bool {
        // Clique's measurement-error filtering can commit corrections that
        // neither form a stabilizer product nor flip the observable, so the
        // observable alone is not a sound witness. Check the net operator
        // explicitly: it must clear every stabilizer and keep every data
        // column at even weight.
        let lattice = self.geometry.lattice();
        let mut net = corrections.clone();
        for round_errors in errors {
            net.xor_assign(round_errors);
        }
        !verification::all_stabilizers_clear(lattice, &net) || verification::any_column_odd(&net)
    }
}
