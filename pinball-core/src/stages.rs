//! Pipeline stage kernels.
//!
//! Each kernel is a pure pass over borrowed syndrome grids: cells covered by
//! a leaf site are replaced by the leaf outputs, everything else flows
//! through untouched, and the stage's correction mask comes back alongside
//! the updated grids. The nine-stage pipeline is their sequential
//! composition in fixed order:
//!
//! 1. measurement-error suppression across the round pair,
//! 2.-5. bulk data errors within the current round (four diagonals),
//! 6.-7. spacetime diagonals across the round pair,
//! 8. hooks across the round pair (width-2 corrections),
//! 9. boundary ancillas on the outgoing round.
//!
//! Leaf sites within one stage touch disjoint ancillas and disjoint data
//! qubits, so evaluation order within a stage is immaterial.

use crate::bits::BitGrid;
use crate::geometry::{BulkStage, GeometryCatalog, SpacetimeStage};
use crate::leaf::leaf;

/// Output of a stage operating on a single round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePass {
    /// The round with fired ancilla pairs cleared.
    pub syndrome: BitGrid,
    /// Data qubits flipped by this stage.
    pub corrections: BitGrid,
}

/// Output of a stage operating on a round pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairPass {
    /// The previous round with fired neighbors cleared.
    pub prev: BitGrid,
    /// The current round with fired centers cleared.
    pub curr: BitGrid,
    /// Data qubits flipped by this stage.
    pub corrections: BitGrid,
}

/// Stage 1: clear ancillas set in both rounds of the pair.
///
/// A detector firing identically in two consecutive rounds indicates a
/// measurement error; both copies are suppressed and no data qubit is
/// touched.
pub fn clear_measurement_errors(prev: &BitGrid, curr: &BitGrid) -> (BitGrid, BitGrid) {
    let mut prev = prev.clone();
    let mut curr = curr.clone();
    for idx in 0..curr.len() {
        let out = leaf(curr.get(idx), prev.get(idx));
        if out.fired {
            curr.set(idx, out.center);
            prev.set(idx, out.neighbor);
        }
    }
    (prev, curr)
}

/// Stages 2-5: clear space-like data errors in the bulk of one round.
pub fn clear_bulk_errors(
    catalog: &GeometryCatalog,
    stage: BulkStage,
    syndrome: &BitGrid,
) -> StagePass {
    let d = catalog.lattice().distance();
    let mut syndrome = syndrome.clone();
    let mut corrections = BitGrid::new(d, d);
    for pair in catalog.bulk_stage(stage) {
        let out = leaf(syndrome.get(pair.center), syndrome.get(pair.neighbor));
        if out.fired {
            corrections.toggle(pair.data);
            syndrome.set(pair.center, out.center);
            syndrome.set(pair.neighbor, out.neighbor);
        }
    }
    StagePass { syndrome, corrections }
}

/// Stages 6-7: clear single-qubit spacetime errors across the round pair.
pub fn clear_spacetime_errors(
    catalog: &GeometryCatalog,
    stage: SpacetimeStage,
    prev: &BitGrid,
    curr: &BitGrid,
) -> PairPass {
    let d = catalog.lattice().distance();
    let mut prev = prev.clone();
    let mut curr = curr.clone();
    let mut corrections = BitGrid::new(d, d);
    for pair in catalog.spacetime_stage(stage) {
        let out = leaf(curr.get(pair.center), prev.get(pair.neighbor));
        if out.fired {
            corrections.toggle(pair.data);
            curr.set(pair.center, out.center);
            prev.set(pair.neighbor, out.neighbor);
        }
    }
    PairPass { prev, curr, corrections }
}

/// Stage 8: clear hook errors across the round pair.
///
/// A hook flips two vertically adjacent data qubits at once, so the leaf
/// correction is broadcast to both.
pub fn clear_hook_errors(catalog: &GeometryCatalog, prev: &BitGrid, curr: &BitGrid) -> PairPass {
    let d = catalog.lattice().distance();
    let mut prev = prev.clone();
    let mut curr = curr.clone();
    let mut corrections = BitGrid::new(d, d);
    for hook in catalog.hook_stage() {
        let out = leaf(curr.get(hook.center), prev.get(hook.neighbor));
        if out.fired {
            corrections.toggle(hook.data[0]);
            corrections.toggle(hook.data[1]);
            curr.set(hook.center, out.center);
            prev.set(hook.neighbor, out.neighbor);
        }
    }
    PairPass { prev, curr, corrections }
}

/// Stage 9: clear boundary ancillas against the artificial always-set
/// boundary neighbor.
///
/// Runs on the outgoing previous round each cycle, and once more on the
/// final round of a block.
pub fn clear_edge_errors(catalog: &GeometryCatalog, syndrome: &BitGrid) -> StagePass {
    let d = catalog.lattice().distance();
    let mut syndrome = syndrome.clone();
    let mut corrections = BitGrid::new(d, d);
    for cell in catalog.edge_stage() {
        let out = leaf(syndrome.get(cell.center), true);
        if out.fired {
            corrections.toggle(cell.data);
            syndrome.set(cell.center, out.center);
        }
    }
    StagePass { syndrome, corrections }
}
