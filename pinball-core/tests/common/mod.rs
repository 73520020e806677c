//! Shared test utilities: grid builders and a ground-truth error injector.
//!
//! The injector plants individual error mechanisms (space-like, measurement,
//! spacetime diagonal, hook) into a multi-round shot, tracking both the
//! detector events they fire and the data qubits they actually flip, so
//! tests can check decoded corrections against ground truth.

#![allow(dead_code)] // Not all test files use all helpers

use pinball_core::geometry::{GeometryCatalog, SpacetimeStage};
use pinball_core::verification::observable_flipped;
use pinball_core::BitGrid;

/// A multi-round shot with ground truth attached.
#[derive(Debug, Clone)]
pub struct InjectedShot {
    /// Per-round syndrome grids.
    pub rounds: Vec<BitGrid>,
    /// Per-round data-qubit flips.
    pub data_errors: Vec<BitGrid>,
}

impl InjectedShot {
    /// Net data-qubit flips over the whole shot.
    pub fn net_errors(&self, distance: usize) -> BitGrid {
        let mut net = BitGrid::new(distance, distance);
        for round in &self.data_errors {
            net.xor_assign(round);
        }
        net
    }

    /// Whether the ground-truth errors flip the left-column observable.
    pub fn observable_flip(&self, distance: usize) -> bool {
        observable_flipped(&self.net_errors(distance))
    }
}

/// Plants error mechanisms into a fixed-length shot.
pub struct Injector<'a> {
    catalog: &'a GeometryCatalog,
    shot: InjectedShot,
}

impl<'a> Injector<'a> {
    pub fn new(catalog: &'a GeometryCatalog, num_rounds: usize) -> Self {
        let lattice = catalog.lattice();
        let d = lattice.distance();
        Self {
            catalog,
            shot: InjectedShot {
                rounds: vec![BitGrid::new(lattice.rows(), lattice.cols()); num_rounds],
                data_errors: vec![BitGrid::new(d, d); num_rounds],
            },
        }
    }

    pub fn num_rounds(&self) -> usize {
        self.shot.rounds.len()
    }

    /// A data error before round `round`: flips the qubit and fires its
    /// adjacent detectors in that round.
    pub fn space_error(&mut self, round: usize, qubit: usize) {
        self.shot.data_errors[round].toggle(qubit);
        for &ancilla in self.catalog.ancillas_of(qubit) {
            self.shot.rounds[round].toggle(ancilla);
        }
    }

    /// A misread ancilla in round `round`: fires the detector there and in
    /// the following round, flipping no data qubit.
    pub fn measurement_error(&mut self, round: usize, ancilla: usize) {
        self.shot.rounds[round].toggle(ancilla);
        if round + 1 < self.shot.rounds.len() {
            self.shot.rounds[round + 1].toggle(ancilla);
        }
    }

    /// A spacetime diagonal landing in round `round >= 1`, taken from the
    /// stage's pair table.
    pub fn spacetime_error(&mut self, round: usize, stage: SpacetimeStage, pair_idx: usize) {
        let pairs = self.catalog.spacetime_stage(stage);
        let pair = &pairs[pair_idx % pairs.len()];
        self.shot.rounds[round - 1].toggle(pair.neighbor);
        self.shot.rounds[round].toggle(pair.center);
        self.shot.data_errors[round].toggle(pair.data);
    }

    /// A hook error landing in round `round >= 1`, taken from the hook
    /// table.
    pub fn hook_error(&mut self, round: usize, hook_idx: usize) {
        let hooks = self.catalog.hook_stage();
        let hook = &hooks[hook_idx % hooks.len()];
        self.shot.rounds[round - 1].toggle(hook.neighbor);
        self.shot.rounds[round].toggle(hook.center);
        self.shot.data_errors[round].toggle(hook.data[0]);
        self.shot.data_errors[round].toggle(hook.data[1]);
    }

    pub fn finish(self) -> InjectedShot {
        self.shot
    }
}

/// Build a syndrome grid with the given `(row, col)` ancillas set.
pub fn syndrome_grid(catalog: &GeometryCatalog, cells: &[(usize, usize)]) -> BitGrid {
    let lattice = catalog.lattice();
    let mut grid = BitGrid::new(lattice.rows(), lattice.cols());
    for &(i, j) in cells {
        grid.set(lattice.syndrome_index(i, j), true);
    }
    grid
}

/// Build a data mask with the given `(row, col)` qubits set.
pub fn data_grid(distance: usize, cells: &[(usize, usize)]) -> BitGrid {
    let mut grid = BitGrid::new(distance, distance);
    for &(r, c) in cells {
        grid.set_at(r, c, true);
    }
    grid
}
