//! Rotated surface code lattice geometry.
//!
//! For an odd code distance `d`, the Z-error decoding problem sees one
//! syndrome grid of `(d+1)` rows by `(d-1)/2` columns of ancilla detectors
//! per measurement round, laid over a `d x d` grid of data qubits. Ancilla
//! rows alternate horizontal offset, so the four data qubits under the
//! ancilla at `(i, j)` sit at column offset `i % 2`:
//!
//! ```text
//!        data col:  0   1   2   3   4
//!   ancilla row 0         A           (even rows shifted right)
//!   data row 0      o   o   o   o   o
//!   ancilla row 1     A       A
//!   data row 1      o   o   o   o   o
//!   ancilla row 2         A
//! ```
//!
//! Every pipeline stage examines a fixed set of ancilla pairs and corrects a
//! fixed data qubit per pair. Those adjacency tables depend only on the
//! distance, so they are computed once per distance and shared behind an
//! [`Arc`] across predecoder instances and threads.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::bits::BitGrid;
use crate::error::PredecodeError;

/// Lattice dimensions for one odd code distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lattice {
    distance: usize,
    rows: usize,
    cols: usize,
}

impl Lattice {
    /// Validate the distance and derive the syndrome grid dimensions.
    pub fn new(distance: usize) -> Result<Self, PredecodeError> {
        if distance < 3 || distance % 2 == 0 {
            return Err(PredecodeError::InvalidDistance(distance));
        }
        Ok(Self {
            distance,
            rows: distance + 1,
            cols: (distance - 1) / 2,
        })
    }

    /// Code distance.
    #[inline]
    pub fn distance(&self) -> usize {
        self.distance
    }

    /// Syndrome grid rows, `d + 1`.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Syndrome grid columns, `(d - 1) / 2`.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Syndrome bits per round.
    #[inline]
    pub fn num_syndromes(&self) -> usize {
        self.rows * self.cols
    }

    /// Data qubits in the patch.
    #[inline]
    pub fn num_data_qubits(&self) -> usize {
        self.distance * self.distance
    }

    /// Flat row-major index of the ancilla at `(i, j)`.
    #[inline]
    pub fn syndrome_index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.rows && j < self.cols);
        i * self.cols + j
    }

    /// Flat row-major index of the data qubit at `(r, c)`.
    #[inline]
    pub fn data_index(&self, r: usize, c: usize) -> usize {
        debug_assert!(r < self.distance && c < self.distance);
        r * self.distance + c
    }

    /// Ancilla index for possibly out-of-bounds coordinates.
    fn ancilla_at(&self, i: isize, j: isize) -> Option<usize> {
        (i >= 0 && (i as usize) < self.rows && j >= 0 && (j as usize) < self.cols)
            .then(|| self.syndrome_index(i as usize, j as usize))
    }

    /// Data qubit index for possibly out-of-bounds coordinates.
    fn data_at(&self, r: isize, c: isize) -> Option<usize> {
        (r >= 0
            && (r as usize) < self.distance
            && c >= 0
            && (c as usize) < self.distance)
            .then(|| self.data_index(r as usize, c as usize))
    }

    /// The up-to-four data qubits measured by the ancilla at `(i, j)`, in
    /// top-left, top-right, bottom-left, bottom-right order.
    ///
    /// Even ancilla rows sit one data column to the right of odd rows.
    pub fn ancilla_support(&self, i: usize, j: usize) -> [Option<usize>; 4] {
        let d = self.distance as isize;
        let (i, j) = (i as isize, j as isize);
        let offset = if i % 2 == 0 { 1 } else { 0 };
        let top_left = d * (i - 1) + offset + 2 * j;
        let bottom_left = d * i + offset + 2 * j;
        let in_patch = |q: isize| (q >= 0 && q < d * d).then_some(q as usize);
        [
            in_patch(top_left),
            in_patch(top_left + 1),
            in_patch(bottom_left),
            in_patch(bottom_left + 1),
        ]
    }
}

/// The four single-round bulk stages, one diagonal direction each.
///
/// Bulk leaves are centered on odd ancilla rows; the neighbor sits on the
/// adjacent even row in the named direction and the corrected data qubit
/// lies on the edge between the two ancillas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkStage {
    /// Neighbor at `(i-1, j)`, data qubit `(i-1, 2j+1)`.
    TopRight,
    /// Neighbor at `(i+1, j)`, data qubit `(i, 2j+1)`.
    BottomRight,
    /// Neighbor at `(i+1, j-1)`, data qubit `(i, 2j)`.
    BottomLeft,
    /// Neighbor at `(i-1, j-1)`, data qubit `(i-1, 2j)`.
    TopLeft,
}

impl BulkStage {
    /// All bulk stages in pipeline order.
    pub const ALL: [BulkStage; 4] = [
        BulkStage::TopRight,
        BulkStage::BottomRight,
        BulkStage::BottomLeft,
        BulkStage::TopLeft,
    ];
}

/// The two round-pair diagonal stages.
///
/// The center ancilla fires in the current round and its neighbor in the
/// previous round, one row up in the named direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpacetimeStage {
    /// Neighbor at `(i-1, j+1-i%2)`, data qubit `(i-1, 2(j+1)-i%2)`.
    TopRight,
    /// Neighbor at `(i-1, j-i%2)`, data qubit `(i-1, 2(j+1)-i%2-1)`.
    TopLeft,
}

impl SpacetimeStage {
    /// Both spacetime stages in pipeline order.
    pub const ALL: [SpacetimeStage; 2] = [SpacetimeStage::TopRight, SpacetimeStage::TopLeft];
}

/// One leaf site: a center ancilla, its partner ancilla, and the data qubit
/// flipped when both fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafPair {
    /// Flat syndrome index of the center ancilla.
    pub center: usize,
    /// Flat syndrome index of the partner ancilla.
    pub neighbor: usize,
    /// Flat data index of the corrected qubit.
    pub data: usize,
}

/// One hook site: ancillas two rows apart across a round pair, correcting
/// the two data qubits between them at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookPair {
    /// Current-round ancilla at `(i, j)`, `i >= 2`.
    pub center: usize,
    /// Previous-round ancilla at `(i-2, j)`.
    pub neighbor: usize,
    /// Data qubits `(i-1, c)` and `(i-2, c)` with `c = 2(j+1) - i%2 - 1`.
    pub data: [usize; 2],
}

/// One boundary site: an ancilla whose partner is the artificial always-set
/// boundary, so it fires whenever the ancilla alone is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeCell {
    /// Flat syndrome index of the boundary-adjacent ancilla.
    pub center: usize,
    /// Flat data index of the boundary qubit flipped on fire.
    pub data: usize,
}

/// One arm of a decoding clique: a diagonal partner ancilla and the data
/// qubit on the edge between it and the clique center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CliqueArm {
    /// Flat syndrome index of the partner ancilla.
    pub ancilla: usize,
    /// Flat data index of the qubit corrected when this arm fires.
    pub data: usize,
}

/// The local clique around one ancilla: up to four diagonal arms plus an
/// optional boundary fallback qubit for edge and corner ancillas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliqueCell {
    /// Flat syndrome index of the clique center.
    pub center: usize,
    /// Boundary qubit to correct when an edge ancilla fires with an even
    /// number of arms. `None` for bulk ancillas.
    pub edge: Option<usize>,
    /// Arms in top-right, bottom-right, bottom-left, top-left order; `None`
    /// where the partner ancilla falls outside the lattice.
    pub arms: [Option<CliqueArm>; 4],
}

/// Per-distance adjacency tables, computed once and shared read-only.
#[derive(Debug, Clone)]
pub struct GeometryCatalog {
    lattice: Lattice,
    bulk: [Vec<LeafPair>; 4],
    spacetime: [Vec<LeafPair>; 2],
    hooks: Vec<HookPair>,
    edges: Vec<EdgeCell>,
    cliques: Vec<CliqueCell>,
    qubit_ancillas: Vec<Vec<usize>>,
}

/// Process-wide catalog cache, keyed by distance.
static CATALOGS: Mutex<BTreeMap<usize, Arc<GeometryCatalog>>> = Mutex::new(BTreeMap::new());

impl GeometryCatalog {
    /// Build the full set of adjacency tables for one distance.
    pub fn new(distance: usize) -> Result<Self, PredecodeError> {
        let lattice = Lattice::new(distance)?;
        let bulk = BulkStage::ALL.map(|stage| bulk_pairs(&lattice, stage));
        let spacetime = SpacetimeStage::ALL.map(|stage| spacetime_pairs(&lattice, stage));
        Ok(Self {
            lattice,
            bulk,
            spacetime,
            hooks: hook_pairs(&lattice),
            edges: edge_cells(&lattice),
            cliques: clique_cells(&lattice),
            qubit_ancillas: qubit_ancillas(&lattice),
        })
    }

    /// Fetch the interned catalog for a distance, building it on first use.
    pub fn shared(distance: usize) -> Result<Arc<Self>, PredecodeError> {
        let mut cache = CATALOGS.lock();
        if let Some(catalog) = cache.get(&distance) {
            return Ok(Arc::clone(catalog));
        }
        let catalog = Arc::new(Self::new(distance)?);
        cache.insert(distance, Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Lattice dimensions.
    #[inline]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Leaf sites for one bulk stage.
    pub fn bulk_stage(&self, stage: BulkStage) -> &[LeafPair] {
        match stage {
            BulkStage::TopRight => &self.bulk[0],
            BulkStage::BottomRight => &self.bulk[1],
            BulkStage::BottomLeft => &self.bulk[2],
            BulkStage::TopLeft => &self.bulk[3],
        }
    }

    /// Leaf sites for one spacetime stage.
    pub fn spacetime_stage(&self, stage: SpacetimeStage) -> &[LeafPair] {
        match stage {
            SpacetimeStage::TopRight => &self.spacetime[0],
            SpacetimeStage::TopLeft => &self.spacetime[1],
        }
    }

    /// Hook sites.
    pub fn hook_stage(&self) -> &[HookPair] {
        &self.hooks
    }

    /// Boundary sites for the edge stage.
    pub fn edge_stage(&self) -> &[EdgeCell] {
        &self.edges
    }

    /// Clique cells for the Clique predecoder, in row-major center order.
    pub fn clique_cells(&self) -> &[CliqueCell] {
        &self.cliques
    }

    /// Ancillas that measure the given data qubit (one or two).
    pub fn ancillas_of(&self, data_idx: usize) -> &[usize] {
        &self.qubit_ancillas[data_idx]
    }

    /// Data qubits a bulk stage may flip.
    pub fn bulk_data_mask(&self, stage: BulkStage) -> BitGrid {
        pair_mask(&self.lattice, self.bulk_stage(stage))
    }

    /// Data qubits a spacetime stage may flip.
    pub fn spacetime_data_mask(&self, stage: SpacetimeStage) -> BitGrid {
        pair_mask(&self.lattice, self.spacetime_stage(stage))
    }

    /// Data qubits the hook stage may flip.
    pub fn hook_data_mask(&self) -> BitGrid {
        let d = self.lattice.distance();
        let mut mask = BitGrid::new(d, d);
        for hook in &self.hooks {
            mask.set(hook.data[0], true);
            mask.set(hook.data[1], true);
        }
        mask
    }

    /// Data qubits the edge stage flips.
    pub fn edge_data_mask(&self) -> BitGrid {
        let d = self.lattice.distance();
        let mut mask = BitGrid::new(d, d);
        for cell in &self.edges {
            mask.set(cell.data, true);
        }
        mask
    }
}

fn pair_mask(lattice: &Lattice, pairs: &[LeafPair]) -> BitGrid {
    let d = lattice.distance();
    let mut mask = BitGrid::new(d, d);
    for pair in pairs {
        mask.set(pair.data, true);
    }
    mask
}

fn bulk_pairs(lattice: &Lattice, stage: BulkStage) -> Vec<LeafPair> {
    let mut pairs = Vec::new();
    for i in (1..lattice.rows()).step_by(2) {
        for j in 0..lattice.cols() {
            let (i, j) = (i as isize, j as isize);
            // Odd-row centers; the neighbor column already accounts for the
            // even-row offset.
            let (neighbor, data) = match stage {
                BulkStage::TopRight => ((i - 1, j), (i - 1, 2 * j + 1)),
                BulkStage::BottomRight => ((i + 1, j), (i, 2 * j + 1)),
                BulkStage::BottomLeft => ((i + 1, j - 1), (i, 2 * j)),
                BulkStage::TopLeft => ((i - 1, j - 1), (i - 1, 2 * j)),
            };
            if let (Some(neighbor), Some(data)) = (
                lattice.ancilla_at(neighbor.0, neighbor.1),
                lattice.data_at(data.0, data.1),
            ) {
                pairs.push(LeafPair {
                    center: lattice.syndrome_index(i as usize, j as usize),
                    neighbor,
                    data,
                });
            }
        }
    }
    pairs
}

fn spacetime_pairs(lattice: &Lattice, stage: SpacetimeStage) -> Vec<LeafPair> {
    let mut pairs = Vec::new();
    for i in 0..lattice.rows() {
        for j in 0..lattice.cols() {
            let parity = (i % 2) as isize;
            let (i, j) = (i as isize, j as isize);
            let (neighbor, data) = match stage {
                SpacetimeStage::TopRight => {
                    ((i - 1, j + 1 - parity), (i - 1, 2 * (j + 1) - parity))
                }
                SpacetimeStage::TopLeft => {
                    ((i - 1, j - parity), (i - 1, 2 * (j + 1) - parity - 1))
                }
            };
            if let (Some(neighbor), Some(data)) = (
                lattice.ancilla_at(neighbor.0, neighbor.1),
                lattice.data_at(data.0, data.1),
            ) {
                pairs.push(LeafPair {
                    center: lattice.syndrome_index(i as usize, j as usize),
                    neighbor,
                    data,
                });
            }
        }
    }
    pairs
}

fn hook_pairs(lattice: &Lattice) -> Vec<HookPair> {
    let mut pairs = Vec::new();
    for i in 2..lattice.rows() {
        for j in 0..lattice.cols() {
            // The pair of qubits between the two ancillas; always in bounds
            // for i >= 2.
            let col = 2 * (j + 1) - i % 2 - 1;
            pairs.push(HookPair {
                center: lattice.syndrome_index(i, j),
                neighbor: lattice.syndrome_index(i - 2, j),
                data: [
                    lattice.data_index(i - 1, col),
                    lattice.data_index(i - 2, col),
                ],
            });
        }
    }
    pairs
}

fn edge_cells(lattice: &Lattice) -> Vec<EdgeCell> {
    let d = lattice.distance();
    let mut cells = Vec::new();
    // Odd rows in the first column explain through the left boundary. The
    // top-left qubit is a fixed choice; the alternative differs by a
    // stabilizer.
    for i in (1..lattice.rows()).step_by(2) {
        cells.push(EdgeCell {
            center: lattice.syndrome_index(i, 0),
            data: lattice.data_index(i - 1, 0),
        });
    }
    // Even rows in the last column explain through the right boundary.
    for i in (0..lattice.rows()).step_by(2) {
        cells.push(EdgeCell {
            center: lattice.syndrome_index(i, lattice.cols() - 1),
            data: lattice.data_index(i, d - 1),
        });
    }
    cells
}

fn clique_cells(lattice: &Lattice) -> Vec<CliqueCell> {
    let d = lattice.distance();
    let mut cells = Vec::new();
    for i in 0..lattice.rows() {
        for j in 0..lattice.cols() {
            let parity = (i % 2) as isize;
            let (ii, jj) = (i as isize, j as isize);
            // Arms in top-right, bottom-right, bottom-left, top-left order.
            let arm_coords = [
                ((ii - 1, jj + 1 - parity), (ii - 1, 2 * (jj + 1) - parity)),
                ((ii + 1, jj + 1 - parity), (ii, 2 * (jj + 1) - parity)),
                ((ii + 1, jj - parity), (ii, 2 * (jj + 1) - parity - 1)),
                ((ii - 1, jj - parity), (ii - 1, 2 * (jj + 1) - parity - 1)),
            ];
            let arms = arm_coords.map(|(ancilla, data)| {
                match (
                    lattice.ancilla_at(ancilla.0, ancilla.1),
                    lattice.data_at(data.0, data.1),
                ) {
                    (Some(ancilla), Some(data)) => Some(CliqueArm { ancilla, data }),
                    _ => None,
                }
            });
            let is_edge = (i % 2 == 0 && j == lattice.cols() - 1) || (i % 2 == 1 && j == 0);
            let edge = is_edge.then(|| {
                let row = if i < lattice.rows() - 1 { i } else { i - 1 };
                let col = if j == 0 { 0 } else { d - 1 };
                lattice.data_index(row, col)
            });
            cells.push(CliqueCell {
                center: lattice.syndrome_index(i, j),
                edge,
                arms,
            });
        }
    }
    cells
}

fn qubit_ancillas(lattice: &Lattice) -> Vec<Vec<usize>> {
    let mut table = vec![Vec::new(); lattice.num_data_qubits()];
    for i in 0..lattice.rows() {
        for j in 0..lattice.cols() {
            for qubit in lattice.ancilla_support(i, j).into_iter().flatten() {
                table[qubit].push(lattice.syndrome_index(i, j));
            }
        }
    }
    table
}
