//! Correction verification helpers.
//!
//! These operate on a net data-qubit mask, usually the XOR of a block
//! correction with the ground-truth errors of a shot. A sound correction
//! leaves every stabilizer at even parity; whether it also flipped the
//! logical observable is a parity over data columns.

use crate::bits::BitGrid;
use crate::geometry::Lattice;

/// Stabilizer parities of a net data mask, as a syndrome grid.
///
/// Each ancilla cell is set when the mask has odd weight over the data
/// qubits that ancilla measures.
pub fn stabilizer_residual(lattice: &Lattice, net: &BitGrid) -> BitGrid {
    let mut residual = BitGrid::new(lattice.rows(), lattice.cols());
    for i in 0..lattice.rows() {
        for j in 0..lattice.cols() {
            let mut parity = false;
            for qubit in lattice.ancilla_support(i, j).into_iter().flatten() {
                parity ^= net.get(qubit);
            }
            if parity {
                residual.set(lattice.syndrome_index(i, j), true);
            }
        }
    }
    residual
}

/// Whether a net data mask leaves every stabilizer at even parity.
pub fn all_stabilizers_clear(lattice: &Lattice, net: &BitGrid) -> bool {
    !stabilizer_residual(lattice, net).any()
}

/// Whether a data mask overlaps the leftmost column an odd number of times.
///
/// The leftmost data column supports the X-basis logical observable of the
/// memory experiment.
pub fn observable_flipped(mask: &BitGrid) -> bool {
    (0..mask.rows()).fold(false, |parity, r| parity ^ mask.get_at(r, 0))
}

/// Whether any data column of the mask has odd weight.
pub fn any_column_odd(mask: &BitGrid) -> bool {
    (0..mask.cols()).any(|c| {
        (0..mask.rows())
            .filter(|&r| mask.get_at(r, c))
            .count()
            % 2
            == 1
    })
}
