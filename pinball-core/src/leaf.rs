//! The two-bit leaf decoder.

/// Result of evaluating one leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafOutput {
    /// Whether both inputs were set, implying a correction.
    pub fired: bool,
    /// Center ancilla bit after the leaf, cleared on fire.
    pub center: bool,
    /// Neighbor ancilla bit after the leaf, cleared on fire.
    pub neighbor: bool,
}

/// Evaluate the atomic two-input decoder.
///
/// The leaf fires exactly when both ancilla bits are set. The fired bit is
/// the correction, broadcast by the caller to however many data qubits the
/// stage associates with the pair (one for the bulk, spacetime, and edge
/// stages, two for the hook stage), and both inputs are suppressed so no
/// later stage can consume them again.
#[inline]
pub fn leaf(center: bool, neighbor: bool) -> LeafOutput {
    let fired = center && neighbor;
    LeafOutput {
        fired,
        center: center ^ fired,
        neighbor: neighbor ^ fired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truth_table() {
        assert_eq!(
            leaf(false, false),
            LeafOutput { fired: false, center: false, neighbor: false }
        );
        assert_eq!(
            leaf(true, false),
            LeafOutput { fired: false, center: true, neighbor: false }
        );
        assert_eq!(
            leaf(false, true),
            LeafOutput { fired: false, center: false, neighbor: true }
        );
        assert_eq!(
            leaf(true, true),
            LeafOutput { fired: true, center: false, neighbor: false }
        );
    }

    #[test]
    fn test_idempotent() {
        for center in [false, true] {
            for neighbor in [false, true] {
                let first = leaf(center, neighbor);
                let second = leaf(first.center, first.neighbor);
                assert!(!second.fired);
                assert_eq!(second.center, first.center);
                assert_eq!(second.neighbor, first.neighbor);
            }
        }
    }
}
