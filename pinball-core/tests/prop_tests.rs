//! Property-based tests for the pipeline invariants.

mod common;

use common::Injector;
use pinball_core::geometry::{BulkStage, GeometryCatalog, SpacetimeStage};
use pinball_core::verification::{all_stabilizers_clear, observable_flipped};
use pinball_core::{BitGrid, Clique, Pinball, Predecoder};
use proptest::prelude::*;

/// One planted error mechanism, with indices reduced into range by the
/// applier.
#[derive(Debug, Clone)]
enum Mechanism {
    Space { round: usize, qubit: usize },
    Measurement { round: usize, ancilla: usize },
    Spacetime { round: usize, top_left: bool, pair: usize },
    Hook { round: usize, pair: usize },
}

fn mechanism_strategy() -> impl Strategy<Value = Mechanism> {
    prop_oneof![
        (0usize..64, 0usize..1024).prop_map(|(round, qubit)| Mechanism::Space { round, qubit }),
        (0usize..64, 0usize..1024)
            .prop_map(|(round, ancilla)| Mechanism::Measurement { round, ancilla }),
        (0usize..64, any::<bool>(), 0usize..1024)
            .prop_map(|(round, top_left, pair)| Mechanism::Spacetime { round, top_left, pair }),
        (0usize..64, 0usize..1024).prop_map(|(round, pair)| Mechanism::Hook { round, pair }),
    ]
}

fn inject(catalog: &GeometryCatalog, num_rounds: usize, mechanisms: &[Mechanism]) -> common::InjectedShot {
    let lattice = catalog.lattice();
    let mut injector = Injector::new(catalog, num_rounds);
    for mechanism in mechanisms {
        match *mechanism {
            Mechanism::Space { round, qubit } => {
                injector.space_error(round % num_rounds, qubit % lattice.num_data_qubits());
            }
            Mechanism::Measurement { round, ancilla } => {
                // Keep the second detector inside the shot.
                injector.measurement_error(
                    round % (num_rounds - 1),
                    ancilla % lattice.num_syndromes(),
                );
            }
            Mechanism::Spacetime { round, top_left, pair } => {
                let stage = if top_left {
                    SpacetimeStage::TopLeft
                } else {
                    SpacetimeStage::TopRight
                };
                injector.spacetime_error(1 + round % (num_rounds - 1), stage, pair);
            }
            Mechanism::Hook { round, pair } => {
                injector.hook_error(1 + round % (num_rounds - 1), pair);
            }
        }
    }
    injector.finish()
}

proptest! {
    /// Committed blocks are sound: when the complex flag stays low, the
    /// corrections reproduce the planted errors up to stabilizers, and the
    /// logical-error verdict matches the net operator's observable parity.
    #[test]
    fn prop_committed_blocks_are_sound(
        d in prop_oneof![Just(3usize), Just(5), Just(7)],
        mechanisms in proptest::collection::vec(mechanism_strategy(), 0..12),
    ) {
        let pinball = Pinball::new(d).unwrap();
        let catalog = pinball.geometry();
        let shot = inject(catalog, d, &mechanisms);

        let block = pinball.decode_batch(&shot.rounds).unwrap();
        if !block.complex {
            let mut net = shot.net_errors(d);
            net.xor_assign(&block.corrections);
            prop_assert!(
                all_stabilizers_clear(catalog.lattice(), &net),
                "committed corrections do not explain the planted errors"
            );
            let verdict = pinball.is_logical_error(
                &shot.data_errors,
                &block.corrections,
                shot.observable_flip(d),
            );
            prop_assert_eq!(verdict, observable_flipped(&net));
        }
    }

    /// Complex stays low and corrections exact for a single planted
    /// mechanism: each pipeline stage handles its own error class alone.
    #[test]
    fn prop_single_mechanism_fully_explained(
        d in prop_oneof![Just(3usize), Just(5), Just(7)],
        mechanism in mechanism_strategy(),
    ) {
        let pinball = Pinball::new(d).unwrap();
        let catalog = pinball.geometry();
        let shot = inject(catalog, d, core::slice::from_ref(&mechanism));

        let block = pinball.decode_batch(&shot.rounds).unwrap();
        prop_assert!(!block.complex, "single mechanism {:?} deferred", mechanism);

        let mut net = shot.net_errors(d);
        net.xor_assign(&block.corrections);
        prop_assert!(all_stabilizers_clear(catalog.lattice(), &net));
    }

    /// Decoding is a pure function of the input rounds.
    #[test]
    fn prop_decode_deterministic(
        d in prop_oneof![Just(3usize), Just(5)],
        mechanisms in proptest::collection::vec(mechanism_strategy(), 0..16),
    ) {
        let pinball = Pinball::new(d).unwrap();
        let shot = inject(pinball.geometry(), d, &mechanisms);

        let first = pinball.decode_batch(&shot.rounds).unwrap();
        let second = pinball.decode_batch(&shot.rounds).unwrap();
        prop_assert_eq!(first, second);
    }

    /// A block that reports no complexity never carries a residual, and a
    /// residual always raises the flag.
    #[test]
    fn prop_complex_flag_covers_residual(
        d in prop_oneof![Just(3usize), Just(5)],
        mechanisms in proptest::collection::vec(mechanism_strategy(), 0..16),
    ) {
        let pinball = Pinball::new(d).unwrap();
        let shot = inject(pinball.geometry(), d, &mechanisms);

        let block = pinball.decode_batch(&shot.rounds).unwrap();
        prop_assert!(block.complex || !block.residual.any());
    }

    /// Stage clearance: no fired pair survives its own stage.
    #[test]
    fn prop_bulk_stage_clears_fired_pairs(
        d in prop_oneof![Just(3usize), Just(5), Just(7)],
        bits in proptest::collection::vec(any::<bool>(), 0..128),
    ) {
        let catalog = GeometryCatalog::shared(d).unwrap();
        let lattice = catalog.lattice();
        let mut syndrome = BitGrid::new(lattice.rows(), lattice.cols());
        for (idx, &bit) in bits.iter().enumerate() {
            if bit {
                syndrome.set(idx % lattice.num_syndromes(), true);
            }
        }

        for stage in BulkStage::ALL {
            let pass = pinball_core::stages::clear_bulk_errors(&catalog, stage, &syndrome);
            for pair in catalog.bulk_stage(stage) {
                prop_assert!(
                    !(pass.syndrome.get(pair.center) && pass.syndrome.get(pair.neighbor)),
                    "pair ({}, {}) still set after its stage",
                    pair.center,
                    pair.neighbor
                );
            }
            // Re-running the stage finds nothing left to do.
            let again = pinball_core::stages::clear_bulk_errors(&catalog, stage, &pass.syndrome);
            prop_assert!(!again.corrections.any());
        }
    }

    /// The Clique baseline is deterministic and only commits corrections on
    /// rounds it did not defer.
    #[test]
    fn prop_clique_deterministic(
        d in prop_oneof![Just(3usize), Just(5)],
        mechanisms in proptest::collection::vec(mechanism_strategy(), 0..8),
    ) {
        let clique = Clique::new(d).unwrap();
        let shot = inject(clique.geometry(), d, &mechanisms);

        let first = clique.decode_batch(&shot.rounds).unwrap();
        let second = clique.decode_batch(&shot.rounds).unwrap();
        prop_assert_eq!(first, second);
    }
}
