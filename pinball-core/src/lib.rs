//! # pinball-core: streaming local predecoders for the rotated surface code
//!
//! This crate implements two lightweight predecoders that sit in front of a
//! general-purpose decoder in a surface code decoding stack:
//!
//! - **Pinball**, a nine-stage fixed-latency pipeline whose cell is a
//!   two-bit combinational leaf repeated over the ancilla lattice. It
//!   resolves isolated measurement errors, bulk and boundary data errors,
//!   spacetime diagonals, and hook errors under circuit-level noise.
//! - **Clique**, a coarser single-stage baseline that resolves one local
//!   neighborhood per flipped ancilla.
//!
//! Both consume streams of per-round Z-ancilla syndromes, emit data-qubit
//! flip masks accumulated over a block of rounds, and raise a **complex
//! flag** whenever residual syndromes remain so that no information is ever
//! silently suppressed: a flagged block must be handed to the downstream
//! decoder together with the residual.
//!
//! ## Structure
//!
//! - [`geometry`] - lattice dimensions and per-stage adjacency tables,
//!   interned per distance
//! - [`leaf`] - the atomic two-input decoder
//! - [`stages`] - the nine pure pipeline stage kernels
//! - [`scheduler`] - streaming round scheduler and block emission
//! - [`pinball`] / [`clique`] - the two predecoder variants
//! - [`predecoder`] - the shared interface and the tagged dispatch type
//! - [`verification`] - stabilizer-parity checks over net correction masks
//! - [`bits`] - packed bit grids for syndromes and correction masks
//!
//! ## Example
//!
//! ```
//! use pinball_core::{BitGrid, Pinball, Predecoder};
//!
//! let pinball = Pinball::new(3)?;
//! // Three zero rounds: nothing to explain, nothing deferred.
//! let rounds = vec![BitGrid::new(4, 1); 3];
//! let block = pinball.decode_batch(&rounds)?;
//! assert!(!block.complex);
//! assert!(!block.corrections.any());
//! # Ok::<(), pinball_core::PredecodeError>(())
//! ```

#![deny(missing_docs)]

pub mod bits;
pub mod clique;
pub mod error;
pub mod geometry;
pub mod leaf;
pub mod pinball;
pub mod predecoder;
pub mod scheduler;
pub mod stages;
pub mod verification;

pub use bits::BitGrid;
pub use clique::Clique;
pub use error::PredecodeError;
pub use geometry::{
    BulkStage, CliqueArm, CliqueCell, EdgeCell, GeometryCatalog, HookPair, Lattice, LeafPair,
    SpacetimeStage,
};
pub use leaf::{leaf, LeafOutput};
pub use pinball::Pinball;
pub use predecoder::{
    AnyPredecoder, BlockResult, BlockTail, Predecoder, PredecoderKind, RoundResult,
};
pub use scheduler::RoundScheduler;
