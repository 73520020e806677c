//! The public predecoder interface.
//!
//! Both predecoders expose the same three operations: a per-round decode, a
//! per-block batch decode, and the logical-error check against ground
//! truth. The harness selects a variant by tag and dispatches statically
//! through [`AnyPredecoder`].

use core::fmt;
use core::str::FromStr;

use crate::bits::BitGrid;
use crate::clique::Clique;
use crate::error::PredecodeError;
use crate::geometry::GeometryCatalog;
use crate::pinball::Pinball;
use crate::scheduler::RoundScheduler;

/// Output of decoding one round against the retained previous round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    /// Data qubits flipped while explaining this round pair.
    pub corrections: BitGrid,
    /// The current round after the pipeline, to be retained as the next
    /// previous round.
    pub next_prev: BitGrid,
    /// Whether this round left syndromes the predecoder cannot explain.
    pub complex: bool,
}

/// Output of the block-boundary pass over the final retained round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTail {
    /// Data qubits flipped by the final pass.
    pub corrections: BitGrid,
    /// Syndromes still set after the final pass.
    pub residual: BitGrid,
}

/// Output of decoding a full block of rounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockResult {
    /// XOR accumulation of every stage correction over the block.
    pub corrections: BitGrid,
    /// Whether any round of the block left unexplained syndromes; when set,
    /// the downstream decoder must be invoked and `corrections` discarded.
    pub complex: bool,
    /// Syndromes of the final round still set at block end.
    pub residual: BitGrid,
}

/// Common interface of the local predecoders.
pub trait Predecoder {
    /// The shared geometry tables this predecoder decodes over.
    fn geometry(&self) -> &GeometryCatalog;

    /// Code distance.
    fn distance(&self) -> usize {
        self.geometry().lattice().distance()
    }

    /// Decode one round against the retained previous round.
    fn decode_round(&self, prev: &BitGrid, curr: &BitGrid) -> RoundResult;

    /// Run the block-boundary pass over the final retained round.
    fn finish_block(&self, last: &BitGrid) -> BlockTail;

    /// Whether the block corrections form a logical error given the sampled
    /// per-round data errors and the circuit's observable flip.
    fn is_logical_error(
        &self,
        errors: &[BitGrid],
        corrections: &BitGrid,
        observable_flip: bool,
    ) -> bool;

    /// Decode a slice of consecutive rounds as one block.
    fn decode_batch(&self, rounds: &[BitGrid]) -> Result<BlockResult, PredecodeError>
    where
        Self: Sized,
    {
        let mut scheduler = RoundScheduler::with_block_len(self, rounds.len())?;
        let mut emitted = None;
        for (idx, round) in rounds.iter().enumerate() {
            emitted = scheduler.push_round(idx, round)?;
        }
        Ok(emitted.expect("scheduler emits a block after its final round"))
    }
}

impl<T: Predecoder> Predecoder for &T {
    fn geometry(&self) -> &GeometryCatalog {
        (**self).geometry()
    }

    fn decode_round(&self, prev: &BitGrid, curr: &BitGrid) -> RoundResult {
        (**self).decode_round(prev, curr)
    }

    fn finish_block(&self, last: &BitGrid) -> BlockTail {
        (**self).finish_block(last)
    }

    fn is_logical_error(
        &self,
        errors: &[BitGrid],
        corrections: &BitGrid,
        observable_flip: bool,
    ) -> bool {
        (**self).is_logical_error(errors, corrections, observable_flip)
    }
}

/// Configuration tag selecting a predecoder variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredecoderKind {
    /// The nine-stage pipelined predecoder.
    Pinball,
    /// The single-stage local clique predecoder.
    Clique,
}

impl PredecoderKind {
    /// Variant name as used in configuration and output paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            PredecoderKind::Pinball => "Pinball",
            PredecoderKind::Clique => "Clique",
        }
    }
}

impl fmt::Display for PredecoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredecoderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pinball" | "pinball" => Ok(PredecoderKind::Pinball),
            "Clique" | "clique" => Ok(PredecoderKind::Clique),
            other => Err(format!("unrecognized predecoder {:?}", other)),
        }
    }
}

/// A predecoder variant behind a tag, dispatched statically.
#[derive(Debug, Clone)]
pub enum AnyPredecoder {
    /// The nine-stage pipelined predecoder.
    Pinball(Pinball),
    /// The single-stage local clique predecoder.
    Clique(Clique),
}

macro_rules! dispatch {
    ($self:expr, $method:ident $(, $arg:expr)*) => {
        match $self {
            AnyPredecoder::Pinball(p) => p.$method($($arg),*),
            AnyPredecoder::Clique(c) => c.$method($($arg),*),
        }
    };
}

impl AnyPredecoder {
    /// Construct the tagged variant for a distance.
    pub fn new(kind: PredecoderKind, distance: usize) -> Result<Self, PredecodeError> {
        Ok(match kind {
            PredecoderKind::Pinball => AnyPredecoder::Pinball(Pinball::new(distance)?),
            PredecoderKind::Clique => AnyPredecoder::Clique(Clique::new(distance)?),
        })
    }

    /// The tag of the held variant.
    pub fn kind(&self) -> PredecoderKind {
        match self {
            AnyPredecoder::Pinball(_) => PredecoderKind::Pinball,
            AnyPredecoder::Clique(_) => PredecoderKind::Clique,
        }
    }
}

impl Predecoder for AnyPredecoder {
    fn geometry(&self) -> &GeometryCatalog {
        dispatch!(self, geometry)
    }

    fn decode_round(&self, prev: &BitGrid, curr: &BitGrid) -> RoundResult {
        dispatch!(self, decode_round, prev, curr)
    }

    fn finish_block(&self, last: &BitGrid) -> BlockTail {
        dispatch!(self, finish_block, last)
    }

    fn is_logical_error(
        &self,
        errors: &[BitGrid],
        corrections: &BitGrid,
        observable_flip: bool,
    ) -> bool {
        dispatch!(self, is_logical_error, errors, corrections, observable_flip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips() {
        assert_eq!("Pinball".parse::<PredecoderKind>(), Ok(PredecoderKind::Pinball));
        assert_eq!("clique".parse::<PredecoderKind>(), Ok(PredecoderKind::Clique));
        assert!("Matching".parse::<PredecoderKind>().is_err());
        assert_eq!(PredecoderKind::Pinball.to_string(), "Pinball");
    }

    #[test]
    fn test_any_predecoder_dispatches() {
        let any = AnyPredecoder::new(PredecoderKind::Pinball, 3).unwrap();
        assert_eq!(any.kind(), PredecoderKind::Pinball);
        assert_eq!(any.distance(), 3);

        let any = AnyPredecoder::new(PredecoderKind::Clique, 5).unwrap();
        assert_eq!(any.kind(), PredecoderKind::Clique);
        assert_eq!(any.distance(), 5);
    }
}
