//! Streaming round scheduler.
//!
//! The scheduler owns all mutable decoding state: the retained previous
//! round, the round counter, the accumulated block correction, and the
//! complex flag. Rounds must arrive in order; each one flows through the
//! predecoder against the retained round, and at the block boundary the
//! scheduler emits the aggregate result and resets for the next block.

use crate::bits::BitGrid;
use crate::error::PredecodeError;
use crate::predecoder::{BlockResult, Predecoder};

/// Drives a predecoder over a stream of syndrome rounds.
#[derive(Debug)]
pub struct RoundScheduler<P: Predecoder> {
    predecoder: P,
    block_len: usize,
    prev: BitGrid,
    next_round: usize,
    corrections: BitGrid,
    complex: bool,
}

impl<P: Predecoder> RoundScheduler<P> {
    /// Create a scheduler emitting one block per `d` rounds.
    pub fn new(predecoder: P) -> Self {
        let block_len = predecoder.distance();
        Self::with_block_len(predecoder, block_len)
            .expect("code distance is a nonzero block length")
    }

    /// Create a scheduler emitting one block per `block_len` rounds.
    ///
    /// The memory experiment produces `d + 1` detector rounds per shot, one
    /// more than the scheduling default.
    pub fn with_block_len(predecoder: P, block_len: usize) -> Result<Self, PredecodeError> {
        if block_len == 0 {
            return Err(PredecodeError::EmptyBlock);
        }
        let lattice = predecoder.geometry().lattice();
        let prev = BitGrid::new(lattice.rows(), lattice.cols());
        let d = lattice.distance();
        Ok(Self {
            predecoder,
            block_len,
            prev,
            next_round: 0,
            corrections: BitGrid::new(d, d),
            complex: false,
        })
    }

    /// Rounds per emitted block.
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Index of the round the scheduler expects next.
    pub fn next_round(&self) -> usize {
        self.next_round
    }

    /// Feed the next round; returns the block result on the final round of
    /// each block.
    ///
    /// Rounds are indexed from zero within the block. A round with the
    /// wrong shape or index leaves the scheduler state untouched.
    pub fn push_round(
        &mut self,
        round_idx: usize,
        round: &BitGrid,
    ) -> Result<Option<BlockResult>, PredecodeError> {
        let lattice = self.predecoder.geometry().lattice();
        if (round.rows(), round.cols()) != (lattice.rows(), lattice.cols()) {
            return Err(PredecodeError::ShapeMismatch {
                expected: lattice.num_syndromes(),
                got: round.len(),
            });
        }
        if round_idx != self.next_round {
            return Err(PredecodeError::OutOfOrderRound {
                expected: self.next_round,
                got: round_idx,
            });
        }

        let result = self.predecoder.decode_round(&self.prev, round);
        self.corrections.xor_assign(&result.corrections);
        self.complex |= result.complex;
        self.prev = result.next_prev;
        self.next_round += 1;

        if self.next_round < self.block_len {
            return Ok(None);
        }

        let tail = self.predecoder.finish_block(&self.prev);
        let mut corrections = self.corrections.clone();
        corrections.xor_assign(&tail.corrections);
        let block = BlockResult {
            corrections,
            complex: self.complex || tail.residual.any(),
            residual: tail.residual,
        };
        self.reset();
        Ok(Some(block))
    }

    /// Feed the next round from one byte per detector, row-major.
    pub fn push_round_bits(
        &mut self,
        round_idx: usize,
        bits: &[u8],
    ) -> Result<Option<BlockResult>, PredecodeError> {
        let lattice = self.predecoder.geometry().lattice();
        let round = BitGrid::from_bits(lattice.rows(), lattice.cols(), bits)?;
        self.push_round(round_idx, &round)
    }

    fn reset(&mut self) {
        let lattice = self.predecoder.geometry().lattice();
        let d = lattice.distance();
        self.prev = BitGrid::new(lattice.rows(), lattice.cols());
        self.next_round = 0;
        self.corrections = BitGrid::new(d, d);
        self.complex = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pinball::Pinball;

    #[test]
    fn test_rejects_out_of_order_round() {
        let pinball = Pinball::new(3).unwrap();
        let mut scheduler = RoundScheduler::new(&pinball);
        let round = BitGrid::new(4, 1);

        assert_eq!(
            scheduler.push_round(1, &round),
            Err(PredecodeError::OutOfOrderRound { expected: 0, got: 1 })
        );
        // The failed push left the scheduler expecting round 0.
        assert!(scheduler.push_round(0, &round).unwrap().is_none());
        assert_eq!(
            scheduler.push_round(0, &round),
            Err(PredecodeError::OutOfOrderRound { expected: 1, got: 0 })
        );
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let pinball = Pinball::new(3).unwrap();
        let mut scheduler = RoundScheduler::new(&pinball);

        assert_eq!(
            scheduler.push_round_bits(0, &[0, 0, 0]),
            Err(PredecodeError::ShapeMismatch { expected: 4, got: 3 })
        );
        assert_eq!(
            scheduler.push_round(0, &BitGrid::new(6, 2)),
            Err(PredecodeError::ShapeMismatch { expected: 4, got: 12 })
        );
    }

    #[test]
    fn test_emits_block_and_resets() {
        let pinball = Pinball::new(3).unwrap();
        let mut scheduler = RoundScheduler::new(&pinball);
        let zero = BitGrid::new(4, 1);

        for idx in 0..2 {
            assert!(scheduler.push_round(idx, &zero).unwrap().is_none());
        }
        let block = scheduler.push_round(2, &zero).unwrap().unwrap();
        assert!(!block.complex);
        assert!(!block.corrections.any());
        assert!(!block.residual.any());

        // Counter wrapped; the next block starts at round 0 again.
        assert_eq!(scheduler.next_round(), 0);
        assert!(scheduler.push_round(0, &zero).unwrap().is_none());
    }

    #[test]
    fn test_zero_block_length_rejected() {
        let pinball = Pinball::new(3).unwrap();
        assert_eq!(
            RoundScheduler::with_block_len(&pinball, 0).err(),
            Some(PredecodeError::EmptyBlock)
        );
    }
}
