//! Monte Carlo syndrome sampling from a detector error model.
//!
//! Each shot flips a coin per error mechanism; a fired mechanism XORs its
//! detectors into the shot and its observable mask into the frame. The
//! fired mechanism ids are kept so the harness can reconstruct the actual
//! data-qubit errors behind the shot.

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::dem::DetectorModel;

/// One sampled shot.
#[derive(Debug, Clone)]
pub struct SampledShot {
    /// Packed detector bits, one bit per detector id.
    pub detectors: Vec<u64>,
    /// Bitmask of flipped logical observables.
    pub observables: u8,
    /// Ids of the mechanisms that fired, in id order.
    pub triggered: Vec<u32>,
}

impl SampledShot {
    /// Whether no detector fired.
    pub fn is_trivial(&self) -> bool {
        self.detectors.iter().all(|&w| w == 0)
    }

    /// Whether logical observable 0 flipped.
    pub fn observable_flip(&self) -> bool {
        self.observables & 1 != 0
    }
}

/// Mechanism sampler over a parsed model.
///
/// Mechanism data is pre-extracted into flat vectors so the per-shot loop
/// does no pointer chasing beyond the detector lists.
pub struct DemSampler {
    probabilities: Vec<f32>,
    targets: Vec<Vec<u32>>,
    observables: Vec<u8>,
    syndrome_words: usize,
    rng: Xoshiro256PlusPlus,
}

impl DemSampler {
    /// Create a sampler with a deterministic seed.
    pub fn new(model: &DetectorModel, seed: u64) -> Self {
        Self {
            probabilities: model.mechanisms.iter().map(|m| m.probability).collect(),
            targets: model.mechanisms.iter().map(|m| m.detectors.clone()).collect(),
            observables: model.mechanisms.iter().map(|m| m.observables).collect(),
            syndrome_words: model.syndrome_words(),
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Draw one shot.
    pub fn sample(&mut self) -> SampledShot {
        let mut detectors = vec![0u64; self.syndrome_words];
        let mut observables = 0u8;
        let mut triggered = Vec::new();

        for (mechanism, &probability) in self.probabilities.iter().enumerate() {
            if self.rng.random::<f32>() < probability {
                for &det in &self.targets[mechanism] {
                    detectors[det as usize / 64] ^= 1 << (det as usize % 64);
                }
                observables ^= self.observables[mechanism];
                triggered.push(mechanism as u32);
            }
        }

        SampledShot {
            detectors,
            observables,
            triggered,
        }
    }
}
