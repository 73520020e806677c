//! Owned detector error model data.

/// One detector declaration with its spacetime coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorInfo {
    /// Detector id as numbered by the circuit.
    pub id: u32,
    /// Spatial x coordinate.
    pub x: f32,
    /// Spatial y coordinate.
    pub y: f32,
    /// Time coordinate (measurement round).
    pub t: f32,
}

impl DetectorInfo {
    /// Create a detector record.
    pub fn new(id: u32, x: f32, y: f32, t: f32) -> Self {
        Self { id, x, y, t }
    }
}

/// One error mechanism: a probability, the detectors it flips, and the
/// logical observables it flips as a bitmask.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMechanism {
    /// Probability that this mechanism fires in a shot.
    pub probability: f32,
    /// Detector ids flipped when it fires.
    pub detectors: Vec<u32>,
    /// Bitmask of flipped logical observables, bit `i` for `L<i>`.
    pub observables: u8,
}

impl ErrorMechanism {
    /// Whether this mechanism flips a single detector (a boundary error).
    pub fn is_boundary(&self) -> bool {
        self.detectors.len() == 1
    }

    /// Whether this mechanism flips exactly two detectors (a graph edge).
    pub fn is_edge(&self) -> bool {
        self.detectors.len() == 2
    }
}

/// A parsed detector error model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorModel {
    /// Total number of detectors (one past the highest id seen).
    pub num_detectors: u32,
    /// Number of logical observables.
    pub num_observables: u8,
    /// Detector declarations carrying coordinates.
    pub detectors: Vec<DetectorInfo>,
    /// All error mechanisms.
    pub mechanisms: Vec<ErrorMechanism>,
}

impl DetectorModel {
    /// Number of `u64` words needed to hold one detector shot.
    pub fn syndrome_words(&self) -> usize {
        (self.num_detectors as usize).div_ceil(64)
    }
}
