//! Shot tallies, confidence intervals, and serialized run summaries.

use serde::Serialize;

/// Wilson score confidence interval for a binomial proportion.
///
/// Better behaved than the normal approximation when successes are scarce,
/// which is the typical regime for logical errors. `z = 1.96` gives a 95%
/// interval. Bounds are clamped to `[0, 1]`.
pub fn wilson_ci(successes: usize, trials: usize, z: f64) -> (f64, f64) {
    if trials == 0 {
        return (0.0, 1.0);
    }
    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let spread = z * ((p * (1.0 - p) + z2 / (4.0 * n)) / n).sqrt() / denom;
    ((center - spread).max(0.0), (center + spread).min(1.0))
}

/// Per-chunk shot accounting, merged across worker threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShotTally {
    /// Shots processed.
    pub shots: usize,
    /// Shots committed by the predecoder (including trivial all-zero
    /// shots).
    pub l1_shots: usize,
    /// Committed shots whose corrections formed a logical error.
    pub l1_errors: usize,
    /// Complex shots deferred to the downstream decoder.
    pub deferred: usize,
}

impl ShotTally {
    /// Combine two tallies.
    pub fn merge(self, other: ShotTally) -> ShotTally {
        ShotTally {
            shots: self.shots + other.shots,
            l1_shots: self.l1_shots + other.l1_shots,
            l1_errors: self.l1_errors + other.l1_errors,
            deferred: self.deferred + other.deferred,
        }
    }
}

/// One results file, covering a single (predecoder, distance, error rate)
/// point.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Code distance.
    pub distance: usize,
    /// Physical error rate of the noise model.
    pub error_rate: f64,
    /// Predecoder variant name, or "None".
    pub predecoder: String,
    /// Total shots simulated.
    pub num_shots: usize,
    /// Shots committed by the predecoder.
    pub num_l1_shots: usize,
    /// Committed shots with a logical error.
    pub num_l1_errors: usize,
    /// Complex shots handed to the downstream decoder.
    pub num_deferred_shots: usize,
    /// Logical error rate over committed shots.
    pub l1_logical_error_rate: f64,
    /// Lower 95% bound on the committed logical error rate.
    pub l1_ci_low: f64,
    /// Upper 95% bound on the committed logical error rate.
    pub l1_ci_high: f64,
    /// Fraction of shots deferred.
    pub complex_fraction: f64,
}

impl RunSummary {
    /// Derive the rates and intervals from a tally.
    pub fn new(distance: usize, error_rate: f64, predecoder: &str, tally: ShotTally) -> Self {
        let l1_rate = if tally.l1_shots > 0 {
            tally.l1_errors as f64 / tally.l1_shots as f64
        } else {
            0.0
        };
        let (ci_low, ci_high) = wilson_ci(tally.l1_errors, tally.l1_shots, 1.96);
        let complex_fraction = if tally.shots > 0 {
            tally.deferred as f64 / tally.shots as f64
        } else {
            0.0
        };
        Self {
            distance,
            error_rate,
            predecoder: predecoder.to_string(),
            num_shots: tally.shots,
            num_l1_shots: tally.l1_shots,
            num_l1_errors: tally.l1_errors,
            num_deferred_shots: tally.deferred,
            l1_logical_error_rate: l1_rate,
            l1_ci_low: ci_low,
            l1_ci_high: ci_high,
            complex_fraction,
        }
    }
}

/// Predecoder-only quality metrics for one (distance, error rate) point.
///
/// Coverage is the percentage of shots the predecoder committed on its own;
/// accuracy is the percentage of those commits that did not form a logical
/// error. Neither involves the downstream decoder.
#[derive(Debug, Clone, Serialize)]
pub struct L1Statistics {
    /// Percentage of committed shots decoded without a logical error; 0
    /// when nothing was committed.
    pub l1_accuracy: f64,
    /// Percentage of shots committed rather than deferred.
    pub l1_coverage: f64,
    /// Total shots simulated.
    pub num_shots: usize,
}

impl L1Statistics {
    /// Derive the percentages from a tally.
    pub fn new(tally: ShotTally) -> Self {
        let coverage = if tally.shots > 0 {
            100.0 * tally.l1_shots as f64 / tally.shots as f64
        } else {
            0.0
        };
        let accuracy = if tally.l1_shots > 0 {
            100.0 * (1.0 - tally.l1_errors as f64 / tally.l1_shots as f64)
        } else {
            0.0
        };
        Self {
            l1_accuracy: accuracy,
            l1_coverage: coverage,
            num_shots: tally.shots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wilson_ci_brackets_estimate() {
        let (low, high) = wilson_ci(50, 100, 1.96);
        assert!(low > 0.39 && low < 0.41, "low={}", low);
        assert!(high > 0.59 && high < 0.61, "high={}", high);
    }

    #[test]
    fn test_wilson_ci_edges() {
        assert_eq!(wilson_ci(0, 0, 1.96), (0.0, 1.0));
        let (low, high) = wilson_ci(0, 100, 1.96);
        assert_eq!(low, 0.0);
        assert!(high > 0.0 && high < 0.05);
        let (low, high) = wilson_ci(100, 100, 1.96);
        assert!(low > 0.95);
        assert!((high - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tally_merge() {
        let a = ShotTally { shots: 10, l1_shots: 8, l1_errors: 1, deferred: 2 };
        let b = ShotTally { shots: 5, l1_shots: 5, l1_errors: 0, deferred: 0 };
        let merged = a.merge(b);
        assert_eq!(merged.shots, 15);
        assert_eq!(merged.l1_shots, 13);
        assert_eq!(merged.l1_errors, 1);
        assert_eq!(merged.deferred, 2);
    }

    #[test]
    fn test_summary_rates() {
        let tally = ShotTally { shots: 100, l1_shots: 80, l1_errors: 4, deferred: 20 };
        let summary = RunSummary::new(5, 0.001, "Pinball", tally);
        assert!((summary.l1_logical_error_rate - 0.05).abs() < 1e-12);
        assert!((summary.complex_fraction - 0.2).abs() < 1e-12);
        assert!(summary.l1_ci_low < 0.05 && summary.l1_ci_high > 0.05);
    }

    #[test]
    fn test_l1_statistics_percentages() {
        let tally = ShotTally { shots: 200, l1_shots: 160, l1_errors: 8, deferred: 40 };
        let stats = L1Statistics::new(tally);
        assert!((stats.l1_coverage - 80.0).abs() < 1e-12);
        assert!((stats.l1_accuracy - 95.0).abs() < 1e-12);
        assert_eq!(stats.num_shots, 200);

        // Nothing committed means accuracy has no meaning and reads 0.
        let tally = ShotTally { shots: 10, l1_shots: 0, l1_errors: 0, deferred: 10 };
        let stats = L1Statistics::new(tally);
        assert_eq!(stats.l1_accuracy, 0.0);
        assert_eq!(stats.l1_coverage, 0.0);
    }
}
