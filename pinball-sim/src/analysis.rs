//! Auxiliary syndrome analyses: mechanism classification and error chain
//! lengths.
//!
//! These characterize the noise the predecoder faces rather than the
//! predecoder itself: how sampled error mechanisms split into space-like
//! and time-like components, and how long the chains formed by a shot's
//! errors get in the decoding graph.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use pinball_core::Lattice;

use crate::dem::DetectorModel;
use crate::maps::DetectorMap;

/// Space-like and time-like extent of one mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MechanismClass {
    /// Lattice distance between the flipped detectors: 0, 1, or 2.
    pub spacelike: usize,
    /// Round distance between the flipped detectors: 0 or 1.
    pub timelike: usize,
}

/// Classify a mechanism by the mapped positions of its detectors.
///
/// Mechanisms whose detectors belong to the other decoding basis have no
/// map entries and return `None`. Boundary mechanisms count as a length-1
/// space-like step into the boundary.
pub fn classify_mechanism(
    detectors: &[u32],
    map: &DetectorMap,
    lattice: &Lattice,
) -> Option<MechanismClass> {
    let positions: Vec<(u16, u16)> = detectors
        .iter()
        .map(|id| map.0.get(id).copied())
        .collect::<Option<_>>()?;

    match positions.as_slice() {
        [_] => Some(MechanismClass { spacelike: 1, timelike: 0 }),
        [(r1, i1), (r2, i2)] => {
            let timelike = usize::from(r1 != r2);
            let spacelike = if i1 == i2 {
                0
            } else {
                let (row1, col1) = (*i1 as usize / lattice.cols(), *i1 as usize % lattice.cols());
                let (row2, col2) = (*i2 as usize / lattice.cols(), *i2 as usize % lattice.cols());
                if row1.abs_diff(row2) <= 1 && col1.abs_diff(col2) <= 1 {
                    1
                } else {
                    2
                }
            };
            Some(MechanismClass { spacelike, timelike })
        }
        _ => None,
    }
}

/// Counts of sampled mechanisms by (space-like, time-like) class.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorFrequency {
    /// `counts[s][t]` holds mechanisms with space-like extent `s` and
    /// time-like extent `t`.
    pub counts: [[u64; 2]; 3],
    /// Total classified mechanisms.
    pub total: u64,
}

impl ErrorFrequency {
    /// Record one classified mechanism.
    pub fn record(&mut self, class: MechanismClass) {
        if class.spacelike < 3 && class.timelike < 2 {
            self.counts[class.spacelike][class.timelike] += 1;
            self.total += 1;
        }
    }
}

/// Histogram of per-shot maximum chain lengths.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChainLengthHistogram {
    /// Shot counts keyed by maximum chain length.
    pub counts: HashMap<usize, u64>,
    /// Shots recorded.
    pub num_shots: u64,
}

impl ChainLengthHistogram {
    /// Record one shot's maximum chain length.
    pub fn record(&mut self, length: usize) {
        *self.counts.entry(length).or_insert(0) += 1;
        self.num_shots += 1;
    }
}

/// Longest error chain formed by a shot's fired mechanisms.
///
/// Each fired two-detector mechanism is one edge of the decoding graph;
/// chains are connected components of those edges and their length is the
/// component's edge count. Boundary and hyperedge mechanisms do not extend
/// chains. A shot with no adjacent pairs of edges still reports length 1
/// when any edge fired, and 0 when none did.
pub fn max_chain_length(triggered: &[u32], model: &DetectorModel) -> usize {
    let mut adjacency: HashMap<u32, Vec<u32>> = HashMap::new();
    let mut num_edges = 0usize;
    for &id in triggered {
        let mechanism = &model.mechanisms[id as usize];
        if mechanism.is_edge() {
            let (a, b) = (mechanism.detectors[0], mechanism.detectors[1]);
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
            num_edges += 1;
        }
    }
    if num_edges == 0 {
        return 0;
    }

    let mut visited: HashSet<u32> = HashSet::new();
    let mut longest = 1;
    for &start in adjacency.keys() {
        if visited.contains(&start) {
            continue;
        }
        // BFS one component, counting traversed edges.
        let mut edges = 0usize;
        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(node) = queue.pop_front() {
            for &next in &adjacency[&node] {
                if visited.insert(next) {
                    edges += 1;
                    queue.push_back(next);
                }
            }
        }
        longest = longest.max(edges);
    }
    longest
}
