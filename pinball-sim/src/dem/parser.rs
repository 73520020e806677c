//! Parser for Stim's detector error model text format.
//!
//! The format is line oriented. The instructions this harness needs:
//!
//! ```text
//! detector(x, y, t) D7          # declaration with coordinates
//! detector D7                   # declaration without coordinates
//! error(0.001) D0 D1            # edge mechanism
//! error(0.002) D0 ^ L0          # boundary mechanism flipping observable 0
//! shift_detectors(0, 0, 1) ...  # cumulative coordinate offset
//! logical_observable L0
//! ```
//!
//! Models must be flattened when generated (`flatten_loops=True` on the
//! Stim side); the bodies of `repeat` blocks are skipped.

use core::fmt;

use super::types::{DetectorInfo, DetectorModel, ErrorMechanism};

/// Parse failure with the offending content attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemParseError {
    /// A line that matches no known instruction shape.
    Syntax(String),
    /// An error probability that is not a float.
    Probability(String),
    /// A `D<id>` target that is not an integer.
    DetectorId(String),
    /// An `L<id>` target that is not an integer.
    ObservableId(String),
}

impl fmt::Display for DemParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemParseError::Syntax(line) => write!(f, "invalid DEM syntax: {}", line),
            DemParseError::Probability(token) => write!(f, "invalid probability: {}", token),
            DemParseError::DetectorId(token) => write!(f, "invalid detector id: {}", token),
            DemParseError::ObservableId(token) => write!(f, "invalid observable id: {}", token),
        }
    }
}

impl std::error::Error for DemParseError {}

/// Parse a detector error model from its text form.
pub fn parse_dem(content: &str) -> Result<DetectorModel, DemParseError> {
    let mut model = DetectorModel::default();
    let mut offset = (0.0f32, 0.0f32, 0.0f32);
    let mut max_detector = 0u32;
    let mut max_observable = 0u8;
    let mut repeat_depth = 0usize;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "}" {
            repeat_depth = repeat_depth.saturating_sub(1);
            continue;
        }
        if line.starts_with("repeat") {
            repeat_depth += 1;
            continue;
        }
        // Flattened models only; anything inside a repeat block is the
        // compressed form we do not expand.
        if repeat_depth > 0 {
            continue;
        }

        if let Some(rest) = line.strip_prefix("detector") {
            let (coords, rest) = take_parens(rest)?;
            let (x, y, t) = match coords {
                Some(args) => parse_coords(args),
                None => (0.0, 0.0, 0.0),
            };
            let token = rest.split_whitespace().next().unwrap_or("");
            let id =
                parse_target(token, 'D').ok_or_else(|| DemParseError::DetectorId(token.into()))?;
            max_detector = max_detector.max(id + 1);
            model.detectors.push(DetectorInfo::new(
                id,
                x + offset.0,
                y + offset.1,
                t + offset.2,
            ));
        } else if let Some(rest) = line.strip_prefix("error") {
            let (args, rest) = take_parens(rest)?;
            let args = args
                .ok_or_else(|| DemParseError::Syntax(format!("error without probability: {}", line)))?;
            let probability: f32 = args
                .trim()
                .parse()
                .map_err(|_| DemParseError::Probability(args.into()))?;

            let (detector_part, observable_part) = match rest.split_once('^') {
                Some((d, o)) => (d, o),
                None => (rest, ""),
            };
            let mut detectors = Vec::new();
            for token in detector_part.split_whitespace() {
                let id = parse_target(token, 'D')
                    .ok_or_else(|| DemParseError::DetectorId(token.into()))?;
                detectors.push(id);
                max_detector = max_detector.max(id + 1);
            }
            let mut observables = 0u8;
            for token in observable_part.split_whitespace() {
                let id = parse_target(token, 'L')
                    .ok_or_else(|| DemParseError::ObservableId(token.into()))?;
                if id < 8 {
                    observables |= 1 << id;
                    max_observable = max_observable.max(id as u8 + 1);
                }
            }
            model.mechanisms.push(ErrorMechanism {
                probability,
                detectors,
                observables,
            });
        } else if let Some(rest) = line.strip_prefix("shift_detectors") {
            // The bare "shift_detectors N" form only renumbers ids and
            // carries no coordinates.
            if let (Some(args), _) = take_parens(rest)? {
                let (dx, dy, dt) = parse_coords(args);
                offset = (offset.0 + dx, offset.1 + dy, offset.2 + dt);
            }
        } else if let Some(rest) = line.strip_prefix("logical_observable") {
            if let Some(id) = rest.split_whitespace().find_map(|t| parse_target(t, 'L')) {
                max_observable = max_observable.max(id as u8 + 1);
            }
        }
        // Other instructions are irrelevant to sampling and ignored.
    }

    model.num_detectors = max_detector;
    model.num_observables = max_observable;
    Ok(model)
}

/// Split an optional leading `(args)` group off an instruction tail.
fn take_parens(rest: &str) -> Result<(Option<&str>, &str), DemParseError> {
    let rest = rest.trim_start();
    if !rest.starts_with('(') {
        return Ok((None, rest));
    }
    match rest[1..].split_once(')') {
        Some((args, tail)) => Ok((Some(args), tail)),
        None => Err(DemParseError::Syntax(format!("unclosed parenthesis: {}", rest))),
    }
}

/// Parse up to three comma-separated floats, defaulting missing ones to 0.
fn parse_coords(args: &str) -> (f32, f32, f32) {
    let mut parts = args.split(',').map(|p| p.trim().parse::<f32>().unwrap_or(0.0));
    (
        parts.next().unwrap_or(0.0),
        parts.next().unwrap_or(0.0),
        parts.next().unwrap_or(0.0),
    )
}

/// Parse a `D<id>` or `L<id>` target token.
fn parse_target(token: &str, prefix: char) -> Option<u32> {
    token.strip_prefix(prefix)?.parse().ok()
}
