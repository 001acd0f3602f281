pub mod cycles;
pub mod shells;
pub mod smurfing;

use std::time::{Duration, Instant};

/// Structural pattern category a ring was detected under.
///
/// Categories (not fine-grained tags) drive the multi-pattern bonus: all
/// cycle lengths count as one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RingPattern {
    /// Simple directed cycle of the given length (3..=5).
    Cycle(usize),
    SmurfingFanIn,
    SmurfingFanOut,
    LayeredShell,
}

impl RingPattern {
    pub fn type_str(&self) -> String {
        match self {
            RingPattern::Cycle(len) => format!("cycle_length_{len}"),
            RingPattern::SmurfingFanIn => "smurfing_fan_in".to_string(),
            RingPattern::SmurfingFanOut => "smurfing_fan_out".to_string(),
            RingPattern::LayeredShell => "layered_shell_network".to_string(),
        }
    }

    /// Ring-level risk score, including the temporal-confirmation bump.
    pub fn risk_score(&self, temporal: bool) -> u8 {
        match self {
            RingPattern::Cycle(3) => 95,
            RingPattern::Cycle(4) => 92,
            RingPattern::Cycle(_) => 90,
            RingPattern::SmurfingFanIn | RingPattern::SmurfingFanOut => {
                if temporal {
                    90
                } else {
                    85
                }
            }
            RingPattern::LayeredShell => {
                if temporal {
                    80
                } else {
                    75
                }
            }
        }
    }
}

/// A ring as emitted by a single detector, in vertex-index form.
///
/// Resolution to account identifiers and ring-id assignment happen in the
/// orchestrator after the fixed-order merge.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRing {
    pub pattern: RingPattern,
    /// Member vertices in traversal order. Never empty.
    pub members: Vec<u32>,
    /// Hub vertex for smurfing rings; drives hub/leaf role tags.
    pub hub: Option<u32>,
    pub temporal: bool,
}

/// Cooperative per-detector deadline.
///
/// Detectors are CPU-bound traversals; they poll the budget at loop
/// boundaries and return whatever they have when it expires.
#[derive(Debug, Clone, Copy)]
pub struct DetectorBudget {
    deadline: Instant,
}

impl DetectorBudget {
    pub fn new(limit: Duration) -> Self {
        Self {
            deadline: Instant::now() + limit,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// What a detector produced, plus why it stopped early (if it did).
#[derive(Debug, Clone, Default)]
pub struct DetectorOutcome {
    pub rings: Vec<RawRing>,
    pub hit_cap: bool,
    pub hit_deadline: bool,
}
