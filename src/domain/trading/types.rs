use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional decision for one observation index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    EnterLong,
    ExitLong,
    Neutral,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::EnterLong => write!(f, "ENTER_LONG"),
            Signal::ExitLong => write!(f, "EXIT_LONG"),
            Signal::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Full breakdown of a decision, kept for logging and exports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalDecision {
    pub signal: Signal,
    pub entry: bool,
    pub exit: bool,
    pub up_probability: f64,
}

/// Per-signal tallies over a decided sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub enter_long: usize,
    pub exit_long: usize,
    pub neutral: usize,
    pub undefined: usize,
}

impl SignalSummary {
    pub fn from_signals(signals: &[Option<Signal>]) -> Self {
        let mut summary = Self::default();
        for signal in signals {
            match signal {
                Some(Signal::EnterLong) => summary.enter_long += 1,
                Some(Signal::ExitLong) => summary.exit_long += 1,
                Some(Signal::Neutral) => summary.neutral += 1,
                None => summary.undefined += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.enter_long + self.exit_long + self.neutral + self.undefined
    }
}
