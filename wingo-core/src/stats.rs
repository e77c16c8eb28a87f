use crate::error::{HarnessError, Result};
use crate::types::BetOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive win-rate window, in percent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AcceptanceBand {
    pub min_percent: f64,
    pub max_percent: f64,
}

impl Default for AcceptanceBand {
    // 0-50% around an expected ~20% for a single-number pick.
    fn default() -> Self {
        Self::new(0.0, 50.0)
    }
}

impl AcceptanceBand {
    pub fn new(min_percent: f64, max_percent: f64) -> Self {
        Self {
            min_percent,
            max_percent,
        }
    }

    pub fn contains(&self, rate: f64) -> bool {
        self.min_percent <= rate && rate <= self.max_percent
    }

    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.min_percent) || !in_range(self.max_percent) {
            return Err(HarnessError::config(format!(
                "Acceptance band must lie within 0-100%, got {}",
                self
            )));
        }
        if self.min_percent > self.max_percent {
            return Err(HarnessError::config(format!(
                "Acceptance band minimum exceeds maximum: {}",
                self
            )));
        }
        Ok(())
    }
}

impl fmt::Display for AcceptanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.1}%, {:.1}%]", self.min_percent, self.max_percent)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WinStats {
    pub wins: u32,
    pub losses: u32,
}

impl WinStats {
    pub fn new(wins: u32, losses: u32) -> Self {
        Self { wins, losses }
    }

    pub fn record(&mut self, outcome: &BetOutcome) {
        if outcome.is_win() {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }

    pub fn total(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn win_rate_percent(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.wins as f64 / total as f64 * 100.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum StatsVerdict {
    Acceptable { rate: f64 },
    OutOfBand { rate: f64, band: AcceptanceBand },
    NoSuccessfulBets,
}

impl StatsVerdict {
    pub fn is_acceptable(&self) -> bool {
        matches!(self, StatsVerdict::Acceptable { .. })
    }
}

impl fmt::Display for StatsVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsVerdict::Acceptable { rate } => {
                write!(f, "win rate {:.1}% is within the acceptance band", rate)
            }
            StatsVerdict::OutOfBand { rate, band } => {
                write!(f, "win rate {:.1}% is outside {}", rate, band)
            }
            StatsVerdict::NoSuccessfulBets => f.write_str("no successful bets"),
        }
    }
}

pub fn evaluate(stats: &WinStats, band: &AcceptanceBand) -> StatsVerdict {
    match stats.win_rate_percent() {
        None => StatsVerdict::NoSuccessfulBets,
        Some(rate) if band.contains(rate) => StatsVerdict::Acceptable { rate },
        Some(rate) => StatsVerdict::OutOfBand { rate, band: *band },
    }
}

/// Money flow across the successful trials.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PayoutSummary {
    pub staked: f64,
    pub won: f64,
}

impl PayoutSummary {
    pub fn record(&mut self, stake: u64, outcome: &BetOutcome) {
        self.staked += stake as f64;
        self.won += outcome.win_amount.max(0.0);
    }

    pub fn net(&self) -> f64 {
        self.won - self.staked
    }
}
