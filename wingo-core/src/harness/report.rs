use crate::config::HarnessConfig;
use crate::error::{ApiError, FailureKind};
use crate::stats::{PayoutSummary, StatsVerdict, WinStats};
use crate::types::BetOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Harness steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    RegisterUser,
    OperatorLogin,
    RequestDeposit,
    ApproveDeposit,
    ReadBalance,
    PlaceBets,
    EvaluateWinRate,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::RegisterUser,
        Step::OperatorLogin,
        Step::RequestDeposit,
        Step::ApproveDeposit,
        Step::ReadBalance,
        Step::PlaceBets,
        Step::EvaluateWinRate,
    ];
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Step::RegisterUser => "User registration",
            Step::OperatorLogin => "Operator login",
            Step::RequestDeposit => "Deposit request",
            Step::ApproveDeposit => "Deposit approval",
            Step::ReadBalance => "Balance check",
            Step::PlaceBets => "Bet trials",
            Step::EvaluateWinRate => "Win-rate check",
        };
        f.write_str(label)
    }
}

/// Why a step stopped the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    pub step: Step,
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub message: String,
}

impl StepFailure {
    pub fn new(step: Step, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            step,
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn from_api(step: Step, err: &ApiError) -> Self {
        Self {
            step,
            kind: err.kind(),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} failed: {} ({})", self.step, status, self.kind),
            None => write!(f, "{} failed: {} ({})", self.step, self.message, self.kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepStatus {
    Completed { detail: Option<String> },
    Failed(StepFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    pub status: StepStatus,
}

impl StepRecord {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, StepStatus::Completed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TrialResult {
    Settled(BetOutcome),
    Failed {
        kind: FailureKind,
        status: Option<u16>,
        message: String,
    },
}

/// One request/response cycle against the bet endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// 1-based.
    pub index: u32,
    #[serde(flatten)]
    pub result: TrialResult,
}

impl TrialRecord {
    pub fn outcome(&self) -> Option<&BetOutcome> {
        match &self.result {
            TrialResult::Settled(outcome) => Some(outcome),
            TrialResult::Failed { .. } => None,
        }
    }

    pub fn is_win(&self) -> bool {
        self.outcome().map_or(false, BetOutcome::is_win)
    }
}

/// Everything a run produced. Rendering is left to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub base_url: String,
    pub user_email: String,
    pub steps: Vec<StepRecord>,
    pub deposit_id: Option<String>,
    pub balance_before: Option<f64>,
    pub balance: Option<f64>,
    pub trials: Vec<TrialRecord>,
    pub halted_early: bool,
    pub stats: WinStats,
    pub payout: PayoutSummary,
    pub verdict: Option<StatsVerdict>,
    pub passed: bool,
}

impl RunReport {
    pub fn new(config: &HarnessConfig, user_email: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            base_url: config.base_url.clone(),
            user_email: user_email.into(),
            steps: Vec::new(),
            deposit_id: None,
            balance_before: None,
            balance: None,
            trials: Vec::new(),
            halted_early: false,
            stats: WinStats::default(),
            payout: PayoutSummary::default(),
            verdict: None,
            passed: false,
        }
    }

    pub fn complete(&mut self, step: Step, detail: Option<String>) {
        self.steps.push(StepRecord {
            step,
            status: StepStatus::Completed { detail },
        });
    }

    pub fn fail(&mut self, failure: StepFailure) {
        self.steps.push(StepRecord {
            step: failure.step,
            status: StepStatus::Failed(failure),
        });
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
        self.passed = self.failure().is_none()
            && self.steps.len() == Step::ALL.len()
            && self.verdict.map_or(false, |v| v.is_acceptable());
    }

    /// The step that stopped the run, if any.
    pub fn failure(&self) -> Option<&StepFailure> {
        self.steps.iter().find_map(|record| match &record.status {
            StepStatus::Failed(failure) => Some(failure),
            StepStatus::Completed { .. } => None,
        })
    }

    pub fn completed_steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .filter(|record| record.is_completed())
            .map(|record| record.step)
            .collect()
    }

    pub fn win_rate_percent(&self) -> Option<f64> {
        self.stats.win_rate_percent()
    }
}
