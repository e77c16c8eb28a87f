//! Wingo harness - bet verification for number-guessing game services
//!
//! This library drives a remote Wingo-style betting API through account
//! provisioning, funding and a series of identical bets, then checks the
//! observed win rate against an acceptance band. Results come back as a
//! structured [`RunReport`]; rendering is up to the caller.

pub mod api;
pub mod config;
pub mod error;
pub mod harness;
pub mod stats;
pub mod types;

pub use api::{GameApi, HttpGameApi};
pub use config::{BetPolicy, HarnessConfig};
pub use error::{ApiError, FailureKind, HarnessError, Result};
pub use harness::{Harness, RunReport, Step, StepFailure, TrialRecord, TrialResult};
pub use stats::{evaluate, AcceptanceBand, PayoutSummary, StatsVerdict, WinStats};
pub use types::{Balance, BetOutcome, BetRequest, Credential, Deposit, DepositRequest, SessionToken};
