//! The verification pipeline: provision, fund, bet, evaluate.
//!
//! Each step either completes or produces a [`StepFailure`]; the first failure
//! stops the run. [`Harness::run`] never errors for expected failures, it
//! records them in the returned [`RunReport`].

pub mod report;

pub use report::{RunReport, Step, StepFailure, StepRecord, StepStatus, TrialRecord, TrialResult};

use crate::api::{GameApi, HttpGameApi};
use crate::config::HarnessConfig;
use crate::error::{ApiError, FailureKind, Result};
use crate::stats::{self, StatsVerdict};
use crate::types::{Credential, DepositRequest, SessionToken};
use rand::Rng;
use uuid::Uuid;

type StepResult<T> = std::result::Result<T, StepFailure>;

const BALANCE_EPSILON: f64 = 1e-6;

struct Sessions {
    user: SessionToken,
    operator: SessionToken,
}

pub struct Harness<A: GameApi> {
    config: HarnessConfig,
    api: A,
}

impl Harness<HttpGameApi> {
    /// Harness talking to `config.base_url` over HTTP.
    pub fn http(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        let api = HttpGameApi::new(config.base_url.clone(), config.request_timeout)?;
        Ok(Self::new(config, api))
    }
}

impl<A: GameApi> Harness<A> {
    pub fn new(config: HarnessConfig, api: A) -> Self {
        Self { config, api }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn run(&self) -> RunReport {
        let user = self.user_credential();
        let mut report = RunReport::new(&self.config, user.email.clone());

        tracing::info!(
            "Starting run {} against {} as {}",
            report.run_id,
            self.config.base_url,
            user.email
        );

        if let Err(failure) = self.pipeline(&user, &mut report).await {
            tracing::error!("{}", failure);
            report.fail(failure);
        }

        report.finish();
        tracing::info!(
            "Run {} {}",
            report.run_id,
            if report.passed { "passed" } else { "failed" }
        );
        report
    }

    async fn pipeline(&self, user: &Credential, report: &mut RunReport) -> StepResult<()> {
        let sessions = self.provision(user, report).await?;
        self.fund(&sessions, report).await?;
        self.place_bets(&sessions.user, report).await?;

        let verdict = stats::evaluate(&report.stats, &self.config.band);
        report.verdict = Some(verdict);
        match verdict {
            StatsVerdict::Acceptable { .. } => {
                tracing::info!("{}", verdict);
                report.complete(Step::EvaluateWinRate, Some(verdict.to_string()));
                Ok(())
            }
            _ => Err(StepFailure::new(
                Step::EvaluateWinRate,
                FailureKind::Statistical,
                verdict.to_string(),
            )),
        }
    }

    async fn provision(&self, user: &Credential, report: &mut RunReport) -> StepResult<Sessions> {
        let user_session = self
            .api
            .register(user)
            .await
            .map_err(|e| StepFailure::from_api(Step::RegisterUser, &e))?;
        tracing::info!("Registered user {}", user.email);
        report.complete(Step::RegisterUser, None);

        let operator_session = self
            .api
            .login(&self.config.operator)
            .await
            .map_err(|e| StepFailure::from_api(Step::OperatorLogin, &e))?;
        tracing::info!("Operator {} logged in", self.config.operator.email);
        report.complete(Step::OperatorLogin, None);

        Ok(Sessions {
            user: user_session,
            operator: operator_session,
        })
    }

    async fn fund(&self, sessions: &Sessions, report: &mut RunReport) -> StepResult<()> {
        if self.config.verify_balance_delta {
            let before = self
                .api
                .balance(&sessions.user)
                .await
                .map_err(|e| StepFailure::from_api(Step::RequestDeposit, &e))?;
            report.balance_before = Some(before.amount);
        }

        let request = DepositRequest {
            utr: self.deposit_utr(),
            amount: self.config.deposit_amount,
        };
        let deposit = self
            .api
            .request_deposit(&sessions.user, &request)
            .await
            .map_err(|e| StepFailure::from_api(Step::RequestDeposit, &e))?;
        tracing::info!(
            "Deposit {} requested (utr {}, amount {})",
            deposit.id,
            request.utr,
            request.amount
        );
        report.deposit_id = Some(deposit.id.clone());
        report.complete(Step::RequestDeposit, Some(format!("deposit {}", deposit.id)));

        self.api
            .approve_deposit(&sessions.operator, &deposit.id)
            .await
            .map_err(|e| StepFailure::from_api(Step::ApproveDeposit, &e))?;
        tracing::info!("Deposit {} approved", deposit.id);
        report.complete(Step::ApproveDeposit, None);

        let balance = self
            .api
            .balance(&sessions.user)
            .await
            .map_err(|e| StepFailure::from_api(Step::ReadBalance, &e))?;
        report.balance = Some(balance.amount);
        tracing::info!("User balance: {}", balance.amount);

        if let Some(before) = report.balance_before {
            let delta = balance.amount - before;
            let expected = self.config.deposit_amount as f64;
            if (delta - expected).abs() > BALANCE_EPSILON {
                return Err(StepFailure::new(
                    Step::ReadBalance,
                    FailureKind::BalanceMismatch,
                    format!(
                        "balance moved by {} after approving {} ({} -> {})",
                        delta, expected, before, balance.amount
                    ),
                ));
            }
        }

        report.complete(Step::ReadBalance, Some(format!("balance {}", balance.amount)));
        Ok(())
    }

    /// Trials run strictly in sequence. A non-200 status ends the loop without
    /// failing the step, and the win-rate check judges what settled. A
    /// malformed body or a transport error fails the step outright.
    async fn place_bets(&self, session: &SessionToken, report: &mut RunReport) -> StepResult<()> {
        let bet = self.config.bet.request();
        let stake = self.config.bet.stake;

        for index in 1..=self.config.trial_count {
            match self.api.place_bet(session, &bet).await {
                Ok(outcome) => {
                    if outcome.is_win() {
                        tracing::info!(
                            "Bet {}: WIN - number {}, color {}, won {}",
                            index,
                            outcome.result_number,
                            outcome.result_color,
                            outcome.win_amount
                        );
                    } else {
                        tracing::info!(
                            "Bet {}: LOSS - number {}, color {}",
                            index,
                            outcome.result_number,
                            outcome.result_color
                        );
                    }
                    report.stats.record(&outcome);
                    report.payout.record(stake, &outcome);
                    report.trials.push(TrialRecord {
                        index,
                        result: TrialResult::Settled(outcome),
                    });
                }
                Err(e) => {
                    tracing::warn!("Bet {}: FAILED - {}", index, e);
                    report.trials.push(TrialRecord {
                        index,
                        result: TrialResult::Failed {
                            kind: e.kind(),
                            status: e.status().map(|s| s.as_u16()),
                            message: e.to_string(),
                        },
                    });
                    report.halted_early = true;

                    // only a rejected bet halts quietly; an unusable or
                    // missing response fails the step
                    if !matches!(e, ApiError::UnexpectedStatus { .. }) {
                        return Err(StepFailure::from_api(Step::PlaceBets, &e));
                    }
                    break;
                }
            }
        }

        let settled = report.stats.total();
        let detail = if report.halted_early {
            format!(
                "{} of {} trials settled, halted early",
                settled, self.config.trial_count
            )
        } else {
            format!("{} trials settled", settled)
        };
        tracing::info!(
            "Game results: {} wins, {} losses",
            report.stats.wins,
            report.stats.losses
        );
        report.complete(Step::PlaceBets, Some(detail));
        Ok(())
    }

    fn user_credential(&self) -> Credential {
        let mut user = self.config.user.clone();
        if self.config.unique_user {
            let suffix = &Uuid::new_v4().simple().to_string()[..8];
            user.email = match user.email.split_once('@') {
                Some((local, domain)) => format!("{}+{}@{}", local, suffix, domain),
                None => format!("{}+{}", user.email, suffix),
            };
        }
        user
    }

    fn deposit_utr(&self) -> String {
        match &self.config.deposit_utr {
            Some(utr) => utr.clone(),
            None => rand::thread_rng()
                .gen_range(100_000_000_000u64..1_000_000_000_000u64)
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiResult;
    use crate::stats::AcceptanceBand;
    use crate::types::{Balance, BetOutcome, BetRequest, Deposit};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Fault {
        Status(u16),
        Malformed,
        Transport,
    }

    impl Fault {
        fn into_error(self) -> ApiError {
            match self {
                Fault::Status(code) => ApiError::UnexpectedStatus {
                    status: StatusCode::from_u16(code).unwrap(),
                    body: String::new(),
                },
                Fault::Malformed => ApiError::malformed("token is empty"),
                // an unparsable URL yields a reqwest::Error without touching the network
                Fault::Transport => ApiError::Transport(
                    reqwest::Client::new().get("not a url").build().unwrap_err(),
                ),
            }
        }
    }

    /// In-memory game service. Bets follow `script` (a win amount or a
    /// failing status per call) and lose once the script is exhausted.
    #[derive(Default)]
    struct FakeApi {
        faults: HashMap<&'static str, Fault>,
        script: Mutex<VecDeque<std::result::Result<f64, Fault>>>,
        credit: Option<f64>,
        balance: Mutex<f64>,
        pending: Mutex<HashMap<String, u64>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeApi {
        fn with_fault(mut self, call: &'static str, fault: Fault) -> Self {
            self.faults.insert(call, fault);
            self
        }

        fn with_script(self, script: Vec<std::result::Result<f64, Fault>>) -> Self {
            *self.script.lock().unwrap() = script.into();
            self
        }

        fn enter(&self, call: &'static str) -> ApiResult<()> {
            self.calls.lock().unwrap().push(call);
            match self.faults.get(call) {
                Some(fault) => Err(fault.into_error()),
                None => Ok(()),
            }
        }

        fn count(&self, call: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
        }
    }

    #[async_trait]
    impl GameApi for FakeApi {
        async fn register(&self, credential: &Credential) -> ApiResult<SessionToken> {
            self.enter("register")?;
            SessionToken::new(format!("user:{}", credential.email))
        }

        async fn login(&self, _credential: &Credential) -> ApiResult<SessionToken> {
            self.enter("login")?;
            SessionToken::new("operator")
        }

        async fn request_deposit(
            &self,
            _session: &SessionToken,
            request: &DepositRequest,
        ) -> ApiResult<Deposit> {
            self.enter("request_deposit")?;
            assert_eq!(request.utr.len(), 12);
            let id = format!("dep-{}", request.utr);
            self.pending.lock().unwrap().insert(id.clone(), request.amount);
            Ok(Deposit { id })
        }

        async fn approve_deposit(&self, operator: &SessionToken, deposit_id: &str) -> ApiResult<()> {
            self.enter("approve_deposit")?;
            assert_eq!(operator.as_str(), "operator");
            let amount = self
                .pending
                .lock()
                .unwrap()
                .remove(deposit_id)
                .ok_or_else(|| Fault::Status(404).into_error())?;
            *self.balance.lock().unwrap() += self.credit.unwrap_or(amount as f64);
            Ok(())
        }

        async fn balance(&self, _session: &SessionToken) -> ApiResult<Balance> {
            self.enter("balance")?;
            Ok(Balance {
                amount: *self.balance.lock().unwrap(),
            })
        }

        async fn place_bet(&self, session: &SessionToken, bet: &BetRequest) -> ApiResult<BetOutcome> {
            self.enter("place_bet")?;
            assert!(session.as_str().starts_with("user:"));
            assert_eq!(bet.bet_amount, 10);
            match self.script.lock().unwrap().pop_front() {
                Some(Err(fault)) => Err(fault.into_error()),
                Some(Ok(win_amount)) => Ok(BetOutcome {
                    result_number: if win_amount > 0.0 { "0" } else { "3" }.to_string(),
                    result_color: "green".to_string(),
                    win_amount,
                }),
                None => Ok(BetOutcome {
                    result_number: "3".to_string(),
                    result_color: "green".to_string(),
                    win_amount: 0.0,
                }),
            }
        }
    }

    fn harness(api: FakeApi) -> Harness<FakeApi> {
        Harness::new(HarnessConfig::default(), api)
    }

    fn two_wins() -> Vec<std::result::Result<f64, Fault>> {
        vec![Ok(90.0), Ok(0.0), Ok(0.0), Ok(90.0)]
    }

    #[tokio::test]
    async fn test_full_run_passes() {
        let harness = harness(FakeApi::default().with_script(two_wins()));
        let report = harness.run().await;

        assert!(report.passed, "{:?}", report.failure());
        assert_eq!(report.completed_steps(), Step::ALL.to_vec());
        assert_eq!(report.balance, Some(1000.0));
        assert_eq!(report.trials.len(), 10);
        assert_eq!(report.stats.wins, 2);
        assert_eq!(report.stats.losses, 8);
        assert_eq!(report.verdict, Some(StatsVerdict::Acceptable { rate: 20.0 }));
        assert_eq!(report.payout.staked, 100.0);
        assert_eq!(report.payout.won, 180.0);
        assert!(!report.halted_early);
        assert!(report.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_each_setup_failure_stops_the_run() {
        let cases = [
            ("register", Step::RegisterUser, 0),
            ("login", Step::OperatorLogin, 1),
            ("request_deposit", Step::RequestDeposit, 2),
            ("approve_deposit", Step::ApproveDeposit, 3),
            ("balance", Step::ReadBalance, 4),
        ];

        for (call, step, completed) in cases {
            let harness = harness(FakeApi::default().with_fault(call, Fault::Status(500)));
            let report = harness.run().await;

            assert!(!report.passed);
            let failure = report.failure().unwrap();
            assert_eq!(failure.step, step);
            assert_eq!(failure.kind, FailureKind::Setup);
            assert_eq!(failure.status, Some(500));
            assert_eq!(report.completed_steps().len(), completed);
            assert_eq!(harness.api().count("place_bet"), 0);
            assert!(report.verdict.is_none());
        }
    }

    #[tokio::test]
    async fn test_rejected_approval_aborts() {
        let harness = harness(FakeApi::default().with_fault("approve_deposit", Fault::Status(400)));
        let report = harness.run().await;

        let failure = report.failure().unwrap();
        assert_eq!(failure.step, Step::ApproveDeposit);
        assert_eq!(failure.status, Some(400));
        assert!(report.deposit_id.is_some());
        assert!(report.balance.is_none());
        assert_eq!(harness.api().count("balance"), 0);
    }

    #[tokio::test]
    async fn test_malformed_token_is_distinguishable() {
        let harness = harness(FakeApi::default().with_fault("register", Fault::Malformed));
        let report = harness.run().await;

        let failure = report.failure().unwrap();
        assert_eq!(failure.step, Step::RegisterUser);
        assert_eq!(failure.kind, FailureKind::Malformed);
        assert_eq!(failure.status, None);
    }

    #[tokio::test]
    async fn test_bet_failure_halts_trials() {
        let api = FakeApi::default().with_script(vec![Ok(0.0), Ok(90.0), Ok(0.0), Err(Fault::Status(503)), Ok(90.0)]);
        let harness = harness(api);
        let report = harness.run().await;

        // three settled, the fourth failed, nothing after it was attempted
        assert_eq!(harness.api().count("place_bet"), 4);
        assert_eq!(report.trials.len(), 4);
        assert!(report.halted_early);
        assert!(matches!(
            report.trials[3].result,
            TrialResult::Failed { kind: FailureKind::Setup, status: Some(503), .. }
        ));
        assert!(report.trials[..3].iter().all(|t| t.outcome().is_some()));
        assert_eq!(report.trials.iter().filter(|t| t.is_win()).count(), 1);

        // earlier steps stay completed and the settled trials are judged
        assert!(report.completed_steps().contains(&Step::PlaceBets));
        assert_eq!(report.stats.total(), 3);
        assert!(matches!(report.verdict, Some(StatsVerdict::Acceptable { .. })));
        assert!(report.passed);
    }

    #[tokio::test]
    async fn test_malformed_bet_response_fails_run() {
        let api = FakeApi::default().with_script(vec![Ok(90.0), Ok(0.0), Err(Fault::Malformed), Ok(0.0)]);
        let harness = harness(api);
        let report = harness.run().await;

        assert!(!report.passed);
        assert_eq!(harness.api().count("place_bet"), 3);
        let failure = report.failure().unwrap();
        assert_eq!(failure.step, Step::PlaceBets);
        assert_eq!(failure.kind, FailureKind::Malformed);
        assert!(!report.completed_steps().contains(&Step::PlaceBets));
        assert!(matches!(
            report.trials[2].result,
            TrialResult::Failed { kind: FailureKind::Malformed, status: None, .. }
        ));
        assert!(report.verdict.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_during_bets_fails_run() {
        let api = FakeApi::default().with_script(vec![Ok(0.0), Err(Fault::Transport)]);
        let harness = harness(api);
        let report = harness.run().await;

        assert!(!report.passed);
        assert_eq!(harness.api().count("place_bet"), 2);
        let failure = report.failure().unwrap();
        assert_eq!(failure.step, Step::PlaceBets);
        assert_eq!(failure.kind, FailureKind::Transport);
        assert!(matches!(
            report.trials[1].result,
            TrialResult::Failed { kind: FailureKind::Transport, .. }
        ));
    }

    #[tokio::test]
    async fn test_no_successful_bets_fails() {
        let harness = harness(FakeApi::default().with_script(vec![Err(Fault::Status(500))]));
        let report = harness.run().await;

        assert!(!report.passed);
        assert_eq!(harness.api().count("place_bet"), 1);
        assert_eq!(report.verdict, Some(StatsVerdict::NoSuccessfulBets));
        let failure = report.failure().unwrap();
        assert_eq!(failure.step, Step::EvaluateWinRate);
        assert_eq!(failure.kind, FailureKind::Statistical);
    }

    #[tokio::test]
    async fn test_win_rate_out_of_band_fails() {
        let mut config = HarnessConfig::default();
        config.trial_count = 4;
        config.band = AcceptanceBand::new(0.0, 50.0);
        let api = FakeApi::default().with_script(vec![Ok(90.0), Ok(90.0), Ok(90.0), Ok(0.0)]);
        let report = Harness::new(config, api).run().await;

        assert!(!report.passed);
        assert!(matches!(report.verdict, Some(StatsVerdict::OutOfBand { rate, .. }) if rate == 75.0));
        assert_eq!(report.failure().unwrap().kind, FailureKind::Statistical);
    }

    #[tokio::test]
    async fn test_balance_delta_verified() {
        let mut config = HarnessConfig::default();
        config.verify_balance_delta = true;

        let report = Harness::new(config.clone(), FakeApi::default()).run().await;
        assert_eq!(report.balance_before, Some(0.0));
        assert_eq!(report.balance, Some(1000.0));
        assert!(report.passed);

        let short = FakeApi {
            credit: Some(900.0),
            ..FakeApi::default()
        };
        let report = Harness::new(config, short).run().await;
        let failure = report.failure().unwrap();
        assert_eq!(failure.step, Step::ReadBalance);
        assert_eq!(failure.kind, FailureKind::BalanceMismatch);
        assert_eq!(report.balance, Some(900.0));
    }

    #[tokio::test]
    async fn test_unique_user_and_configured_utr() {
        let mut config = HarnessConfig::default();
        config.unique_user = true;
        config.deposit_utr = Some("987654321098".to_string());
        let harness = Harness::new(config, FakeApi::default());

        let report = harness.run().await;
        assert!(report.user_email.starts_with("gametest+"));
        assert!(report.user_email.ends_with("@wingo.com"));
        assert_ne!(report.user_email, "gametest@wingo.com");
        assert_eq!(report.deposit_id.as_deref(), Some("dep-987654321098"));
    }

    #[test]
    fn test_http_harness_rejects_invalid_config() {
        let mut config = HarnessConfig::default();
        config.trial_count = 0;
        assert!(Harness::http(config).is_err());
    }
}
