use crate::render;
use clap::Args;
use std::path::Path;
use wingo_core::{Harness, HarnessConfig};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Base URL of the game API, e.g. https://host/api
    #[arg(short = 'u', long)]
    pub base_url: Option<String>,

    /// Number of bet trials
    #[arg(short = 'n', long)]
    pub trials: Option<u32>,

    /// Stake per bet
    #[arg(long)]
    pub stake: Option<u64>,

    /// Game mode to bet in (30s, 1m, 3m, 5m)
    #[arg(long)]
    pub game_mode: Option<String>,

    /// Bet type (number, color, size)
    #[arg(long)]
    pub bet_type: Option<String>,

    /// Value to bet on
    #[arg(long)]
    pub bet_value: Option<String>,

    /// Register a fresh user email for this run
    #[arg(long)]
    pub unique_user: bool,

    /// Fail unless the balance grows by exactly the deposit amount
    #[arg(long)]
    pub verify_balance: bool,

    /// Print the report as JSON instead of progress lines
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn apply(&self, config: &mut HarnessConfig) {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(trials) = self.trials {
            config.trial_count = trials;
        }
        if let Some(stake) = self.stake {
            config.bet.stake = stake;
        }
        if let Some(mode) = &self.game_mode {
            config.bet.game_mode = mode.clone();
        }
        if let Some(bet_type) = &self.bet_type {
            config.bet.bet_type = bet_type.clone();
        }
        if let Some(value) = &self.bet_value {
            config.bet.bet_value = value.clone();
        }
        config.unique_user |= self.unique_user;
        config.verify_balance_delta |= self.verify_balance;
    }
}

pub async fn run(config_path: Option<&Path>, args: RunArgs) -> anyhow::Result<bool> {
    let mut config = crate::config::load(config_path)?;
    args.apply(&mut config);
    tracing::debug!("Effective config: {:?}", config.redacted());

    let harness = Harness::http(config)?;
    if !args.json {
        println!("Testing game functionality against {}", harness.config().base_url);
    }

    let report = harness.run().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_report(&report));
    }

    Ok(report.passed)
}
