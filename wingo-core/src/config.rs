use crate::error::{HarnessError, Result};
use crate::stats::AcceptanceBand;
use crate::types::{BetRequest, Credential};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_BASE_URL: &str = "WINGO_BASE_URL";
pub const ENV_OPERATOR_EMAIL: &str = "WINGO_OPERATOR_EMAIL";
pub const ENV_OPERATOR_PASSWORD: &str = "WINGO_OPERATOR_PASSWORD";
pub const ENV_USER_EMAIL: &str = "WINGO_USER_EMAIL";
pub const ENV_USER_PASSWORD: &str = "WINGO_USER_PASSWORD";
pub const ENV_TRIALS: &str = "WINGO_TRIALS";
pub const ENV_STAKE: &str = "WINGO_STAKE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
    pub base_url: String,
    pub user: Credential,
    pub operator: Credential,
    pub unique_user: bool,
    pub deposit_amount: u64,
    pub deposit_utr: Option<String>,
    pub verify_balance_delta: bool,
    pub bet: BetPolicy,
    pub trial_count: u32,
    pub band: AcceptanceBand,
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

/// Constant parameters shared by every bet trial.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BetPolicy {
    pub game_mode: String,
    pub bet_type: String,
    pub bet_value: String,
    pub stake: u64,
}

impl Default for BetPolicy {
    fn default() -> Self {
        Self {
            game_mode: "30s".to_string(),
            bet_type: "number".to_string(),
            bet_value: "0".to_string(),
            stake: 10,
        }
    }
}

impl BetPolicy {
    pub fn request(&self) -> BetRequest {
        BetRequest {
            game_mode: self.game_mode.clone(),
            bet_type: self.bet_type.clone(),
            bet_value: self.bet_value.clone(),
            bet_amount: self.stake,
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001/api".to_string(),
            user: Credential::new("gametest@wingo.com", "TestPass123!").with_name("Game Test User"),
            operator: Credential::new("admin@wingo.com", "admin123"),
            unique_user: false,
            deposit_amount: 1000,
            deposit_utr: None,
            verify_balance_delta: false,
            bet: BetPolicy::default(),
            trial_count: 10,
            band: AcceptanceBand::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl HarnessConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// `<config_dir>/wingo/harness.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wingo").join("harness.json"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Defaults, then the config file (explicit path, or the default location
    /// if present), then `WINGO_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    tracing::debug!("Loading harness config from {}", path.display());
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(email) = lookup(ENV_OPERATOR_EMAIL) {
            self.operator.email = email;
        }
        if let Some(password) = lookup(ENV_OPERATOR_PASSWORD) {
            self.operator.password = password;
        }
        if let Some(email) = lookup(ENV_USER_EMAIL) {
            self.user.email = email;
        }
        if let Some(password) = lookup(ENV_USER_PASSWORD) {
            self.user.password = password;
        }
        if let Some(trials) = lookup(ENV_TRIALS) {
            self.trial_count = trials
                .parse()
                .map_err(|_| HarnessError::config(format!("{} is not a number: {}", ENV_TRIALS, trials)))?;
        }
        if let Some(stake) = lookup(ENV_STAKE) {
            self.bet.stake = stake
                .parse()
                .map_err(|_| HarnessError::config(format!("{} is not a number: {}", ENV_STAKE, stake)))?;
        }
        Ok(())
    }

    /// Copy with both passwords masked.
    pub fn redacted(&self) -> Self {
        Self {
            user: self.user.masked(),
            operator: self.operator.masked(),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(HarnessError::config("Base URL cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(HarnessError::config(format!(
                "Base URL must be http(s): {}",
                self.base_url
            )));
        }

        for (role, credential) in [("user", &self.user), ("operator", &self.operator)] {
            if credential.email.is_empty() || credential.password.is_empty() {
                return Err(HarnessError::config(format!(
                    "The {} email and password must be set",
                    role
                )));
            }
        }

        if self.trial_count == 0 {
            return Err(HarnessError::config("Trial count must be greater than 0"));
        }

        if self.bet.stake == 0 {
            return Err(HarnessError::config("Stake must be greater than 0"));
        }

        if self.deposit_amount == 0 {
            return Err(HarnessError::config("Deposit amount must be greater than 0"));
        }

        self.band.validate()?;

        if self.request_timeout.is_zero() {
            return Err(HarnessError::config("Request timeout must be greater than 0"));
        }

        Ok(())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
