use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::types::PrincipalId;

/// Top-level config (promobot.toml + PROMOBOT_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromobotConfig {
    /// The immutable Owner principal. Fixed for the process lifetime.
    pub owner_id: i64,

    /// When true, freshly created jobs stay Queued until an explicit Start,
    /// regardless of their schedule.
    #[serde(default = "bool_true")]
    pub safe_mode: bool,

    /// Interval-phase policy on resume: when true the interval restarts from
    /// the resume instant instead of keeping the original deadline.
    #[serde(default)]
    pub reset_on_resume: bool,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// How long terminal jobs stay queryable in the live set before being
/// evicted. Audit rows are never evicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_retention_secs")]
    pub terminal_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            terminal_secs: default_retention_secs(),
        }
    }
}

impl PromobotConfig {
    /// Load config from a TOML file with PROMOBOT_* env var overrides.
    ///
    /// Checks the explicit path argument first, then ~/.promobot/promobot.toml.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: PromobotConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("PROMOBOT_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }

    pub fn owner(&self) -> PrincipalId {
        PrincipalId(self.owner_id)
    }
}

fn bool_true() -> bool {
    true
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.promobot/promobot.db", home)
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.promobot/promobot.toml", home)
}

fn default_retention_secs() -> u64 {
    24 * 60 * 60
}
