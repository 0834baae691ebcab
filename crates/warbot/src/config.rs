//! Bot configuration loaded from TOML.
//!
//! ```toml
//! audit_channel = 5150
//!
//! [staff]
//! moderator_role = 900
//! score_operator_role = 901
//!
//! [war]
//! rounds_to_win = 2
//! max_rounds = 3
//!
//! [war.retry]
//! attempts = 3
//! backoff_ms = 50
//! ```
//!
//! Every section is optional and falls back to its defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use warbot_engine::WarConfig;
use warbot_model::{ChannelId, RoleId};

/// Errors from loading or validating a [`BotConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Roles whose holders count as staff. Server administrators always do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffRoles {
    pub moderator_role: Option<RoleId>,
    pub score_operator_role: Option<RoleId>,
}

impl StaffRoles {
    /// The configured roles, in declaration order.
    pub fn roles(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.moderator_role
            .iter()
            .chain(self.score_operator_role.iter())
            .copied()
    }
}

/// Top-level configuration of the war bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub war: WarConfig,
    pub staff: StaffRoles,
    /// Channel that receives dodge notices. Applied to the in-memory audit
    /// sink by `WarBotBuilder::build_in_memory`; other backends read it from
    /// here when building their `AuditSink`. `None` leaves the sink to
    /// decide.
    pub audit_channel: Option<ChannelId>,
}

impl BotConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: BotConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.war.validate().map_err(|e| ConfigError::InvalidValue {
            field: e.field,
            reason: e.reason,
        })?;
        if let (Some(moderator), Some(operator)) =
            (self.staff.moderator_role, self.staff.score_operator_role)
        {
            if moderator == operator {
                return Err(ConfigError::InvalidValue {
                    field: "staff.score_operator_role",
                    reason: format!("must differ from staff.moderator_role ({moderator})"),
                });
            }
        }
        Ok(())
    }
}
