use std::path::PathBuf;

use crate::error::GuildError;

pub const DATABASE_URL_VAR: &str = "TERCIO_DATABASE_URL";
pub const FIRST_USER_COMMANDER_VAR: &str = "TERCIO_FIRST_USER_COMMANDER";
pub const EXPORT_DIR_VAR: &str = "TERCIO_EXPORT_DIR";

/// Deployment settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Postgres connection string. Only required by the Postgres store.
    pub database_url: Option<String>,
    /// Whether the very first profile ever created becomes Comandante.
    pub first_user_commander: bool,
    /// Where plan exports are written.
    pub export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            first_user_commander: false,
            export_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, GuildError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GuildError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        config.database_url = get(DATABASE_URL_VAR);
        if let Some(raw) = get(FIRST_USER_COMMANDER_VAR) {
            config.first_user_commander = parse_flag(&raw).ok_or_else(|| {
                GuildError::Configuration(format!(
                    "{FIRST_USER_COMMANDER_VAR} must be true or false, got {raw:?}"
                ))
            })?;
        }
        if let Some(dir) = get(EXPORT_DIR_VAR) {
            config.export_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn database_url(&self) -> Result<&str, GuildError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| GuildError::Configuration(format!("{DATABASE_URL_VAR} is not set")))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
