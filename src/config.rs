use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;

use crate::model::profile::{DEFAULT_LEAVE_BALANCE, ProfileDefaults, WeekdayHours};

#[derive(Clone)]
pub struct Config {
    /// `mysql://...`, or `memory://` for a process-local store
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Idle seconds before a session and its held proposals are discarded
    pub session_idle_secs: u64,
    pub profile_defaults: ProfileDefaults,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("{key} has an invalid value: `{raw}`")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let weekday_hours = match env::var("DEFAULT_WEEKDAY_HOURS") {
            Ok(raw) => WeekdayHours::parse_list(&raw)
                .map_err(|e| anyhow!("DEFAULT_WEEKDAY_HOURS: {e}"))?,
            Err(_) => WeekdayHours::default(),
        };
        let leave_balance = parsed_or("DEFAULT_LEAVE_BALANCE", DEFAULT_LEAVE_BALANCE)?;
        if !leave_balance.is_finite() || leave_balance < 0.0 {
            return Err(anyhow!("DEFAULT_LEAVE_BALANCE must be non-negative"));
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed_or("ACCESS_TOKEN_TTL", 900)?, // default 15 min

            rate_login_per_min: parsed_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parsed_or("RATE_REGISTER_PER_MIN", 30)?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            session_idle_secs: parsed_or("SESSION_IDLE_SECS", 1800)?,
            profile_defaults: ProfileDefaults {
                weekday_hours,
                leave_balance,
            },
        })
    }
}
