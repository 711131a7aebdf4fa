use crate::error::AppError;
use crate::session::SessionSettings;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sessions with no frames for this long are closed by the reaper.
    pub idle_timeout: Duration,
    pub reaper_interval: Duration,
    pub max_sessions: usize,
    pub inbound_capacity: usize,
    pub outbound_capacity: usize,
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Pose-estimation sidecar; when unset only client-side landmarks work.
    pub url: Option<String>,
    pub timeout: Duration,
    pub max_in_flight: usize,
    pub min_visibility: f64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub session: SessionConfig,
    pub extractor: ExtractorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            session: SessionConfig {
                idle_timeout: Duration::from_secs(300),
                reaper_interval: Duration::from_secs(15),
                max_sessions: 100,
                inbound_capacity: 32,
                outbound_capacity: 64,
            },
            extractor: ExtractorConfig {
                url: None,
                timeout: Duration::from_millis(2000),
                max_in_flight: 8,
                min_visibility: 0.5,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys take defaults;
    /// present but unparsable keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Config {
            host: var("HOST").unwrap_or(defaults.host),
            port: parse(&var, "PORT", defaults.port)?,
            session: SessionConfig {
                idle_timeout: Duration::from_secs(parse(
                    &var,
                    "SESSION_IDLE_TIMEOUT_SECS",
                    defaults.session.idle_timeout.as_secs(),
                )?),
                reaper_interval: Duration::from_secs(parse(
                    &var,
                    "REAPER_INTERVAL_SECS",
                    defaults.session.reaper_interval.as_secs(),
                )?),
                max_sessions: parse(&var, "MAX_CONCURRENT_SESSIONS", defaults.session.max_sessions)?,
                inbound_capacity: parse(
                    &var,
                    "SESSION_INBOUND_CAPACITY",
                    defaults.session.inbound_capacity,
                )?,
                outbound_capacity: parse(
                    &var,
                    "SESSION_OUTBOUND_CAPACITY",
                    defaults.session.outbound_capacity,
                )?,
            },
            extractor: ExtractorConfig {
                url: var("EXTRACTOR_URL"),
                timeout: Duration::from_millis(parse(
                    &var,
                    "EXTRACTOR_TIMEOUT_MS",
                    defaults.extractor.timeout.as_millis() as u64,
                )?),
                max_in_flight: parse(
                    &var,
                    "EXTRACTOR_MAX_IN_FLIGHT",
                    defaults.extractor.max_in_flight,
                )?,
                min_visibility: parse(
                    &var,
                    "MIN_LANDMARK_VISIBILITY",
                    defaults.extractor.min_visibility,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        let positive = [
            ("SESSION_IDLE_TIMEOUT_SECS", self.session.idle_timeout.as_secs() as usize),
            ("REAPER_INTERVAL_SECS", self.session.reaper_interval.as_secs() as usize),
            ("MAX_CONCURRENT_SESSIONS", self.session.max_sessions),
            ("SESSION_INBOUND_CAPACITY", self.session.inbound_capacity),
            ("SESSION_OUTBOUND_CAPACITY", self.session.outbound_capacity),
            ("EXTRACTOR_TIMEOUT_MS", self.extractor.timeout.as_millis() as usize),
            ("EXTRACTOR_MAX_IN_FLIGHT", self.extractor.max_in_flight),
        ];
        if let Some((key, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(AppError::Config(format!("{key} must be greater than zero")));
        }

        if !(0.0..=1.0).contains(&self.extractor.min_visibility) {
            return Err(AppError::Config(
                "MIN_LANDMARK_VISIBILITY must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            inbound_capacity: self.session.inbound_capacity,
            outbound_capacity: self.session.outbound_capacity,
            max_sessions: self.session.max_sessions,
        }
    }
}

fn parse<T, F>(var: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has invalid value {raw:?}"))),
        None => Ok(default),
    }
}
