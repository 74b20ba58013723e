use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Refresh scheduler
    pub scheduler_enabled: bool,
    pub refresh_interval_minutes: u64,
    pub refresh_initial_delay_secs: u64,
    pub refresh_pause_ms: u64,
    pub retention_days: i64,
    // Feed fetching
    pub fetch_timeout_secs: u64,
    pub fetch_user_agent: String,
    // Article list cache
    pub article_cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

pub const DEFAULT_USER_AGENT: &str = "FeedHive/1.0 (+feed reader)";

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            database_url: env::var("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            jwt_secret: env::var("JWT_SECRET")?,
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            scheduler_enabled: env::var("SCHEDULER_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
            refresh_interval_minutes: env::var("REFRESH_INTERVAL_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,
            refresh_initial_delay_secs: env::var("REFRESH_INITIAL_DELAY_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            refresh_pause_ms: env::var("REFRESH_PAUSE_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
            retention_days: env::var("RETENTION_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()?,
            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            fetch_user_agent: env::var("FETCH_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            article_cache_ttl_secs: env::var("ARTICLE_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,
        };

        if config.refresh_interval_minutes == 0 {
            return Err("REFRESH_INTERVAL_MINUTES must be greater than zero".into());
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes * 60)
    }

    pub fn refresh_initial_delay(&self) -> Duration {
        Duration::from_secs(self.refresh_initial_delay_secs)
    }

    pub fn refresh_pause(&self) -> Duration {
        Duration::from_millis(self.refresh_pause_ms)
    }

    pub fn retention_horizon(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_days)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn article_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.article_cache_ttl_secs)
    }
}
