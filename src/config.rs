//! Type-safe configuration loader using the `config` crate, reading
//! `res/config.json` and applying the environment-variable overrides
//! named in spec §6.

use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use std::env;

/// Config keys read verbatim from `res/config.json`.
#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// Poll period, in seconds, between ingestion ticks.
    pub lazy_time: i64,
    pub db_address: String,
    pub db_port: i64,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,

    /// HTTP bind address for the `/metrics` and `/healthz` endpoints.
    /// Additive to spec §6 — not one of the JSON-config keys it names,
    /// defaulted so existing `res/config.json` files keep working.
    #[serde(default = "default_server_bind")]
    pub server_bind: String,
}

fn default_server_bind() -> String {
    "0.0.0.0:9898".to_string()
}

impl Settings {
    /// Load `res/config.json`, then apply the environment overrides from
    /// spec §6. `PGHOST, PGPORT, PGDATABASE, PGUSER, PGPASSWORD, PGSERVICE`
    /// are unset first so no ambient libpq environment can shadow the
    /// configured connection parameters.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        for var in [
            "PGHOST",
            "PGPORT",
            "PGDATABASE",
            "PGUSER",
            "PGPASSWORD",
            "PGSERVICE",
        ] {
            env::remove_var(var);
        }

        let cfg = Config::builder()
            .add_source(File::new(path, FileFormat::Json))
            .build()?;
        let mut settings: Settings = cfg.try_deserialize()?;

        if let Ok(password) = env::var("POSTGRES_PASSWORD") {
            settings.db_password = password;
        } else {
            tracing::warn!("POSTGRES_PASSWORD not set; using password from config file");
        }

        Ok(settings)
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_address, self.db_port, self.db_name
        )
    }
}

/// Bus configuration, sourced entirely from environment variables per spec §6.
#[derive(Debug, Clone)]
pub struct BusSettings {
    pub redis_url: String,
    pub in_channel: String,
    pub out_channel: String,
}

impl BusSettings {
    pub fn from_env() -> Self {
        Self {
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://redis:6379/0".into()),
            in_channel: env::var("RSS_IN_CHANNEL")
                .unwrap_or_else(|_| "rss_news_fetch_requests".into()),
            out_channel: env::var("REDIS_OUT_CHANNEL")
                .unwrap_or_else(|_| "news_fetch_results".into()),
        }
    }
}

/// Resolves the LLM model path: explicit arg, then `LLM_MODEL_PATH` env,
/// then a compile-time default, then a built-in fallback path.
pub fn resolve_llm_model_path(explicit: Option<&str>) -> String {
    const COMPILE_TIME_DEFAULT: Option<&str> = option_env!("LLM_MODEL_PATH");
    const BUILTIN_FALLBACK: &str = "/opt/models/qwen-topics.gguf";

    explicit
        .map(str::to_string)
        .or_else(|| env::var("LLM_MODEL_PATH").ok())
        .or_else(|| COMPILE_TIME_DEFAULT.map(str::to_string))
        .unwrap_or_else(|| BUILTIN_FALLBACK.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_llm_model_path_prefers_explicit() {
        assert_eq!(resolve_llm_model_path(Some("/x/model.gguf")), "/x/model.gguf");
    }

    #[test]
    fn bus_settings_default_channels() {
        env::remove_var("REDIS_URL");
        env::remove_var("RSS_IN_CHANNEL");
        env::remove_var("REDIS_OUT_CHANNEL");
        let s = BusSettings::from_env();
        assert_eq!(s.redis_url, "redis://redis:6379/0");
        assert_eq!(s.in_channel, "rss_news_fetch_requests");
        assert_eq!(s.out_channel, "news_fetch_results");
    }
}
