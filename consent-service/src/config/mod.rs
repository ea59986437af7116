use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

use crate::services::restrictions::RestrictionPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct ConsentConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub mongodb: MongoConfig,
    pub smtp: SmtpConfig,
    pub consent: ConsentSettings,
    pub data_rights: DataRightsConfig,
    pub content: ContentConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// When false the service logs outgoing mail instead of sending it.
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsentSettings {
    /// Link target of the parental verification email.
    pub verification_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataRightsConfig {
    pub deletion_code_ttl_minutes: i64,
    /// When false any non-empty confirmation code is accepted.
    pub require_issued_deletion_code: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    pub restrict_full_content_for_minors: bool,
    /// JSON file served by the content endpoint. A bundled sample feed is
    /// used when unset.
    pub feed_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl ConsentConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = ConsentConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("consent-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("consent"), is_prod)?,
            },
            smtp: SmtpConfig {
                enabled: parse_bool("SMTP_ENABLED", get_env("SMTP_ENABLED", Some("false"), is_prod)?)?,
                host: get_env("SMTP_HOST", Some("localhost"), is_prod)?,
                port: get_env("SMTP_PORT", Some("587"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!("SMTP_PORT: {}", e))
                    })?,
                username: get_env("SMTP_USERNAME", Some(""), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from: get_env("SMTP_FROM", Some("no-reply@localhost"), is_prod)?,
            },
            consent: ConsentSettings {
                verification_base_url: get_env(
                    "CONSENT_VERIFICATION_BASE_URL",
                    Some("http://localhost:3000"),
                    is_prod,
                )?,
            },
            data_rights: DataRightsConfig {
                deletion_code_ttl_minutes: get_env("DELETION_CODE_TTL_MINUTES", Some("30"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!("DELETION_CODE_TTL_MINUTES: {}", e))
                    })?,
                require_issued_deletion_code: parse_bool(
                    "REQUIRE_ISSUED_DELETION_CODE",
                    get_env("REQUIRE_ISSUED_DELETION_CODE", Some("true"), is_prod)?,
                )?,
            },
            content: ContentConfig {
                restrict_full_content_for_minors: parse_bool(
                    "RESTRICT_FULL_CONTENT_FOR_MINORS",
                    get_env("RESTRICT_FULL_CONTENT_FOR_MINORS", Some("false"), is_prod)?,
                )?,
                // Optional in every environment.
                feed_path: env::var("CONTENT_FEED_PATH").ok().filter(|p| !p.is_empty()),
            },
            security: SecurityConfig {
                allowed_origins: split_origins(&get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn restriction_policy(&self) -> RestrictionPolicy {
        RestrictionPolicy {
            restrict_full_content_for_minors: self.content.restrict_full_content_for_minors,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.data_rights.deletion_code_ttl_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DELETION_CODE_TTL_MINUTES must be positive"
            )));
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if !self.data_rights.require_issued_deletion_code {
                tracing::error!("Presence-only deletion confirmation is enabled in production");
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_bool(key: &str, value: String) -> Result<bool, AppError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be a boolean, got '{}'",
            key,
            other
        ))),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
