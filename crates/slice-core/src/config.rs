use std::str::FromStr;

use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("PASSWORD_RESET_EXPIRY_SECS ({reset}) must be shorter than EMAIL_VERIFICATION_EXPIRY_SECS ({verification})")]
    ResetOutlivesVerification { reset: u64, verification: u64 },
}

/// Auth policy knobs.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// When `false`, new accounts are created already verified.
    pub require_email_verification: bool,

    /// Minimum length for new passwords (default: 6)
    pub min_password_length: usize,

    /// Lifetime of an email-verification token (default: 24h)
    pub email_verification_expiry_secs: u64,

    /// Lifetime of a password-reset token (default: 1h)
    pub password_reset_expiry_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        SecurityConfig {
            require_email_verification: false,
            min_password_length: 6,
            email_verification_expiry_secs: 86_400,
            password_reset_expiry_secs: 3_600,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL (e.g. sqlite://slice.db?mode=rwc, postgres://...)
    pub database_url: String,

    /// JWT signing secret
    pub jwt_secret: String,

    /// JWT token expiry in hours (default: 24)
    pub jwt_expiry_hours: u64,

    /// Server host (default: 127.0.0.1)
    pub server_host: String,

    /// Server port (default: 5000)
    pub server_port: u16,

    /// Environment: development, production, test
    pub environment: String,

    /// Shared secret expected in `x-api-key`. `None` disables the gate.
    pub api_key: Option<String>,

    /// Base URL of the web client; used for CORS and for links in emails.
    pub frontend_url: String,

    /// HTTP mail relay endpoint. When unset, emails are only logged.
    pub mail_api_url: Option<String>,

    /// Sender address for outgoing mail.
    pub mail_from: String,

    pub security: SecurityConfig,
}

impl Config {
    /// Load configuration from environment variables (with .env support).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if missing)
        let _ = dotenvy::dotenv();

        let defaults = SecurityConfig::default();
        let security = SecurityConfig {
            require_email_verification: env_flag("REQUIRE_EMAIL_VERIFICATION"),
            min_password_length: env_parse(
                "MIN_PASSWORD_LENGTH",
                "integer",
                defaults.min_password_length,
            )?,
            email_verification_expiry_secs: env_parse(
                "EMAIL_VERIFICATION_EXPIRY_SECS",
                "integer",
                defaults.email_verification_expiry_secs,
            )?,
            password_reset_expiry_secs: env_parse(
                "PASSWORD_RESET_EXPIRY_SECS",
                "integer",
                defaults.password_reset_expiry_secs,
            )?,
        };

        let config = Config {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://slice.db?mode=rwc".to_string()),
            jwt_secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "slice-dev-secret-change-me".to_string()),
            jwt_expiry_hours: env_parse("JWT_EXPIRY_HOURS", "integer", 24)?,
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env_parse("SERVER_PORT", "port number", 5000)?,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            api_key: std::env::var("API_KEY").ok().filter(|k| !k.is_empty()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            mail_api_url: std::env::var("MAIL_API_URL").ok().filter(|u| !u.is_empty()),
            mail_from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "noreply@slicechill.com".to_string()),
            security,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.security;
        if s.password_reset_expiry_secs >= s.email_verification_expiry_secs {
            return Err(ConfigError::ResetOutlivesVerification {
                reset: s.password_reset_expiry_secs,
                verification: s.email_verification_expiry_secs,
            });
        }
        Ok(())
    }

    /// Check if running in development mode.
    pub fn is_dev(&self) -> bool {
        self.environment == "development"
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name)
            .unwrap_or_default()
            .to_lowercase()
            .as_str(),
        "true" | "1" | "yes"
    )
}

fn env_parse<T: FromStr>(
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name,
                expected,
                value: raw,
            })
        }
        _ => Ok(default),
    }
}
