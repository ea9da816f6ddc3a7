//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

/// Drafts untouched for longer than this are removed by the cleanup endpoint
pub const DEFAULT_DRAFT_MAX_AGE_HOURS: i64 = 24;

/// Minimum spacing between manual ranking refreshes
pub const DEFAULT_RANKINGS_REFRESH_COOLDOWN_SECS: u64 = 30;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Supabase project URL
    pub supabase_url: String,
    /// Supabase anonymous key, sent to the auth service
    pub supabase_anon_key: String,
    /// Supabase service role key (bypasses RLS - server only!)
    pub supabase_service_role_key: String,
    /// Supabase JWT secret for token verification
    pub supabase_jwt_secret: String,

    /// Public base URL of this service
    pub public_base_url: String,
    /// Allowed client origins for CORS (comma-separated)
    pub client_origin: String,

    /// Age after which a draft counts as abandoned
    pub draft_max_age_hours: i64,
    /// Cooldown between manual ranking refreshes
    pub rankings_refresh_cooldown_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            supabase_url: required("SUPABASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            supabase_anon_key: required("SUPABASE_ANON_KEY")?,
            supabase_service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            supabase_jwt_secret: required("SUPABASE_JWT_SECRET")?,

            public_base_url: required("PUBLIC_BASE_URL")?,
            client_origin: required("CLIENT_ORIGIN")?,

            draft_max_age_hours: optional("DRAFT_MAX_AGE_HOURS", DEFAULT_DRAFT_MAX_AGE_HOURS)?,
            rankings_refresh_cooldown_secs: optional(
                "RANKINGS_REFRESH_COOLDOWN_SECS",
                DEFAULT_RANKINGS_REFRESH_COOLDOWN_SECS,
            )?,
        })
    }

    /// Whether cookies we set should carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.public_base_url.starts_with("https://")
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// Config pointing the backend client at `supabase_url`.
    pub fn test_config(supabase_url: &str) -> Config {
        Config {
            server_addr: "127.0.0.1:0".parse().expect("static address"),
            log_level: "debug".to_string(),
            supabase_url: supabase_url.to_string(),
            supabase_anon_key: "anon-key".to_string(),
            supabase_service_role_key: "service-key".to_string(),
            supabase_jwt_secret: "test-jwt-secret".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
            client_origin: "http://localhost:3000".to_string(),
            draft_max_age_hours: DEFAULT_DRAFT_MAX_AGE_HOURS,
            rankings_refresh_cooldown_secs: DEFAULT_RANKINGS_REFRESH_COOLDOWN_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_accepts_padded_numbers() {
        let hours: i64 = parse_value("DRAFT_MAX_AGE_HOURS", " 48 ").unwrap();
        assert_eq!(hours, 48);
    }

    #[test]
    fn parse_value_rejects_garbage() {
        let err = parse_value::<u64>("RANKINGS_REFRESH_COOLDOWN_SECS", "soon").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("RANKINGS_REFRESH_COOLDOWN_SECS")));
    }

    #[test]
    fn secure_cookies_follow_public_scheme() {
        let mut config = test_helpers::test_config("http://localhost");
        assert!(!config.secure_cookies());
        config.public_base_url = "https://gallery.example.com".to_string();
        assert!(config.secure_cookies());
    }
}
