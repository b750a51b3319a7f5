use anyhow::Result;

use crate::types::UserId;

// ============================================================================
// Configuration Constants
// ============================================================================

// Default port for the liveness/metrics listener
const DEFAULT_PORT: u16 = 8080;

// Default time intervals (in seconds)
const DEFAULT_SELF_PING_INTERVAL_SECS: u64 = 300;
const DEFAULT_SELF_PING_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Relay links kept before the oldest is evicted. An operator reply to an
// evicted forward degrades to the normal "user not found" outcome.
const DEFAULT_RELAY_MAP_CAPACITY: usize = 65536;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

// ============================================================================
// Configuration Structures
// ============================================================================

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// When false (the default), user ids in log lines are replaced by a
    /// salted truncated hash. Raw ids still reach the operator as chat
    /// messages, which is the product's purpose.
    pub enable_user_identifiers: bool,
    pub hash_salt: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Bot API credential. Required.
    pub bot_token: String,
    /// The single privileged operator. Required.
    pub operator_id: UserId,
    /// Liveness/metrics listener port.
    pub port: u16,
    /// Bot API base URL, overridable for self-hosted gateways and tests.
    pub api_base: String,
    /// Optional URL pinged periodically to keep free-tier hosts awake.
    pub self_url: Option<String>,
    pub self_ping_interval_secs: u64,
    pub self_ping_timeout_secs: u64,
    /// getUpdates long-poll hold time.
    pub poll_timeout_secs: u64,
    /// Timeout for every outbound Bot API call.
    pub request_timeout_secs: u64,
    pub relay_map_capacity: usize,
    pub rust_log: String,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let bot_token = std::env::var("BOT_TOKEN")
            .map_err(|_| anyhow::anyhow!("BOT_TOKEN is not set"))?;
        if bot_token.is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }

        let operator_raw = std::env::var("ADMIN_ID")
            .map_err(|_| anyhow::anyhow!("ADMIN_ID is not set"))?;
        let operator_id = UserId::parse(&operator_raw)
            .map_err(|e| anyhow::anyhow!("ADMIN_ID is invalid: {}", e))?;

        Ok(Self {
            bot_token,
            operator_id,
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            api_base: std::env::var("TELEGRAM_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            self_url: std::env::var("SELF_URL").ok().filter(|u| !u.is_empty()),
            self_ping_interval_secs: std::env::var("SELF_PING_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SELF_PING_INTERVAL_SECS),
            self_ping_timeout_secs: std::env::var("SELF_PING_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SELF_PING_TIMEOUT_SECS),
            poll_timeout_secs: std::env::var("POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            relay_map_capacity: std::env::var("RELAY_MAP_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&c| c > 0)
                .unwrap_or(DEFAULT_RELAY_MAP_CAPACITY),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            logging: LoggingConfig {
                enable_user_identifiers: std::env::var("LOG_USER_IDENTIFIERS")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
                hash_salt: std::env::var("LOG_HASH_SALT")
                    .unwrap_or_else(|_| "relay-gateway".to_string()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "BOT_TOKEN",
            "ADMIN_ID",
            "PORT",
            "TELEGRAM_API_BASE",
            "SELF_URL",
            "SELF_PING_INTERVAL_SECS",
            "SELF_PING_TIMEOUT_SECS",
            "POLL_TIMEOUT_SECS",
            "REQUEST_TIMEOUT_SECS",
            "RELAY_MAP_CAPACITY",
            "LOG_USER_IDENTIFIERS",
            "LOG_HASH_SALT",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_missing_bot_token_is_fatal() {
        clear_env();
        std::env::set_var("ADMIN_ID", "42");
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("BOT_TOKEN"));
    }

    #[test]
    #[serial]
    fn test_missing_operator_id_is_fatal() {
        clear_env();
        std::env::set_var("BOT_TOKEN", "123:abc");
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("ADMIN_ID"));
    }

    #[test]
    #[serial]
    fn test_non_numeric_operator_id_is_fatal() {
        clear_env();
        std::env::set_var("BOT_TOKEN", "123:abc");
        std::env::set_var("ADMIN_ID", "not-a-number");
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("ADMIN_ID"));
    }

    #[test]
    #[serial]
    fn test_defaults_applied() {
        clear_env();
        std::env::set_var("BOT_TOKEN", "123:abc");
        std::env::set_var("ADMIN_ID", "42");
        let config = Config::from_env().unwrap();
        assert_eq!(config.operator_id, UserId(42));
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.self_url, None);
        assert_eq!(config.self_ping_interval_secs, 300);
        assert_eq!(config.relay_map_capacity, DEFAULT_RELAY_MAP_CAPACITY);
        assert!(!config.logging.enable_user_identifiers);
    }

    #[test]
    #[serial]
    fn test_overrides_applied() {
        clear_env();
        std::env::set_var("BOT_TOKEN", "123:abc");
        std::env::set_var("ADMIN_ID", "42");
        std::env::set_var("PORT", "9090");
        std::env::set_var("SELF_URL", "https://bot.example.com/");
        std::env::set_var("RELAY_MAP_CAPACITY", "128");
        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(
            config.self_url.as_deref(),
            Some("https://bot.example.com/")
        );
        assert_eq!(config.relay_map_capacity, 128);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_relay_capacity_falls_back_to_default() {
        clear_env();
        std::env::set_var("BOT_TOKEN", "123:abc");
        std::env::set_var("ADMIN_ID", "42");
        std::env::set_var("RELAY_MAP_CAPACITY", "0");
        let config = Config::from_env().unwrap();
        assert_eq!(config.relay_map_capacity, DEFAULT_RELAY_MAP_CAPACITY);
        clear_env();
    }
}
