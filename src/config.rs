use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub pusher: PusherConfig,
    #[serde(default)]
    pub qbet88: Qbet88Config,
    #[serde(default)]
    pub dpay: DpayConfig,
    #[serde(default)]
    pub optimum_pay: OptimumPayConfig,
    #[serde(default)]
    pub blob: BlobConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub tickets: TicketConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub session_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub guest_cookie_name: String,
    pub secure_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            guest_cookie_name: "guest_id".to_string(),
            secure_cookies: true,
        }
    }
}

/// Realtime pub/sub (Pusher Channels) credentials. Publishing is disabled
/// when `app_id` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PusherConfig {
    pub app_id: String,
    pub key: String,
    pub secret: String,
    pub cluster: String,
}

impl Default for PusherConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            key: String::new(),
            secret: String::new(),
            cluster: "ap1".to_string(),
        }
    }
}

impl PusherConfig {
    pub fn is_enabled(&self) -> bool {
        !self.app_id.is_empty() && !self.key.is_empty() && !self.secret.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Qbet88Config {
    pub base_url: String,
    pub operator_code: String,
    pub secret_key: String,
    /// Shared key required on the server-to-server `/api/qbet88/*` routes.
    pub internal_api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DpayConfig {
    pub base_url: String,
    pub callback_url: String,
}

impl Default for DpayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dpay.example".to_string(),
            callback_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OptimumPayConfig {
    pub base_url: String,
    pub merchant_id: String,
    pub api_key: String,
    pub callback_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlobConfig {
    pub base_url: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TicketConfig {
    /// Reject statuses outside a ticket kind's known set instead of
    /// persisting them verbatim.
    #[serde(default)]
    pub strict_status_validation: bool,
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // no config file means everything comes from the environment
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("Failed to parse config file: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // DATABASE_URL is required without a config file
                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        session_expires_in: get_env_parse("JWT_SESSION_EXPIRES_IN", 43_200i64),
                    },
                    session: SessionConfig::default(),
                    pusher: PusherConfig::default(),
                    qbet88: Qbet88Config::default(),
                    dpay: DpayConfig::default(),
                    optimum_pay: OptimumPayConfig::default(),
                    blob: BlobConfig::default(),
                    rate_limit: RateLimitConfig::default(),
                    tickets: TicketConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("Unable to read config file {config_path}: {e}").into());
            }
        };

        // env overrides apply even when the file exists
        config.apply_env_overrides();

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        fn set_string(target: &mut String, name: &str) {
            if let Ok(v) = env::var(name) {
                *target = v;
            }
        }
        fn set_parsed<T: std::str::FromStr>(target: &mut T, name: &str) {
            if let Ok(v) = env::var(name)
                && let Ok(parsed) = v.parse()
            {
                *target = parsed;
            }
        }

        set_string(&mut self.server.host, "SERVER_HOST");
        set_parsed(&mut self.server.port, "SERVER_PORT");
        set_string(&mut self.database.url, "DATABASE_URL");
        set_parsed(&mut self.database.max_connections, "DB_MAX_CONNECTIONS");
        set_string(&mut self.jwt.secret, "JWT_SECRET");
        set_parsed(&mut self.jwt.session_expires_in, "JWT_SESSION_EXPIRES_IN");
        set_string(&mut self.session.cookie_name, "SESSION_COOKIE_NAME");
        set_parsed(&mut self.session.secure_cookies, "SESSION_SECURE_COOKIES");

        set_string(&mut self.pusher.app_id, "PUSHER_APP_ID");
        set_string(&mut self.pusher.key, "PUSHER_KEY");
        set_string(&mut self.pusher.secret, "PUSHER_SECRET");
        set_string(&mut self.pusher.cluster, "PUSHER_CLUSTER");

        set_string(&mut self.qbet88.base_url, "QBET88_BASE_URL");
        set_string(&mut self.qbet88.operator_code, "QBET88_OPERATOR_CODE");
        set_string(&mut self.qbet88.secret_key, "QBET88_SECRET_KEY");
        set_string(&mut self.qbet88.internal_api_key, "QBET88_INTERNAL_API_KEY");

        set_string(&mut self.dpay.base_url, "DPAY_BASE_URL");
        set_string(&mut self.dpay.callback_url, "DPAY_CALLBACK_URL");

        set_string(&mut self.optimum_pay.base_url, "OPTIMUM_PAY_BASE_URL");
        set_string(&mut self.optimum_pay.merchant_id, "OPTIMUM_PAY_MERCHANT_ID");
        set_string(&mut self.optimum_pay.api_key, "OPTIMUM_PAY_API_KEY");
        set_string(&mut self.optimum_pay.callback_url, "OPTIMUM_PAY_CALLBACK_URL");

        set_string(&mut self.blob.base_url, "BLOB_BASE_URL");
        set_string(&mut self.blob.token, "BLOB_READ_WRITE_TOKEN");

        set_parsed(&mut self.rate_limit.max_requests, "RATE_LIMIT_MAX_REQUESTS");
        set_parsed(&mut self.rate_limit.window_secs, "RATE_LIMIT_WINDOW_SECS");

        set_parsed(
            &mut self.tickets.strict_status_validation,
            "TICKETS_STRICT_STATUS_VALIDATION",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_toml_uses_section_defaults() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [database]
            url = "postgres://localhost/backoffice"
            max_connections = 5

            [jwt]
            secret = "s3cret"
            session_expires_in = 3600
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.cookie_name, "session");
        assert_eq!(config.rate_limit.max_requests, 5);
        assert!(!config.pusher.is_enabled());
        assert!(!config.tickets.strict_status_validation);
    }

    #[test]
    fn test_pusher_enabled_requires_all_credentials() {
        let mut pusher = PusherConfig {
            app_id: "1".into(),
            key: "k".into(),
            secret: String::new(),
            cluster: "ap1".into(),
        };
        assert!(!pusher.is_enabled());
        pusher.secret = "s".into();
        assert!(pusher.is_enabled());
    }
}
