/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, REDIS_URL, JWT 設定, gate の除外パスなど)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

const DEFAULT_EXCLUDED_PATHS: &str = "/health,/docs/**,/api/v1/auth/refresh";

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub database_url: String,
    pub redis_url: String,

    pub auth_issuer: String,
    // HS256 signing key. Never printed.
    pub jwt_secret: String,
    pub access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,
    pub token_leeway_seconds: u64,

    pub store_timeout: Duration,
    pub gate_excluded_paths: Vec<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("auth_issuer", &self.auth_issuer)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("token_leeway_seconds", &self.token_leeway_seconds)
            .field("store_timeout", &self.store_timeout)
            .field("gate_excluded_paths", &self.gate_excluded_paths)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let redis_url =
            std::env::var("REDIS_URL").map_err(|_| ConfigError::Missing("REDIS_URL"))?;

        let auth_issuer =
            std::env::var("AUTH_ISSUER").unwrap_or_else(|_| "flower-auth".to_string());

        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let access_token_ttl_seconds = parse_or(
            "ACCESS_TOKEN_TTL_SECONDS",
            std::env::var("ACCESS_TOKEN_TTL_SECONDS").ok(),
            900, // 15 min
        )?;

        let refresh_token_ttl_seconds = parse_or(
            "REFRESH_TOKEN_TTL_SECONDS",
            std::env::var("REFRESH_TOKEN_TTL_SECONDS").ok(),
            1_209_600, // 14 days
        )?;

        let token_leeway_seconds = parse_or(
            "TOKEN_LEEWAY_SECONDS",
            std::env::var("TOKEN_LEEWAY_SECONDS").ok(),
            0,
        )?;

        let store_timeout_ms: u64 =
            parse_or("STORE_TIMEOUT_MS", std::env::var("STORE_TIMEOUT_MS").ok(), 500)?;
        if store_timeout_ms == 0 {
            return Err(ConfigError::Invalid("STORE_TIMEOUT_MS"));
        }

        let gate_excluded_paths = parse_path_list(
            &std::env::var("GATE_EXCLUDED_PATHS")
                .unwrap_or_else(|_| DEFAULT_EXCLUDED_PATHS.to_string()),
        );

        Ok(Self {
            addr,
            app_env,
            database_url,
            redis_url,
            auth_issuer,
            jwt_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            token_leeway_seconds,
            store_timeout: Duration::from_millis(store_timeout_ms),
            gate_excluded_paths,
        })
    }
}

// Unset -> default. Set but unparsable -> Invalid (never silently the default).
fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
    }
}

fn parse_path_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
}
