/*
 * Responsibility
 * - Load settings from the environment (.env supported via dotenvy)
 * - Validate values (invalid -> startup failure)
 * - Parsing goes through a lookup function so it can be tested without env vars
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
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

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub request_timeout_seconds: u64,
    pub body_limit_bytes: usize,

    // Paths served without authentication (ant-style patterns, in order)
    pub url_permit_all: Vec<String>,

    // Verification key: bundled resource first, key-uri second
    pub key_resource_dir: PathBuf,
    pub key_uri: Option<Url>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub key_fetch_timeout_seconds: u64,

    pub jwt_algorithm: Algorithm,
    pub auth_issuer: Option<String>,
    pub auth_audience: Option<String>,
    pub access_token_leeway_seconds: u64,
    pub allow_query_token: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("url_permit_all", &self.url_permit_all)
            .field("key_resource_dir", &self.key_resource_dir)
            .field("key_uri", &self.key_uri.as_ref().map(Url::as_str))
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("auth_issuer", &self.auth_issuer)
            .field("auth_audience", &self.auth_audience)
            .finish_non_exhaustive()
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, key: &'static str) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::Invalid(key)),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port: u16 = parse_or(get("PORT"), "PORT", 3000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV").as_deref());

        let request_timeout_seconds =
            parse_or(get("HTTP_REQUEST_TIMEOUT_SECONDS"), "HTTP_REQUEST_TIMEOUT_SECONDS", 30)?;
        let body_limit_bytes =
            parse_or(get("HTTP_BODY_LIMIT_BYTES"), "HTTP_BODY_LIMIT_BYTES", 1024 * 1024)?;

        let url_permit_all = get("AUTH_URL_PERMIT_ALL")
            .unwrap_or_else(|| "/health".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let key_resource_dir = PathBuf::from(
            get("AUTH_KEY_RESOURCE_DIR").unwrap_or_else(|| "resources".to_string()),
        );

        let key_uri = match get("AUTH_KEY_URI") {
            Some(raw) => {
                let url = Url::parse(&raw).map_err(|_| ConfigError::Invalid("AUTH_KEY_URI"))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(ConfigError::Invalid("AUTH_KEY_URI"));
                }
                Some(url)
            }
            None => None,
        };

        let client_id = get("AUTH_CLIENT_ID");
        let client_secret = get("AUTH_CLIENT_SECRET");

        let key_fetch_timeout_seconds = parse_or(
            get("AUTH_KEY_FETCH_TIMEOUT_SECONDS"),
            "AUTH_KEY_FETCH_TIMEOUT_SECONDS",
            5,
        )?;
        if key_fetch_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("AUTH_KEY_FETCH_TIMEOUT_SECONDS"));
        }

        let jwt_algorithm = parse_or(get("AUTH_JWT_ALGORITHM"), "AUTH_JWT_ALGORITHM", Algorithm::RS256)?;
        // Only public-key algorithms: the gate never holds a signing secret.
        if matches!(
            jwt_algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ConfigError::Invalid("AUTH_JWT_ALGORITHM"));
        }

        let auth_issuer = get("AUTH_ISSUER");
        let auth_audience = get("AUTH_AUDIENCE");

        let access_token_leeway_seconds = parse_or(
            get("ACCESS_TOKEN_LEEWAY_SECONDS"),
            "ACCESS_TOKEN_LEEWAY_SECONDS",
            60,
        )?;

        let allow_query_token = parse_bool(get("AUTH_ALLOW_QUERY_TOKEN"), "AUTH_ALLOW_QUERY_TOKEN")?;

        Ok(Self {
            addr,
            app_env,
            request_timeout_seconds,
            body_limit_bytes,
            url_permit_all,
            key_resource_dir,
            key_uri,
            client_id,
            client_secret,
            key_fetch_timeout_seconds,
            jwt_algorithm,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            allow_query_token,
        })
    }
}
