use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use academy_application::RateLimitRule;
use academy_core::AppError;
use tracing_subscriber::EnvFilter;

/// Where academy data and sessions live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Where write rate limit counters live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitBackend {
    Memory,
    Postgres,
    Redis,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_teacher_emails: Vec<String>,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub rate_limit_backend: RateLimitBackend,
    pub redis_url: Option<String>,
    pub write_rate_limit: RateLimitRule,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let storage_backend = match optional("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "STORAGE_BACKEND must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        let database_url = optional("DATABASE_URL");
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(AppError::Validation(
                "DATABASE_URL is required when STORAGE_BACKEND=postgres".to_owned(),
            ));
        }

        let bootstrap_token = optional("AUTH_BOOTSTRAP_TOKEN")
            .ok_or_else(|| AppError::Validation("AUTH_BOOTSTRAP_TOKEN is required".to_owned()))?;
        if bootstrap_token.len() < 16 {
            return Err(AppError::Validation(
                "AUTH_BOOTSTRAP_TOKEN must be at least 16 characters".to_owned(),
            ));
        }

        let rate_limit_backend = match optional("RATE_LIMIT_BACKEND").as_deref() {
            None => match storage_backend {
                StorageBackend::Postgres => RateLimitBackend::Postgres,
                StorageBackend::Memory => RateLimitBackend::Memory,
            },
            Some("memory") => RateLimitBackend::Memory,
            Some("postgres") => RateLimitBackend::Postgres,
            Some("redis") => RateLimitBackend::Redis,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "RATE_LIMIT_BACKEND must be 'memory', 'postgres' or 'redis', got '{other}'"
                )));
            }
        };
        if rate_limit_backend == RateLimitBackend::Postgres && database_url.is_none() {
            return Err(AppError::Validation(
                "DATABASE_URL is required when RATE_LIMIT_BACKEND=postgres".to_owned(),
            ));
        }

        let redis_url = optional("REDIS_URL");
        if rate_limit_backend == RateLimitBackend::Redis && redis_url.is_none() {
            return Err(AppError::Validation(
                "REDIS_URL is required when RATE_LIMIT_BACKEND=redis".to_owned(),
            ));
        }

        let write_max =
            parse_or::<i32>("WRITE_RATE_LIMIT_MAX", optional("WRITE_RATE_LIMIT_MAX"), 60)?;
        let write_window = parse_or::<i64>(
            "WRITE_RATE_LIMIT_WINDOW_SECONDS",
            optional("WRITE_RATE_LIMIT_WINDOW_SECONDS"),
            60,
        )?;
        if write_max <= 0 || write_window <= 0 {
            return Err(AppError::Validation(
                "write rate limit budget and window must be positive".to_owned(),
            ));
        }

        Ok(Self {
            migrate_only,
            storage_backend,
            database_url,
            frontend_url: optional("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_owned()),
            bootstrap_token,
            bootstrap_admin_email: optional("BOOTSTRAP_ADMIN_EMAIL"),
            bootstrap_teacher_emails: optional("BOOTSTRAP_TEACHER_EMAILS")
                .map(|value| {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|email| !email.is_empty())
                        .map(ToOwned::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            api_host: optional("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned()),
            api_port: parse_or("API_PORT", optional("API_PORT"), 3001)?,
            cookie_secure: optional("SESSION_COOKIE_SECURE")
                .is_some_and(|value| value.eq_ignore_ascii_case("true")),
            rate_limit_backend,
            redis_url,
            write_rate_limit: RateLimitRule::new(
                RateLimitRule::default_write_rule().category,
                write_max,
                write_window,
            ),
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_or<T: FromStr>(name: &str, value: Option<String>, default: T) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
    })
}
