/// Configuration management for the API server
///
/// Configuration is read once at startup and then shared read-only
/// (`Arc<Config>`). The signing secret and pagination defaults are passed
/// explicitly into the token codec and the resource service.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `STORAGE_BACKEND`: `postgres` or `memory` (default: postgres)
/// - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for token signing (required, at least 32 characters)
/// - `PAGE_SIZE_DEFAULT`: Page size when none is requested (default: 10)
/// - `PAGE_SIZE_MAX`: Upper bound on requested page sizes (default: 100, at most 1000)
/// - `AUTH_REJECT_AUTHENTICATED`: Refuse `/register` and `/login` for callers
///   that already hold a valid token (default: false)
/// - `RUST_LOG`: Log filter (default: todolist_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use todolist_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::{env, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use todolist_shared::pagination::PaginationConfig;

/// Largest value accepted for `PAGE_SIZE_MAX`
pub const MAX_PAGE_SIZE_LIMIT: u32 = 1000;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,

    pub storage: StorageConfig,

    pub jwt: JwtConfig,

    pub pagination: PaginationConfig,

    pub auth: AuthConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,
}

/// Where entities are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("Unknown STORAGE_BACKEND '{}' (expected postgres or memory)", other),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres => f.write_str("postgres"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Present when `backend` is postgres
    pub database: Option<DatabaseConfig>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for HS256 signing
    ///
    /// Must be at least 32 characters. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig").field("secret", &"<redacted>").finish()
    }
}

/// Authentication policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Reject already-authenticated callers on anonymous-only routes
    pub reject_authenticated: bool,
}

impl Config {
    /// Loads configuration from the process environment (and `.env` if present)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = parse_or(&lookup, "API_PORT", 8080u16)?;
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::Postgres,
        };

        let database = match backend {
            StorageBackend::Postgres => {
                let url = lookup("DATABASE_URL").ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL environment variable is required")
                })?;
                let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
                Some(DatabaseConfig {
                    url,
                    max_connections,
                })
            }
            StorageBackend::Memory => None,
        };

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.chars().count() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let defaults = PaginationConfig::default();
        let pagination = PaginationConfig {
            default_page_size: parse_or(&lookup, "PAGE_SIZE_DEFAULT", defaults.default_page_size)?,
            max_page_size: parse_or(&lookup, "PAGE_SIZE_MAX", defaults.max_page_size)?,
        };

        if pagination.default_page_size == 0 {
            anyhow::bail!("PAGE_SIZE_DEFAULT must be at least 1");
        }
        if pagination.max_page_size > MAX_PAGE_SIZE_LIMIT {
            anyhow::bail!("PAGE_SIZE_MAX must be at most {}", MAX_PAGE_SIZE_LIMIT);
        }
        if pagination.max_page_size < pagination.default_page_size {
            anyhow::bail!("PAGE_SIZE_MAX must be greater than or equal to PAGE_SIZE_DEFAULT");
        }

        let reject_authenticated = parse_or(&lookup, "AUTH_REJECT_AUTHENTICATED", false)?;

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            storage: StorageConfig { backend, database },
            jwt: JwtConfig { secret: jwt_secret },
            pagination,
            auth: AuthConfig {
                reject_authenticated,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether CORS should allow any origin
    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_memory_backend() {
        let config = load(&[("STORAGE_BACKEND", "memory"), ("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.storage.database.is_none());
        assert_eq!(config.pagination, PaginationConfig::default());
        assert!(!config.auth.reject_authenticated);
        assert!(config.cors_permissive());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = load(&[("JWT_SECRET", SECRET)]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("DATABASE_URL", "postgresql://localhost/todolist"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();
        let database = config.storage.database.unwrap();
        assert_eq!(database.url, "postgresql://localhost/todolist");
        assert_eq!(database.max_connections, 4);
    }

    #[test]
    fn test_jwt_secret_required_and_long_enough() {
        let err = load(&[("STORAGE_BACKEND", "memory")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let err = load(&[("STORAGE_BACKEND", "memory"), ("JWT_SECRET", "short")]).unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_pagination_bounds() {
        let config = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", SECRET),
            ("PAGE_SIZE_DEFAULT", "20"),
            ("PAGE_SIZE_MAX", "50"),
        ])
        .unwrap();
        assert_eq!(config.pagination.default_page_size, 20);
        assert_eq!(config.pagination.max_page_size, 50);

        let err = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", SECRET),
            ("PAGE_SIZE_DEFAULT", "20"),
            ("PAGE_SIZE_MAX", "5"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("PAGE_SIZE_MAX"));

        let err = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", SECRET),
            ("PAGE_SIZE_MAX", "4294967295"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("at most 1000"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", SECRET),
            ("API_PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("API_PORT"));

        let err = load(&[("STORAGE_BACKEND", "sqlite"), ("JWT_SECRET", SECRET)]).unwrap_err();
        assert!(err.to_string().contains("sqlite"));
    }

    #[test]
    fn test_cors_and_strict_auth() {
        let config = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", SECRET),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("AUTH_REJECT_AUTHENTICATED", "true"),
        ])
        .unwrap();

        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(!config.cors_permissive());
        assert!(config.auth.reject_authenticated);
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        let config = load(&[("STORAGE_BACKEND", "memory"), ("JWT_SECRET", SECRET)]).unwrap();
        assert!(!format!("{:?}", config).contains(SECRET));
    }
}
