//! Fee server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which store implementation backs the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown STORE_BACKEND '{other}' (expected postgres|memory)")),
        }
    }
}

/// Fee server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// HTTP port
    pub http_port: u16,
    pub store_backend: StoreBackend,
    /// PostgreSQL connection URL (required for the postgres backend)
    pub database_url: Option<String>,
    /// Gateway key secret used to verify callback signatures
    pub gateway_key_secret: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(v) => v.parse::<StoreBackend>()?,
            Err(_) if database_url.is_none() && environment == "development" => {
                StoreBackend::Memory
            }
            Err(_) => StoreBackend::Postgres,
        };
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err("DATABASE_URL must be set for the postgres store backend".into());
        }

        Ok(Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            store_backend,
            database_url,
            gateway_key_secret: Self::require_secret("GATEWAY_KEY_SECRET", &environment)?,
            environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_case_insensitively() {
        assert_eq!("Postgres".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn dev_secret_placeholder_is_labelled() {
        let secret =
            Config::require_secret("FEE_SERVER_TEST_UNSET_SECRET", "development").unwrap();
        assert_eq!(secret, "dev-FEE_SERVER_TEST_UNSET_SECRET-not-for-production");
        assert!(Config::require_secret("FEE_SERVER_TEST_UNSET_SECRET", "production").is_err());
    }
}
