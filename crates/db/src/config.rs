/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Database pool configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    /// Upper bound on pooled connections (default: `10`).
    pub max_connections: u32,
    /// Seconds to wait for a free connection (default: `5`).
    pub acquire_timeout_secs: u64,
    /// Server-side per-statement timeout in milliseconds (default: `5000`).
    pub statement_timeout_ms: u64,
}

impl DbConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default  |
    /// |---------------------------|----------|
    /// | `DATABASE_URL`            | required |
    /// | `DB_MAX_CONNECTIONS`      | `10`     |
    /// | `DB_ACQUIRE_TIMEOUT_SECS` | `5`      |
    /// | `DB_STATEMENT_TIMEOUT_MS` | `5000`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
            acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            statement_timeout_ms: env_or("DB_STATEMENT_TIMEOUT_MS", 5000)?,
        })
    }
}

/// Read and parse an environment variable, falling back to `default` when unset.
pub fn env_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_uses_default() {
        let value: u32 = env_or("CELLBLOCK_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn invalid_value_is_reported_with_name() {
        std::env::set_var("CELLBLOCK_TEST_BAD_NUMBER", "seven");
        let err = env_or::<u32>("CELLBLOCK_TEST_BAD_NUMBER", 7).unwrap_err();
        assert_eq!(
            err.to_string(),
            "CELLBLOCK_TEST_BAD_NUMBER has an invalid value 'seven'"
        );
    }

    #[test]
    fn valid_value_is_parsed() {
        std::env::set_var("CELLBLOCK_TEST_GOOD_NUMBER", " 42 ");
        assert_eq!(env_or::<u64>("CELLBLOCK_TEST_GOOD_NUMBER", 1).unwrap(), 42);
    }
}
