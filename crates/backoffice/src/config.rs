use cellblock_db::config::{env_or, ConfigError, DbConfig};
use cellblock_services::auth::{AuthConfig, DEFAULT_MIN_PASSWORD_LENGTH};

/// Credentials for the administrator account created on first start.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Back-office startup configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BackofficeConfig {
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// Created only when no account with that username exists yet.
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Deactivate expired access grants during the startup integrity report.
    pub sweep_expired_access: bool,
}

impl BackofficeConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default  |
    /// |----------------------------|----------|
    /// | `MIN_PASSWORD_LENGTH`      | `12`     |
    /// | `BOOTSTRAP_ADMIN_USERNAME` | unset    |
    /// | `BOOTSTRAP_ADMIN_PASSWORD` | unset    |
    /// | `SWEEP_EXPIRED_ACCESS`     | `false`  |
    ///
    /// Database variables are documented on [`DbConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let bootstrap_admin = bootstrap_from(
            std::env::var("BOOTSTRAP_ADMIN_USERNAME").ok(),
            std::env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
        )?;

        Ok(Self {
            db: DbConfig::from_env()?,
            auth: AuthConfig {
                min_password_length: env_or("MIN_PASSWORD_LENGTH", DEFAULT_MIN_PASSWORD_LENGTH)?,
            },
            bootstrap_admin,
            sweep_expired_access: env_or("SWEEP_EXPIRED_ACCESS", false)?,
        })
    }
}

/// Both bootstrap variables must be set together, or neither.
fn bootstrap_from(
    username: Option<String>,
    password: Option<String>,
) -> Result<Option<BootstrapAdmin>, ConfigError> {
    let username = username.filter(|s| !s.trim().is_empty());
    let password = password.filter(|s| !s.is_empty());
    match (username, password) {
        (Some(username), Some(password)) => Ok(Some(BootstrapAdmin { username, password })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
        (None, Some(_)) => Err(ConfigError::Missing("BOOTSTRAP_ADMIN_USERNAME")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_is_optional() {
        assert!(bootstrap_from(None, None).unwrap().is_none());
    }

    #[test]
    fn bootstrap_needs_both_values() {
        let err = bootstrap_from(Some("warden".into()), None).unwrap_err();
        assert_eq!(err.to_string(), "BOOTSTRAP_ADMIN_PASSWORD must be set");

        let err = bootstrap_from(None, Some("s3cure-enough-pw".into())).unwrap_err();
        assert_eq!(err.to_string(), "BOOTSTRAP_ADMIN_USERNAME must be set");
    }

    #[test]
    fn blank_username_counts_as_unset() {
        assert!(bootstrap_from(Some("  ".into()), None).unwrap().is_none());
    }

    #[test]
    fn debug_output_hides_password() {
        let admin = bootstrap_from(Some("warden".into()), Some("s3cure-enough-pw".into()))
            .unwrap()
            .unwrap();
        let shown = format!("{admin:?}");
        assert!(shown.contains("warden"));
        assert!(!shown.contains("s3cure-enough-pw"));
    }
}
