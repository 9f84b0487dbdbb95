use crate::oauth2::identity::UserIdentity;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// The single client this provider knows about.
#[derive(Clone, Debug, Deserialize)]
pub struct ClientRegistration {
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI the client is expected to use. Mismatches are logged, not rejected.
    pub redirect_uri: String,
}

impl ClientRegistration {
    /// The registered secret for `client_id`, if that client is registered.
    pub fn secret_for(&self, client_id: &str) -> Option<&str> {
        (self.client_id == client_id).then_some(self.client_secret.as_str())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct OAuth2Config {
    /// Server identity stamped into every access token and advertised in discovery.
    pub issuer: String,
    #[serde(default = "default_code_lifetime")]
    pub code_lifetime: u64,
    #[serde(default = "default_access_token_lifetime")]
    pub access_token_lifetime: u64,
    #[serde(default = "default_refresh_token_lifetime")]
    pub refresh_token_lifetime: u64,
    /// Seconds between sweeps of expired credentials.
    #[serde(default = "default_purge_interval")]
    pub purge_interval: u64,
}

impl OAuth2Config {
    pub fn code_ttl(&self) -> Duration {
        Duration::from_secs(self.code_lifetime)
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_lifetime)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_lifetime)
    }

    pub fn purge_every(&self) -> Duration {
        Duration::from_secs(self.purge_interval)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    pub oauth2: OAuth2Config,
    pub client: ClientRegistration,
    /// When set, every authorization binds this user instead of a generated one.
    #[serde(default)]
    pub fixture_user: Option<UserIdentity>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_code_lifetime() -> u64 {
    300 // 5 minutes
}

fn default_access_token_lifetime() -> u64 {
    3600 // 1 hour
}

fn default_refresh_token_lifetime() -> u64 {
    86400 * 7 // 7 days
}

fn default_purge_interval() -> u64 {
    60
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.oauth2.issuer.trim().is_empty() {
            return Err(ConfigError::Validation("oauth2.issuer must not be empty".into()));
        }
        if self.client.client_id.is_empty() {
            return Err(ConfigError::Validation("client.client_id must not be empty".into()));
        }
        if self.client.client_secret.is_empty() {
            return Err(ConfigError::Validation(
                "client.client_secret must not be empty".into(),
            ));
        }
        for (name, value) in [
            ("oauth2.code_lifetime", self.oauth2.code_lifetime),
            ("oauth2.access_token_lifetime", self.oauth2.access_token_lifetime),
            ("oauth2.refresh_token_lifetime", self.oauth2.refresh_token_lifetime),
            ("oauth2.purge_interval", self.oauth2.purge_interval),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{name} must be > 0")));
            }
        }
        Ok(())
    }
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// The file is optional. Any variable matching the key path separated by double
/// underscores (e.g. `OAUTH2__ISSUER`, `CLIENT__CLIENT_SECRET`) overrides the file value.
///
/// Returns a `ConfigError` instead of panicking so the caller can decide how to fail.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name("config.yaml").required(false))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;

    Ok(app)
}

/// Convenience helper for binaries wanting the old panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}
