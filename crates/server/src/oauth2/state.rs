//! OAuth2 state management.
//!
//! Provides the state structures for the OAuth2 authorization server.

use crate::config::{AppConfig, ClientRegistration};
use crate::oauth2::{
    authorize::AuthorizationEndpoint, guard::ResourceGuard, identity::IdentitySource,
    store::CredentialStore, token::TokenEndpoint,
};
use std::sync::Arc;
use std::time::Duration;

/// Server identity and credential lifetimes, read-only once the server starts.
#[derive(Clone, Debug)]
pub struct ProviderSettings {
    /// Base URL for the OAuth2 server (used for issuer in tokens)
    pub issuer: String,
    pub client: ClientRegistration,
    pub code_ttl: Duration,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl ProviderSettings {
    pub fn new(issuer: impl Into<String>, client: ClientRegistration) -> Self {
        Self {
            issuer: issuer.into(),
            client,
            code_ttl: Duration::from_secs(300),           // 5 minutes
            access_token_ttl: Duration::from_secs(3600),  // 1 hour
            refresh_token_ttl: Duration::from_secs(86400 * 7), // 7 days
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            issuer: config.oauth2.issuer.trim_end_matches('/').to_string(),
            client: config.client.clone(),
            code_ttl: config.oauth2.code_ttl(),
            access_token_ttl: config.oauth2.access_token_ttl(),
            refresh_token_ttl: config.oauth2.refresh_token_ttl(),
        }
    }
}

/// OAuth2 state containing all components needed for the authorization server.
#[derive(Clone)]
pub struct OAuth2State {
    pub store: CredentialStore,
    pub settings: Arc<ProviderSettings>,
    pub authorization: AuthorizationEndpoint,
    pub token: TokenEndpoint,
    pub guard: ResourceGuard,
}

impl OAuth2State {
    pub fn new(settings: ProviderSettings, identities: IdentitySource) -> Self {
        let store = CredentialStore::new();
        let settings = Arc::new(settings);
        Self {
            authorization: AuthorizationEndpoint::new(
                store.clone(),
                settings.clone(),
                identities,
            ),
            token: TokenEndpoint::new(store.clone(), settings.clone()),
            guard: ResourceGuard::new(store.clone(), settings.clone()),
            store,
            settings,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ProviderSettings::from_config(config),
            IdentitySource::from_fixture(config.fixture_user.clone()),
        )
    }

    /// Periodically drops expired credentials so memory stays bounded.
    pub fn spawn_purge_task(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.store.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let purged = store.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = store.len(), "purged expired credentials");
                }
            }
        })
    }
}
