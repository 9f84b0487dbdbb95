//! Token endpoint: code exchange, refresh rotation and revocation.

use crate::error::OAuth2Error;
use crate::oauth2::{
    credentials::{AccessToken, AuthorizationCode, CredentialKind, RefreshToken},
    identity::UserIdentity,
    scope::ScopeSet,
    state::ProviderSettings,
    store::{CredentialStore, StoreError},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TokenRequest {
    /// `authorization_code` or `refresh_token`
    #[serde(default)]
    pub grant_type: String,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// When present, must match the state sent to the authorization endpoint
    pub state: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: String,
    pub scope: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RevokeRequest {
    pub token: String,
    pub token_type_hint: Option<String>,
}

#[derive(Clone)]
pub struct TokenEndpoint {
    store: CredentialStore,
    settings: Arc<ProviderSettings>,
}

impl TokenEndpoint {
    pub fn new(store: CredentialStore, settings: Arc<ProviderSettings>) -> Self {
        Self { store, settings }
    }

    pub fn exchange(&self, request: TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        match request.grant_type.as_str() {
            "authorization_code" => self.redeem_code(&request),
            "refresh_token" => self.rotate_refresh_token(request.refresh_token.as_deref()),
            other => Err(OAuth2Error::UnsupportedGrantType(other.to_string())),
        }
    }

    /// Exchanges an authorization code for a token pair.
    ///
    /// The code is removed before any check runs, so a failed attempt burns it.
    fn redeem_code(&self, request: &TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        let entry = self
            .store
            .take_entry::<AuthorizationCode>(request.code.as_deref().unwrap_or_default())
            .ok_or(OAuth2Error::InvalidGrant)?;
        let expired = CredentialStore::is_expired(&entry);
        let code = entry.into_record();

        let client_id = request.client_id.as_deref().unwrap_or_default();
        if client_id != code.client_id {
            return Err(OAuth2Error::InvalidClient);
        }
        match self.settings.client.secret_for(client_id) {
            Some(secret) if request.client_secret.as_deref() == Some(secret) => {}
            _ => return Err(OAuth2Error::InvalidClientSecret),
        }
        if request.redirect_uri.as_deref() != Some(code.redirect_uri.as_str()) {
            return Err(OAuth2Error::InvalidRedirect);
        }
        if let Some(state) = request.state.as_deref()
            && state != code.state
        {
            return Err(OAuth2Error::InvalidState);
        }
        if expired {
            return Err(OAuth2Error::ExpiredCode);
        }

        tracing::debug!(client_id = %code.client_id, "authorization code redeemed");
        Ok(self.mint_pair(code.scopes, code.user, code.client_id))
    }

    /// Trades a refresh token for a new pair.
    ///
    /// Client credentials are not re-checked here; possession of the refresh
    /// token is enough.
    fn rotate_refresh_token(&self, presented: Option<&str>) -> Result<TokenResponse, OAuth2Error> {
        let presented = presented
            .filter(|token| !token.is_empty())
            .ok_or(OAuth2Error::MissingRefreshToken)?;

        let previous = self
            .store
            .take::<RefreshToken>(presented)
            .map_err(|err| match err {
                StoreError::Expired => OAuth2Error::ExpiredRefreshToken,
                StoreError::NotFound | StoreError::DuplicateId => OAuth2Error::InvalidRefreshToken,
            })?;

        tracing::debug!(client_id = %previous.client_id, "refresh token rotated");
        Ok(self.mint_pair(previous.scopes, previous.user, previous.client_id))
    }

    fn mint_pair(&self, scopes: ScopeSet, user: UserIdentity, client_id: String) -> TokenResponse {
        let scope = scopes.to_string();
        let access_token = self.store.issue(
            AccessToken {
                scopes: scopes.clone(),
                user: user.clone(),
                issuer: self.settings.issuer.clone(),
                audience: client_id.clone(),
            },
            self.settings.access_token_ttl,
        );
        let refresh_token = self.store.issue(
            RefreshToken {
                scopes,
                user,
                client_id,
            },
            self.settings.refresh_token_ttl,
        );

        TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: self.settings.access_token_ttl.as_secs(),
            refresh_token,
            scope,
        }
    }

    /// Revokes an access or refresh token (RFC 7009).
    ///
    /// Tries the hinted kind first and falls back to the other one. Unknown
    /// hints are ignored. Returns the kind that held the token, if any.
    pub fn revoke(&self, token: &str, token_type_hint: Option<&str>) -> Option<CredentialKind> {
        let refresh_first = matches!(token_type_hint, Some("refresh_token"));
        let revoke_access = || {
            self.store
                .take_entry::<AccessToken>(token)
                .map(|_| CredentialKind::AccessToken)
        };
        let revoke_refresh = || {
            self.store
                .take_entry::<RefreshToken>(token)
                .map(|_| CredentialKind::RefreshToken)
        };

        let revoked = if refresh_first {
            revoke_refresh().or_else(revoke_access)
        } else {
            revoke_access().or_else(revoke_refresh)
        };
        if let Some(kind) = revoked {
            tracing::debug!(%kind, "token revoked");
        }
        revoked
    }
}
