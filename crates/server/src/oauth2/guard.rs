//! Bearer-token validation and scope-gated claim projection for `/userinfo`.

use crate::error::OAuth2Error;
use crate::oauth2::{
    credentials::AccessToken,
    scope::Scope,
    state::ProviderSettings,
    store::{CredentialStore, StoreError},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Identity claims visible to the bearer. Claims outside the token's scopes
/// are left out of the JSON entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserInfo {
    pub fn project(token: &AccessToken) -> Self {
        let user = &token.user;
        let mut info = UserInfo {
            sub: user.sub.clone(),
            name: None,
            picture: None,
            email: None,
        };

        for scope in token.scopes.iter() {
            match scope {
                Scope::Openid => {}
                Scope::Profile => {
                    info.name = Some(user.name.clone());
                    info.picture = Some(user.picture.clone());
                }
                Scope::Email => info.email = Some(user.email.clone()),
            }
        }
        info
    }
}

/// Extracts the credential from an `Authorization: Bearer <token>` header value.
///
/// A header that is missing or not exactly `<scheme> <credential>` is a
/// malformed request; any scheme other than bearer is an unusable token.
pub fn bearer_token(header: Option<&str>) -> Result<&str, OAuth2Error> {
    let mut parts = header.ok_or(OAuth2Error::InvalidRequest)?.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        (Some(_), Some(_), None) => Err(OAuth2Error::InvalidToken),
        _ => Err(OAuth2Error::InvalidRequest),
    }
}

#[derive(Clone)]
pub struct ResourceGuard {
    store: CredentialStore,
    settings: Arc<ProviderSettings>,
}

impl ResourceGuard {
    pub fn new(store: CredentialStore, settings: Arc<ProviderSettings>) -> Self {
        Self { store, settings }
    }

    /// Looks up a live access token and checks it was minted by this server
    /// for the registered client.
    pub fn authenticate(&self, token: &str) -> Result<AccessToken, OAuth2Error> {
        let access = self
            .store
            .peek::<AccessToken>(token)
            .map_err(|err| match err {
                StoreError::Expired => OAuth2Error::ExpiredToken,
                StoreError::NotFound | StoreError::DuplicateId => OAuth2Error::InvalidToken,
            })?;

        if access.audience != self.settings.client.client_id
            || access.issuer != self.settings.issuer
        {
            return Err(OAuth2Error::InvalidTokenClaims);
        }
        Ok(access)
    }

    pub fn userinfo(&self, authorization: Option<&str>) -> Result<UserInfo, OAuth2Error> {
        let token = bearer_token(authorization)?;
        let access = self.authenticate(token)?;
        Ok(UserInfo::project(&access))
    }
}
