//! The three credential kinds the provider issues.

use crate::oauth2::{identity::UserIdentity, scope::ScopeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    AuthorizationCode,
    AccessToken,
    RefreshToken,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CredentialKind::AuthorizationCode => "authorization_code",
            CredentialKind::AccessToken => "access_token",
            CredentialKind::RefreshToken => "refresh_token",
        })
    }
}

/// Short-lived, single-use grant bound to the authorization request that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub scopes: ScopeSet,
    pub user: UserIdentity,
    pub redirect_uri: String,
    pub client_id: String,
    /// CSRF token from the authorization request; empty when none was sent.
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub scopes: ScopeSet,
    pub user: UserIdentity,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub scopes: ScopeSet,
    pub user: UserIdentity,
    pub client_id: String,
}
