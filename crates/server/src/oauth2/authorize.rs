//! Authorization endpoint: validates the request shape and mints a code.

use crate::error::OAuth2Error;
use crate::oauth2::{
    credentials::AuthorizationCode, identity::IdentitySource, scope::ScopeSet,
    state::ProviderSettings, store::CredentialStore,
};
use axum::http::HeaderValue;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

/// OAuth2 authorization request parameters.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorizeRequest {
    /// Must be "code" for Authorization Code flow
    #[serde(default)]
    pub response_type: String,
    /// Client identifier. Not authenticated here.
    pub client_id: String,
    /// Where the user agent is sent with the issued code
    pub redirect_uri: String,
    /// Space-separated list of requested scopes
    #[serde(default)]
    pub scope: String,
    /// Opaque value for CSRF protection, echoed back in the redirect
    #[serde(default)]
    pub state: String,
}

/// Outcome of a successful authorization: where to send the user agent.
#[derive(Debug, Clone)]
pub struct AuthorizationRedirect {
    pub code: String,
    pub location: String,
}

#[derive(Clone)]
pub struct AuthorizationEndpoint {
    store: CredentialStore,
    settings: Arc<ProviderSettings>,
    identities: IdentitySource,
}

impl AuthorizationEndpoint {
    pub fn new(
        store: CredentialStore,
        settings: Arc<ProviderSettings>,
        identities: IdentitySource,
    ) -> Self {
        Self {
            store,
            settings,
            identities,
        }
    }

    pub fn authorize(
        &self,
        request: &AuthorizeRequest,
    ) -> Result<AuthorizationRedirect, OAuth2Error> {
        if request.response_type != "code" {
            return Err(OAuth2Error::UnsupportedResponseType);
        }
        let scopes = ScopeSet::parse(&request.scope)?;
        // Codes are URL-safe base64 and never make a Location value invalid.
        if HeaderValue::try_from(redirect_location(&request.redirect_uri, "", &request.state))
            .is_err()
        {
            return Err(OAuth2Error::InvalidRedirectUri);
        }

        let registered = &self.settings.client;
        if registered.client_id == request.client_id
            && registered.redirect_uri != request.redirect_uri
        {
            tracing::warn!(
                client_id = %request.client_id,
                redirect_uri = %request.redirect_uri,
                registered = %registered.redirect_uri,
                "redirect_uri differs from the registered one"
            );
        }

        let code = self.store.issue(
            AuthorizationCode {
                scopes,
                user: self.identities.next_identity(),
                redirect_uri: request.redirect_uri.clone(),
                client_id: request.client_id.clone(),
                state: request.state.clone(),
            },
            self.settings.code_ttl,
        );
        tracing::debug!(client_id = %request.client_id, "authorization code minted");

        Ok(AuthorizationRedirect {
            location: redirect_location(&request.redirect_uri, &code, &request.state),
            code,
        })
    }
}

/// Appends `code` and, when non-empty, `state` to the client's redirect URI,
/// keeping any query string the URI already carries.
fn redirect_location(redirect_uri: &str, code: &str, state: &str) -> String {
    let separator = if redirect_uri.contains('?') { '&' } else { '?' };
    let mut location = format!(
        "{redirect_uri}{separator}code={}",
        urlencoding::encode(code)
    );
    if !state.is_empty() {
        location.push_str(&format!("&state={}", urlencoding::encode(state)));
    }
    location
}
