//! OAuth2 HTTP endpoints.
//!
//! Thin axum bindings over the authorization, token and resource components:
//! - Authorization endpoint
//! - Token endpoint
//! - Token revocation
//! - UserInfo
//! - Discovery document

use crate::error::{ErrorResponse, OAuth2Error};
use crate::oauth2::{
    OAUTH2_TAG,
    authorize::AuthorizeRequest,
    guard::UserInfo,
    scope::Scope,
    state::OAuth2State,
    token::{RevokeRequest, TokenRequest, TokenResponse},
};
use axum::{
    Form, Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Creates the OAuth2 router.
pub fn router(state: OAuth2State) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(authorize))
        .routes(routes!(token))
        .routes(routes!(revoke))
        .routes(routes!(userinfo))
        .routes(routes!(openid_configuration))
        .with_state(state)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OpenIdConfiguration {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub revocation_endpoint: String,
    pub response_types_supported: Vec<String>,
    pub grant_types_supported: Vec<String>,
    pub subject_types_supported: Vec<String>,
    pub scopes_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
}

// =============================================================================
// Endpoints
// =============================================================================

/// OAuth2 Authorization endpoint.
///
/// There is no login step: a user is bound to the code immediately and the
/// user agent is sent straight back to the client.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/authorize",
    tag = OAUTH2_TAG,
    operation_id = "OAuth2 Authorize",
    summary = "Issue an authorization code",
    description = "Validates the request shape, binds a user to a fresh authorization code and redirects \
                   to `redirect_uri` with `code` and, when provided, `state` appended.\n\n\
                   **Supported scopes:** `openid`, `profile`, `email`",
    params(AuthorizeRequest),
    responses(
        (status = 302, description = "Redirect back to the client with an authorization code"),
        (status = 400, description = "Unsupported response type, unknown scope or unusable redirect_uri", body = ErrorResponse),
    )
)]
pub async fn authorize(
    State(state): State<OAuth2State>,
    Query(params): Query<AuthorizeRequest>,
) -> Result<Response, OAuth2Error> {
    let redirect = state.authorization.authorize(&params)?;
    Ok((StatusCode::FOUND, [(header::LOCATION, redirect.location)]).into_response())
}

/// OAuth2 Token endpoint.
#[tracing::instrument(skip(state, headers, params))]
#[utoipa::path(
    post,
    path = "/token",
    tag = OAUTH2_TAG,
    operation_id = "OAuth2 Token",
    summary = "Exchange authorization code or refresh token for access token",
    description = "Exchanges an authorization code for tokens, or rotates a refresh token.\n\n\
                   **Supported grant types:**\n\
                   - `authorization_code`: requires `code`, `redirect_uri`, `client_id` and `client_secret`\n\
                   - `refresh_token`: requires `refresh_token`; the presented token is invalidated\n\n\
                   **Client authentication:** HTTP Basic auth or `client_id` and `client_secret` in the body.",
    request_body(
        content = TokenRequest,
        content_type = "application/x-www-form-urlencoded",
        description = "Token request parameters"
    ),
    responses(
        (status = 200, description = "Tokens issued successfully", body = TokenResponse),
        (status = 400, description = "Invalid, expired or mismatched grant", body = ErrorResponse),
        (status = 401, description = "Invalid client secret", body = ErrorResponse),
    )
)]
pub async fn token(
    State(state): State<OAuth2State>,
    headers: HeaderMap,
    Form(mut params): Form<TokenRequest>,
) -> Result<Json<TokenResponse>, OAuth2Error> {
    if let Some((client_id, client_secret)) = basic_client_credentials(&headers) {
        params.client_id = Some(client_id);
        params.client_secret = Some(client_secret);
    }

    state.token.exchange(params).map(Json)
}

/// Token revocation endpoint (RFC 7009).
///
/// Uses `token_type_hint` to optimize lookup - tries the hinted type first,
/// then falls back to the other type if not found.
#[tracing::instrument(skip(state, params))]
#[utoipa::path(
    post,
    path = "/revoke",
    tag = OAUTH2_TAG,
    operation_id = "OAuth2 Revoke Token",
    summary = "Revoke an access or refresh token",
    description = "Revokes an access token or refresh token, preventing further use. \
                   Returns 200 OK even if the token was already revoked or never existed.",
    request_body(
        content = RevokeRequest,
        content_type = "application/x-www-form-urlencoded",
        description = "Token revocation request"
    ),
    responses(
        (status = 200, description = "Token revoked successfully (or was already invalid)"),
    )
)]
pub async fn revoke(
    State(state): State<OAuth2State>,
    Form(params): Form<RevokeRequest>,
) -> StatusCode {
    state
        .token
        .revoke(&params.token, params.token_type_hint.as_deref());
    StatusCode::OK
}

/// UserInfo endpoint.
#[tracing::instrument(skip(state, headers))]
#[utoipa::path(
    get,
    path = "/userinfo",
    tag = OAUTH2_TAG,
    operation_id = "OpenID Connect UserInfo",
    summary = "Get the identity bound to an access token",
    description = "Returns claims about the user the access token was issued for.\n\n\
                   **Returned claims depend on granted scopes:**\n\
                   - always: `sub`\n\
                   - `profile`: `name`, `picture`\n\
                   - `email`: `email`",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User profile information", body = UserInfo),
        (status = 401, description = "Missing, malformed, unknown, expired or foreign access token", body = ErrorResponse),
    )
)]
pub async fn userinfo(
    State(state): State<OAuth2State>,
    headers: HeaderMap,
) -> Result<Json<UserInfo>, OAuth2Error> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    state.guard.userinfo(authorization).map(Json)
}

/// OpenID Connect Discovery document.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/.well-known/openid-configuration",
    tag = OAUTH2_TAG,
    operation_id = "OpenID Connect Discovery",
    summary = "OpenID Connect Discovery document",
    description = "Returns endpoint URLs and supported capabilities so clients can configure themselves.",
    responses(
        (status = 200, description = "OpenID Connect configuration document", body = OpenIdConfiguration),
    )
)]
pub async fn openid_configuration(State(state): State<OAuth2State>) -> Json<OpenIdConfiguration> {
    let issuer = &state.settings.issuer;
    Json(OpenIdConfiguration {
        issuer: issuer.clone(),
        authorization_endpoint: format!("{issuer}/authorize"),
        token_endpoint: format!("{issuer}/token"),
        userinfo_endpoint: format!("{issuer}/userinfo"),
        revocation_endpoint: format!("{issuer}/revoke"),
        response_types_supported: vec!["code".to_string()],
        grant_types_supported: vec![
            "authorization_code".to_string(),
            "refresh_token".to_string(),
        ],
        subject_types_supported: vec!["public".to_string()],
        scopes_supported: Scope::ALL.iter().map(|s| s.to_string()).collect(),
        token_endpoint_auth_methods_supported: vec![
            "client_secret_basic".to_string(),
            "client_secret_post".to_string(),
        ],
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Client credentials from an `Authorization: Basic` header. Both halves are
/// form-urlencoded before base64 (RFC 6749 section 2.3.1).
fn basic_client_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let (scheme, encoded) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded =
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded.trim()).ok()?;
    let creds = String::from_utf8(decoded).ok()?;
    let (id, secret) = creds.split_once(':')?;
    Some((form_decode(id)?, form_decode(secret)?))
}

fn form_decode(value: &str) -> Option<String> {
    urlencoding::decode(&value.replace('+', " "))
        .ok()
        .map(|decoded| decoded.into_owned())
}
