use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Every way an OAuth2 request can fail.
///
/// The variants form a flat taxonomy. Each one maps to a stable snake_case
/// `error` code on the wire so a client under test can assert on the cause
/// rather than only on the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OAuth2Error {
    #[error("Only the 'code' response type is supported")]
    UnsupportedResponseType,
    #[error("Unknown scope(s): {}", .0.join(" "))]
    InvalidScope(Vec<String>),
    #[error("redirect_uri cannot be used as a redirect target")]
    InvalidRedirectUri,
    #[error("Authorization code not found")]
    InvalidGrant,
    #[error("Client ID does not match the authorization code")]
    InvalidClient,
    #[error("Client secret is not valid for this client")]
    InvalidClientSecret,
    #[error("Redirect URI does not match the authorization code")]
    InvalidRedirect,
    #[error("State does not match the authorization request")]
    InvalidState,
    #[error("Authorization code expired")]
    ExpiredCode,
    #[error("refresh_token is required")]
    MissingRefreshToken,
    #[error("Refresh token not found")]
    InvalidRefreshToken,
    #[error("Refresh token expired")]
    ExpiredRefreshToken,
    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),
    #[error("Missing or malformed Authorization header")]
    InvalidRequest,
    #[error("Access token not found")]
    InvalidToken,
    #[error("Access token expired")]
    ExpiredToken,
    #[error("Access token was not issued by this server for this client")]
    InvalidTokenClaims,
}

impl OAuth2Error {
    /// The taxonomy name sent as the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            OAuth2Error::UnsupportedResponseType => "unsupported_response_type",
            OAuth2Error::InvalidScope(_) => "invalid_scope",
            OAuth2Error::InvalidRedirectUri => "invalid_redirect_uri",
            OAuth2Error::InvalidGrant => "invalid_grant",
            OAuth2Error::InvalidClient => "invalid_client",
            OAuth2Error::InvalidClientSecret => "invalid_client_secret",
            OAuth2Error::InvalidRedirect => "invalid_redirect",
            OAuth2Error::InvalidState => "invalid_state",
            OAuth2Error::ExpiredCode => "expired_code",
            OAuth2Error::MissingRefreshToken => "missing_refresh_token",
            OAuth2Error::InvalidRefreshToken => "invalid_refresh_token",
            OAuth2Error::ExpiredRefreshToken => "expired_refresh_token",
            OAuth2Error::UnsupportedGrantType(_) => "unsupported_grant_type",
            OAuth2Error::InvalidRequest => "invalid_request",
            OAuth2Error::InvalidToken => "invalid_token",
            OAuth2Error::ExpiredToken => "expired_token",
            OAuth2Error::InvalidTokenClaims => "invalid_token_claims",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            OAuth2Error::InvalidClientSecret
            | OAuth2Error::InvalidRequest
            | OAuth2Error::InvalidToken
            | OAuth2Error::ExpiredToken
            | OAuth2Error::InvalidTokenClaims => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl From<&OAuth2Error> for ErrorResponse {
    fn from(err: &OAuth2Error) -> Self {
        ErrorResponse {
            error: err.code().to_string(),
            error_description: Some(err.to_string()),
        }
    }
}

impl IntoResponse for OAuth2Error {
    fn into_response(self) -> Response {
        tracing::info!(error = self.code(), "{}", self);
        (self.status(), Json(ErrorResponse::from(&self))).into_response()
    }
}
