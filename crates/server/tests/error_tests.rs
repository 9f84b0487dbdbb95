use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
use mock_oauth_provider::error::{ErrorResponse, OAuth2Error};

fn all_errors() -> Vec<OAuth2Error> {
    vec![
        OAuth2Error::UnsupportedResponseType,
        OAuth2Error::InvalidScope(vec!["admin".into()]),
        OAuth2Error::InvalidRedirectUri,
        OAuth2Error::InvalidGrant,
        OAuth2Error::InvalidClient,
        OAuth2Error::InvalidClientSecret,
        OAuth2Error::InvalidRedirect,
        OAuth2Error::InvalidState,
        OAuth2Error::ExpiredCode,
        OAuth2Error::MissingRefreshToken,
        OAuth2Error::InvalidRefreshToken,
        OAuth2Error::ExpiredRefreshToken,
        OAuth2Error::UnsupportedGrantType("password".into()),
        OAuth2Error::InvalidRequest,
        OAuth2Error::InvalidToken,
        OAuth2Error::ExpiredToken,
        OAuth2Error::InvalidTokenClaims,
    ]
}

#[test]
fn test_error_codes_are_distinct_snake_case() {
    let codes: Vec<&str> = all_errors().iter().map(OAuth2Error::code).collect();
    let mut unique = codes.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), codes.len());
    assert!(
        codes
            .iter()
            .all(|c| c.chars().all(|ch| ch.is_ascii_lowercase() || ch == '_'))
    );
}

#[test]
fn test_only_credential_failures_are_unauthorized() {
    let unauthorized: Vec<&str> = all_errors()
        .iter()
        .filter(|e| e.status() == StatusCode::UNAUTHORIZED)
        .map(OAuth2Error::code)
        .collect();
    assert_eq!(
        unauthorized,
        vec![
            "invalid_client_secret",
            "invalid_request",
            "invalid_token",
            "expired_token",
            "invalid_token_claims",
        ]
    );
}

#[test]
fn test_error_response_from_error() {
    let response = ErrorResponse::from(&OAuth2Error::UnsupportedGrantType("password".into()));
    assert_eq!(response.error, "unsupported_grant_type");
    assert_eq!(
        response.error_description.as_deref(),
        Some("Unsupported grant type: password")
    );
}

#[tokio::test]
async fn test_into_response_renders_json_body() {
    let response = OAuth2Error::ExpiredCode.into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["error"], "expired_code");
    assert_eq!(body["error_description"], "Authorization code expired");
}
