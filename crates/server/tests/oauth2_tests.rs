//! OAuth2 endpoint tests.
//!
//! Drive the full router through `axum-test`, walking the credential
//! lifecycle the way a client under test would.

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use mock_oauth_provider::{
    api,
    config::ClientRegistration,
    oauth2::{
        IdentitySource, OAuth2State, ProviderSettings, UserIdentity,
        token::{TokenRequest, TokenResponse},
    },
};
use std::time::Duration;

const CLIENT_ID: &str = "c1";
const CLIENT_SECRET: &str = "s1";
const REDIRECT_URI: &str = "http://cb";

fn create_test_settings() -> ProviderSettings {
    ProviderSettings::new(
        "http://localhost:8000",
        ClientRegistration {
            client_id: CLIENT_ID.into(),
            client_secret: CLIENT_SECRET.into(),
            redirect_uri: REDIRECT_URI.into(),
        },
    )
}

fn fixture_user() -> UserIdentity {
    UserIdentity {
        sub: "user-123".into(),
        name: "Test User".into(),
        email: "test@example.com".into(),
        picture: "https://example.com/avatar.png".into(),
    }
}

fn create_test_server(settings: ProviderSettings) -> (TestServer, OAuth2State) {
    let state = OAuth2State::new(settings, IdentitySource::Fixed(fixture_user()));
    let server = TestServer::new(api::app(state.clone())).expect("create test server");
    (server, state)
}

fn query_param(location: &str, key: &str) -> Option<String> {
    let (_, query) = location.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}

async fn authorize(server: &TestServer, scope: &str, state: &str) -> String {
    let response = server
        .get("/authorize")
        .add_query_param("response_type", "code")
        .add_query_param("client_id", CLIENT_ID)
        .add_query_param("redirect_uri", REDIRECT_URI)
        .add_query_param("scope", scope)
        .add_query_param("state", state)
        .await;

    response.assert_status(StatusCode::FOUND);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string();
    query_param(&location, "code").expect("code in redirect")
}

fn exchange_form(code: &str) -> Vec<(&'static str, String)> {
    vec![
        ("grant_type", "authorization_code".to_string()),
        ("code", code.to_string()),
        ("redirect_uri", REDIRECT_URI.to_string()),
        ("client_id", CLIENT_ID.to_string()),
        ("client_secret", CLIENT_SECRET.to_string()),
    ]
}

async fn exchange(server: &TestServer, code: &str) -> TokenResponse {
    let response = server.post("/token").form(&exchange_form(code)).await;
    response.assert_status_ok();
    response.json()
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).expect("header value")
}

// =============================================================================
// Full Flow
// =============================================================================

#[tokio::test]
async fn test_full_flow_with_rotation() {
    let (server, _) = create_test_server(create_test_settings());

    let response = server
        .get("/authorize")
        .add_query_param("response_type", "code")
        .add_query_param("client_id", CLIENT_ID)
        .add_query_param("redirect_uri", REDIRECT_URI)
        .add_query_param("scope", "openid profile")
        .add_query_param("state", "s1")
        .await;
    response.assert_status(StatusCode::FOUND);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string();
    let code = query_param(&location, "code").expect("code");
    assert_eq!(location, format!("http://cb?code={code}&state=s1"));

    let tokens = exchange(&server, &code).await;
    assert_eq!(tokens.token_type, "bearer");
    assert_eq!(tokens.expires_in, 3600);
    assert_eq!(tokens.scope, "openid profile");

    let userinfo = server
        .get("/userinfo")
        .add_header(header::AUTHORIZATION, bearer(&tokens.access_token))
        .await;
    userinfo.assert_status_ok();
    let body: serde_json::Value = userinfo.json();
    assert_eq!(
        body,
        serde_json::json!({
            "sub": "user-123",
            "name": "Test User",
            "picture": "https://example.com/avatar.png",
        })
    );

    let refreshed = server
        .post("/token")
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", tokens.refresh_token.as_str()),
        ])
        .await;
    refreshed.assert_status_ok();
    let rotated: TokenResponse = refreshed.json();
    assert_ne!(rotated.refresh_token, tokens.refresh_token);
    assert_ne!(rotated.access_token, tokens.access_token);
    assert_eq!(rotated.scope, "openid profile");

    let replay = server
        .post("/token")
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", tokens.refresh_token.as_str()),
        ])
        .await;
    replay.assert_status_bad_request();
    let body: serde_json::Value = replay.json();
    assert_eq!(body["error"], "invalid_refresh_token");

    // Rotation leaves earlier access tokens valid until they expire.
    server
        .get("/userinfo")
        .add_header(header::AUTHORIZATION, bearer(&tokens.access_token))
        .await
        .assert_status_ok();
    server
        .get("/userinfo")
        .add_header(header::AUTHORIZATION, bearer(&rotated.access_token))
        .await
        .assert_status_ok();
}

// =============================================================================
// Authorization Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_authorize_invalid_response_type() {
    let (server, state) = create_test_server(create_test_settings());

    let response = server
        .get("/authorize")
        .add_query_param("response_type", "token")
        .add_query_param("client_id", CLIENT_ID)
        .add_query_param("redirect_uri", REDIRECT_URI)
        .add_query_param("scope", "openid")
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "unsupported_response_type");
    assert!(state.store.is_empty());
}

#[tokio::test]
async fn test_authorize_invalid_scope() {
    let (server, _) = create_test_server(create_test_settings());

    let response = server
        .get("/authorize")
        .add_query_param("response_type", "code")
        .add_query_param("client_id", CLIENT_ID)
        .add_query_param("redirect_uri", REDIRECT_URI)
        .add_query_param("scope", "openid admin")
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid_scope");
    assert!(
        body["error_description"]
            .as_str()
            .unwrap()
            .contains("admin")
    );
}

#[tokio::test]
async fn test_authorize_rejects_control_characters_in_redirect() {
    let (server, state) = create_test_server(create_test_settings());

    let response = server
        .get("/authorize")
        .add_query_param("response_type", "code")
        .add_query_param("client_id", CLIENT_ID)
        .add_query_param("redirect_uri", "http://cb/\nSet-Cookie: x=1")
        .add_query_param("scope", "openid")
        .await;

    response.assert_status_bad_request();
    assert!(response.headers().get("location").is_none());
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid_redirect_uri");
    assert!(state.store.is_empty());
}

#[tokio::test]
async fn test_authorize_without_state_omits_it() {
    let (server, _) = create_test_server(create_test_settings());

    let response = server
        .get("/authorize")
        .add_query_param("response_type", "code")
        .add_query_param("client_id", "unregistered")
        .add_query_param("redirect_uri", "http://other/cb")
        .add_query_param("scope", "openid")
        .await;

    response.assert_status(StatusCode::FOUND);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    assert!(location.starts_with("http://other/cb?code="));
    assert!(!location.contains("state="));
}

// =============================================================================
// Token Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_token_code_is_single_use() {
    let (server, _) = create_test_server(create_test_settings());
    let code = authorize(&server, "openid", "").await;

    exchange(&server, &code).await;

    let response = server.post("/token").form(&exchange_form(&code)).await;
    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn test_token_error_codes() {
    let (server, _) = create_test_server(create_test_settings());

    let cases: [(&str, &str, StatusCode, &str); 4] = [
        ("client_id", "c2", StatusCode::BAD_REQUEST, "invalid_client"),
        (
            "client_secret",
            "wrong",
            StatusCode::UNAUTHORIZED,
            "invalid_client_secret",
        ),
        (
            "redirect_uri",
            "http://evil",
            StatusCode::BAD_REQUEST,
            "invalid_redirect",
        ),
        ("state", "forged", StatusCode::BAD_REQUEST, "invalid_state"),
    ];

    for (field, value, status, error) in cases {
        let code = authorize(&server, "openid", "s1").await;
        let mut form: Vec<(&str, String)> = exchange_form(&code)
            .into_iter()
            .filter(|(k, _)| *k != field)
            .collect();
        form.push((field, value.to_string()));

        let response = server.post("/token").form(&form).await;
        response.assert_status(status);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], error);

        // The failed attempt consumed the code.
        let retry = server.post("/token").form(&exchange_form(&code)).await;
        let body: serde_json::Value = retry.json();
        assert_eq!(body["error"], "invalid_grant");
    }
}

#[tokio::test]
async fn test_token_matching_state_is_accepted() {
    let (server, _) = create_test_server(create_test_settings());
    let code = authorize(&server, "openid email", "s1").await;

    let mut form = exchange_form(&code);
    form.push(("state", "s1".to_string()));
    let response = server.post("/token").form(&form).await;
    response.assert_status_ok();
    let tokens: TokenResponse = response.json();
    assert_eq!(tokens.scope, "openid email");
}

#[tokio::test]
async fn test_token_basic_auth_client_credentials() {
    let (server, _) = create_test_server(create_test_settings());
    let code = authorize(&server, "openid", "").await;

    // base64("c1:s1")
    let response = server
        .post("/token")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Basic YzE6czE="))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", REDIRECT_URI),
        ])
        .await;

    response.assert_status_ok();

    let code = authorize(&server, "openid", "").await;
    let response = server
        .post("/token")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("BASIC YzE6czE="))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", REDIRECT_URI),
        ])
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_token_expired_code() {
    let mut settings = create_test_settings();
    settings.code_ttl = Duration::ZERO;
    let (server, state) = create_test_server(settings);
    let code = authorize(&server, "openid", "").await;

    let response = server.post("/token").form(&exchange_form(&code)).await;
    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "expired_code");
    assert!(state.store.is_empty());

    let response = server.post("/token").form(&exchange_form(&code)).await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn test_token_refresh_errors() {
    let mut settings = create_test_settings();
    settings.refresh_token_ttl = Duration::ZERO;
    let (server, _) = create_test_server(settings);

    let missing = server
        .post("/token")
        .form(&[("grant_type", "refresh_token")])
        .await;
    missing.assert_status_bad_request();
    let body: serde_json::Value = missing.json();
    assert_eq!(body["error"], "missing_refresh_token");

    let unknown = server
        .post("/token")
        .form(&[("grant_type", "refresh_token"), ("refresh_token", "nope")])
        .await;
    let body: serde_json::Value = unknown.json();
    assert_eq!(body["error"], "invalid_refresh_token");

    let code = authorize(&server, "openid", "").await;
    let tokens = exchange(&server, &code).await;
    let expired = server
        .post("/token")
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", tokens.refresh_token.as_str()),
        ])
        .await;
    expired.assert_status_bad_request();
    let body: serde_json::Value = expired.json();
    assert_eq!(body["error"], "expired_refresh_token");
}

#[tokio::test]
async fn test_token_unsupported_grant_type() {
    let (server, _) = create_test_server(create_test_settings());

    let response = server
        .post("/token")
        .form(&[("grant_type", "password"), ("client_id", CLIENT_ID)])
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "unsupported_grant_type");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redemptions_yield_one_pair() {
    let (server, state) = create_test_server(create_test_settings());
    let code = authorize(&server, "openid", "").await;

    let attempts = (0..16).map(|_| {
        let state = state.clone();
        let request = TokenRequest {
            grant_type: "authorization_code".into(),
            code: Some(code.clone()),
            redirect_uri: Some(REDIRECT_URI.into()),
            client_id: Some(CLIENT_ID.into()),
            client_secret: Some(CLIENT_SECRET.into()),
            ..Default::default()
        };
        tokio::spawn(async move { state.token.exchange(request) })
    });

    let results = futures::future::join_all(attempts).await;
    let successes = results
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .filter(Result::is_ok)
        .count();
    assert_eq!(successes, 1);
}

// =============================================================================
// Revoke Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_revoke_nonexistent_token() {
    let (server, _) = create_test_server(create_test_settings());

    // Per RFC 7009, should return 200 even for nonexistent tokens
    let response = server
        .post("/revoke")
        .form(&[("token", "nonexistent-token")])
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_revoke_access_token_blocks_userinfo() {
    let (server, _) = create_test_server(create_test_settings());
    let code = authorize(&server, "openid", "").await;
    let tokens = exchange(&server, &code).await;

    server
        .post("/revoke")
        .form(&[
            ("token", tokens.access_token.as_str()),
            ("token_type_hint", "refresh_token"),
        ])
        .await
        .assert_status_ok();

    let response = server
        .get("/userinfo")
        .add_header(header::AUTHORIZATION, bearer(&tokens.access_token))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid_token");
}

// =============================================================================
// UserInfo Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_userinfo_missing_header() {
    let (server, _) = create_test_server(create_test_settings());

    let response = server.get("/userinfo").await;

    response.assert_status_unauthorized();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_userinfo_invalid_token() {
    let (server, _) = create_test_server(create_test_settings());

    let response = server
        .get("/userinfo")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer invalid-token"),
        )
        .await;

    response.assert_status_unauthorized();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_userinfo_non_bearer_scheme() {
    let (server, _) = create_test_server(create_test_settings());
    let code = authorize(&server, "openid", "").await;
    let tokens = exchange(&server, &code).await;

    let response = server
        .get("/userinfo")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"))
        .await;
    response.assert_status_unauthorized();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid_token");

    // A live token presented under another scheme is still refused.
    let response = server
        .get("/userinfo")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Token {}", tokens.access_token)).unwrap(),
        )
        .await;
    response.assert_status_unauthorized();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid_token");

    let response = server
        .get("/userinfo")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer"))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn test_userinfo_expired_token() {
    let mut settings = create_test_settings();
    settings.access_token_ttl = Duration::ZERO;
    let (server, _) = create_test_server(settings);
    let code = authorize(&server, "openid", "").await;
    let tokens = exchange(&server, &code).await;

    let response = server
        .get("/userinfo")
        .add_header(header::AUTHORIZATION, bearer(&tokens.access_token))
        .await;

    response.assert_status_unauthorized();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "expired_token");
}

#[tokio::test]
async fn test_userinfo_scope_projection() {
    let (server, _) = create_test_server(create_test_settings());

    for (scope, expected) in [
        ("openid", serde_json::json!({ "sub": "user-123" })),
        (
            "openid email",
            serde_json::json!({ "sub": "user-123", "email": "test@example.com" }),
        ),
        (
            "openid profile email",
            serde_json::json!({
                "sub": "user-123",
                "name": "Test User",
                "picture": "https://example.com/avatar.png",
                "email": "test@example.com",
            }),
        ),
    ] {
        let code = authorize(&server, scope, "").await;
        let tokens = exchange(&server, &code).await;
        let response = server
            .get("/userinfo")
            .add_header(header::AUTHORIZATION, bearer(&tokens.access_token))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body, expected, "scope {scope}");
    }
}

// =============================================================================
// Discovery and Misc Tests
// =============================================================================

#[tokio::test]
async fn test_openid_configuration() {
    let (server, _) = create_test_server(create_test_settings());

    let response = server.get("/.well-known/openid-configuration").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    assert_eq!(body["issuer"], "http://localhost:8000");
    assert_eq!(body["authorization_endpoint"], "http://localhost:8000/authorize");
    assert_eq!(body["token_endpoint"], "http://localhost:8000/token");
    assert_eq!(body["userinfo_endpoint"], "http://localhost:8000/userinfo");
    assert_eq!(body["revocation_endpoint"], "http://localhost:8000/revoke");

    let grant_types = body["grant_types_supported"].as_array().unwrap();
    assert!(grant_types.iter().any(|v| v == "authorization_code"));
    assert!(grant_types.iter().any(|v| v == "refresh_token"));

    let scopes = body["scopes_supported"].as_array().unwrap();
    assert_eq!(scopes.len(), 3);
}

#[tokio::test]
async fn test_root_and_health() {
    let (server, _) = create_test_server(create_test_settings());

    let root = server.get("/").await;
    root.assert_status_ok();
    let body: serde_json::Value = root.json();
    assert_eq!(body["message"], "Mock OAuth2 Provider");

    let health = server.get("/healthz").await;
    health.assert_status_ok();
    assert_eq!(health.text(), "ok");
}
