use goose::prelude::*;
use reqwest::header::{AUTHORIZATION, LOCATION};
use std::env;

struct ClientSettings {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl ClientSettings {
    fn from_env() -> Self {
        Self {
            client_id: env::var("CLIENT_ID").unwrap_or_else(|_| "test-client".to_string()),
            client_secret: env::var("CLIENT_SECRET").unwrap_or_else(|_| "test-secret".to_string()),
            redirect_uri: env::var("REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:8001/callback".to_string()),
        }
    }
}

fn code_from_location(location: &str) -> Option<String> {
    let (_, query) = location.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == "code").then(|| value.to_string())
    })
}

/// The authorize endpoint answers with a redirect the client must not follow.
async fn setup_client(user: &mut GooseUser) -> TransactionResult {
    let builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
    user.set_client_builder(builder).await?;
    Ok(())
}

async fn health_check(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/healthz").await?;
    Ok(())
}

async fn discovery(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/.well-known/openid-configuration").await?;
    Ok(())
}

async fn authorization_code_flow(user: &mut GooseUser) -> TransactionResult {
    let client = ClientSettings::from_env();

    let path = format!(
        "/authorize?response_type=code&client_id={}&redirect_uri={}&scope=openid%20profile%20email&state=loadtest",
        client.client_id, client.redirect_uri
    );
    let request = GooseRequest::builder()
        .path(path.as_str())
        .name("authorize")
        .expect_status_code(302)
        .build();
    let mut goose = user.request(request).await?;
    let code = goose
        .response
        .as_ref()
        .ok()
        .and_then(|r| r.headers().get(LOCATION))
        .and_then(|v| v.to_str().ok())
        .and_then(code_from_location);
    let Some(code) = code else {
        return user.set_failure("authorize: no code in redirect", &mut goose.request, None, None);
    };

    let params = [
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", client.redirect_uri.as_str()),
        ("client_id", client.client_id.as_str()),
        ("client_secret", client.client_secret.as_str()),
    ];
    let mut goose = user.post_form("/token", &params).await?;
    let body = match goose.response {
        Ok(response) => response.text().await.ok(),
        Err(_) => None,
    };
    let Some(tokens) = body.and_then(|b| serde_json::from_str::<serde_json::Value>(&b).ok()) else {
        return user.set_failure("token: unreadable response", &mut goose.request, None, None);
    };
    let access_token = tokens["access_token"].as_str().unwrap_or_default().to_string();
    let refresh_token = tokens["refresh_token"].as_str().unwrap_or_default().to_string();

    let builder = user
        .get_request_builder(&GooseMethod::Get, "/userinfo")?
        .header(AUTHORIZATION, format!("Bearer {access_token}"));
    let request = GooseRequest::builder()
        .set_request_builder(builder)
        .name("userinfo")
        .build();
    let _goose_metrics = user.request(request).await?;

    let params = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token.as_str()),
    ];
    let _goose_metrics = user.post_form("/token", &params).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    let client = ClientSettings::from_env();
    println!(
        "Running grant flow as client '{}' redirecting to {}",
        client.client_id, client.redirect_uri
    );

    GooseAttack::initialize()?
        .register_scenario(
            scenario!("HealthCheck").register_transaction(transaction!(health_check)),
        )
        .register_scenario(
            scenario!("AuthorizationCodeFlow")
                .register_transaction(transaction!(setup_client).set_on_start())
                .register_transaction(transaction!(discovery))
                .register_transaction(transaction!(authorization_code_flow)),
        )
        .execute()
        .await?;

    Ok(())
}
