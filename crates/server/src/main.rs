use mock_oauth_provider::api::start_webserver;
use mock_oauth_provider::config::load_config_or_panic;
use mock_oauth_provider::oauth2::OAuth2State;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_standard_tracing() {
    let default_directives = "mock_oauth_provider=info,tower_http=info";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    // A missing .env is fine; variables may come from the real environment.
    dotenvy::dotenv().ok();

    initialize_standard_tracing();

    let config = load_config_or_panic();
    tracing::info!(
        issuer = %config.oauth2.issuer,
        client_id = %config.client.client_id,
        redirect_uri = %config.client.redirect_uri,
        fixture_user = config.fixture_user.is_some(),
        code_lifetime = config.oauth2.code_lifetime,
        access_token_lifetime = config.oauth2.access_token_lifetime,
        refresh_token_lifetime = config.oauth2.refresh_token_lifetime,
        "oauth2 configuration"
    );

    let state = OAuth2State::from_config(&config);
    state.spawn_purge_task(config.oauth2.purge_every());

    start_webserver(state, &config.listen_addr).await?;
    Ok(())
}
