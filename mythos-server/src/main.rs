use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use twitter_api::TwitterClient;

use mythos_server::{
    config::{Configuration, OAuthMode},
    router,
    services::{
        sweep_loop, AuthService, DemoProvider, MemoryStateStore, OAuthFlow, StateStore,
        TokenCipher, TokenProvider, TwitterProvider,
    },
    storage::{AccountRepository, Db, SqliteStateStore, UserRepository},
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();

    let configuration = Configuration::new().context("failed to load configuration")?;
    tracing::info!("Configuration loaded successfully");

    let db = Arc::new(Db::open(&configuration.database.path).context("failed to open database")?);
    db.run_migrations().context("failed to run migrations")?;
    db.health_check().context("database health check failed")?;

    let cipher = match configuration.database.encryption_key.as_deref() {
        Some(key_hex) => {
            Arc::new(TokenCipher::from_hex(key_hex).context("invalid encryption key")?)
        }
        None => {
            tracing::warn!(
                "no encryption key configured, stored credentials will not survive a restart"
            );
            Arc::new(TokenCipher::generate())
        }
    };

    // Resolve the OAuth mode once. Demo keeps pending state in memory and
    // never talks to Twitter; live persists it and uses real credentials.
    let (store, provider): (Arc<dyn StateStore>, Arc<dyn TokenProvider>) =
        match configuration.twitter.oauth_mode() {
            OAuthMode::Demo => {
                if configuration.twitter.demo_mode {
                    tracing::info!("twitter oauth in demo mode (explicitly enabled)");
                } else {
                    tracing::warn!("twitter oauth in demo mode: no api credentials configured");
                }
                (Arc::new(MemoryStateStore::new()), Arc::new(DemoProvider))
            }
            OAuthMode::Live => {
                tracing::info!("twitter oauth in live mode");
                let api_key = configuration
                    .twitter
                    .api_key
                    .clone()
                    .context("twitter api_key missing in live mode")?;
                let api_secret = configuration
                    .twitter
                    .api_secret
                    .clone()
                    .context("twitter api_secret missing in live mode")?;
                (
                    Arc::new(SqliteStateStore::new(Arc::clone(&db))),
                    Arc::new(TwitterProvider::new(TwitterClient::new(api_key, api_secret))),
                )
            }
        };

    let flow = Arc::new(OAuthFlow::new(
        Arc::clone(&store),
        provider,
        configuration.server.state_ttl_seconds,
    ));

    // Abandoned handshakes are reclaimed in the background.
    tokio::spawn(sweep_loop(
        store,
        Duration::from_secs(configuration.server.sweep_interval_seconds),
    ));

    let users = Arc::new(UserRepository::new(Arc::clone(&db)));
    let app_state = AppState {
        flow,
        auth: Arc::new(AuthService::new(Arc::clone(&users))),
        accounts: Arc::new(AccountRepository::new(Arc::clone(&db))),
        users,
        cipher,
        public_url: configuration.server.public_url.clone(),
    };

    let app = router(app_state);

    let addr = format!("{}:{}", configuration.server.host, configuration.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
