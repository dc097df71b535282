pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod storage;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::Configuration;
pub use error::{ApiError, FlowError};

use services::{AuthService, OAuthFlow, TokenCipher};
use storage::{AccountRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<OAuthFlow>,
    pub auth: Arc<AuthService>,
    pub accounts: Arc<AccountRepository>,
    pub users: Arc<UserRepository>,
    pub cipher: Arc<TokenCipher>,
    /// Public base URL of this deployment, for callback construction.
    pub public_url: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/auth/validate", get(handlers::validate_token))
        .route(
            "/api/twitter/oauth",
            get(handlers::begin_oauth).post(handlers::complete_oauth),
        )
        .route("/api/twitter/oauth/callback", get(handlers::oauth_callback))
        .route(
            "/api/twitter/accounts",
            get(handlers::list_accounts)
                .post(handlers::add_account)
                .delete(handlers::remove_account),
        )
        .route("/api/qr", get(handlers::render_qr))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
