mod accounts;
mod auth;
mod oauth;
mod qr;

pub use accounts::{add_account, list_accounts, remove_account};
pub use auth::validate_token;
pub use oauth::{begin_oauth, complete_oauth, oauth_callback};
pub use qr::render_qr;

use axum::Json;

use crate::models::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
