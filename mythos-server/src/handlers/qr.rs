use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::error::ApiError;
use crate::models::QrParams;
use crate::services::qr;
use crate::AppState;

const MAX_TEXT_LEN: usize = 1024;

/// Render arbitrary text as a QR code PNG.
pub async fn render_qr(
    State(_state): State<AppState>,
    Query(params): Query<QrParams>,
) -> Result<impl IntoResponse, ApiError> {
    if params.text.is_empty() {
        return Err(ApiError::BadRequest("text is required".to_string()));
    }
    if params.text.len() > MAX_TEXT_LEN {
        return Err(ApiError::BadRequest(format!(
            "text exceeds {MAX_TEXT_LEN} bytes"
        )));
    }

    let size = params.size.unwrap_or(qr::DEFAULT_SIZE);
    let png = qr::render_png(&params.text, size)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png")],
        png,
    ))
}
