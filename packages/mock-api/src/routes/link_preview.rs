use axum::{extract::Query, Json};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LinkPreviewResponse {
    pub url: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub domain: String,
}

/// GET /link-preview?url=..
///
/// Every URL gets the same preview; only the domain is derived from it.
pub async fn link_preview_handler(
    Query(query): Query<PreviewQuery>,
) -> Result<Json<LinkPreviewResponse>, ApiError> {
    let raw = query
        .url
        .ok_or_else(|| ApiError::BadRequest("Missing url parameter".to_string()))?;
    let parsed = Url::parse(&raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid url: {}", e)))?;
    let domain = parsed
        .host_str()
        .ok_or_else(|| ApiError::BadRequest("Url has no host".to_string()))?
        .to_string();

    Ok(Json(LinkPreviewResponse {
        url: raw,
        title: "Example Link".to_string(),
        description: "Link preview description".to_string(),
        image: "https://picsum.photos/200/200".to_string(),
        domain,
    }))
}
