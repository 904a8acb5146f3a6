//! Aggregate scrape endpoint and the request validation shared with the
//! streaming endpoint.

use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use socmet_core::{Platform, ScrapeResponse};
use socmet_extract::ExtractError;
use socmet_session::SessionError;
use url::Url;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Body of `POST /api/v1/scrape` and query of the streaming route.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ScrapeRequest {
    pub platform: String,
    pub profile_url: String,
}

/// A request that passed validation.
#[derive(Debug)]
pub(super) struct ValidScrape {
    pub platform: Platform,
    pub url: String,
}

pub(super) fn validate(rid: &str, request: &ScrapeRequest) -> Result<ValidScrape, ApiError> {
    let platform: Platform = request
        .platform
        .parse()
        .map_err(|e: socmet_core::ParsePlatformError| {
            ApiError::new(rid, "validation_error", e.to_string())
        })?;

    let url = Url::parse(request.profile_url.trim()).map_err(|e| {
        ApiError::new(
            rid,
            "validation_error",
            format!("profileUrl is not a valid URL: {e}"),
        )
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("profileUrl must use http or https, got '{}'", url.scheme()),
        ));
    }

    Ok(ValidScrape {
        platform,
        url: url.into(),
    })
}

pub(super) fn map_session_error(request_id: String, error: &SessionError) -> ApiError {
    let code = match error {
        SessionError::Extract(ExtractError::Precondition { .. }) => "unauthorized",
        SessionError::Extract(ExtractError::Exhausted { .. }) => "extraction_exhausted",
        SessionError::UnsupportedPlatform(_) => "validation_error",
        _ => "upstream_error",
    };
    tracing::warn!(error = %error, code, "scrape session failed");
    ApiError::new(request_id, code, error.to_string())
}

pub(super) async fn scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ApiResponse<ScrapeResponse>>, ApiError> {
    let valid = validate(&req_id.0, &request)?;

    let data = state
        .scrape
        .scrape(valid.platform, &valid.url)
        .await
        .map_err(|e| map_session_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
