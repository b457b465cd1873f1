use crate::AppState;
use crate::access::SESSION_COOKIE_NAME;
use crate::error::RelayError;
use crate::page::{admin_page, index_page};
use crate::registry::is_origin_url;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path as AxumPath, Query};
use axum::http::{HeaderMap, HeaderValue, Response, StatusCode, header};
use axum::response::{Html, IntoResponse, Json};
use axum_extra::TypedHeader;
use axum_extra::headers::Cookie;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(alias = "url")]
    pub origin_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub slug: String,
    pub playback_url: String,
}

#[derive(Debug, Deserialize)]
pub struct PlayParams {
    pub t: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectStreamParams {
    pub token: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminParams {
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn index() -> Result<Html<String>, RelayError> {
    Ok(Html(index_page()?))
}

pub async fn generate(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, RelayError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(%rejection, "Rejected generate body");
        RelayError::InvalidInput("Invalid request body".into())
    })?;

    state.access.check_token(request.token.as_deref())?;

    let entry = state
        .registry
        .register(&request.name, &request.origin_url)
        .await?;

    let base = match &state.public_base_url {
        Some(base) => base.to_string(),
        None => headers
            .get(header::HOST)
            .and_then(|host| host.to_str().ok())
            .map(|host| format!("http://{host}"))
            .unwrap_or_default(),
    };
    let playback_url = format!(
        "{base}/play/{}?t={}",
        urlencoding::encode(&entry.slug),
        urlencoding::encode(state.access.user_secret().expose()),
    );

    info!(slug = %entry.slug, "Generated playback link");
    Ok(Json(GenerateResponse {
        slug: entry.slug,
        playback_url,
    }))
}

/// Trade the one-time token for a session cookie and bounce to the stream.
pub async fn play(
    Extension(state): Extension<AppState>,
    AxumPath(slug): AxumPath<String>,
    Query(params): Query<PlayParams>,
) -> Result<axum::response::Response, RelayError> {
    state.access.check_token(params.t.as_deref())?;

    let cookie = state.access.session_cookie()?;
    let location = HeaderValue::from_str(&format!("/stream/{}", urlencoding::encode(&slug)))
        .map_err(|_| RelayError::InvalidInput("Invalid slug".into()))?;
    debug!(%slug, "Session cookie issued");

    let mut res = StatusCode::FOUND.into_response();
    res.headers_mut().insert(header::LOCATION, location);
    res.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(res)
}

pub async fn stream(
    Extension(state): Extension<AppState>,
    AxumPath(slug): AxumPath<String>,
    cookies: Option<TypedHeader<Cookie>>,
    headers: HeaderMap,
) -> Result<Response<Body>, RelayError> {
    let session = cookies
        .as_ref()
        .and_then(|TypedHeader(cookies)| cookies.get(SESSION_COOKIE_NAME));
    state.access.check_session(session)?;

    let origin_url = state.registry.resolve(&slug).await?;
    debug!(%slug, "Streaming link");
    state
        .relay
        .relay(&origin_url, headers.get(header::RANGE))
        .await
}

/// Relay an arbitrary origin URL without a registry entry.
pub async fn direct_stream(
    Extension(state): Extension<AppState>,
    Query(params): Query<DirectStreamParams>,
    headers: HeaderMap,
) -> Result<Response<Body>, RelayError> {
    state.access.check_token(params.token.as_deref())?;

    let Some(video_url) = params.video_url.filter(|url| !url.is_empty()) else {
        return Err(RelayError::InvalidInput(
            "'videoUrl' parameter is required".into(),
        ));
    };
    if !is_origin_url(&video_url) {
        return Err(RelayError::InvalidInput("Invalid video URL".into()));
    }

    state
        .relay
        .relay(&video_url, headers.get(header::RANGE))
        .await
}

pub async fn admin(
    Extension(state): Extension<AppState>,
    Query(params): Query<AdminParams>,
) -> Result<Html<String>, RelayError> {
    let token = params.token.unwrap_or_default();
    state
        .access
        .check_admin(Some(token.as_str()))
        .map_err(|_| RelayError::Forbidden)?;

    let entries = state.registry.list_all().await?;
    Ok(Html(admin_page(&entries, &token)?))
}

pub async fn delete(
    Extension(state): Extension<AppState>,
    AxumPath(slug): AxumPath<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    if let Err(err) = state.access.check_admin(token) {
        return delete_response(StatusCode::UNAUTHORIZED, Some(err.to_string()));
    }

    match state.registry.delete(&slug).await {
        Ok(()) => delete_response(StatusCode::OK, None),
        Err(err) => {
            warn!(%slug, %err, "Failed to delete link");
            delete_response(StatusCode::BAD_REQUEST, Some(err.to_string()))
        }
    }
}

fn delete_response(status: StatusCode, error: Option<String>) -> (StatusCode, Json<DeleteResponse>) {
    (
        status,
        Json(DeleteResponse {
            success: error.is_none(),
            error,
        }),
    )
}
