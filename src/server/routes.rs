use super::{
    error::{ApiError, ApiResult, LogErr},
    files::scratch_attachment,
    passthrough::{self, Relay},
    AppState,
};
use crate::media::{formats, AudioFormat, MediaInfo, ScratchKind};
use crate::utils::non_empty;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Default, Deserialize)]
pub struct InfoRequest {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoRequest {
    url: Option<String>,
    format_id: Option<String>,
    audio_format_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AudioRequest {
    url: Option<String>,
    #[serde(rename = "audioFormat")]
    audio_format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    url: Option<String>,
}

/// An absent or unreadable JSON body counts as an empty object.
fn body_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>) -> T {
    match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            debug!("Treating unreadable request body as empty: {}", rejection);
            T::default()
        }
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn fetch_info(
    State(state): State<AppState>,
    payload: Result<Json<InfoRequest>, JsonRejection>,
) -> ApiResult<Json<MediaInfo>> {
    let request = body_or_default(payload);
    let url = non_empty(request.url.as_deref())
        .ok_or_else(|| ApiError::bad_request("No URL provided"))?;
    info!("📥 Got URL: {}", url);

    let _permit = state.acquire_job().await?;
    let raw = state
        .extractor
        .probe(url)
        .await
        .log_500("Fetch info error", "Failed to fetch video info")?;

    let media = formats::reduce(&raw);
    info!(
        "Found {} formats for {} (audio: {})",
        media.formats.len(),
        url,
        media.audio.is_some()
    );
    Ok(Json(media))
}

pub async fn download_video(
    State(state): State<AppState>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ApiResult<Response> {
    const FAILURE: &str = "Failed to download or merge video";

    let request = body_or_default(payload);
    let (Some(url), Some(format_id)) = (
        non_empty(request.url.as_deref()),
        non_empty(request.format_id.as_deref()),
    ) else {
        return Err(ApiError::bad_request("Missing data"));
    };
    let audio_format_id = non_empty(request.audio_format_id.as_deref())
        .unwrap_or(state.default_audio_format_id.as_ref());

    let permit = state.acquire_job().await?;
    let merged = async {
        let video = state.scratch.allocate(ScratchKind::Video, "mp4");
        let audio = state.scratch.allocate(ScratchKind::Audio, "m4a");
        let merged = state.scratch.allocate(ScratchKind::Merged, "mp4");

        state
            .extractor
            .fetch_stream(url, format_id, video.path())
            .await?;
        state
            .extractor
            .fetch_stream(url, audio_format_id, audio.path())
            .await?;
        state
            .transcoder
            .merge(video.path(), audio.path(), merged.path())
            .await?;

        anyhow::Ok(merged)
    }
    .await
    .log_500("Merge error", FAILURE)?;
    drop(permit);

    scratch_attachment(merged)
        .await
        .log_500("Merged file error", FAILURE)
}

pub async fn download_thumbnail(
    State(state): State<AppState>,
    payload: Result<Json<InfoRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let request = body_or_default(payload);
    let url = non_empty(request.url.as_deref())
        .ok_or_else(|| ApiError::bad_request("No URL provided"))?;

    relay(&state, url, &passthrough::THUMBNAIL).await
}

pub async fn stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> ApiResult<Response> {
    let url = non_empty(query.url.as_deref())
        .ok_or_else(|| ApiError::bad_request("No URL provided"))?;

    relay(&state, url, &passthrough::VIDEO).await
}

async fn relay(state: &AppState, url: &str, relay: &Relay) -> ApiResult<Response> {
    passthrough::relay(&state.http, &state.passthrough, url, relay).await
}

pub async fn download_audio(
    State(state): State<AppState>,
    payload: Result<Json<AudioRequest>, JsonRejection>,
) -> ApiResult<Response> {
    const FAILURE: &str = "Audio download failed";

    let request = body_or_default(payload);
    let (Some(url), Some(token)) = (
        non_empty(request.url.as_deref()),
        non_empty(request.audio_format.as_deref()),
    ) else {
        return Err(ApiError::bad_request("URL or audio format missing"));
    };
    let format =
        AudioFormat::parse(token).ok_or_else(|| ApiError::bad_request("Unsupported audio format"))?;

    let permit = state.acquire_job().await?;
    let file = state.scratch.allocate(ScratchKind::Audio, format.extension());
    state
        .extractor
        .extract_audio(url, format, file.path())
        .await
        .log_500("Audio Download error", FAILURE)?;
    drop(permit);

    scratch_attachment(file)
        .await
        .log_500("Audio file error", FAILURE)
}
