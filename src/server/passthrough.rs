use super::{
    error::{ApiError, ApiResult, LogErr},
    files::attachment_disposition,
};
use crate::config::PassthroughConfig;
use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use tracing::{error, info};
use url::Url;

/// How a relayed body is presented to the caller.
pub struct Relay {
    pub filename: &'static str,
    pub content_type: &'static str,
    /// Message returned when the upstream fetch fails.
    pub failure: &'static str,
}

pub const THUMBNAIL: Relay = Relay {
    filename: "thumbnail.jpg",
    content_type: "image/jpeg",
    failure: "Failed to download thumbnail",
};

pub const VIDEO: Relay = Relay {
    filename: "video.mp4",
    content_type: "video/mp4",
    failure: "Failed to stream video",
};

pub fn validate_url(raw: &str, policy: &PassthroughConfig) -> ApiResult<Url> {
    let url = Url::parse(raw).map_err(|_| ApiError::bad_request("Invalid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::bad_request("Invalid URL"));
    }

    let host = url
        .host_str()
        .ok_or_else(|| ApiError::bad_request("Invalid URL"))?;
    if !policy.is_host_allowed(host) {
        return Err(ApiError::forbidden("Host not allowed"));
    }

    Ok(url)
}

/// Fetches `url` and pipes the upstream body through with forced download headers.
pub async fn relay(
    client: &reqwest::Client,
    policy: &PassthroughConfig,
    raw_url: &str,
    relay: &Relay,
) -> ApiResult<Response> {
    let url = validate_url(raw_url, policy)?;
    info!("Relaying {}", url);

    let upstream = client
        .get(url.clone())
        .send()
        .await
        .log_500("Passthrough fetch error", relay.failure)?;

    let status = upstream.status();
    if !status.is_success() {
        error!("❌ Passthrough upstream {} answered {}", url, status);
        return Err(ApiError::internal(relay.failure));
    }

    let content_length = upstream.content_length();
    let disposition =
        attachment_disposition(relay.filename).log_500("Passthrough header error", relay.failure)?;

    let mut response = Body::from_stream(upstream.bytes_stream()).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(relay.content_type),
    );
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    if let Some(length) = content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok(response)
}
