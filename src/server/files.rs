use crate::media::ScratchFile;
use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use tokio_util::io::ReaderStream;

pub fn attachment_disposition(filename: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .with_context(|| format!("Invalid attachment filename {filename}"))
}

/// Streams a finished scratch artifact as an attachment.
///
/// The guard travels with the body stream, so the file is removed once the
/// transfer completes or the client goes away.
pub async fn scratch_attachment(file: ScratchFile) -> Result<Response> {
    let handle = tokio::fs::File::open(file.path())
        .await
        .with_context(|| format!("Failed to open {}", file.path().display()))?;
    let length = handle
        .metadata()
        .await
        .with_context(|| format!("Failed to stat {}", file.path().display()))?
        .len();

    let filename = file.file_name();
    let content_type = mime_guess::from_path(file.path()).first_or_octet_stream();
    let disposition = attachment_disposition(&filename)?;

    let stream = ReaderStream::new(handle).map(move |chunk| {
        let _guard = &file;
        chunk
    });

    let mut response = Body::from_stream(stream).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type.as_ref())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok(response)
}
