use super::{
    extractor::Extractor,
    process::{ensure_written, probe_version, run_tool, ToolError},
    types::{AudioFormat, RawMediaInfo},
};
use crate::config::ToolsConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct YtDlpExtractor {
    program: String,
    metadata_timeout: Option<Duration>,
    download_timeout: Option<Duration>,
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl YtDlpExtractor {
    pub fn new(config: &ToolsConfig) -> Self {
        Self {
            program: config.ytdlp.clone(),
            metadata_timeout: timeout_from_secs(config.metadata_timeout_secs),
            download_timeout: timeout_from_secs(config.download_timeout_secs),
        }
    }

    fn probe_args(url: &str) -> Vec<String> {
        vec![
            "--dump-single-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            // Everything after this is positional, so a URL can never be read as an option.
            "--".to_string(),
            url.to_string(),
        ]
    }

    fn fetch_args(url: &str, format_id: &str, output: &Path) -> Vec<String> {
        vec![
            "--format".to_string(),
            format_id.to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--no-part".to_string(),
            "--output".to_string(),
            output.to_string_lossy().into_owned(),
            "--".to_string(),
            url.to_string(),
        ]
    }

    fn audio_args(url: &str, format: AudioFormat, output: &Path) -> Vec<String> {
        // yt-dlp picks the extension; `adopt_converted` moves the result onto `output`.
        let template = output.with_extension("%(ext)s");
        vec![
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            format.codec().to_string(),
            "--audio-quality".to_string(),
            "0".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--no-part".to_string(),
            "--output".to_string(),
            template.to_string_lossy().into_owned(),
            "--".to_string(),
            url.to_string(),
        ]
    }

    fn parse_metadata(&self, stdout: &[u8]) -> Result<RawMediaInfo> {
        serde_json::from_slice::<RawMediaInfo>(stdout)
            .map_err(|e| ToolError::output(&self.program, e.to_string()))
            .context("Failed to parse media metadata")
    }
}

/// yt-dlp picks the final extension after conversion. If it differs from the
/// one we allocated, move the converted file onto `output`.
async fn adopt_converted(output: &Path) -> Result<()> {
    if tokio::fs::try_exists(output).await.unwrap_or(false) {
        return Ok(());
    }
    let (Some(dir), Some(stem)) = (output.parent(), output.file_stem()) else {
        return Ok(());
    };
    let prefix = format!("{}.", stem.to_string_lossy());

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(&prefix) || name.ends_with(".part") || name.ends_with(".ytdl") {
            continue;
        }
        debug!("yt-dlp wrote {}, moving to {}", name, output.display());
        tokio::fs::rename(entry.path(), output)
            .await
            .with_context(|| format!("Failed to move {} to {}", name, output.display()))?;
        break;
    }
    Ok(())
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str) -> Result<RawMediaInfo> {
        debug!("Extracting metadata with yt-dlp for: {}", url);

        let output = run_tool(&self.program, &Self::probe_args(url), self.metadata_timeout)
            .await
            .context("Media metadata extraction failed")?;

        let info = self.parse_metadata(&output.stdout)?;
        debug!(
            "yt-dlp reported {} formats for {}",
            info.formats.len(),
            url
        );
        Ok(info)
    }

    async fn fetch_stream(&self, url: &str, format_id: &str, output: &Path) -> Result<()> {
        info!("Downloading format {} with yt-dlp: {}", format_id, url);

        run_tool(
            &self.program,
            &Self::fetch_args(url, format_id, output),
            self.download_timeout,
        )
        .await
        .with_context(|| format!("Failed to download format {format_id}"))?;

        ensure_written(&self.program, output).await?;
        Ok(())
    }

    async fn extract_audio(&self, url: &str, format: AudioFormat, output: &Path) -> Result<()> {
        info!("Extracting {} audio with yt-dlp: {}", format.codec(), url);

        run_tool(
            &self.program,
            &Self::audio_args(url, format, output),
            self.download_timeout,
        )
        .await
        .context("Audio extraction failed")?;

        adopt_converted(output).await?;
        ensure_written(&self.program, output).await?;
        Ok(())
    }

    async fn check_available(&self) -> bool {
        match probe_version(&self.program, "--version").await {
            Ok(version) => {
                info!("✅ yt-dlp is available, version: {}", version);
                true
            }
            Err(e) => {
                warn!("❌ yt-dlp unavailable: {}", e);
                false
            }
        }
    }
}
