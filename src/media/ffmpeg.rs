use super::{
    process::{ensure_written, probe_version, run_tool},
    transcoder::Transcoder,
};
use crate::config::ToolsConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub struct FfmpegTranscoder {
    program: String,
    timeout: Option<Duration>,
}

impl FfmpegTranscoder {
    pub fn new(config: &ToolsConfig) -> Self {
        Self {
            program: config.ffmpeg.clone(),
            timeout: (config.download_timeout_secs > 0)
                .then(|| Duration::from_secs(config.download_timeout_secs)),
        }
    }

    fn merge_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-i".to_string(),
            audio.to_string_lossy().into_owned(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        info!(
            "Merging {} and {} into {}",
            video.display(),
            audio.display(),
            output.display()
        );

        run_tool(
            &self.program,
            &Self::merge_args(video, audio, output),
            self.timeout,
        )
        .await
        .context("ffmpeg merge failed")?;

        ensure_written(&self.program, output).await?;

        info!("Successfully merged into {}", output.display());
        Ok(())
    }

    async fn check_available(&self) -> bool {
        match probe_version(&self.program, "-version").await {
            Ok(version_line) => {
                info!("✅ ffmpeg is available: {}", version_line);
                true
            }
            Err(e) => {
                warn!("❌ ffmpeg unavailable: {} (required for video merging)", e);
                false
            }
        }
    }
}
