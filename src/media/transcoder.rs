use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Human-readable name of the transcoder
    fn name(&self) -> &'static str;

    /// Multiplex a video-only and an audio-only file into `output` without re-encoding
    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<()>;

    /// Test if the transcoder is available on the system
    async fn check_available(&self) -> bool;
}
