use super::types::{AudioFormat, RawMediaInfo};
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Human-readable name of the extractor
    fn name(&self) -> &'static str;

    /// Dump the full metadata for `url`, including every available format
    async fn probe(&self, url: &str) -> Result<RawMediaInfo>;

    /// Download the single stream `format_id` to `output`
    async fn fetch_stream(&self, url: &str, format_id: &str, output: &Path) -> Result<()>;

    /// Download the best audio and convert it to `format`, writing to `output`.
    /// `output` must carry the extension matching `format`.
    async fn extract_audio(&self, url: &str, format: AudioFormat, output: &Path) -> Result<()>;

    /// Test if the extractor is available on the system
    async fn check_available(&self) -> bool;
}
