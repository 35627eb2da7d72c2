use super::AppState;
use crate::config::Config;
use crate::media::{
    types::{RawFormat, RawMediaInfo},
    AudioFormat, Extractor, Transcoder,
};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Extractor double: returns canned metadata and writes marker bytes instead of downloading.
#[derive(Default)]
pub struct StubExtractor {
    pub info: RawMediaInfo,
    pub delay: Duration,
    pub fail: bool,
    probes: AtomicUsize,
    fetched: Mutex<Vec<String>>,
}

impl StubExtractor {
    pub fn with_info(info: RawMediaInfo) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }

    /// Every call fails. Downloads leave partial output behind first, the way yt-dlp does.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn slow(info: RawMediaInfo, delay: Duration) -> Self {
        Self {
            info,
            delay,
            ..Self::default()
        }
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl Extractor for StubExtractor {
    fn name(&self) -> &'static str {
        "stub-extractor"
    }

    async fn probe(&self, _url: &str) -> Result<RawMediaInfo> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail {
            bail!("extractor exited with status 1: ERROR: Unsupported URL");
        }
        Ok(self.info.clone())
    }

    async fn fetch_stream(&self, _url: &str, format_id: &str, output: &Path) -> Result<()> {
        self.fetched.lock().unwrap().push(format_id.to_string());
        self.pause().await;
        if self.fail {
            tokio::fs::write(output, b"partial").await?;
            bail!("extractor exited with status 1");
        }
        tokio::fs::write(output, format!("stream:{format_id};")).await?;
        Ok(())
    }

    async fn extract_audio(&self, _url: &str, format: AudioFormat, output: &Path) -> Result<()> {
        self.pause().await;
        if self.fail {
            // Source stream downloaded, conversion failed.
            tokio::fs::write(output.with_extension("webm"), b"source").await?;
            bail!("extractor exited with status 1: ERROR: Postprocessing: audio conversion failed");
        }
        tokio::fs::write(output, format!("audio:{}", format.codec())).await?;
        Ok(())
    }

    async fn check_available(&self) -> bool {
        true
    }
}

/// Transcoder double: concatenates both inputs into the output.
#[derive(Default)]
pub struct StubTranscoder {
    pub fail: bool,
}

#[async_trait]
impl Transcoder for StubTranscoder {
    fn name(&self) -> &'static str {
        "stub-transcoder"
    }

    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        if self.fail {
            bail!("transcoder exited with status 1: Invalid data found when processing input");
        }
        let mut merged = tokio::fs::read(video).await?;
        merged.extend(tokio::fs::read(audio).await?);
        tokio::fs::write(output, merged).await?;
        Ok(())
    }

    async fn check_available(&self) -> bool {
        true
    }
}

pub fn config_for(scratch: &Path, jobs: usize) -> Config {
    let mut config = Config::default();
    config.downloads.scratch_dir = scratch.to_path_buf();
    config.downloads.max_concurrent_jobs = jobs;
    config
}

pub fn state_with(
    config: &Config,
    extractor: Arc<StubExtractor>,
    transcoder: Arc<StubTranscoder>,
) -> AppState {
    AppState::new(config, extractor, transcoder).unwrap()
}

pub fn scratch_entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

pub fn raw_format(
    id: &str,
    ext: &str,
    height: Option<u32>,
    acodec: &str,
    vcodec: &str,
    filesize: Option<f64>,
) -> RawFormat {
    RawFormat {
        format_id: id.to_string(),
        ext: Some(ext.to_string()),
        height,
        acodec: Some(acodec.to_string()),
        vcodec: Some(vcodec.to_string()),
        filesize,
    }
}

pub fn sample_info() -> RawMediaInfo {
    RawMediaInfo {
        title: Some("Sample clip".to_string()),
        thumbnail: None,
        thumbnails: vec![crate::media::types::RawThumbnail {
            url: Some("https://i.example/last.jpg".to_string()),
        }],
        formats: vec![
            raw_format("247", "webm", Some(720), "none", "vp9", None),
            raw_format("136", "mp4", Some(720), "none", "avc1", Some(10485760.0)),
            raw_format("135", "mp4", Some(480), "none", "avc1", None),
            raw_format("140", "m4a", None, "mp4a.40.2", "none", Some(3145728.0)),
        ],
    }
}
