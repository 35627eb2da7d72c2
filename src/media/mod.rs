mod extractor;
mod ffmpeg;
pub mod formats;
pub mod process;
pub mod scratch;
mod transcoder;
pub mod types;
mod ytdlp;

pub use extractor::Extractor;
pub use ffmpeg::FfmpegTranscoder;
pub use scratch::{ScratchDir, ScratchFile, ScratchKind};
pub use transcoder::Transcoder;
pub use types::{AudioFormat, MediaInfo};
pub use ytdlp::YtDlpExtractor;

use anyhow::Result;
use tracing::{info, warn};

/// Checks that the external tools respond before the server starts accepting requests.
pub async fn test_setup(extractor: &dyn Extractor, transcoder: &dyn Transcoder) -> Result<()> {
    info!("Testing media tool setup...");

    let extractor_available = extractor.check_available().await;
    let transcoder_available = transcoder.check_available().await;

    if extractor_available && !transcoder_available {
        warn!(
            "⚠️  {} will work but combined video downloads need {}",
            extractor.name(),
            transcoder.name()
        );
    }

    if extractor_available {
        info!("✅ {} is ready", extractor.name());
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "{} is not available. Please install it or set tools.ytdlp in the config.",
            extractor.name()
        ))
    }
}
