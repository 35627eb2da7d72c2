use super::types::{AudioOption, FormatOption, MediaInfo, RawFormat, RawMediaInfo};
use crate::utils::format_size_mb;
use std::collections::HashSet;

/// Only formats in this container are offered as video options.
pub const TARGET_CONTAINER: &str = "mp4";

const NO_CODEC: &str = "none";

fn has_audio(format: &RawFormat) -> bool {
    matches!(format.acodec.as_deref(), Some(codec) if codec != NO_CODEC)
}

fn is_video_only(format: &RawFormat) -> bool {
    format.acodec.as_deref() == Some(NO_CODEC)
}

fn is_audio_only(format: &RawFormat) -> bool {
    has_audio(format) && format.vcodec.as_deref() == Some(NO_CODEC)
}

/// One option per vertical resolution, first-seen wins, extractor order kept.
/// A zero height counts as unknown.
pub fn video_options(formats: &[RawFormat]) -> Vec<FormatOption> {
    let mut seen_heights = HashSet::new();

    formats
        .iter()
        .filter(|format| format.ext.as_deref() == Some(TARGET_CONTAINER))
        .filter_map(|format| {
            format
                .height
                .filter(|height| *height > 0)
                .map(|height| (height, format))
        })
        .filter(|(height, _)| seen_heights.insert(*height))
        .map(|(height, format)| FormatOption {
            format_id: format.format_id.clone(),
            quality: format!("{height}p"),
            has_audio: has_audio(format),
            video_only: is_video_only(format),
            size: format_size_mb(format.filesize),
        })
        .collect()
}

/// First audio-only format in extractor order. No quality comparison.
pub fn audio_option(formats: &[RawFormat]) -> Option<AudioOption> {
    formats
        .iter()
        .find(|format| is_audio_only(format))
        .map(|format| AudioOption {
            format_id: format.format_id.clone(),
            size: format_size_mb(format.filesize),
        })
}

pub fn reduce(info: &RawMediaInfo) -> MediaInfo {
    MediaInfo {
        title: info
            .title
            .clone()
            .unwrap_or_else(|| "Unknown Title".to_string()),
        thumbnail: info.best_thumbnail(),
        formats: video_options(&info.formats),
        audio: audio_option(&info.formats),
    }
}
