use serde::{Deserialize, Serialize};

/// Subset of the extractor's JSON dump that the relay consumes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMediaInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<RawThumbnail>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

impl RawMediaInfo {
    /// Direct thumbnail field, falling back to the last entry of the thumbnail list.
    pub fn best_thumbnail(&self) -> Option<String> {
        self.thumbnail
            .as_deref()
            .filter(|thumb| !thumb.is_empty())
            .map(|thumb| thumb.to_string())
            .or_else(|| self.thumbnails.last().and_then(|thumb| thumb.url.clone()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawThumbnail {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub filesize: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatOption {
    pub format_id: String,
    pub quality: String,
    #[serde(rename = "hasAudio")]
    pub has_audio: bool,
    #[serde(rename = "videoOnly")]
    pub video_only: bool,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioOption {
    pub format_id: String,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    pub title: String,
    pub thumbnail: Option<String>,
    pub formats: Vec<FormatOption>,
    pub audio: Option<AudioOption>,
}

/// Audio containers the extractor can convert to, keyed by the request token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    M4a,
    Aac,
    Wav,
    Flac,
    Opus,
    Vorbis,
    Alac,
}

impl AudioFormat {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "m4a" => Some(Self::M4a),
            "aac" => Some(Self::Aac),
            "wav" => Some(Self::Wav),
            "flac" => Some(Self::Flac),
            "opus" => Some(Self::Opus),
            "vorbis" | "ogg" => Some(Self::Vorbis),
            "alac" => Some(Self::Alac),
            _ => None,
        }
    }

    /// Value passed to the extractor's `--audio-format`.
    pub fn codec(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::M4a => "m4a",
            Self::Aac => "aac",
            Self::Wav => "wav",
            Self::Flac => "flac",
            Self::Opus => "opus",
            Self::Vorbis => "vorbis",
            Self::Alac => "alac",
        }
    }

    /// File extension the extractor produces for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Vorbis => "ogg",
            Self::Aac | Self::Alac => "m4a",
            other => other.codec(),
        }
    }
}
