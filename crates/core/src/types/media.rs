//! Portfolio media kinds.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a media kind string is not recognized.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown media type '{0}' (expected image, video or music)")]
pub struct MediaKindError(String);

/// The kind of media a portfolio item points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
    Music,
}

impl MediaKind {
    /// All media kinds, in the order the admin form lists them.
    pub const ALL: [Self; 3] = [Self::Image, Self::Video, Self::Music];

    /// Stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Music => "music",
        }
    }

    /// MIME type prefix accepted for uploads of this kind.
    #[must_use]
    pub const fn mime_prefix(self) -> &'static str {
        match self {
            Self::Image => "image/",
            Self::Video => "video/",
            Self::Music => "audio/",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = MediaKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "music" | "audio" => Ok(Self::Music),
            other => Err(MediaKindError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_media_kind() {
        assert_eq!("video".parse::<MediaKind>().unwrap(), MediaKind::Video);
        assert_eq!(" Music ".parse::<MediaKind>().unwrap(), MediaKind::Music);
        assert_eq!("audio".parse::<MediaKind>().unwrap(), MediaKind::Music);
        assert!("gif".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_media_kind_serde_is_lowercase() {
        let json = serde_json::to_string(&MediaKind::Music).unwrap();
        assert_eq!(json, "\"music\"");
        let kind: MediaKind = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(kind, MediaKind::Image);
    }
}
