use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::{resolve, AssetRef, Media, Resolve};
use crate::asset::{AssetHandle, NativeSubtypes};
use crate::error::{MediaError, Result};
use crate::filter::MediaSubtype;
use crate::kind::MediaKind;
use crate::store::{AssetChangeRequest, AssetResource, ResourceKind, ResourceSource};

#[derive(Debug, Clone)]
pub struct Video {
    asset: AssetRef,
}

impl Media for Video {
    type Subtype = VideoSubtype;

    const KIND: MediaKind = MediaKind::Video;

    fn from_asset(asset: AssetRef) -> Self {
        Self { asset }
    }

    fn asset(&self) -> &AssetRef {
        &self.asset
    }
}

impl Resolve for Video {
    fn resolve(handle: AssetHandle) -> Option<Self> {
        resolve(handle)
    }
}

impl Video {
    /// Change request that copies the movie at `path` into the library.
    ///
    /// The file type is taken from the extension and must be one the library
    /// accepts.
    pub fn creation_request(path: &Path) -> Result<AssetChangeRequest> {
        VideoFileType::from_path(path).ok_or_else(|| {
            MediaError::invalid(format!("unsupported video file: {}", path.display()))
        })?;
        Ok(AssetChangeRequest::Create {
            resources: vec![AssetResource {
                kind: ResourceKind::Video,
                source: ResourceSource::File {
                    path: path.to_path_buf(),
                    move_file: false,
                },
            }],
        })
    }
}

/// Container formats accepted for new videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoFileType {
    Mov,
    Mp4,
    M4v,
}

impl VideoFileType {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "mov" | "qt" => Some(Self::Mov),
            "mp4" => Some(Self::Mp4),
            "m4v" => Some(Self::M4v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoSubtype {
    Streamed,
    HighFrameRate,
    Timelapse,
}

impl VideoSubtype {
    pub const ALL: [VideoSubtype; 3] = [Self::Streamed, Self::HighFrameRate, Self::Timelapse];

    pub fn name(self) -> &'static str {
        match self {
            Self::Streamed => "streamed",
            Self::HighFrameRate => "high-frame-rate",
            Self::Timelapse => "timelapse",
        }
    }
}

impl MediaSubtype for VideoSubtype {
    fn native(self) -> NativeSubtypes {
        match self {
            Self::Streamed => NativeSubtypes::VIDEO_STREAMED,
            Self::HighFrameRate => NativeSubtypes::VIDEO_HIGH_FRAME_RATE,
            Self::Timelapse => NativeSubtypes::VIDEO_TIMELAPSE,
        }
    }
}

impl fmt::Display for VideoSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VideoSubtype {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|subtype| subtype.name() == normalized)
            .ok_or_else(|| MediaError::invalid(format!("unknown video subtype: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(
            VideoFileType::from_path(Path::new("/tmp/clip.MOV")),
            Some(VideoFileType::Mov)
        );
        assert_eq!(
            VideoFileType::from_path(Path::new("clip.m4v")),
            Some(VideoFileType::M4v)
        );
        assert_eq!(VideoFileType::from_path(Path::new("clip.avi")), None);
        assert_eq!(VideoFileType::from_path(Path::new("clip")), None);
    }

    #[test]
    fn test_creation_request_copies_the_file() {
        let request = Video::creation_request(Path::new("/tmp/clip.mp4")).unwrap();
        let AssetChangeRequest::Create { resources } = request else {
            panic!("expected a create request");
        };
        assert_eq!(
            resources[0].source,
            ResourceSource::File {
                path: "/tmp/clip.mp4".into(),
                move_file: false
            }
        );

        assert!(Video::creation_request(Path::new("/tmp/clip.gif")).is_err());
    }

    #[test]
    fn test_subtype_parse() {
        assert_eq!(
            "high_frame_rate".parse::<VideoSubtype>().unwrap(),
            VideoSubtype::HighFrameRate
        );
        assert!("hdr".parse::<VideoSubtype>().is_err());
    }
}
