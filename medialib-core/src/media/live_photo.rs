use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::{resolve, AssetRef, Media, Resolve, VideoFileType};
use crate::asset::{AssetHandle, NativeSubtypes};
use crate::error::{MediaError, Result};
use crate::filter::MediaSubtype;
use crate::kind::MediaKind;
use crate::store::{AssetChangeRequest, AssetResource, ResourceKind, ResourceSource};

/// A still image paired with a short movie.
#[derive(Debug, Clone)]
pub struct LivePhoto {
    asset: AssetRef,
}

impl Media for LivePhoto {
    type Subtype = LivePhotoSubtype;

    const KIND: MediaKind = MediaKind::LivePhoto;

    fn from_asset(asset: AssetRef) -> Self {
        Self { asset }
    }

    fn asset(&self) -> &AssetRef {
        &self.asset
    }
}

impl Resolve for LivePhoto {
    fn resolve(handle: AssetHandle) -> Option<Self> {
        resolve(handle)
    }
}

/// The two halves of a live photo to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivePhotoData {
    pub still_image: Vec<u8>,
    /// Staged movie file. The library takes ownership of it on save.
    pub movie: PathBuf,
}

impl LivePhoto {
    /// Change request that pairs the still image with the movie file.
    pub fn creation_request(data: LivePhotoData) -> Result<AssetChangeRequest> {
        if data.still_image.is_empty() {
            return Err(MediaError::invalid("still image data must not be empty"));
        }
        if VideoFileType::from_path(&data.movie).is_none() {
            return Err(MediaError::invalid(format!(
                "unsupported paired movie file: {}",
                data.movie.display()
            )));
        }
        Ok(AssetChangeRequest::Create {
            resources: vec![
                AssetResource {
                    kind: ResourceKind::Photo,
                    source: ResourceSource::Data(data.still_image),
                },
                AssetResource {
                    kind: ResourceKind::PairedVideo,
                    source: ResourceSource::File {
                        path: data.movie,
                        move_file: true,
                    },
                },
            ],
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LivePhotoSubtype {
    Live,
}

impl MediaSubtype for LivePhotoSubtype {
    fn native(self) -> NativeSubtypes {
        match self {
            Self::Live => NativeSubtypes::PHOTO_LIVE,
        }
    }
}

impl fmt::Display for LivePhotoSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => f.write_str("live"),
        }
    }
}

impl FromStr for LivePhotoSubtype {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "live" => Ok(Self::Live),
            _ => Err(MediaError::invalid(format!(
                "unknown live photo subtype: {s}"
            ))),
        }
    }
}
