use std::fmt;
use std::str::FromStr;

use super::{resolve, AssetRef, Media, Resolve};
use crate::asset::{AssetHandle, NativeSubtypes};
use crate::error::{MediaError, Result};
use crate::filter::MediaSubtype;
use crate::kind::MediaKind;
use crate::store::{AssetChangeRequest, AssetResource, ResourceKind, ResourceSource};

/// A still image. Live photos are a separate kind.
#[derive(Debug, Clone)]
pub struct Photo {
    asset: AssetRef,
}

impl Media for Photo {
    type Subtype = PhotoSubtype;

    const KIND: MediaKind = MediaKind::Photo;

    fn from_asset(asset: AssetRef) -> Self {
        Self { asset }
    }

    fn asset(&self) -> &AssetRef {
        &self.asset
    }
}

impl Resolve for Photo {
    fn resolve(handle: AssetHandle) -> Option<Self> {
        resolve(handle)
    }
}

impl Photo {
    /// Change request that adds `image_data` to the library as a new photo.
    pub fn creation_request(image_data: Vec<u8>) -> Result<AssetChangeRequest> {
        if image_data.is_empty() {
            return Err(MediaError::invalid("image data must not be empty"));
        }
        Ok(AssetChangeRequest::Create {
            resources: vec![AssetResource {
                kind: ResourceKind::Photo,
                source: ResourceSource::Data(image_data),
            }],
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoSubtype {
    Panorama,
    Hdr,
    Screenshot,
    DepthEffect,
}

impl PhotoSubtype {
    pub const ALL: [PhotoSubtype; 4] = [
        Self::Panorama,
        Self::Hdr,
        Self::Screenshot,
        Self::DepthEffect,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Panorama => "panorama",
            Self::Hdr => "hdr",
            Self::Screenshot => "screenshot",
            Self::DepthEffect => "depth-effect",
        }
    }
}

impl MediaSubtype for PhotoSubtype {
    fn native(self) -> NativeSubtypes {
        match self {
            Self::Panorama => NativeSubtypes::PHOTO_PANORAMA,
            Self::Hdr => NativeSubtypes::PHOTO_HDR,
            Self::Screenshot => NativeSubtypes::PHOTO_SCREENSHOT,
            Self::DepthEffect => NativeSubtypes::PHOTO_DEPTH_EFFECT,
        }
    }
}

impl fmt::Display for PhotoSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PhotoSubtype {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|subtype| subtype.name() == normalized)
            .ok_or_else(|| MediaError::invalid(format!("unknown photo subtype: {s}")))
    }
}
