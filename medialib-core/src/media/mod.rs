//! Typed domain objects and the resolver that builds them from raw handles.

mod audio;
mod live_photo;
mod photo;
mod video;

pub use audio::{Audio, AudioSubtype};
pub use live_photo::{LivePhoto, LivePhotoData, LivePhotoSubtype};
pub use photo::{Photo, PhotoSubtype};
pub use video::{Video, VideoFileType, VideoSubtype};

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::asset::{AssetHandle, Metadata};
use crate::filter::MediaSubtype;
use crate::kind::MediaKind;

/// The handle a domain object currently holds.
///
/// Clones of a domain object share it, so a successful mutation through one
/// clone is visible through all of them.
#[derive(Clone)]
pub struct AssetRef(Arc<ArcSwap<AssetHandle>>);

impl AssetRef {
    pub(crate) fn new(handle: AssetHandle) -> Self {
        Self(Arc::new(ArcSwap::from_pointee(handle)))
    }

    /// The currently held handle.
    pub fn snapshot(&self) -> Arc<AssetHandle> {
        self.0.load_full()
    }

    pub(crate) fn replace(&self, handle: AssetHandle) {
        self.0.store(Arc::new(handle));
    }
}

impl fmt::Debug for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AssetRef").field(&*self.0.load()).finish()
    }
}

/// A typed media object backed by one asset handle.
pub trait Media: Sized + Send + Sync + 'static {
    type Subtype: MediaSubtype;

    const KIND: MediaKind;

    /// Wraps an already validated handle. Use [`resolve`] instead.
    #[doc(hidden)]
    fn from_asset(asset: AssetRef) -> Self;

    fn asset(&self) -> &AssetRef;

    fn identifier(&self) -> String {
        self.asset().snapshot().identifier.clone()
    }

    /// Fresh copy of the metadata of the currently held handle.
    fn metadata(&self) -> Metadata {
        Metadata::from_handle(&self.asset().snapshot())
    }
}

/// Anything holding an asset handle of a known kind, typed or not.
pub trait AssetBacked {
    fn asset_ref(&self) -> &AssetRef;

    fn media_kind(&self) -> MediaKind;
}

impl<M: Media> AssetBacked for M {
    fn asset_ref(&self) -> &AssetRef {
        self.asset()
    }

    fn media_kind(&self) -> MediaKind {
        M::KIND
    }
}

impl AssetBacked for AnyMedia {
    fn asset_ref(&self) -> &AssetRef {
        self.asset()
    }

    fn media_kind(&self) -> MediaKind {
        self.kind()
    }
}

/// Types that can be built from a raw handle, or decline it.
pub trait Resolve: Sized {
    fn resolve(handle: AssetHandle) -> Option<Self>;
}

/// Build an `M` from `handle` if the handle is of kind `M::KIND`.
///
/// A mismatch is an ordinary outcome and yields `None`.
pub fn resolve<M: Media>(handle: AssetHandle) -> Option<M> {
    if M::KIND.matches(&handle) {
        Some(M::from_asset(AssetRef::new(handle)))
    } else {
        None
    }
}

/// Build the domain object for `kind` from `handle`.
pub fn resolve_kind(handle: AssetHandle, kind: MediaKind) -> Option<AnyMedia> {
    match kind {
        MediaKind::Photo => resolve::<Photo>(handle).map(AnyMedia::Photo),
        MediaKind::Video => resolve::<Video>(handle).map(AnyMedia::Video),
        MediaKind::Audio => resolve::<Audio>(handle).map(AnyMedia::Audio),
        MediaKind::LivePhoto => resolve::<LivePhoto>(handle).map(AnyMedia::LivePhoto),
    }
}

/// A domain object of any kind.
#[derive(Debug, Clone)]
pub enum AnyMedia {
    Photo(Photo),
    Video(Video),
    Audio(Audio),
    LivePhoto(LivePhoto),
}

impl AnyMedia {
    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Photo(_) => MediaKind::Photo,
            Self::Video(_) => MediaKind::Video,
            Self::Audio(_) => MediaKind::Audio,
            Self::LivePhoto(_) => MediaKind::LivePhoto,
        }
    }

    pub fn asset(&self) -> &AssetRef {
        match self {
            Self::Photo(m) => m.asset(),
            Self::Video(m) => m.asset(),
            Self::Audio(m) => m.asset(),
            Self::LivePhoto(m) => m.asset(),
        }
    }

    pub fn identifier(&self) -> String {
        self.asset().snapshot().identifier.clone()
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::from_handle(&self.asset().snapshot())
    }

    pub fn as_photo(&self) -> Option<&Photo> {
        match self {
            Self::Photo(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_video(&self) -> Option<&Video> {
        match self {
            Self::Video(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_audio(&self) -> Option<&Audio> {
        match self {
            Self::Audio(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_live_photo(&self) -> Option<&LivePhoto> {
        match self {
            Self::LivePhoto(m) => Some(m),
            _ => None,
        }
    }
}

impl Resolve for AnyMedia {
    fn resolve(handle: AssetHandle) -> Option<Self> {
        let kind = MediaKind::classify(&handle)?;
        resolve_kind(handle, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{NativeMediaType, NativeSubtypes};

    fn handles() -> Vec<(AssetHandle, Option<MediaKind>)> {
        vec![
            (
                AssetHandle::new("photo", NativeMediaType::Image),
                Some(MediaKind::Photo),
            ),
            (
                AssetHandle::new("screenshot", NativeMediaType::Image)
                    .with_subtypes(NativeSubtypes::PHOTO_SCREENSHOT),
                Some(MediaKind::Photo),
            ),
            (
                AssetHandle::new("live", NativeMediaType::Image)
                    .with_subtypes(NativeSubtypes::PHOTO_LIVE),
                Some(MediaKind::LivePhoto),
            ),
            (
                AssetHandle::new("video", NativeMediaType::Video)
                    .with_subtypes(NativeSubtypes::VIDEO_HIGH_FRAME_RATE),
                Some(MediaKind::Video),
            ),
            (
                AssetHandle::new("audio", NativeMediaType::Audio),
                Some(MediaKind::Audio),
            ),
            (AssetHandle::new("unknown", NativeMediaType::Unknown), None),
        ]
    }

    #[test]
    fn test_resolve_every_kind_pair() {
        for (handle, expected) in handles() {
            for kind in MediaKind::ALL {
                let resolved = resolve_kind(handle.clone(), kind);
                if Some(kind) == expected {
                    let media = resolved.expect("matching kind should resolve");
                    assert_eq!(media.kind(), kind);
                    assert_eq!(media.identifier(), handle.identifier);
                } else {
                    assert!(
                        resolved.is_none(),
                        "{} resolved as {kind}",
                        handle.identifier
                    );
                }
            }
        }
    }

    #[test]
    fn test_typed_resolve() {
        let live = AssetHandle::new("live", NativeMediaType::Image)
            .with_subtypes(NativeSubtypes::PHOTO_LIVE);
        assert!(resolve::<Photo>(live.clone()).is_none());
        let live_photo = resolve::<LivePhoto>(live).expect("live photo");
        assert_eq!(live_photo.identifier(), "live");
    }

    #[test]
    fn test_any_media_classifies() {
        for (handle, expected) in handles() {
            let resolved = AnyMedia::resolve(handle);
            assert_eq!(resolved.map(|m| m.kind()), expected);
        }
    }

    #[test]
    fn test_clones_share_the_held_handle() {
        let photo: Photo = resolve(AssetHandle::new("p", NativeMediaType::Image)).unwrap();
        let clone = photo.clone();
        let before = photo.metadata();

        photo
            .asset()
            .replace(AssetHandle::new("p", NativeMediaType::Image).favorite(true));

        assert!(clone.metadata().is_favorite);
        assert!(!before.is_favorite);
    }
}
