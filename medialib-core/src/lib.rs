//! Medialib Core - typed access to a platform media library
//!
//! This crate turns declarative filters and sort keys into native queries,
//! runs them against an [`AssetStore`], and hands back strongly typed media
//! objects. Mutations go through one uniform pipeline.
//!
//! # Features
//!
//! - Filters and sort keys compiled to a native predicate and ordering
//! - Photo, Video, Audio and LivePhoto resolved from shared native type tags
//! - Lazily evaluated collections that hit the store at most once
//! - Favorite, save and album mutations with store errors passed through unchanged
//! - Degraded representation results collapsed into one terminal callback
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use medialib_core::{
//!     AssetHandle, Filter, InMemoryStore, MediaLibrary, NativeMediaType, NativeSubtypes,
//!     Photo, Sort, AssetSortKey,
//! };
//!
//! # fn example() -> medialib_core::Result<()> {
//! let store = InMemoryStore::new();
//! store.insert(AssetHandle::new("plain", NativeMediaType::Image));
//! store.insert(
//!     AssetHandle::new("live", NativeMediaType::Image).with_subtypes(NativeSubtypes::PHOTO_LIVE),
//! );
//!
//! let library = MediaLibrary::new(Arc::new(store));
//! let photos = library.fetch_assets::<Photo>(
//!     &[Filter::identifier("plain")],
//!     &[Sort::descending(AssetSortKey::CreationDate)],
//! )?;
//!
//! // Live photos are their own kind and never show up here.
//! assert_eq!(photos.len(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod album;
pub mod asset;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod kind;
pub mod library;
pub mod media;
pub mod mutation;
pub mod predicate;
pub mod query;
pub mod representation;
pub mod sort;
pub mod store;

// Re-export main types for convenience
pub use album::{Album, AlbumFilter, AlbumHandle, AlbumType, CollectionSubtype, CollectionType};
pub use asset::{AssetHandle, Location, Metadata, NativeMediaType, NativeSubtypes, SourceType};
pub use config::LibraryConfig;
pub use error::{MediaError, Result};
pub use fetch::{CollectionState, FetchAlbums, FetchAsset, FetchAssets, LazyCollection};
pub use filter::{Filter, MediaSubtype};
pub use kind::MediaKind;
pub use library::MediaLibrary;
pub use media::{
    resolve, resolve_kind, AnyMedia, AssetBacked, AssetRef, Audio, AudioSubtype, LivePhoto,
    LivePhotoData, LivePhotoSubtype, Media, Photo, PhotoSubtype, Resolve, Video, VideoFileType,
    VideoSubtype,
};
pub use mutation::{MutationIntent, MutationPipeline};
pub use predicate::{Comparison, Field, Predicate, PredicateTarget, Value};
pub use query::Query;
pub use representation::{
    collect_representation, DegradedResultClassifier, Displayable, Fidelity, Representation,
    RepresentationRequest,
};
pub use sort::{AlbumSortKey, AssetSortKey, Sort, SortDescriptor, SortKey};
pub use store::{
    AlbumChangeRequest, AssetChangeRequest, AssetResource, AssetStore, ContentMode,
    RepresentationDelivery, RepresentationOptions, RepresentationStream, ResourceKind,
    ResourceSource, StoreError, TargetSize,
};

// In-memory store (test double and CLI backend)
#[cfg(feature = "memory-store")]
pub use store::{AlbumRecord, InMemoryStore, LibrarySnapshot};

#[cfg(all(test, feature = "memory-store"))]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    fn library() -> (Arc<InMemoryStore>, MediaLibrary) {
        let day = |d| Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.insert(AssetHandle::new("p1", NativeMediaType::Image).created_at(day(1)));
        store.insert(
            AssetHandle::new("p2", NativeMediaType::Image)
                .with_subtypes(NativeSubtypes::PHOTO_PANORAMA)
                .created_at(day(3)),
        );
        store.insert(
            AssetHandle::new("l1", NativeMediaType::Image)
                .with_subtypes(NativeSubtypes::PHOTO_LIVE)
                .created_at(day(2)),
        );
        store.insert(AssetHandle::new("v1", NativeMediaType::Video).created_at(day(4)));
        store.insert(AssetHandle::new("a1", NativeMediaType::Audio).created_at(day(5)));
        let library = MediaLibrary::new(store.clone());
        (store, library)
    }

    fn ids<M: Media>(items: &[M]) -> Vec<String> {
        items.iter().map(Media::identifier).collect()
    }

    /// Declare, fetch, favorite and re-declare through the public facade.
    #[tokio::test]
    async fn test_full_library_workflow() {
        let (store, library) = library();

        let photos = library.photos().expect("Failed to declare photos");
        assert!(!photos.is_evaluated());
        assert_eq!(ids(photos.get()), ["p2", "p1"]);

        let first = &photos.get()[1];
        library
            .mutations()
            .favorite(first, true)
            .await
            .expect("Favorite failed");
        assert!(first.metadata().is_favorite);

        let favorites = library
            .fetch_assets::<Photo>(
                &[Filter::Custom(Predicate::equals(Field::IsFavorite, true))],
                &[],
            )
            .unwrap();
        assert_eq!(ids(favorites.get()), ["p1"]);
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn test_presets() {
        let (_store, library) = library();
        assert_eq!(
            ids(library.photos_with_subtype(PhotoSubtype::Panorama).unwrap().get()),
            ["p2"]
        );
        assert_eq!(ids(library.live_photos().unwrap().get()), ["l1"]);
        assert_eq!(ids(library.videos().unwrap().get()), ["v1"]);
        assert_eq!(ids(library.audios().unwrap().get()), ["a1"]);
        assert!(library
            .videos_with_subtype(VideoSubtype::Timelapse)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_identifier_lookups() {
        let (_store, library) = library();
        assert!(library.with_identifier::<LivePhoto>("l1").unwrap().is_some());
        assert!(library.with_identifier::<Photo>("l1").unwrap().is_none());
        assert!(library.with_identifier::<Photo>("missing").unwrap().is_none());
        assert!(matches!(
            library.with_identifier::<Photo>(""),
            Err(MediaError::InvalidArgument(_))
        ));

        let any = library.media_with_identifier("v1").unwrap().unwrap();
        assert_eq!(any.kind(), MediaKind::Video);
        assert!(library
            .resolve_with_identifier("v1", MediaKind::Audio)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_identifier_lookups_respect_hidden() {
        let (store, library) = library();
        store.insert(AssetHandle::new("secret", NativeMediaType::Image).hidden(true));

        assert!(library.photos().unwrap().iter().all(|p| p.identifier() != "secret"));
        assert!(library.with_identifier::<Photo>("secret").unwrap().is_none());
        assert!(library.media_with_identifier("secret").unwrap().is_none());
        assert!(library
            .resolve_with_identifier("secret", MediaKind::Photo)
            .unwrap()
            .is_none());

        let config = LibraryConfig {
            include_hidden_assets: true,
            ..LibraryConfig::default()
        };
        let revealed = MediaLibrary::with_config(store, config);
        let photo = revealed.with_identifier::<Photo>("secret").unwrap().unwrap();
        assert!(photo.metadata().is_hidden);
        assert!(revealed.media_with_identifier("secret").unwrap().is_some());
    }
}
