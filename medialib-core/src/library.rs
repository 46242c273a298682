//! Entry point tying the store, configuration and pipelines together.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::album::{Album, AlbumFilter, AlbumType};
use crate::asset::AssetHandle;
use crate::config::LibraryConfig;
use crate::error::{MediaError, Result};
use crate::fetch::{FetchAlbums, FetchAsset, FetchAssets};
use crate::filter::{Filter, MediaSubtype};
use crate::kind::MediaKind;
use crate::media::{
    resolve_kind, AnyMedia, Audio, LivePhoto, Media, Photo, PhotoSubtype, Resolve, Video,
    VideoSubtype,
};
use crate::mutation::MutationPipeline;
use crate::query::Query;
use crate::representation::{
    display_representation, Displayable, Representation, RepresentationRequest,
};
use crate::sort::{AlbumSortKey, AssetSortKey, Sort};
use crate::store::{AssetStore, ContentMode, RepresentationOptions, TargetSize};

/// Typed access to one media library.
#[derive(Clone)]
pub struct MediaLibrary {
    store: Arc<dyn AssetStore>,
    config: LibraryConfig,
    mutations: MutationPipeline,
}

impl MediaLibrary {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self::with_config(store, LibraryConfig::default())
    }

    pub fn with_config(store: Arc<dyn AssetStore>, config: LibraryConfig) -> Self {
        Self {
            mutations: MutationPipeline::new(Arc::clone(&store)),
            store,
            config,
        }
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    pub fn mutations(&self) -> &MutationPipeline {
        &self.mutations
    }

    /// Declare a collection of `M`. Nothing is fetched until it is read.
    pub fn fetch_assets<M: Media + Resolve>(
        &self,
        filters: &[Filter<M::Subtype>],
        sorts: &[Sort<AssetSortKey>],
    ) -> Result<FetchAssets<M>> {
        let query = Query::compile(filters, sorts, M::KIND)?.with_config(&self.config)?;
        Ok(FetchAssets::new(Arc::clone(&self.store), query))
    }

    /// Declare a single `M`: the first match of the filters.
    pub fn fetch_asset<M: Media + Resolve>(
        &self,
        filters: &[Filter<M::Subtype>],
        sorts: &[Sort<AssetSortKey>],
    ) -> Result<FetchAsset<M>> {
        let query = Query::compile(filters, sorts, M::KIND)?.with_config(&self.config)?;
        Ok(FetchAsset::new(Arc::clone(&self.store), query))
    }

    /// Declare a mixed-kind scan; handles of no known kind are skipped.
    pub fn fetch_media<S: MediaSubtype>(
        &self,
        filters: &[Filter<S>],
        sorts: &[Sort<AssetSortKey>],
    ) -> Result<FetchAssets<AnyMedia>> {
        let query = Query::compile_mixed(filters, sorts)?.with_config(&self.config)?;
        Ok(FetchAssets::new(Arc::clone(&self.store), query))
    }

    /// Look up one asset of kind `M`.
    ///
    /// `None` when no asset has the identifier, it is of another kind, or it
    /// is hidden and the config leaves hidden assets out.
    #[instrument(level = "debug", skip(self), fields(kind = %M::KIND))]
    pub fn with_identifier<M: Media + Resolve>(&self, identifier: &str) -> Result<Option<M>> {
        let media = self.lookup(identifier)?.and_then(crate::media::resolve::<M>);
        debug!(found = media.is_some(), "Identifier lookup");
        Ok(media)
    }

    /// Look up one asset of any kind.
    #[instrument(level = "debug", skip(self))]
    pub fn media_with_identifier(&self, identifier: &str) -> Result<Option<AnyMedia>> {
        Ok(self.lookup(identifier)?.and_then(AnyMedia::resolve))
    }

    /// Look up one asset and resolve it as `kind`.
    pub fn resolve_with_identifier(
        &self,
        identifier: &str,
        kind: MediaKind,
    ) -> Result<Option<AnyMedia>> {
        Ok(self
            .lookup(identifier)?
            .and_then(|handle| resolve_kind(handle, kind)))
    }

    /// Hidden assets are only visible when the config includes them.
    fn lookup(&self, identifier: &str) -> Result<Option<AssetHandle>> {
        if identifier.is_empty() {
            return Err(MediaError::invalid("identifier must not be empty"));
        }
        Ok(self
            .store
            .fetch_by_identifier(identifier)
            .filter(|handle| self.config.include_hidden_assets || !handle.is_hidden))
    }

    /// Declare a collection of albums.
    pub fn fetch_albums(
        &self,
        album_type: Option<AlbumType>,
        filters: &[AlbumFilter],
        sorts: &[Sort<AlbumSortKey>],
    ) -> Result<FetchAlbums> {
        let query = Query::compile_albums(album_type, filters, sorts)?
            .including_hidden(self.config.include_hidden_assets);
        Ok(FetchAlbums::new(Arc::clone(&self.store), query))
    }

    /// Look up one album of any type, smart albums included.
    #[instrument(level = "debug", skip(self))]
    pub fn album_with_identifier(&self, identifier: &str) -> Result<Option<Album>> {
        let predicate = AlbumFilter::ByIdentifier(identifier.to_string()).compile()?;
        let query =
            Query::new(predicate, Vec::new()).including_hidden(self.config.include_hidden_assets);
        let album = self.store.fetch_albums(&query).into_iter().next().map(|handle| {
            Album::new(
                handle,
                Arc::clone(&self.store),
                self.config.include_hidden_assets,
            )
        });
        Ok(album)
    }

    fn newest_first() -> [Sort<AssetSortKey>; 1] {
        [Sort::descending(AssetSortKey::CreationDate)]
    }

    pub fn photos(&self) -> Result<FetchAssets<Photo>> {
        self.fetch_assets(&[], &Self::newest_first())
    }

    pub fn photos_with_subtype(&self, subtype: PhotoSubtype) -> Result<FetchAssets<Photo>> {
        self.fetch_assets(&[Filter::subtypes([subtype])], &Self::newest_first())
    }

    pub fn videos(&self) -> Result<FetchAssets<Video>> {
        self.fetch_assets(&[], &Self::newest_first())
    }

    pub fn videos_with_subtype(&self, subtype: VideoSubtype) -> Result<FetchAssets<Video>> {
        self.fetch_assets(&[Filter::subtypes([subtype])], &Self::newest_first())
    }

    pub fn audios(&self) -> Result<FetchAssets<Audio>> {
        self.fetch_assets(&[], &Self::newest_first())
    }

    pub fn live_photos(&self) -> Result<FetchAssets<LivePhoto>> {
        self.fetch_assets(&[], &Self::newest_first())
    }

    fn representation_options(&self) -> RepresentationOptions {
        RepresentationOptions {
            network_access_allowed: self.config.network_access_allowed,
        }
    }

    /// Render `media` and wait for the terminal result.
    pub async fn display_representation<M: Displayable>(
        &self,
        media: &M,
        size: TargetSize,
        mode: ContentMode,
    ) -> Result<Representation> {
        display_representation(
            self.store.as_ref(),
            media,
            size,
            mode,
            self.representation_options(),
        )
        .await
    }

    /// Render `media` in the background and hand the terminal result to
    /// `completion`, unless the returned request is cancelled or dropped first.
    #[must_use = "dropping the request cancels it before the completion runs"]
    pub fn request_representation<M, F>(
        &self,
        media: &M,
        size: TargetSize,
        mode: ContentMode,
        completion: F,
    ) -> RepresentationRequest
    where
        M: Displayable,
        F: FnOnce(Result<Representation>) + Send + 'static,
    {
        let handle = media.asset().snapshot();
        let stream =
            self.store
                .request_representation(&handle, size, mode, self.representation_options());
        RepresentationRequest::spawn(stream, completion)
    }
}

impl std::fmt::Debug for MediaLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaLibrary")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
