//! Mutation pipeline.
//!
//! Every mutation builds exactly one change request, commits it through the
//! store and reports the store's outcome unchanged. Validation happens while
//! building the request, before the store is touched. Nothing is retried.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::album::{Album, AlbumHandle};
use crate::asset::AssetHandle;
use crate::error::{MediaError, Result};
use crate::kind::MediaKind;
use crate::media::{resolve, AssetBacked, LivePhoto, LivePhotoData, Media, Photo, Video};
use crate::store::{AlbumChangeRequest, AssetChangeRequest, AssetStore};

/// What a mutation is meant to achieve, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    Create(MediaKind),
    Favorite { identifier: String, favorite: bool },
    CreateAlbum,
    AddToAlbum { album: String },
    RemoveFromAlbum { album: String },
}

impl fmt::Display for MutationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(kind) => write!(f, "create {kind}"),
            Self::Favorite {
                identifier,
                favorite: true,
            } => write!(f, "favorite {identifier}"),
            Self::Favorite {
                identifier,
                favorite: false,
            } => write!(f, "unfavorite {identifier}"),
            Self::CreateAlbum => f.write_str("create album"),
            Self::AddToAlbum { album } => write!(f, "add to album {album}"),
            Self::RemoveFromAlbum { album } => write!(f, "remove from album {album}"),
        }
    }
}

#[derive(Clone)]
pub struct MutationPipeline {
    store: Arc<dyn AssetStore>,
}

impl MutationPipeline {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    /// Build one change request and commit it.
    ///
    /// A build error is returned before the store is called. A store error is
    /// returned as [`MediaError::Store`] with the store's value unchanged.
    #[instrument(level = "debug", skip_all, fields(intent = %intent))]
    pub async fn mutate<F>(&self, intent: MutationIntent, build: F) -> Result<AssetHandle>
    where
        F: FnOnce() -> Result<AssetChangeRequest>,
    {
        let request = build()?;
        match self.store.commit(request).await {
            Ok(handle) => {
                debug!(identifier = %handle.identifier, "Change request committed");
                Ok(handle)
            }
            Err(e) => {
                warn!(error = %e, "Change request failed");
                Err(MediaError::Store(e))
            }
        }
    }

    #[instrument(level = "debug", skip_all, fields(intent = %intent))]
    pub async fn mutate_album<F>(&self, intent: MutationIntent, build: F) -> Result<AlbumHandle>
    where
        F: FnOnce() -> Result<AlbumChangeRequest>,
    {
        let request = build()?;
        match self.store.commit_album(request).await {
            Ok(album) => {
                debug!(album = %album.identifier, "Album change request committed");
                Ok(album)
            }
            Err(e) => {
                warn!(error = %e, "Album change request failed");
                Err(MediaError::Store(e))
            }
        }
    }

    /// Run [`mutate`](Self::mutate) in the background and hand the outcome
    /// to `completion` exactly once.
    ///
    /// The request is built before anything is spawned; a build error is
    /// returned directly and `completion` is never called.
    pub fn spawn_mutation<B, C>(
        &self,
        intent: MutationIntent,
        build: B,
        completion: C,
    ) -> Result<JoinHandle<()>>
    where
        B: FnOnce() -> Result<AssetChangeRequest>,
        C: FnOnce(Result<AssetHandle>) + Send + 'static,
    {
        let request = build()?;
        let pipeline = self.clone();
        Ok(tokio::spawn(async move {
            let result = pipeline.mutate(intent, move || Ok(request)).await;
            completion(result);
        }))
    }

    /// Set the favorite flag of `media`.
    ///
    /// On success `media`, and every clone of it, holds the store's
    /// post-change handle. On failure the held handle is left untouched.
    ///
    /// If the committed handle no longer resolves to the kind of `media`, the
    /// store has already applied the change but the call still fails with
    /// [`MediaError::UnexpectedKind`] and `media` keeps its stale metadata.
    /// Look the asset up again to observe it.
    pub async fn favorite<M: AssetBacked>(&self, media: &M, favorite: bool) -> Result<()> {
        let identifier = media.asset_ref().snapshot().identifier.clone();
        let intent = MutationIntent::Favorite {
            identifier: identifier.clone(),
            favorite,
        };
        let updated = self
            .mutate(intent, || {
                Ok(AssetChangeRequest::SetFavorite {
                    identifier,
                    favorite,
                })
            })
            .await?;

        let kind = media.media_kind();
        if !kind.matches(&updated) {
            return Err(MediaError::UnexpectedKind {
                identifier: updated.identifier,
                expected: kind,
            });
        }
        media.asset_ref().replace(updated);
        Ok(())
    }

    /// Commit a create request and resolve the new asset as `M`.
    pub async fn create<M, F>(&self, build: F) -> Result<M>
    where
        M: Media,
        F: FnOnce() -> Result<AssetChangeRequest>,
    {
        let handle = self.mutate(MutationIntent::Create(M::KIND), build).await?;
        let identifier = handle.identifier.clone();
        let media = resolve::<M>(handle).ok_or(MediaError::UnexpectedKind {
            identifier: identifier.clone(),
            expected: M::KIND,
        })?;
        info!(%identifier, kind = %M::KIND, "Saved new asset");
        Ok(media)
    }

    pub async fn save_photo(&self, image_data: Vec<u8>) -> Result<Photo> {
        self.create(|| Photo::creation_request(image_data)).await
    }

    pub async fn save_video(&self, path: &Path) -> Result<Video> {
        self.create(|| Video::creation_request(path)).await
    }

    pub async fn save_live_photo(&self, data: LivePhotoData) -> Result<LivePhoto> {
        self.create(|| LivePhoto::creation_request(data)).await
    }

    /// Create an empty user album.
    pub async fn create_album(&self, title: &str) -> Result<Album> {
        let handle = self
            .mutate_album(MutationIntent::CreateAlbum, || {
                if title.trim().is_empty() {
                    return Err(MediaError::invalid("album title must not be empty"));
                }
                Ok(AlbumChangeRequest::Create {
                    title: title.to_string(),
                })
            })
            .await?;
        info!(album = %handle.identifier, "Created album");
        Ok(Album::new(handle, Arc::clone(&self.store), false))
    }

    /// Add `media` to `album` and return a freshly declared album.
    ///
    /// `album` itself keeps its cached membership.
    pub async fn add_to_album<M: AssetBacked>(&self, album: &Album, media: &[M]) -> Result<Album> {
        let intent = MutationIntent::AddToAlbum {
            album: album.identifier().to_string(),
        };
        let handle = self
            .mutate_album(intent, || {
                Ok(AlbumChangeRequest::AddAssets {
                    album: album.identifier().to_string(),
                    assets: identifiers(media)?,
                })
            })
            .await?;
        Ok(self.redeclare(album, handle))
    }

    /// Remove `media` from `album` and return a freshly declared album.
    pub async fn remove_from_album<M: AssetBacked>(
        &self,
        album: &Album,
        media: &[M],
    ) -> Result<Album> {
        let intent = MutationIntent::RemoveFromAlbum {
            album: album.identifier().to_string(),
        };
        let handle = self
            .mutate_album(intent, || {
                Ok(AlbumChangeRequest::RemoveAssets {
                    album: album.identifier().to_string(),
                    assets: identifiers(media)?,
                })
            })
            .await?;
        Ok(self.redeclare(album, handle))
    }

    fn redeclare(&self, album: &Album, handle: AlbumHandle) -> Album {
        let include_hidden = album.media().query().include_hidden;
        Album::new(handle, Arc::clone(&self.store), include_hidden)
    }
}

fn identifiers<M: AssetBacked>(media: &[M]) -> Result<Vec<String>> {
    if media.is_empty() {
        return Err(MediaError::invalid("at least one asset is required"));
    }
    Ok(media
        .iter()
        .map(|m| m.asset_ref().snapshot().identifier.clone())
        .collect())
}

impl fmt::Debug for MutationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationPipeline").finish_non_exhaustive()
    }
}
