//! In-process asset store backed by a serializable library snapshot.
//!
//! Used as the test double for the core and as the backing store of the CLI.
//! It never touches the file system: file resources of create requests are
//! recorded by path only.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::{
    AlbumChangeRequest, AssetChangeRequest, AssetResource, AssetStore, ContentMode,
    RepresentationDelivery, RepresentationOptions, RepresentationStream, ResourceKind,
    StoreError, TargetSize,
};
use crate::album::AlbumHandle;
use crate::asset::{AssetHandle, NativeMediaType, NativeSubtypes, SourceType};
use crate::error::{MediaError, Result};
use crate::query::Query;

/// Album plus the identifiers of its members, in membership order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumRecord {
    #[serde(flatten)]
    pub album: AlbumHandle,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Serializable content of a library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub assets: Vec<AssetHandle>,
    #[serde(default)]
    pub albums: Vec<AlbumRecord>,
}

impl LibrarySnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MediaError::SerializationError(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| MediaError::SerializationError(e.to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    assets: RwLock<Vec<AssetHandle>>,
    albums: RwLock<Vec<AlbumRecord>>,
    fetch_count: AtomicUsize,
    /// Errors returned by the next commits, oldest first.
    commit_failures: Mutex<VecDeque<StoreError>>,
    /// Asset identifier -> deliveries replayed for representation requests
    scripted: DashMap<String, Vec<RepresentationDelivery>>,
    fetch_delay: Option<Duration>,
    delivery_interval: Option<Duration>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LibrarySnapshot) -> Self {
        Self {
            assets: RwLock::new(snapshot.assets),
            albums: RwLock::new(snapshot.albums),
            ..Self::default()
        }
    }

    /// Block every fetch for `delay` before it runs.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Wait `interval` before each representation delivery.
    pub fn with_delivery_interval(mut self, interval: Duration) -> Self {
        self.delivery_interval = Some(interval);
        self
    }

    /// Current content of the library.
    pub fn snapshot(&self) -> LibrarySnapshot {
        LibrarySnapshot {
            assets: self.assets.read().clone(),
            albums: self.albums.read().clone(),
        }
    }

    /// Add or replace an asset.
    pub fn insert(&self, handle: AssetHandle) {
        let mut assets = self.assets.write();
        match assets.iter_mut().find(|a| a.identifier == handle.identifier) {
            Some(existing) => *existing = handle,
            None => assets.push(handle),
        }
    }

    pub fn insert_album(&self, record: AlbumRecord) {
        self.albums.write().push(record);
    }

    /// Number of fetches executed so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Make the next commit fail with `error` without applying anything.
    pub fn fail_next_commit(&self, error: StoreError) {
        self.commit_failures.lock().push_back(error);
    }

    /// Replay `deliveries` for every representation request of `identifier`.
    pub fn script_representation(
        &self,
        identifier: impl Into<String>,
        deliveries: Vec<RepresentationDelivery>,
    ) {
        self.scripted.insert(identifier.into(), deliveries);
    }

    fn begin_fetch(&self) {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            std::thread::sleep(delay);
        }
    }

    fn take_failure(&self) -> Option<StoreError> {
        self.commit_failures.lock().pop_front()
    }

    fn album_view(record: &AlbumRecord) -> AlbumHandle {
        let mut album = record.album.clone();
        album.estimated_asset_count = Some(record.members.len());
        album
    }

    fn create_asset(&self, resources: &[AssetResource]) -> std::result::Result<AssetHandle, StoreError> {
        let has = |kind: ResourceKind| resources.iter().any(|r| r.kind == kind);
        let (media_type, subtypes) = if has(ResourceKind::Photo) && has(ResourceKind::PairedVideo) {
            (NativeMediaType::Image, NativeSubtypes::PHOTO_LIVE)
        } else if has(ResourceKind::Photo) {
            (NativeMediaType::Image, NativeSubtypes::empty())
        } else if has(ResourceKind::Video) {
            (NativeMediaType::Video, NativeSubtypes::empty())
        } else if has(ResourceKind::Audio) {
            (NativeMediaType::Audio, NativeSubtypes::empty())
        } else {
            return Err(StoreError::Other(
                "create request has no primary resource".to_string(),
            ));
        };

        let now = Utc::now();
        let handle = AssetHandle::new(Uuid::new_v4().to_string(), media_type)
            .with_subtypes(subtypes)
            .created_at(now)
            .modified_at(now);
        self.assets.write().push(handle.clone());
        Ok(handle)
    }

    fn set_favorite(
        &self,
        identifier: &str,
        favorite: bool,
    ) -> std::result::Result<AssetHandle, StoreError> {
        let mut assets = self.assets.write();
        let asset = assets
            .iter_mut()
            .find(|a| a.identifier == identifier)
            .ok_or_else(|| StoreError::NotFound(identifier.to_string()))?;
        asset.is_favorite = favorite;
        asset.modification_date = Some(Utc::now());
        Ok(asset.clone())
    }

    fn change_membership(
        &self,
        album: &str,
        assets: &[String],
        add: bool,
    ) -> std::result::Result<AlbumHandle, StoreError> {
        let known = self.assets.read();
        if let Some(missing) = assets
            .iter()
            .find(|id| !known.iter().any(|a| &a.identifier == *id))
        {
            return Err(StoreError::NotFound(missing.clone()));
        }
        drop(known);

        let mut albums = self.albums.write();
        let record = albums
            .iter_mut()
            .find(|r| r.album.identifier == album)
            .ok_or_else(|| StoreError::NotFound(album.to_string()))?;
        if add {
            for id in assets {
                if !record.members.contains(id) {
                    record.members.push(id.clone());
                }
            }
        } else {
            record.members.retain(|id| !assets.contains(id));
        }
        Ok(Self::album_view(record))
    }

    fn render(handle: &AssetHandle, size: TargetSize, mode: ContentMode) -> Vec<u8> {
        format!(
            "{}:{}x{}:{:?}",
            handle.identifier, size.width, size.height, mode
        )
        .into_bytes()
    }
}

#[async_trait]
impl AssetStore for InMemoryStore {
    fn fetch(&self, query: &Query) -> Vec<AssetHandle> {
        self.begin_fetch();
        query.select(self.assets.read().iter().cloned())
    }

    fn fetch_by_identifier(&self, identifier: &str) -> Option<AssetHandle> {
        self.assets
            .read()
            .iter()
            .find(|a| a.identifier == identifier)
            .cloned()
    }

    fn fetch_albums(&self, query: &Query) -> Vec<AlbumHandle> {
        self.begin_fetch();
        query.select(self.albums.read().iter().map(Self::album_view))
    }

    fn fetch_album_assets(&self, album: &str, query: &Query) -> Vec<AssetHandle> {
        self.begin_fetch();
        let members = match self.albums.read().iter().find(|r| r.album.identifier == album) {
            Some(record) => record.members.clone(),
            None => return Vec::new(),
        };
        let assets = self.assets.read();
        let candidates = members
            .iter()
            .filter_map(|id| assets.iter().find(|a| &a.identifier == id).cloned());
        query.select(candidates)
    }

    async fn commit(&self, request: AssetChangeRequest) -> std::result::Result<AssetHandle, StoreError> {
        tokio::task::yield_now().await;
        if let Some(error) = self.take_failure() {
            debug!(%error, "Rejecting asset change request");
            return Err(error);
        }

        let result = match &request {
            AssetChangeRequest::Create { resources } => self.create_asset(resources),
            AssetChangeRequest::SetFavorite {
                identifier,
                favorite,
            } => self.set_favorite(identifier, *favorite),
        };
        if let Ok(handle) = &result {
            debug!(identifier = %handle.identifier, "Applied asset change request");
        }
        result
    }

    async fn commit_album(
        &self,
        request: AlbumChangeRequest,
    ) -> std::result::Result<AlbumHandle, StoreError> {
        tokio::task::yield_now().await;
        if let Some(error) = self.take_failure() {
            debug!(%error, "Rejecting album change request");
            return Err(error);
        }

        match request {
            AlbumChangeRequest::Create { title } => {
                let record = AlbumRecord {
                    album: AlbumHandle::new(Uuid::new_v4().to_string(), title),
                    members: Vec::new(),
                };
                let album = Self::album_view(&record);
                self.albums.write().push(record);
                Ok(album)
            }
            AlbumChangeRequest::AddAssets { album, assets } => {
                self.change_membership(&album, &assets, true)
            }
            AlbumChangeRequest::RemoveAssets { album, assets } => {
                self.change_membership(&album, &assets, false)
            }
        }
    }

    fn request_representation(
        &self,
        handle: &AssetHandle,
        size: TargetSize,
        mode: ContentMode,
        options: RepresentationOptions,
    ) -> RepresentationStream {
        let deliveries =
            if !options.network_access_allowed && handle.source_type == SourceType::CloudShared {
                vec![RepresentationDelivery::failed(
                    StoreError::Network(format!(
                        "{} is cloud-backed and network access is not allowed",
                        handle.identifier
                    )),
                    None,
                )]
            } else if let Some(scripted) = self.scripted.get(&handle.identifier) {
                scripted.value().clone()
            } else {
                vec![RepresentationDelivery::complete(Self::render(
                    handle, size, mode,
                ))]
            };

        let (tx, rx) = mpsc::unbounded_channel();
        let interval = self.delivery_interval;
        tokio::spawn(async move {
            for delivery in deliveries {
                match interval {
                    Some(interval) => tokio::time::sleep(interval).await,
                    None => tokio::task::yield_now().await,
                }
                if tx.send(delivery).is_err() {
                    break;
                }
            }
        });
        rx
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("assets", &self.assets.read().len())
            .field("albums", &self.albums.read().len())
            .field("fetch_count", &self.fetch_count())
            .finish()
    }
}
