//! Boundary to the platform media library.
//!
//! The core never owns library state. Everything it reads or changes goes
//! through an [`AssetStore`]:
//!
//! - fetches run synchronously on the calling thread,
//! - commits and representation requests complete asynchronously,
//! - failures come back as [`StoreError`] and are handed to callers unchanged.
//!
//! The core never retries a store operation.

#[cfg(feature = "memory-store")]
mod memory;

#[cfg(feature = "memory-store")]
pub use memory::{AlbumRecord, InMemoryStore, LibrarySnapshot};

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::album::AlbumHandle;
use crate::asset::AssetHandle;
use crate::query::Query;

/// Failure reported by the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Access to the media library was denied")]
    PermissionDenied,

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Change request conflicted: {0}")]
    Conflict(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Store error: {0}")]
    Other(String),
}

/// Role of a resource inside a new asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Photo,
    Video,
    Audio,
    /// The movie half of a live photo.
    PairedVideo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    Data(Vec<u8>),
    /// A staged file; with `move_file` the store takes the file instead of copying it.
    File { path: PathBuf, move_file: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResource {
    pub kind: ResourceKind,
    pub source: ResourceSource,
}

/// One atomic asset mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetChangeRequest {
    Create { resources: Vec<AssetResource> },
    SetFavorite { identifier: String, favorite: bool },
}

/// One atomic album mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumChangeRequest {
    Create {
        title: String,
    },
    AddAssets {
        album: String,
        assets: Vec<String>,
    },
    RemoveAssets {
        album: String,
        assets: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentMode {
    #[default]
    AspectFit,
    AspectFill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepresentationOptions {
    pub network_access_allowed: bool,
}

impl Default for RepresentationOptions {
    fn default() -> Self {
        Self {
            network_access_allowed: true,
        }
    }
}

/// One callback's worth of a representation request.
///
/// A store may deliver several of these for a single request: interim
/// low-quality payloads first, then a final one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepresentationDelivery {
    pub payload: Option<Vec<u8>>,
    pub is_degraded: bool,
    /// No further deliveries follow.
    pub is_final: bool,
    pub error: Option<StoreError>,
}

impl RepresentationDelivery {
    /// Low-quality payload with more data to come.
    pub fn interim(payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
            is_degraded: true,
            is_final: false,
            error: None,
        }
    }

    /// Low-quality payload that is all the store will deliver.
    pub fn degraded_final(payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
            is_degraded: true,
            is_final: true,
            error: None,
        }
    }

    pub fn complete(payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
            is_degraded: false,
            is_final: true,
            error: None,
        }
    }

    pub fn failed(error: StoreError, payload: Option<Vec<u8>>) -> Self {
        Self {
            payload,
            is_degraded: false,
            is_final: true,
            error: Some(error),
        }
    }
}

/// Deliveries of one representation request, closed when the store is done.
pub type RepresentationStream = mpsc::UnboundedReceiver<RepresentationDelivery>;

/// The platform media library as the core sees it.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Execute `query` and return matching handles in query order.
    fn fetch(&self, query: &Query) -> Vec<AssetHandle>;

    fn fetch_by_identifier(&self, identifier: &str) -> Option<AssetHandle>;

    fn fetch_albums(&self, query: &Query) -> Vec<AlbumHandle>;

    /// Execute `query` against the members of one album.
    fn fetch_album_assets(&self, album: &str, query: &Query) -> Vec<AssetHandle>;

    /// Apply one asset change request and return the post-change handle.
    async fn commit(&self, request: AssetChangeRequest) -> Result<AssetHandle, StoreError>;

    /// Apply one album change request and return the post-change album.
    async fn commit_album(&self, request: AlbumChangeRequest) -> Result<AlbumHandle, StoreError>;

    /// Start rendering a representation of `handle`.
    ///
    /// Must be called from within a Tokio runtime.
    fn request_representation(
        &self,
        handle: &AssetHandle,
        size: TargetSize,
        mode: ContentMode,
        options: RepresentationOptions,
    ) -> RepresentationStream;
}
