//! Lazily evaluated fetch declarations.
//!
//! A declaration holds a compiled [`Query`] and runs it the first time its
//! contents are read. The result is memoized for the lifetime of the
//! declaration and never refreshed; declare a new collection to observe
//! library changes.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, instrument};

use crate::album::Album;
use crate::media::Resolve;
use crate::query::Query;
use crate::store::AssetStore;

/// Evaluation state of a lazy collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionState {
    Unevaluated,
    Evaluated(usize),
}

/// A sequence computed at most once, on first access.
///
/// Concurrent first accesses block on one another so the evaluation runs
/// exactly once; every later read is lock-free.
pub struct LazyCollection<T> {
    cell: OnceCell<Vec<T>>,
}

impl<T> LazyCollection<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn get_or_evaluate(&self, evaluate: impl FnOnce() -> Vec<T>) -> &[T] {
        self.cell.get_or_init(evaluate)
    }

    /// The contents, if already evaluated.
    pub fn get(&self) -> Option<&[T]> {
        self.cell.get().map(Vec::as_slice)
    }

    pub fn state(&self) -> CollectionState {
        match self.cell.get() {
            Some(items) => CollectionState::Evaluated(items.len()),
            None => CollectionState::Unevaluated,
        }
    }
}

impl<T> Default for LazyCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for LazyCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCollection")
            .field("state", &self.state())
            .finish()
    }
}

/// What a declaration fetches from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FetchScope {
    Library,
    Album(String),
}

/// Declared collection of assets resolved to `T`.
///
/// Handles that do not resolve to `T` are skipped.
pub struct FetchAssets<T> {
    store: Arc<dyn AssetStore>,
    scope: FetchScope,
    query: Query,
    items: LazyCollection<T>,
}

impl<T: Resolve> FetchAssets<T> {
    pub fn new(store: Arc<dyn AssetStore>, query: Query) -> Self {
        Self::scoped(store, FetchScope::Library, query)
    }

    pub(crate) fn scoped(store: Arc<dyn AssetStore>, scope: FetchScope, query: Query) -> Self {
        Self {
            store,
            scope,
            query,
            items: LazyCollection::new(),
        }
    }

    #[instrument(level = "debug", skip(self), fields(scope = ?self.scope, predicate = %self.query.predicate))]
    fn evaluate(&self) -> Vec<T> {
        let handles = match &self.scope {
            FetchScope::Library => self.store.fetch(&self.query),
            FetchScope::Album(album) => self.store.fetch_album_assets(album, &self.query),
        };
        let fetched = handles.len();
        let items: Vec<T> = handles.into_iter().filter_map(T::resolve).collect();
        debug!(fetched, resolved = items.len(), "Evaluated collection");
        items
    }

    /// The ordered contents, evaluating the query on first call.
    pub fn get(&self) -> &[T] {
        self.items.get_or_evaluate(|| self.evaluate())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.get().iter()
    }

    pub fn len(&self) -> usize {
        self.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.get().is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.get().first()
    }
}

impl<T> FetchAssets<T> {
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn state(&self) -> CollectionState {
        self.items.state()
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(self.state(), CollectionState::Evaluated(_))
    }
}

impl<'a, T: Resolve> IntoIterator for &'a FetchAssets<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> fmt::Debug for FetchAssets<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchAssets")
            .field("scope", &self.scope)
            .field("query", &self.query)
            .field("state", &self.items.state())
            .finish()
    }
}

/// Declared single asset: the first result of a query.
#[derive(Debug)]
pub struct FetchAsset<T> {
    inner: FetchAssets<T>,
}

impl<T: Resolve> FetchAsset<T> {
    pub fn new(store: Arc<dyn AssetStore>, query: Query) -> Self {
        Self {
            inner: FetchAssets::new(store, query),
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.inner.first()
    }

    pub fn query(&self) -> &Query {
        self.inner.query()
    }

    pub fn is_evaluated(&self) -> bool {
        self.inner.is_evaluated()
    }
}

/// Declared collection of albums.
///
/// Each album's membership honours the hidden-asset setting of the album
/// query.
pub struct FetchAlbums {
    store: Arc<dyn AssetStore>,
    query: Query,
    items: LazyCollection<Album>,
}

impl FetchAlbums {
    pub fn new(store: Arc<dyn AssetStore>, query: Query) -> Self {
        Self {
            store,
            query,
            items: LazyCollection::new(),
        }
    }

    #[instrument(level = "debug", skip(self), fields(predicate = %self.query.predicate))]
    fn evaluate(&self) -> Vec<Album> {
        let albums: Vec<Album> = self
            .store
            .fetch_albums(&self.query)
            .into_iter()
            .map(|handle| {
                Album::new(handle, Arc::clone(&self.store), self.query.include_hidden)
            })
            .collect();
        debug!(albums = albums.len(), "Evaluated album collection");
        albums
    }

    pub fn get(&self) -> &[Album] {
        self.items.get_or_evaluate(|| self.evaluate())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Album> {
        self.get().iter()
    }

    pub fn len(&self) -> usize {
        self.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.get().is_empty()
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn state(&self) -> CollectionState {
        self.items.state()
    }
}

impl<'a> IntoIterator for &'a FetchAlbums {
    type Item = &'a Album;
    type IntoIter = std::slice::Iter<'a, Album>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for FetchAlbums {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchAlbums")
            .field("query", &self.query)
            .field("state", &self.items.state())
            .finish()
    }
}


#[cfg(all(test, feature = "memory-store"))]
mod store_tests {
    use super::*;
    use std::time::Duration;

    use crate::asset::{AssetHandle, NativeMediaType, NativeSubtypes};
    use crate::filter::Filter;
    use crate::kind::MediaKind;
    use crate::media::{LivePhoto, Media, Photo};
    use crate::sort::{AssetSortKey, Sort};
    use crate::store::InMemoryStore;

    fn store() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new().with_fetch_delay(Duration::from_millis(50));
        store.insert(AssetHandle::new("plain", NativeMediaType::Image));
        store.insert(
            AssetHandle::new("live", NativeMediaType::Image)
                .with_subtypes(NativeSubtypes::PHOTO_LIVE),
        );
        store.insert(AssetHandle::new("clip", NativeMediaType::Video));
        Arc::new(store)
    }

    fn photo_query() -> Query {
        Query::compile(
            &[] as &[Filter<NativeSubtypes>],
            &[Sort::ascending(AssetSortKey::Identifier)],
            MediaKind::Photo,
        )
        .unwrap()
    }

    #[test]
    fn test_concurrent_first_access_fetches_once() {
        let store = store();
        let photos: FetchAssets<Photo> = FetchAssets::new(store.clone(), photo_query());

        let (left, right) = std::thread::scope(|scope| {
            let left = scope.spawn(|| photos.get());
            let right = scope.spawn(|| photos.get());
            (left.join().unwrap(), right.join().unwrap())
        });

        assert_eq!(store.fetch_count(), 1);
        assert!(std::ptr::eq(left, right));
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].identifier(), "plain");
    }

    #[test]
    fn test_no_automatic_invalidation() {
        let store = store();
        let photos: FetchAssets<Photo> = FetchAssets::new(store.clone(), photo_query());
        assert!(!photos.is_evaluated());
        assert_eq!(photos.len(), 1);

        store.insert(AssetHandle::new("new", NativeMediaType::Image));
        assert_eq!(photos.len(), 1);
        assert_eq!(store.fetch_count(), 1);

        let redeclared: FetchAssets<Photo> = FetchAssets::new(store.clone(), photo_query());
        assert_eq!(redeclared.len(), 2);
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn test_live_photo_scenario() {
        let query = Query::compile_mixed(
            &[
                Filter::ByMediaType(MediaKind::Photo),
                Filter::subtypes([NativeSubtypes::PHOTO_LIVE]),
            ],
            &[] as &[Sort<AssetSortKey>],
        )
        .unwrap();
        let live: FetchAssets<LivePhoto> = FetchAssets::new(store(), query.clone());
        assert_eq!(live.len(), 1);
        assert_eq!(live.get()[0].identifier(), "live");

        let photos: FetchAssets<Photo> = FetchAssets::new(store(), query);
        assert!(photos.is_empty());
    }

    #[test]
    fn test_fetch_asset_takes_first() {
        let single: FetchAsset<Photo> = FetchAsset::new(store(), photo_query());
        assert!(!single.is_evaluated());
        assert_eq!(single.get().map(|p| p.identifier()), Some("plain".to_string()));
        assert!(single.is_evaluated());
    }
}
