//! Compiled queries.

use tracing::{debug, instrument};

use crate::album::{AlbumFilter, AlbumType, CollectionType};
use crate::config::LibraryConfig;
use crate::error::{MediaError, Result};
use crate::filter::{compile_filters, Filter, MediaSubtype};
use crate::kind::MediaKind;
use crate::predicate::{Field, Predicate, PredicateTarget, Value};
use crate::sort::{
    apply_ordering, compile_sorts, require_ordering, AlbumSortKey, Sort, SortDescriptor, SortKey,
};

/// A compiled, reusable query: native predicate plus native ordering.
///
/// Holds no reference to any asset and can be executed any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub predicate: Predicate,
    pub ordering: Vec<SortDescriptor>,
    /// Whether hidden assets take part in the result.
    pub include_hidden: bool,
    pub fetch_limit: Option<usize>,
}

impl Query {
    pub fn new(predicate: Predicate, ordering: Vec<SortDescriptor>) -> Self {
        Self {
            predicate,
            ordering,
            include_hidden: false,
            fetch_limit: None,
        }
    }

    /// Everything, in the store's natural order.
    pub fn all() -> Self {
        Self::new(Predicate::True, Vec::new())
    }

    /// Compile a filter set and sort set for one media kind.
    ///
    /// The kind's type and subtype constraint always comes first, so the query
    /// can only ever match handles of `kind`. Filters follow in the given
    /// order, all AND-combined.
    #[instrument(level = "debug", skip_all, fields(kind = %kind, filters = filters.len()))]
    pub fn compile<S: MediaSubtype, K: SortKey>(
        filters: &[Filter<S>],
        sorts: &[Sort<K>],
        kind: MediaKind,
    ) -> Result<Self> {
        let mut terms = vec![kind.constraint()];
        terms.extend(compile_filters(filters)?);

        let query = Self::new(Predicate::all(terms), compile_sorts(sorts));
        debug!(predicate = %query.predicate, "Compiled query");
        Ok(query)
    }

    /// Compile a filter set without a kind constraint, for mixed-kind scans.
    #[instrument(level = "debug", skip_all, fields(filters = filters.len()))]
    pub fn compile_mixed<S: MediaSubtype, K: SortKey>(
        filters: &[Filter<S>],
        sorts: &[Sort<K>],
    ) -> Result<Self> {
        let query = Self::new(
            Predicate::all(compile_filters(filters)?),
            compile_sorts(sorts),
        );
        debug!(predicate = %query.predicate, "Compiled mixed-kind query");
        Ok(query)
    }

    /// Compile an album fetch.
    ///
    /// Without an album type only regular (non-smart) albums are selected.
    /// `localizedTitle` ascending is appended as the final key unless the
    /// caller already sorts by title.
    #[instrument(level = "debug", skip_all, fields(album_type = ?album_type, filters = filters.len()))]
    pub fn compile_albums(
        album_type: Option<AlbumType>,
        filters: &[AlbumFilter],
        sorts: &[Sort<AlbumSortKey>],
    ) -> Result<Self> {
        let mut terms = vec![match album_type {
            Some(album_type) => album_type.constraint(),
            None => Predicate::equals(Field::CollectionType, CollectionType::Album.raw_value()),
        }];
        for filter in filters {
            terms.push(filter.compile()?);
        }

        let mut sorts = sorts.to_vec();
        if !sorts.iter().any(|s| s.key == AlbumSortKey::LocalizedTitle) {
            sorts.push(Sort::ascending(AlbumSortKey::LocalizedTitle));
        }

        let query = Self::new(Predicate::all(terms), compile_sorts(&sorts));
        debug!(predicate = %query.predicate, "Compiled album query");
        Ok(query)
    }

    pub fn including_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Truncate results to `limit` items.
    ///
    /// Truncating an unordered result is not reproducible, so the query must
    /// carry at least one sort descriptor.
    pub fn limited(mut self, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(MediaError::invalid("fetch limit must be positive"));
        }
        require_ordering(&self.ordering)?;
        self.fetch_limit = Some(limit);
        Ok(self)
    }

    /// Apply the library-wide fetch options.
    pub fn with_config(self, config: &LibraryConfig) -> Result<Self> {
        let query = self.including_hidden(config.include_hidden_assets);
        match config.fetch_limit {
            Some(limit) => query.limited(limit),
            None => Ok(query),
        }
    }

    pub fn matches<T: PredicateTarget + ?Sized>(&self, target: &T) -> bool {
        if !self.include_hidden && target.value(Field::IsHidden) == Some(Value::Bool(true)) {
            return false;
        }
        self.predicate.evaluate(target)
    }

    /// Run the query over `candidates` given in natural order.
    pub fn select<T: PredicateTarget>(&self, candidates: impl IntoIterator<Item = T>) -> Vec<T> {
        let mut selected: Vec<T> = candidates
            .into_iter()
            .filter(|candidate| self.matches(candidate))
            .collect();
        apply_ordering(&self.ordering, &mut selected);
        if let Some(limit) = self.fetch_limit {
            selected.truncate(limit);
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetHandle, NativeMediaType, NativeSubtypes};
    use crate::sort::AssetSortKey;
    use chrono::{TimeZone, Utc};

    fn library() -> Vec<AssetHandle> {
        let day = |d| Utc.with_ymd_and_hms(2024, 5, d, 10, 0, 0).unwrap();
        vec![
            AssetHandle::new("plain", NativeMediaType::Image).created_at(day(1)),
            AssetHandle::new("live", NativeMediaType::Image)
                .with_subtypes(NativeSubtypes::PHOTO_LIVE)
                .created_at(day(2)),
            AssetHandle::new("hdr", NativeMediaType::Image)
                .with_subtypes(NativeSubtypes::PHOTO_HDR)
                .favorite(true)
                .created_at(day(3)),
            AssetHandle::new("clip", NativeMediaType::Video).created_at(day(4)),
            AssetHandle::new("secret", NativeMediaType::Image)
                .hidden(true)
                .created_at(day(5)),
        ]
    }

    fn ids(items: &[AssetHandle]) -> Vec<&str> {
        items.iter().map(|h| h.identifier.as_str()).collect()
    }

    #[test]
    fn test_kind_constraint_comes_first() {
        let query = Query::compile(
            &[Filter::<NativeSubtypes>::identifier("X")],
            &[] as &[Sort<AssetSortKey>],
            MediaKind::Video,
        )
        .unwrap();
        assert_eq!(
            query.predicate.to_string(),
            "mediaType == 2 AND localIdentifier == \"X\""
        );
    }

    #[test]
    fn test_kind_constraint_prevents_wrong_kind() {
        let query = Query::compile(
            &[Filter::<NativeSubtypes>::ByMediaType(MediaKind::Photo)],
            &[] as &[Sort<AssetSortKey>],
            MediaKind::Photo,
        )
        .unwrap();
        assert_eq!(ids(&query.select(library())), ["plain", "hdr"]);
    }

    #[test]
    fn test_live_photo_scenario() {
        let filters = [
            Filter::ByMediaType(MediaKind::Photo),
            Filter::subtypes([NativeSubtypes::PHOTO_LIVE]),
        ];
        let query = Query::compile_mixed(&filters, &[] as &[Sort<AssetSortKey>]).unwrap();
        assert_eq!(ids(&query.select(library())), ["live"]);
    }

    #[test]
    fn test_dropping_a_filter_never_narrows() {
        let filters = vec![
            Filter::ByMediaType(MediaKind::Photo),
            Filter::subtypes([NativeSubtypes::PHOTO_HDR, NativeSubtypes::PHOTO_LIVE]),
            Filter::Custom(Predicate::equals(Field::IsFavorite, true)),
        ];
        let sorts: &[Sort<AssetSortKey>] = &[];
        let full = Query::compile_mixed(&filters, sorts).unwrap().select(library());

        for skip in 0..filters.len() {
            let reduced: Vec<_> = filters
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, f)| f.clone())
                .collect();
            let broader = Query::compile_mixed(&reduced, sorts).unwrap().select(library());
            for handle in &full {
                assert!(broader.contains(handle), "dropping filter {skip} lost {handle:?}");
            }
        }
    }

    #[test]
    fn test_hidden_assets_are_excluded_unless_requested() {
        let query = Query::compile(
            &[] as &[Filter<NativeSubtypes>],
            &[Sort::descending(AssetSortKey::CreationDate)],
            MediaKind::Photo,
        )
        .unwrap();
        assert_eq!(ids(&query.select(library())), ["hdr", "plain"]);

        let query = query.including_hidden(true);
        assert_eq!(ids(&query.select(library())), ["secret", "hdr", "plain"]);
    }

    #[test]
    fn test_limit_requires_ordering() {
        let unordered = Query::all();
        assert!(matches!(
            unordered.clone().limited(2),
            Err(MediaError::InvalidArgument(_))
        ));

        let ordered = Query::new(
            Predicate::True,
            compile_sorts(&[Sort::ascending(AssetSortKey::CreationDate)]),
        )
        .limited(2)
        .unwrap();
        assert_eq!(ids(&ordered.select(library())), ["plain", "live"]);
    }

    #[test]
    fn test_with_config() {
        let config = LibraryConfig {
            include_hidden_assets: true,
            fetch_limit: Some(1),
            ..LibraryConfig::default()
        };
        let query = Query::new(
            Predicate::True,
            compile_sorts(&[Sort::descending(AssetSortKey::CreationDate)]),
        )
        .with_config(&config)
        .unwrap();
        assert_eq!(ids(&query.select(library())), ["secret"]);

        assert!(Query::all().with_config(&config).is_err());
    }

    #[test]
    fn test_album_query_appends_title_tie_breaker() {
        let query = Query::compile_albums(
            Some(AlbumType::User),
            &[],
            &[Sort::descending(AlbumSortKey::StartDate)],
        )
        .unwrap();
        assert_eq!(
            query.ordering,
            vec![
                SortDescriptor {
                    field: Field::StartDate,
                    ascending: false
                },
                SortDescriptor {
                    field: Field::LocalizedTitle,
                    ascending: true
                },
            ]
        );

        let by_title = Query::compile_albums(
            None,
            &[],
            &[Sort::descending(AlbumSortKey::LocalizedTitle)],
        )
        .unwrap();
        assert_eq!(by_title.ordering.len(), 1);
        assert!(!by_title.ordering[0].ascending);
        assert_eq!(by_title.predicate.to_string(), "assetCollectionType == 1");
    }

    #[test]
    fn test_album_query_rejects_invalid_filter() {
        let result = Query::compile_albums(None, &[AlbumFilter::ByIdentifier(String::new())], &[]);
        assert!(matches!(result, Err(MediaError::InvalidArgument(_))));
    }
}
