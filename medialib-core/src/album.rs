//! Albums: native collection handles, their classification, filters and the
//! domain object with lazily fetched membership.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MediaError, Result};
use crate::fetch::{FetchAssets, FetchScope};
use crate::media::{Audio, AnyMedia, LivePhoto, Photo, Video};
use crate::predicate::{Field, Predicate, PredicateTarget, Value};
use crate::query::Query;
use crate::sort::{compile_sorts, AssetSortKey, Sort};
use crate::store::AssetStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    #[default]
    Album,
    SmartAlbum,
}

impl CollectionType {
    pub fn raw_value(self) -> i64 {
        match self {
            Self::Album => 1,
            Self::SmartAlbum => 2,
        }
    }
}

/// Native collection subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionSubtype {
    #[default]
    Regular,
    SyncedEvent,
    SyncedFaces,
    SyncedAlbum,
    Imported,
    CloudShared,
    MyPhotoStream,
    SmartGeneric,
    SmartPanoramas,
    SmartVideos,
    SmartFavorites,
    SmartRecentlyAdded,
    SmartUserLibrary,
    SmartScreenshots,
    SmartLivePhotos,
}

impl CollectionSubtype {
    pub fn raw_value(self) -> i64 {
        match self {
            Self::Regular => 2,
            Self::SyncedEvent => 3,
            Self::SyncedFaces => 4,
            Self::SyncedAlbum => 5,
            Self::Imported => 6,
            Self::MyPhotoStream => 100,
            Self::CloudShared => 101,
            Self::SmartGeneric => 200,
            Self::SmartPanoramas => 201,
            Self::SmartVideos => 202,
            Self::SmartFavorites => 203,
            Self::SmartRecentlyAdded => 206,
            Self::SmartUserLibrary => 209,
            Self::SmartScreenshots => 211,
            Self::SmartLivePhotos => 213,
        }
    }
}

/// Reference to one library-managed collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumHandle {
    pub identifier: String,
    pub localized_title: String,
    #[serde(default)]
    pub collection_type: CollectionType,
    #[serde(default)]
    pub collection_subtype: CollectionSubtype,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_asset_count: Option<usize>,
}

impl AlbumHandle {
    pub fn new(identifier: impl Into<String>, localized_title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            localized_title: localized_title.into(),
            collection_type: CollectionType::Album,
            collection_subtype: CollectionSubtype::Regular,
            start_date: None,
            end_date: None,
            estimated_asset_count: None,
        }
    }

    pub fn with_subtype(mut self, subtype: CollectionSubtype) -> Self {
        self.collection_subtype = subtype;
        self.collection_type = if AlbumType::Smart.subtypes().contains(&subtype) {
            CollectionType::SmartAlbum
        } else {
            CollectionType::Album
        };
        self
    }

    pub fn with_dates(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }
}

impl PredicateTarget for AlbumHandle {
    fn value(&self, field: Field) -> Option<Value> {
        match field {
            Field::Identifier => Some(Value::Str(self.identifier.clone())),
            Field::LocalizedTitle => Some(Value::Str(self.localized_title.clone())),
            Field::CollectionType => Some(Value::Int(self.collection_type.raw_value())),
            Field::CollectionSubtype => Some(Value::Int(self.collection_subtype.raw_value())),
            Field::StartDate => self.start_date.map(Value::Date),
            Field::EndDate => self.end_date.map(Value::Date),
            Field::EstimatedAssetCount => self
                .estimated_asset_count
                .and_then(|count| i64::try_from(count).ok())
                .map(Value::Int),
            _ => None,
        }
    }
}

/// Album classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlbumType {
    /// Created or synced by the user.
    User,
    /// Shared through the cloud.
    Cloud,
    /// Maintained by the library itself.
    Smart,
}

impl AlbumType {
    pub const ALL: [AlbumType; 3] = [Self::User, Self::Cloud, Self::Smart];

    pub fn collection_type(self) -> CollectionType {
        match self {
            Self::User | Self::Cloud => CollectionType::Album,
            Self::Smart => CollectionType::SmartAlbum,
        }
    }

    pub fn subtypes(self) -> &'static [CollectionSubtype] {
        use CollectionSubtype::*;
        match self {
            Self::User => &[Regular, SyncedEvent, SyncedFaces, SyncedAlbum, Imported],
            Self::Cloud => &[CloudShared, MyPhotoStream],
            Self::Smart => &[
                SmartGeneric,
                SmartPanoramas,
                SmartVideos,
                SmartFavorites,
                SmartRecentlyAdded,
                SmartUserLibrary,
                SmartScreenshots,
                SmartLivePhotos,
            ],
        }
    }

    pub fn classify(handle: &AlbumHandle) -> Option<AlbumType> {
        Self::ALL.into_iter().find(|album_type| {
            album_type.collection_type() == handle.collection_type
                && album_type.subtypes().contains(&handle.collection_subtype)
        })
    }

    /// Native predicate selecting exactly the collections of this type.
    pub fn constraint(self) -> Predicate {
        Predicate::all([
            Predicate::equals(Field::CollectionType, self.collection_type().raw_value()),
            Predicate::one_of(
                Field::CollectionSubtype,
                self.subtypes().iter().map(|subtype| subtype.raw_value()),
            ),
        ])
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Cloud => "cloud",
            Self::Smart => "smart",
        }
    }
}

impl fmt::Display for AlbumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlbumType {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "cloud" => Ok(Self::Cloud),
            "smart" => Ok(Self::Smart),
            _ => Err(MediaError::invalid(format!("unknown album type: {s}"))),
        }
    }
}

/// One constraint on the albums to fetch. Filter sets are AND-combined.
#[derive(Debug, Clone, PartialEq)]
pub enum AlbumFilter {
    ByIdentifier(String),
    ByTitle(String),
    Custom(Predicate),
}

impl AlbumFilter {
    pub fn compile(&self) -> Result<Predicate> {
        match self {
            Self::ByIdentifier(identifier) if identifier.is_empty() => Err(MediaError::invalid(
                "album identifier filter must not be empty",
            )),
            Self::ByIdentifier(identifier) => {
                Ok(Predicate::equals(Field::Identifier, identifier.as_str()))
            }
            Self::ByTitle(title) if title.is_empty() => {
                Err(MediaError::invalid("album title filter must not be empty"))
            }
            Self::ByTitle(title) => Ok(Predicate::equals(Field::LocalizedTitle, title.as_str())),
            Self::Custom(predicate) => Ok(predicate.clone()),
        }
    }
}

/// An album with lazily fetched membership.
///
/// Membership is fetched once, ordered by creation date ascending, and kept
/// for the lifetime of this instance.
pub struct Album {
    handle: AlbumHandle,
    members: FetchAssets<AnyMedia>,
}

impl Album {
    pub(crate) fn new(handle: AlbumHandle, store: Arc<dyn AssetStore>, include_hidden: bool) -> Self {
        let query = Query::new(
            Predicate::True,
            compile_sorts(&[Sort::ascending(AssetSortKey::CreationDate)]),
        )
        .including_hidden(include_hidden);
        let scope = FetchScope::Album(handle.identifier.clone());
        Self {
            members: FetchAssets::scoped(store, scope, query),
            handle,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.handle.identifier
    }

    pub fn localized_title(&self) -> &str {
        &self.handle.localized_title
    }

    pub fn album_type(&self) -> Option<AlbumType> {
        AlbumType::classify(&self.handle)
    }

    pub fn handle(&self) -> &AlbumHandle {
        &self.handle
    }

    /// All members, every kind.
    pub fn media(&self) -> &FetchAssets<AnyMedia> {
        &self.members
    }

    pub fn photos(&self) -> Vec<&Photo> {
        self.members.iter().filter_map(AnyMedia::as_photo).collect()
    }

    pub fn videos(&self) -> Vec<&Video> {
        self.members.iter().filter_map(AnyMedia::as_video).collect()
    }

    pub fn audios(&self) -> Vec<&Audio> {
        self.members.iter().filter_map(AnyMedia::as_audio).collect()
    }

    pub fn live_photos(&self) -> Vec<&LivePhoto> {
        self.members
            .iter()
            .filter_map(AnyMedia::as_live_photo)
            .collect()
    }
}

impl fmt::Debug for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Album")
            .field("handle", &self.handle)
            .field("members", &self.members.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_album_types_are_disjoint() {
        for album_type in AlbumType::ALL {
            for subtype in album_type.subtypes() {
                let handle = AlbumHandle::new("a", "A").with_subtype(*subtype);
                assert_eq!(AlbumType::classify(&handle), Some(album_type));
                for other in AlbumType::ALL {
                    assert_eq!(other.constraint().evaluate(&handle), other == album_type);
                }
            }
        }
    }

    #[test]
    fn test_constraint_text() {
        assert_eq!(
            AlbumType::Cloud.constraint().to_string(),
            "assetCollectionType == 1 AND assetCollectionSubtype IN {101, 100}"
        );
    }

    #[test]
    fn test_filters() {
        let handle = AlbumHandle::new("id-1", "Holidays");
        assert!(AlbumFilter::ByTitle("Holidays".into())
            .compile()
            .unwrap()
            .evaluate(&handle));
        assert!(!AlbumFilter::ByIdentifier("id-2".into())
            .compile()
            .unwrap()
            .evaluate(&handle));
        assert!(matches!(
            AlbumFilter::ByIdentifier(String::new()).compile(),
            Err(MediaError::InvalidArgument(_))
        ));
        assert!(AlbumFilter::ByTitle(String::new()).compile().is_err());
    }

    #[test]
    fn test_album_type_parse() {
        assert_eq!("Smart".parse::<AlbumType>().unwrap(), AlbumType::Smart);
        assert!("shared".parse::<AlbumType>().is_err());
    }
}
