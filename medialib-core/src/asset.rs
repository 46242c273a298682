//! Asset handles as the store hands them out, and the metadata snapshots
//! domain objects copy out of them.

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::predicate::{Field, PredicateTarget, Value};

/// Native media type tag of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeMediaType {
    #[default]
    Unknown,
    Image,
    Video,
    Audio,
}

impl NativeMediaType {
    pub fn raw_value(self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::Image => 1,
            Self::Video => 2,
            Self::Audio => 3,
        }
    }
}

bitflags! {
    /// Native subtype bitset of an asset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct NativeSubtypes: u32 {
        const PHOTO_PANORAMA = 1 << 0;
        const PHOTO_HDR = 1 << 1;
        const PHOTO_SCREENSHOT = 1 << 2;
        const PHOTO_LIVE = 1 << 3;
        const PHOTO_DEPTH_EFFECT = 1 << 4;
        const VIDEO_STREAMED = 1 << 16;
        const VIDEO_HIGH_FRAME_RATE = 1 << 17;
        const VIDEO_TIMELAPSE = 1 << 18;
    }
}

/// Where the asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    UserLibrary,
    CloudShared,
    ITunesSynced,
}

impl SourceType {
    pub fn raw_value(self) -> i64 {
        match self {
            Self::UserLibrary => 1,
            Self::CloudShared => 2,
            Self::ITunesSynced => 4,
        }
    }
}

/// Capture location of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Encode the location as a geohash of `precision` characters.
    ///
    /// Returns `None` for coordinates outside the valid range.
    pub fn geohash(&self, precision: usize) -> Option<String> {
        geohash::encode(
            geohash::Coord {
                x: self.longitude,
                y: self.latitude,
            },
            precision,
        )
        .ok()
    }
}

/// Reference to one library-managed media item.
///
/// Handles are produced by the store; the core only reads them. Domain objects
/// keep the handle they were resolved from until a mutation replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetHandle {
    pub identifier: String,
    pub media_type: NativeMediaType,
    #[serde(default)]
    pub subtypes: NativeSubtypes,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modification_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_hidden: bool,
}

impl AssetHandle {
    pub fn new(identifier: impl Into<String>, media_type: NativeMediaType) -> Self {
        Self {
            identifier: identifier.into(),
            media_type,
            subtypes: NativeSubtypes::empty(),
            source_type: SourceType::default(),
            creation_date: None,
            modification_date: None,
            location: None,
            is_favorite: false,
            is_hidden: false,
        }
    }

    pub fn with_subtypes(mut self, subtypes: NativeSubtypes) -> Self {
        self.subtypes = subtypes;
        self
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn created_at(mut self, date: DateTime<Utc>) -> Self {
        self.creation_date = Some(date);
        self
    }

    pub fn modified_at(mut self, date: DateTime<Utc>) -> Self {
        self.modification_date = Some(date);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    pub fn hidden(mut self, is_hidden: bool) -> Self {
        self.is_hidden = is_hidden;
        self
    }
}

impl PredicateTarget for AssetHandle {
    fn value(&self, field: Field) -> Option<Value> {
        match field {
            Field::Identifier => Some(Value::Str(self.identifier.clone())),
            Field::MediaType => Some(Value::Int(self.media_type.raw_value())),
            Field::MediaSubtypes => Some(Value::Int(i64::from(self.subtypes.bits()))),
            Field::SourceType => Some(Value::Int(self.source_type.raw_value())),
            Field::CreationDate => self.creation_date.map(Value::Date),
            Field::ModificationDate => self.modification_date.map(Value::Date),
            Field::IsFavorite => Some(Value::Bool(self.is_favorite)),
            Field::IsHidden => Some(Value::Bool(self.is_hidden)),
            _ => None,
        }
    }
}

/// Read-only snapshot of an asset's metadata.
///
/// Taken at the moment it is requested; it never changes afterwards. Observe
/// library-side changes by fetching again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub media_type: NativeMediaType,
    pub subtypes: NativeSubtypes,
    pub source_type: SourceType,
    pub creation_date: Option<DateTime<Utc>>,
    pub modification_date: Option<DateTime<Utc>>,
    pub location: Option<Location>,
    pub is_favorite: bool,
    pub is_hidden: bool,
}

impl Metadata {
    pub fn from_handle(handle: &AssetHandle) -> Self {
        Self {
            media_type: handle.media_type,
            subtypes: handle.subtypes,
            source_type: handle.source_type,
            creation_date: handle.creation_date,
            modification_date: handle.modification_date,
            location: handle.location,
            is_favorite: handle.is_favorite,
            is_hidden: handle.is_hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_metadata_is_a_copy() {
        let mut handle = AssetHandle::new("A", NativeMediaType::Image)
            .with_subtypes(NativeSubtypes::PHOTO_HDR)
            .created_at(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
        let metadata = Metadata::from_handle(&handle);

        handle.is_favorite = true;
        handle.subtypes = NativeSubtypes::empty();

        assert!(!metadata.is_favorite);
        assert_eq!(metadata.subtypes, NativeSubtypes::PHOTO_HDR);
        assert_eq!(metadata.media_type, NativeMediaType::Image);
    }

    #[test]
    fn test_predicate_values() {
        let handle = AssetHandle::new("A", NativeMediaType::Video)
            .with_subtypes(NativeSubtypes::VIDEO_TIMELAPSE)
            .favorite(true);

        assert_eq!(handle.value(Field::MediaType), Some(Value::Int(2)));
        assert_eq!(
            handle.value(Field::MediaSubtypes),
            Some(Value::Int(1 << 18))
        );
        assert_eq!(handle.value(Field::IsFavorite), Some(Value::Bool(true)));
        assert_eq!(handle.value(Field::CreationDate), None);
        assert_eq!(handle.value(Field::LocalizedTitle), None);
    }

    #[test]
    fn test_location_geohash() {
        let location = Location::new(48.8584, 2.2945);
        let hash = location.geohash(7).expect("valid coordinates");
        assert_eq!(hash.len(), 7);
        assert!(hash.starts_with("u09"));

        assert!(Location::new(123.0, 0.0).geohash(7).is_none());
    }

    #[test]
    fn test_handle_json_defaults() {
        let json = r#"{"identifier":"X","media_type":"image","subtypes":"PHOTO_LIVE"}"#;
        let handle: AssetHandle = serde_json::from_str(json).unwrap();
        assert_eq!(handle.subtypes, NativeSubtypes::PHOTO_LIVE);
        assert_eq!(handle.source_type, SourceType::UserLibrary);
        assert!(!handle.is_hidden);
    }
}
