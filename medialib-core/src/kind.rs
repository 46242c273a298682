//! The closed set of media kinds and how each is told apart natively.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::asset::{AssetHandle, NativeMediaType, NativeSubtypes};
use crate::error::MediaError;
use crate::predicate::{Field, Predicate};

/// Domain media category.
///
/// Several kinds share a native type tag (`Photo` and `LivePhoto` are both
/// images); the declared required and excluded subtypes keep every handle in
/// at most one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Audio,
    LivePhoto,
}

impl MediaKind {
    pub const ALL: [MediaKind; 4] = [Self::Photo, Self::Video, Self::Audio, Self::LivePhoto];

    pub fn native_type(self) -> NativeMediaType {
        match self {
            Self::Photo | Self::LivePhoto => NativeMediaType::Image,
            Self::Video => NativeMediaType::Video,
            Self::Audio => NativeMediaType::Audio,
        }
    }

    /// Subtype bits a handle must carry to be this kind.
    pub fn required_subtypes(self) -> NativeSubtypes {
        match self {
            Self::LivePhoto => NativeSubtypes::PHOTO_LIVE,
            _ => NativeSubtypes::empty(),
        }
    }

    /// Subtype bits that move a handle to a sibling kind.
    pub fn excluded_subtypes(self) -> NativeSubtypes {
        match self {
            Self::Photo => NativeSubtypes::PHOTO_LIVE,
            _ => NativeSubtypes::empty(),
        }
    }

    pub fn matches(self, handle: &AssetHandle) -> bool {
        handle.media_type == self.native_type()
            && handle.subtypes.contains(self.required_subtypes())
            && !handle.subtypes.intersects(self.excluded_subtypes())
    }

    /// The kind `handle` resolves to, if any.
    pub fn classify(handle: &AssetHandle) -> Option<MediaKind> {
        Self::ALL.into_iter().find(|kind| kind.matches(handle))
    }

    /// Native predicate selecting exactly the handles of this kind.
    pub fn constraint(self) -> Predicate {
        let mut terms = vec![Predicate::equals(
            Field::MediaType,
            self.native_type().raw_value(),
        )];

        let required = self.required_subtypes();
        if !required.is_empty() {
            terms.extend(
                required
                    .iter()
                    .map(|bit| Predicate::any_bits(Field::MediaSubtypes, bit.bits())),
            );
        }

        let excluded = self.excluded_subtypes();
        if !excluded.is_empty() {
            terms.push(!Predicate::any_bits(Field::MediaSubtypes, excluded.bits()));
        }

        Predicate::all(terms)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::LivePhoto => "live photo",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MediaKind {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "photo" | "image" => Ok(Self::Photo),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "livephoto" | "live" => Ok(Self::LivePhoto),
            _ => Err(MediaError::invalid(format!("unknown media kind: {s}"))),
        }
    }
}
