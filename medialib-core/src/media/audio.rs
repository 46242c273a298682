use std::fmt;
use std::str::FromStr;

use super::{resolve, AssetRef, Media, Resolve};
use crate::asset::{AssetHandle, NativeSubtypes};
use crate::error::{MediaError, Result};
use crate::filter::MediaSubtype;
use crate::kind::MediaKind;

#[derive(Debug, Clone)]
pub struct Audio {
    asset: AssetRef,
}

impl Media for Audio {
    type Subtype = AudioSubtype;

    const KIND: MediaKind = MediaKind::Audio;

    fn from_asset(asset: AssetRef) -> Self {
        Self { asset }
    }

    fn asset(&self) -> &AssetRef {
        &self.asset
    }
}

impl Resolve for Audio {
    fn resolve(handle: AssetHandle) -> Option<Self> {
        resolve(handle)
    }
}

/// Audio has no native subtypes, so no value of this type exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioSubtype {}

impl MediaSubtype for AudioSubtype {
    fn native(self) -> NativeSubtypes {
        match self {}
    }
}

impl fmt::Display for AudioSubtype {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl FromStr for AudioSubtype {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        Err(MediaError::invalid(format!(
            "audio has no subtypes (got {s})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::predicate::Predicate;

    #[test]
    fn test_no_subtype_parses() {
        assert!("anything".parse::<AudioSubtype>().is_err());
    }

    #[test]
    fn test_empty_subtype_filter_matches_all() {
        let filter = Filter::<AudioSubtype>::subtypes([]);
        assert_eq!(filter.compile().unwrap(), Predicate::True);
    }
}
