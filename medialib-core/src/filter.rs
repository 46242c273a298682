//! Declarative asset filters.

use std::fmt::Debug;

use crate::asset::NativeSubtypes;
use crate::error::{MediaError, Result};
use crate::kind::MediaKind;
use crate::predicate::{Field, Predicate};

/// Typed subtype of one media kind, mapped onto native subtype bits.
pub trait MediaSubtype: Copy + Debug + Send + Sync + 'static {
    fn native(self) -> NativeSubtypes;
}

/// The raw bitset, for scans that are not tied to one kind.
impl MediaSubtype for NativeSubtypes {
    fn native(self) -> NativeSubtypes {
        self
    }
}

/// One constraint on the assets to fetch.
///
/// A filter set is always AND-combined. Express alternatives with
/// [`Filter::Custom`] and [`Predicate::any`].
#[derive(Debug, Clone, PartialEq)]
pub enum Filter<S: MediaSubtype> {
    ByIdentifier(String),
    /// Matches the native type tag of the kind.
    ByMediaType(MediaKind),
    /// Matches assets carrying any of the subtypes; an empty set matches all.
    BySubtypes(Vec<S>),
    Custom(Predicate),
}

impl<S: MediaSubtype> Filter<S> {
    pub fn identifier(identifier: impl Into<String>) -> Self {
        Self::ByIdentifier(identifier.into())
    }

    pub fn subtypes(subtypes: impl IntoIterator<Item = S>) -> Self {
        Self::BySubtypes(subtypes.into_iter().collect())
    }

    pub fn compile(&self) -> Result<Predicate> {
        match self {
            Self::ByIdentifier(identifier) => {
                if identifier.is_empty() {
                    return Err(MediaError::invalid("identifier filter must not be empty"));
                }
                Ok(Predicate::equals(Field::Identifier, identifier.as_str()))
            }
            Self::ByMediaType(kind) => Ok(Predicate::equals(
                Field::MediaType,
                kind.native_type().raw_value(),
            )),
            Self::BySubtypes(subtypes) => {
                let mask = subtypes
                    .iter()
                    .fold(NativeSubtypes::empty(), |acc, s| acc | s.native());
                if mask.is_empty() {
                    Ok(Predicate::True)
                } else {
                    Ok(Predicate::any_bits(Field::MediaSubtypes, mask.bits()))
                }
            }
            Self::Custom(predicate) => Ok(predicate.clone()),
        }
    }
}

/// Compile every filter, failing on the first invalid one.
pub fn compile_filters<S: MediaSubtype>(filters: &[Filter<S>]) -> Result<Vec<Predicate>> {
    let mut identifiers = filters.iter().filter_map(|f| match f {
        Filter::ByIdentifier(id) => Some(id.as_str()),
        _ => None,
    });
    if let Some(first) = identifiers.next() {
        if identifiers.any(|other| other != first) {
            tracing::warn!(
                "filter set contains conflicting identifier filters and can never match"
            );
        }
    }

    filters.iter().map(Filter::compile).collect()
}
