//! Sort keys and their compilation into native ordering descriptors.
//!
//! Orderings compare fields in declaration order. Items that tie on every
//! declared key keep the store's natural order, which is stable within a
//! session but otherwise undefined. Callers that need reproducible iteration
//! must declare enough keys to break ties.

use std::cmp::Ordering;
use std::fmt::Debug;

use crate::error::{MediaError, Result};
use crate::predicate::{Field, PredicateTarget, Value};

pub trait SortKey: Copy + Eq + Debug {
    fn field(self) -> Field;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetSortKey {
    CreationDate,
    ModificationDate,
    Identifier,
}

impl SortKey for AssetSortKey {
    fn field(self) -> Field {
        match self {
            Self::CreationDate => Field::CreationDate,
            Self::ModificationDate => Field::ModificationDate,
            Self::Identifier => Field::Identifier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlbumSortKey {
    LocalizedTitle,
    StartDate,
    EndDate,
    EstimatedAssetCount,
}

impl SortKey for AlbumSortKey {
    fn field(self) -> Field {
        match self {
            Self::LocalizedTitle => Field::LocalizedTitle,
            Self::StartDate => Field::StartDate,
            Self::EndDate => Field::EndDate,
            Self::EstimatedAssetCount => Field::EstimatedAssetCount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sort<K: SortKey> {
    pub key: K,
    pub ascending: bool,
}

impl<K: SortKey> Sort<K> {
    pub fn new(key: K, ascending: bool) -> Self {
        Self { key, ascending }
    }

    pub fn ascending(key: K) -> Self {
        Self::new(key, true)
    }

    pub fn descending(key: K) -> Self {
        Self::new(key, false)
    }
}

/// Native ordering descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortDescriptor {
    pub field: Field,
    pub ascending: bool,
}

/// Flatten `sorts` into descriptors, keeping the given order.
///
/// A key repeated later in the list can never affect the ordering and is
/// dropped.
pub fn compile_sorts<K: SortKey>(sorts: &[Sort<K>]) -> Vec<SortDescriptor> {
    let mut descriptors: Vec<SortDescriptor> = Vec::with_capacity(sorts.len());
    for sort in sorts {
        let field = sort.key.field();
        if descriptors.iter().any(|d| d.field == field) {
            continue;
        }
        descriptors.push(SortDescriptor {
            field,
            ascending: sort.ascending,
        });
    }
    descriptors
}

/// Check that `ordering` is deterministic enough to truncate.
pub fn require_ordering(ordering: &[SortDescriptor]) -> Result<()> {
    if ordering.is_empty() {
        return Err(MediaError::invalid(
            "at least one sort key is required for a deterministic ordering",
        ));
    }
    Ok(())
}

/// Compare two targets under `ordering`.
pub fn compare_by<T: PredicateTarget + ?Sized>(
    ordering: &[SortDescriptor],
    a: &T,
    b: &T,
) -> Ordering {
    for descriptor in ordering {
        let left = a.value(descriptor.field);
        let right = b.value(descriptor.field);
        let ordering = Value::sort_order(left.as_ref(), right.as_ref());
        let ordering = if descriptor.ascending {
            ordering
        } else {
            ordering.reverse()
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Stable in-place sort of `items` under `ordering`.
pub fn apply_ordering<T: PredicateTarget>(ordering: &[SortDescriptor], items: &mut [T]) {
    if ordering.is_empty() {
        return;
    }
    items.sort_by(|a, b| compare_by(ordering, a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetHandle, NativeMediaType};
    use chrono::{TimeZone, Utc};

    fn photo(id: &str, day: u32) -> AssetHandle {
        AssetHandle::new(id, NativeMediaType::Image)
            .created_at(Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap())
    }

    fn ids(items: &[AssetHandle]) -> Vec<&str> {
        items.iter().map(|h| h.identifier.as_str()).collect()
    }

    #[test]
    fn test_creation_date_descending() {
        let mut items = vec![photo("t1", 1), photo("t3", 3), photo("t2", 2)];
        let ordering = compile_sorts(&[Sort::descending(AssetSortKey::CreationDate)]);
        apply_ordering(&ordering, &mut items);
        assert_eq!(ids(&items), ["t3", "t2", "t1"]);
    }

    #[test]
    fn test_declaration_order_is_preserved() {
        let ordering = compile_sorts(&[
            Sort::descending(AssetSortKey::ModificationDate),
            Sort::ascending(AssetSortKey::CreationDate),
            Sort::ascending(AssetSortKey::ModificationDate),
        ]);
        assert_eq!(
            ordering,
            vec![
                SortDescriptor {
                    field: Field::ModificationDate,
                    ascending: false
                },
                SortDescriptor {
                    field: Field::CreationDate,
                    ascending: true
                },
            ]
        );
    }

    #[test]
    fn test_secondary_key_breaks_ties() {
        let mut items = vec![photo("b", 1), photo("c", 2), photo("a", 1)];
        let ordering = compile_sorts(&[
            Sort::ascending(AssetSortKey::CreationDate),
            Sort::ascending(AssetSortKey::Identifier),
        ]);
        apply_ordering(&ordering, &mut items);
        assert_eq!(ids(&items), ["a", "b", "c"]);
    }

    #[test]
    fn test_ties_keep_natural_order() {
        let mut items = vec![photo("b", 1), photo("a", 1), photo("c", 1)];
        let ordering = compile_sorts(&[Sort::descending(AssetSortKey::CreationDate)]);
        apply_ordering(&ordering, &mut items);
        assert_eq!(ids(&items), ["b", "a", "c"]);
    }

    #[test]
    fn test_missing_dates_sort_first() {
        let mut items = vec![photo("dated", 1), AssetHandle::new("undated", NativeMediaType::Image)];
        let ordering = compile_sorts(&[Sort::ascending(AssetSortKey::CreationDate)]);
        apply_ordering(&ordering, &mut items);
        assert_eq!(ids(&items), ["undated", "dated"]);
    }

    #[test]
    fn test_required_ordering_rejects_empty() {
        let err = require_ordering(&[]).unwrap_err();
        assert!(matches!(err, MediaError::InvalidArgument(_)));

        let ordering = compile_sorts(&[
            Sort::ascending(AlbumSortKey::LocalizedTitle),
            Sort::descending(AlbumSortKey::LocalizedTitle),
        ]);
        assert_eq!(ordering.len(), 1);
        assert!(require_ordering(&ordering).is_ok());
    }
}
