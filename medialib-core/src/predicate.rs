//! Store-native predicate language.
//!
//! Filters and album filters compile into [`Predicate`] fragments which the
//! [`AssetStore`](crate::store::AssetStore) executes. A predicate can be
//! evaluated against anything implementing [`PredicateTarget`] and renders in
//! an NSPredicate-like text form:
//!
//! ```
//! use medialib_core::predicate::{Field, Predicate, Value};
//!
//! let favorite = Predicate::equals(Field::IsFavorite, Value::Bool(true));
//! let image = Predicate::equals(Field::MediaType, Value::Int(1));
//! let video = Predicate::equals(Field::MediaType, Value::Int(2));
//!
//! let predicate = Predicate::all([Predicate::any([image, video]), favorite]);
//! assert_eq!(
//!     predicate.to_string(),
//!     "(mediaType == 1 OR mediaType == 2) AND isFavorite == YES"
//! );
//! ```

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

/// Attribute of an asset or album that predicates and orderings refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Identifier,
    MediaType,
    MediaSubtypes,
    SourceType,
    CreationDate,
    ModificationDate,
    IsFavorite,
    IsHidden,
    LocalizedTitle,
    CollectionType,
    CollectionSubtype,
    StartDate,
    EndDate,
    EstimatedAssetCount,
}

impl Field {
    /// Native key name of the field.
    pub fn key(self) -> &'static str {
        match self {
            Self::Identifier => "localIdentifier",
            Self::MediaType => "mediaType",
            Self::MediaSubtypes => "mediaSubtypes",
            Self::SourceType => "sourceType",
            Self::CreationDate => "creationDate",
            Self::ModificationDate => "modificationDate",
            Self::IsFavorite => "isFavorite",
            Self::IsHidden => "isHidden",
            Self::LocalizedTitle => "localizedTitle",
            Self::CollectionType => "assetCollectionType",
            Self::CollectionSubtype => "assetCollectionSubtype",
            Self::StartDate => "startDate",
            Self::EndDate => "endDate",
            Self::EstimatedAssetCount => "estimatedAssetCount",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Literal operand of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    Date(DateTime<Utc>),
}

impl Value {
    /// Compares two values of the same variant. Mixed variants are unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Ordering used by sort descriptors: missing values sort first.
    pub fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.compare(b).unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Self::Int(i) => write!(f, "{i}"),
            Self::Bool(true) => f.write_str("YES"),
            Self::Bool(false) => f.write_str("NO"),
            Self::Date(d) => write!(
                f,
                "CAST(\"{}\", \"NSDate\")",
                d.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Something a [`Predicate`] can be evaluated against.
pub trait PredicateTarget {
    /// Current value of `field`, or `None` when the target has no such value.
    fn value(&self, field: Field) -> Option<Value>;
}

/// A native query predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    True,
    False,
    Compare {
        field: Field,
        op: Comparison,
        value: Value,
    },
    /// `(field & mask) != 0`
    AnyBits { field: Field, mask: u32 },
    In { field: Field, values: Vec<Value> },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(field: Field, op: Comparison, value: impl Into<Value>) -> Self {
        Self::Compare {
            field,
            op,
            value: value.into(),
        }
    }

    pub fn equals(field: Field, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Eq, value)
    }

    pub fn any_bits(field: Field, mask: u32) -> Self {
        Self::AnyBits { field, mask }
    }

    pub fn one_of<V: Into<Value>>(field: Field, values: impl IntoIterator<Item = V>) -> Self {
        Self::In {
            field,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// AND-combines `terms`, keeping their order.
    ///
    /// Nested conjunctions are flattened and `True` terms dropped; an empty
    /// conjunction is `True`.
    pub fn all(terms: impl IntoIterator<Item = Predicate>) -> Self {
        let mut flat = Vec::new();
        for term in terms {
            match term {
                Self::True => {}
                Self::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Self::True,
            1 => flat.remove(0),
            _ => Self::And(flat),
        }
    }

    /// OR-combines `terms`. An empty disjunction is `False`.
    pub fn any(terms: impl IntoIterator<Item = Predicate>) -> Self {
        let mut flat = Vec::new();
        for term in terms {
            match term {
                Self::False => {}
                Self::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Self::False,
            1 => flat.remove(0),
            _ => Self::Or(flat),
        }
    }

    pub fn evaluate<T: PredicateTarget + ?Sized>(&self, target: &T) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Compare { field, op, value } => match target.value(*field) {
                Some(actual) => actual
                    .compare(value)
                    .map(|ordering| op.holds(ordering))
                    .unwrap_or(false),
                None => *op == Comparison::Ne,
            },
            Self::AnyBits { field, mask } => match target.value(*field) {
                Some(Value::Int(bits)) => bits & i64::from(*mask) != 0,
                _ => false,
            },
            Self::In { field, values } => target
                .value(*field)
                .map(|actual| {
                    values
                        .iter()
                        .any(|v| actual.compare(v) == Some(Ordering::Equal))
                })
                .unwrap_or(false),
            Self::And(terms) => terms.iter().all(|t| t.evaluate(target)),
            Self::Or(terms) => terms.iter().any(|t| t.evaluate(target)),
            Self::Not(inner) => !inner.evaluate(target),
        }
    }

    fn is_compound(&self) -> bool {
        matches!(self, Self::And(_) | Self::Or(_))
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_compound() {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }

    fn fmt_joined(terms: &[Predicate], sep: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                f.write_str(sep)?;
            }
            term.fmt_operand(f)?;
        }
        Ok(())
    }
}

impl std::ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("TRUEPREDICATE"),
            Self::False => f.write_str("FALSEPREDICATE"),
            Self::Compare { field, op, value } => write!(f, "{field} {} {value}", op.symbol()),
            Self::AnyBits { field, mask } => write!(f, "({field} & {mask}) != 0"),
            Self::In { field, values } => {
                write!(f, "{field} IN {{")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("}")
            }
            Self::And(terms) => Self::fmt_joined(terms, " AND ", f),
            Self::Or(terms) => Self::fmt_joined(terms, " OR ", f),
            Self::Not(inner) => write!(f, "NOT ({inner})"),
        }
    }
}
