//! Build variables exposed to the toolchain for flag expansion.
//!
//! A [`VarValue`] is either a primitive value or an arbitrarily deeply
//! nested structure or sequence. Values are immutable and side-effect
//! free; they are expanded and queried multiple times.

mod library;
mod scope;

pub use library::{Artifact, ArtifactExpander, LibraryToLink, LinkType};
pub use scope::{VarScope, VarScopeBuilder};

use std::fmt;
use std::sync::Arc;

use util::HashMap;

/// Raised when a flag value cannot be expanded under a set of build
/// variables: a missing variable, a type mismatch, or a missing structure
/// field. Callers treat these as logic faults in the toolchain or the
/// action; they are not recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    #[error("Cannot find variable named '{0}'")]
    MissingVar(String),
    #[error("Cannot expand variable '{name}': expected string, found {found}")]
    ExpectedString { name: String, found: &'static str },
    #[error("Cannot expand variable '{name}': expected sequence, found {found}")]
    ExpectedSequence { name: String, found: &'static str },
    #[error("Cannot expand variable '{name}.{field}': variable '{name}' is {found}, expected structure")]
    ExpectedStructure {
        name: String,
        field: String,
        found: &'static str,
    },
    #[error("Cannot expand variable '{path}.{field}': structure {path} doesn't have a field named '{field}'")]
    MissingField { path: String, field: String },
}

/// A string sequence computed on first demand by a pure supplier.
/// Make sure the supplier doesn't capture anything that shouldn't outlive
/// the feature configuration.
#[derive(Clone)]
pub struct LazyStrings(Arc<dyn Fn() -> Vec<String> + Send + Sync>);

impl LazyStrings {
    pub fn new(supplier: impl Fn() -> Vec<String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(supplier))
    }

    fn strings(&self) -> Vec<String> {
        (self.0)()
    }
}

impl fmt::Debug for LazyStrings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LazyStrings(..)")
    }
}

/// Value of a single build variable.
#[derive(Debug, Clone)]
pub enum VarValue {
    Str(String),
    Integer(i64),
    /// Sequence of plain strings (the common case, kept flat).
    StringSeq(Vec<String>),
    /// Sequence of arbitrary values.
    Seq(Vec<VarValue>),
    /// Field map supporting dotted access.
    Structure(HashMap<String, VarValue>),
    /// Sequence of structures, materialized per element on iteration.
    StructSeq(Vec<HashMap<String, VarValue>>),
    /// String sequence produced on first demand.
    LazyStringSeq(LazyStrings),
    /// Specialized structure describing one library on a link line.
    Library(LibraryToLink),
}

impl VarValue {
    /// Structure from (field, value) pairs.
    pub fn structure<K: Into<String>>(fields: impl IntoIterator<Item = (K, VarValue)>) -> Self {
        let mut m = HashMap::default();
        for (k, v) in fields {
            m.insert(k.into(), v);
        }
        Self::Structure(m)
    }

    /// Structure sequence from per-element (field, value) pairs.
    pub fn struct_seq<K: Into<String>>(
        elements: impl IntoIterator<Item = Vec<(K, VarValue)>>,
    ) -> Self {
        Self::StructSeq(
            elements
                .into_iter()
                .map(|fields| {
                    let mut m = HashMap::default();
                    for (k, v) in fields {
                        m.insert(k.into(), v);
                    }
                    m
                })
                .collect(),
        )
    }

    /// Human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Integer(_) => "integer",
            Self::StringSeq(_) | Self::Seq(_) | Self::StructSeq(_) | Self::LazyStringSeq(_) => {
                "sequence"
            }
            Self::Structure(_) => "structure",
            Self::Library(_) => "structure (LibraryToLink)",
        }
    }

    /// Whether this value counts as true under `expand_if_true` /
    /// `expand_if_false` gates.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Str(s) => !s.is_empty(),
            Self::Integer(n) => *n != 0,
            Self::StringSeq(xs) => !xs.is_empty(),
            Self::Seq(xs) => !xs.is_empty(),
            Self::Structure(m) => !m.is_empty(),
            Self::StructSeq(ms) => !ms.is_empty(),
            Self::LazyStringSeq(supplier) => !supplier.strings().is_empty(),
            Self::Library(_) => true,
        }
    }

    /// The string form of this value, or an error if the value has no
    /// scalar view. `name` is the variable name at hand, for the error
    /// message.
    pub fn string_view(&self, name: &str) -> Result<String, ExpandError> {
        match self {
            Self::Str(s) => Ok(s.clone()),
            Self::Integer(n) => Ok(n.to_string()),
            other => Err(ExpandError::ExpectedString {
                name: name.to_owned(),
                found: other.type_name(),
            }),
        }
    }

    /// The elements of this value, or an error if it is not a sequence.
    /// Structure sequences materialize a `Structure` per element; lazy
    /// sequences run their supplier.
    pub fn sequence_view(
        &self,
        name: &str,
        _expander: Option<&dyn ArtifactExpander>,
    ) -> Result<Vec<VarValue>, ExpandError> {
        match self {
            Self::StringSeq(xs) => Ok(xs.iter().cloned().map(VarValue::Str).collect()),
            Self::Seq(xs) => Ok(xs.clone()),
            Self::StructSeq(ms) => Ok(ms.iter().cloned().map(VarValue::Structure).collect()),
            Self::LazyStringSeq(supplier) => {
                Ok(supplier.strings().into_iter().map(VarValue::Str).collect())
            }
            other => Err(ExpandError::ExpectedSequence {
                name: name.to_owned(),
                found: other.type_name(),
            }),
        }
    }

    /// Value of `field`, if this value is a structure. Returns `Ok(None)`
    /// when the field is absent, and an error when this value has no
    /// fields at all. `path` is the variable path at hand, for the error
    /// message.
    pub fn field(
        &self,
        path: &str,
        field: &str,
        expander: Option<&dyn ArtifactExpander>,
    ) -> Result<Option<VarValue>, ExpandError> {
        match self {
            Self::Structure(m) => Ok(m.get(field).cloned()),
            Self::Library(lib) => Ok(lib.field(field, expander)),
            other => Err(ExpandError::ExpectedStructure {
                name: path.to_owned(),
                field: field.to_owned(),
                found: other.type_name(),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn structure(fields: &[(&str, VarValue)]) -> VarValue {
        let mut m = HashMap::default();
        for (k, v) in fields {
            m.insert((*k).to_owned(), v.clone());
        }
        VarValue::Structure(m)
    }

    #[test]
    fn test_truthiness() {
        assert!(!VarValue::Str(String::new()).is_truthy());
        assert!(VarValue::Str("x".into()).is_truthy());
        assert!(!VarValue::Integer(0).is_truthy());
        assert!(VarValue::Integer(-1).is_truthy());
        assert!(!VarValue::StringSeq(vec![]).is_truthy());
        assert!(VarValue::StringSeq(vec!["a".into()]).is_truthy());
        assert!(!VarValue::Seq(vec![]).is_truthy());
        assert!(VarValue::Seq(vec![VarValue::Integer(0)]).is_truthy());
        assert!(!structure(&[]).is_truthy());
        assert!(structure(&[("f", VarValue::Integer(1))]).is_truthy());
        assert!(!VarValue::StructSeq(vec![]).is_truthy());
        assert!(!VarValue::LazyStringSeq(LazyStrings::new(Vec::new)).is_truthy());
        assert!(VarValue::LazyStringSeq(LazyStrings::new(|| vec!["a".into()])).is_truthy());
        assert!(VarValue::Library(LibraryToLink::dynamic_library("libfoo.so")).is_truthy());
    }

    #[test]
    fn test_string_view() {
        assert_eq!("abc", VarValue::Str("abc".into()).string_view("v").unwrap());
        assert_eq!("-7", VarValue::Integer(-7).string_view("v").unwrap());

        let e = VarValue::StringSeq(vec![]).string_view("v").unwrap_err();
        assert_eq!(
            "Cannot expand variable 'v': expected string, found sequence",
            e.to_string()
        );
    }

    #[test]
    fn test_sequence_view() {
        let seq = VarValue::StringSeq(vec!["a".into(), "b".into()]);
        let elements = seq.sequence_view("v", None).unwrap();
        assert_eq!(2, elements.len());
        assert_eq!("a", elements[0].string_view("v").unwrap());

        let lazy = VarValue::LazyStringSeq(LazyStrings::new(|| vec!["x".into()]));
        assert_eq!(1, lazy.sequence_view("v", None).unwrap().len());

        let structs = VarValue::StructSeq(vec![HashMap::default()]);
        assert!(matches!(
            structs.sequence_view("v", None).unwrap().as_slice(),
            [VarValue::Structure(_)]
        ));

        let e = VarValue::Str("x".into()).sequence_view("v", None).unwrap_err();
        assert_eq!(
            "Cannot expand variable 'v': expected sequence, found string",
            e.to_string()
        );
    }

    #[test]
    fn test_field() {
        let lib = structure(&[("name", VarValue::Str("libz".into()))]);
        let name = lib.field("lib", "name", None).unwrap().unwrap();
        assert_eq!("libz", name.string_view("lib.name").unwrap());
        assert!(lib.field("lib", "missing", None).unwrap().is_none());

        let e = VarValue::Integer(1).field("v", "f", None).unwrap_err();
        assert_eq!(
            "Cannot expand variable 'v.f': variable 'v' is integer, expected structure",
            e.to_string()
        );
    }
}
