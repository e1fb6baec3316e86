use util::HashMap;

use super::{ArtifactExpander, ExpandError, LazyStrings, VarValue};

/// One frame of build variables, chained to an optional parent frame.
///
/// Bare string bindings live in their own map as a cheaper path beside the
/// typed values; the two maps are kept disjoint. Lookup falls back to the
/// parent chain on a miss. Frames are immutable once built; iteration
/// inside flag groups pushes single-binding child frames that shadow the
/// iterated name.
#[derive(Debug, Default)]
pub struct VarScope<'p> {
    strings: HashMap<String, String>,
    vars: HashMap<String, VarValue>,
    parent: Option<&'p VarScope<'p>>,
}

impl VarScope<'static> {
    pub fn builder() -> VarScopeBuilder {
        VarScopeBuilder::default()
    }

    /// A scope with no bindings at all.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl<'p> VarScope<'p> {
    /// Child scope binding a single variable, shadowing any binding of
    /// `name` in this scope.
    pub(crate) fn binding(&'p self, name: &str, value: VarValue) -> VarScope<'p> {
        let mut vars = HashMap::default();
        vars.insert(name.to_owned(), value);
        Self {
            strings: HashMap::default(),
            vars,
            parent: Some(self),
        }
    }

    /// Get the value of the variable named `name`, supporting dotted field
    /// access into structures (e.g. `libraries_to_link.name`).
    pub fn get(
        &self,
        name: &str,
        expander: Option<&dyn ArtifactExpander>,
    ) -> Result<VarValue, ExpandError> {
        if let Some(value) = self.non_structured(name) {
            return Ok(value);
        }
        match self.structured(name, expander, true)? {
            Some(value) => Ok(value),
            None => Err(ExpandError::MissingVar(name.to_owned())),
        }
    }

    /// Whether a `get` of `name` would succeed.
    pub fn is_available(&self, name: &str, expander: Option<&dyn ArtifactExpander>) -> bool {
        self.non_structured(name).is_some()
            || matches!(self.structured(name, expander, false), Ok(Some(_)))
    }

    /// Scalar shorthand: `get` followed by the string view.
    pub fn string_var(&self, name: &str) -> Result<String, ExpandError> {
        self.get(name, None)?.string_view(name)
    }

    /// Sequence shorthand: `get` followed by the sequence view.
    pub fn sequence_var(
        &self,
        name: &str,
        expander: Option<&dyn ArtifactExpander>,
    ) -> Result<Vec<VarValue>, ExpandError> {
        self.get(name, expander)?.sequence_view(name, expander)
    }

    fn non_structured(&self, name: &str) -> Option<VarValue> {
        if let Some(s) = self.strings.get(name) {
            return Some(VarValue::Str(s.clone()));
        }
        if let Some(v) = self.vars.get(name) {
            return Some(v.clone());
        }
        self.parent.and_then(|p| p.non_structured(name))
    }

    /// Resolve a dotted name as field accesses into a structure variable.
    ///
    /// Suffixes are stripped at the rightmost '.' until the remaining
    /// prefix resolves as a plain variable, so `a.b.c` prefers a flat
    /// variable of that exact name, then a flat `a.b` with field `c`, then
    /// a structure `a` with field path `b.c`. Returns `Ok(None)` when no
    /// prefix resolves at all.
    fn structured(
        &self,
        name: &str,
        expander: Option<&dyn ArtifactExpander>,
        throw_on_missing_field: bool,
    ) -> Result<Option<VarValue>, ExpandError> {
        if !name.contains('.') {
            return Ok(None);
        }

        let mut fields = Vec::new();
        let mut prefix = name;
        let mut value = None;
        while let Some(dot) = prefix.rfind('.') {
            fields.push(&prefix[dot + 1..]);
            prefix = &prefix[..dot];
            value = self.non_structured(prefix);
            if value.is_some() {
                break;
            }
        }
        let Some(mut value) = value else {
            return Ok(None);
        };

        for field in fields.iter().rev() {
            match value.field(prefix, field, expander)? {
                Some(inner) => value = inner,
                None if throw_on_missing_field => {
                    return Err(ExpandError::MissingField {
                        path: prefix.to_owned(),
                        field: (*field).to_owned(),
                    })
                }
                None => return Ok(None),
            }
        }
        Ok(Some(value))
    }
}

/// Builder for a root [`VarScope`]. Later bindings of the same name
/// overwrite earlier ones.
#[derive(Debug, Default)]
pub struct VarScopeBuilder {
    strings: HashMap<String, String>,
    vars: HashMap<String, VarValue>,
}

impl VarScopeBuilder {
    pub fn string(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.vars.remove(&name);
        self.strings.insert(name, value.into());
        self
    }

    pub fn integer(self, name: impl Into<String>, value: i64) -> Self {
        self.var(name, VarValue::Integer(value))
    }

    pub fn string_seq<S: Into<String>>(
        self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.var(
            name,
            VarValue::StringSeq(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn lazy_string_seq(
        self,
        name: impl Into<String>,
        supplier: impl Fn() -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.var(name, VarValue::LazyStringSeq(LazyStrings::new(supplier)))
    }

    pub fn var(mut self, name: impl Into<String>, value: VarValue) -> Self {
        let name = name.into();
        self.strings.remove(&name);
        self.vars.insert(name, value);
        self
    }

    pub fn strings<K: Into<String>, V: Into<String>>(
        mut self,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        for (k, v) in entries {
            self = self.string(k, v);
        }
        self
    }

    pub fn build(self) -> VarScope<'static> {
        VarScope {
            strings: self.strings,
            vars: self.vars,
            parent: None,
        }
    }
}
