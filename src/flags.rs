//! Flag sets, flag groups, and env sets: the gated, possibly nested
//! template containers that expand into command lines and environments.

use std::collections::BTreeMap;

use anyhow::Result;
use syntax::{Chunk, Template};
use util::HashSet;

use crate::decl::{EnvSetDecl, FlagGroupDecl, FlagSetDecl, WithFeatureSetDecl};
use crate::vars::{ArtifactExpander, ExpandError, VarScope};
use crate::Error;

/// Append `template` expanded against `scope` to `buf`. Every referenced
/// variable must have a scalar view.
pub(crate) fn append_expanded(
    template: &Template,
    scope: &VarScope,
    buf: &mut String,
) -> Result<(), ExpandError> {
    for chunk in template.chunks() {
        match chunk {
            Chunk::Text(text) => buf.push_str(text),
            Chunk::Var(name) => buf.push_str(&scope.string_var(name)?),
        }
    }
    Ok(())
}

/// A `with_feature` predicate: all of `features` enabled, none of
/// `not_features`.
#[derive(Debug, Clone)]
pub(crate) struct WithFeatures {
    features: Vec<String>,
    not_features: Vec<String>,
}

impl WithFeatures {
    pub(crate) fn from_decl(decl: &WithFeatureSetDecl) -> Self {
        Self {
            features: decl.features.clone(),
            not_features: decl.not_features.clone(),
        }
    }

    fn matches(&self, enabled: &HashSet<String>) -> bool {
        self.features.iter().all(|f| enabled.contains(f))
            && !self.not_features.iter().any(|f| enabled.contains(f))
    }
}

/// A list of `with_feature` predicates is satisfied if it is empty or at
/// least one predicate matches.
pub(crate) fn with_features_satisfied(
    predicates: &[WithFeatures],
    enabled: &HashSet<String>,
) -> bool {
    predicates.is_empty() || predicates.iter().any(|p| p.matches(enabled))
}

/// A flag group holds either plain flags or nested groups, and expands
/// once or per element of an iterated sequence variable.
#[derive(Debug)]
pub(crate) struct FlagGroup {
    items: Vec<Item>,
    iterate_over: Option<String>,
    expand_if_all_available: Vec<String>,
    expand_if_none_available: Vec<String>,
    expand_if_true: Option<String>,
    expand_if_false: Option<String>,
    expand_if_equal: Option<(String, String)>,
}

#[derive(Debug)]
enum Item {
    Flag(Template),
    Group(FlagGroup),
}

impl FlagGroup {
    pub(crate) fn from_decl(decl: &FlagGroupDecl) -> Result<Self> {
        // if both flags and flag_groups were allowed, the original order
        // would not be preservable:
        if !decl.flags.is_empty() && !decl.flag_groups.is_empty() {
            return Err(Error::MixedFlagGroup.into());
        }
        let mut items = Vec::with_capacity(decl.flags.len() + decl.flag_groups.len());
        for flag in &decl.flags {
            items.push(Item::Flag(syntax::parse(flag)?));
        }
        for group in &decl.flag_groups {
            items.push(Item::Group(Self::from_decl(group)?));
        }
        Ok(Self {
            items,
            iterate_over: decl.iterate_over.clone(),
            expand_if_all_available: decl.expand_if_all_available.clone(),
            expand_if_none_available: decl.expand_if_none_available.clone(),
            expand_if_true: decl.expand_if_true.clone(),
            expand_if_false: decl.expand_if_false.clone(),
            expand_if_equal: decl
                .expand_if_equal
                .as_ref()
                .map(|vv| (vv.variable.clone(), vv.value.clone())),
        })
    }

    pub(crate) fn expand(
        &self,
        scope: &VarScope,
        expander: Option<&dyn ArtifactExpander>,
        out: &mut Vec<String>,
    ) -> Result<(), ExpandError> {
        if !self.can_expand(scope, expander)? {
            return Ok(());
        }
        if let Some(name) = &self.iterate_over {
            for element in scope.sequence_var(name, expander)? {
                let nested = scope.binding(name, element);
                self.expand_items(&nested, expander, out)?;
            }
        } else {
            self.expand_items(scope, expander, out)?;
        }
        Ok(())
    }

    fn expand_items(
        &self,
        scope: &VarScope,
        expander: Option<&dyn ArtifactExpander>,
        out: &mut Vec<String>,
    ) -> Result<(), ExpandError> {
        for item in &self.items {
            match item {
                Item::Flag(template) => {
                    let mut flag = String::new();
                    append_expanded(template, scope, &mut flag)?;
                    out.push(flag);
                }
                Item::Group(group) => group.expand(scope, expander, out)?,
            }
        }
        Ok(())
    }

    fn can_expand(
        &self,
        scope: &VarScope,
        expander: Option<&dyn ArtifactExpander>,
    ) -> Result<bool, ExpandError> {
        for name in &self.expand_if_all_available {
            if !scope.is_available(name, expander) {
                return Ok(false);
            }
        }
        for name in &self.expand_if_none_available {
            if scope.is_available(name, expander) {
                return Ok(false);
            }
        }
        if let Some(name) = &self.expand_if_true {
            if !scope.is_available(name, expander) || !scope.get(name, expander)?.is_truthy() {
                return Ok(false);
            }
        }
        if let Some(name) = &self.expand_if_false {
            if !scope.is_available(name, expander) || scope.get(name, expander)?.is_truthy() {
                return Ok(false);
            }
        }
        if let Some((name, value)) = &self.expand_if_equal {
            if !scope.is_available(name, expander)
                || scope.get(name, expander)?.string_view(name)? != *value
            {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Groups flags to apply for a set of actions.
#[derive(Debug)]
pub(crate) struct FlagSet {
    actions: HashSet<String>,
    with_features: Vec<WithFeatures>,
    expand_if_all_available: Vec<String>,
    flag_groups: Vec<FlagGroup>,
}

impl FlagSet {
    pub(crate) fn from_decl(decl: &FlagSetDecl) -> Result<Self> {
        Self::with_actions(decl, decl.actions.iter().cloned().collect())
    }

    /// Flag set inside an action config: applies to that config's action.
    pub(crate) fn for_action(decl: &FlagSetDecl, action: &str) -> Result<Self> {
        let mut actions = HashSet::default();
        actions.insert(action.to_owned());
        Self::with_actions(decl, actions)
    }

    fn with_actions(decl: &FlagSetDecl, actions: HashSet<String>) -> Result<Self> {
        let mut flag_groups = Vec::with_capacity(decl.flag_groups.len());
        for group in &decl.flag_groups {
            flag_groups.push(FlagGroup::from_decl(group)?);
        }
        Ok(Self {
            actions,
            with_features: decl.with_features.iter().map(WithFeatures::from_decl).collect(),
            expand_if_all_available: decl.expand_if_all_available.clone(),
            flag_groups,
        })
    }

    /// Append the flags that apply to `action` to `out`.
    pub(crate) fn expand(
        &self,
        action: &str,
        scope: &VarScope,
        enabled: &HashSet<String>,
        expander: Option<&dyn ArtifactExpander>,
        out: &mut Vec<String>,
    ) -> Result<(), ExpandError> {
        for name in &self.expand_if_all_available {
            if !scope.is_available(name, expander) {
                return Ok(());
            }
        }
        if !with_features_satisfied(&self.with_features, enabled) {
            return Ok(());
        }
        if !self.actions.contains(action) {
            return Ok(());
        }
        for group in &self.flag_groups {
            group.expand(scope, expander, out)?;
        }
        Ok(())
    }
}

/// Groups environment entries to apply for a set of actions.
#[derive(Debug)]
pub(crate) struct EnvSet {
    actions: HashSet<String>,
    with_features: Vec<WithFeatures>,
    entries: Vec<(String, Template)>,
}

impl EnvSet {
    pub(crate) fn from_decl(decl: &EnvSetDecl) -> Result<Self> {
        let mut entries = Vec::with_capacity(decl.env_entries.len());
        for entry in &decl.env_entries {
            entries.push((entry.key.clone(), syntax::parse(&entry.value)?));
        }
        Ok(Self {
            actions: decl.actions.iter().cloned().collect(),
            with_features: decl.with_features.iter().map(WithFeatures::from_decl).collect(),
            entries,
        })
    }

    /// Merge the key/value pairs that apply to `action` into `env`; later
    /// keys overwrite earlier ones.
    pub(crate) fn expand(
        &self,
        action: &str,
        scope: &VarScope,
        enabled: &HashSet<String>,
        env: &mut BTreeMap<String, String>,
    ) -> Result<(), ExpandError> {
        if !self.actions.contains(action) {
            return Ok(());
        }
        if !with_features_satisfied(&self.with_features, enabled) {
            return Ok(());
        }
        for (key, template) in &self.entries {
            let mut value = String::new();
            append_expanded(template, scope, &mut value)?;
            env.insert(key.clone(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decl::VariableWithValueDecl;
    use crate::vars::VarValue;

    fn group(decl: FlagGroupDecl) -> FlagGroup {
        FlagGroup::from_decl(&decl).unwrap()
    }

    fn expand(group: &FlagGroup, scope: &VarScope) -> Vec<String> {
        let mut out = Vec::new();
        group.expand(scope, None, &mut out).unwrap();
        out
    }

    fn enabled(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_simple_expansion() {
        let g = group(FlagGroupDecl {
            flags: vec!["-f".into(), "%{v}".into()],
            ..Default::default()
        });
        let scope = VarScope::builder().string("v", "bar").build();
        assert_eq!(vec!["-f", "bar"], expand(&g, &scope));
    }

    #[test]
    fn test_iteration() {
        let g = group(FlagGroupDecl {
            flags: vec!["%{xs}".into()],
            iterate_over: Some("xs".into()),
            ..Default::default()
        });
        let scope = VarScope::builder().string_seq("xs", ["a", "b", "c"]).build();
        assert_eq!(vec!["a", "b", "c"], expand(&g, &scope));
    }

    #[test]
    fn test_nested_iteration_shadows() {
        // outer iterates a structure sequence, inner flags use dotted access
        let g = group(FlagGroupDecl {
            flag_groups: vec![FlagGroupDecl {
                flags: vec!["-l%{lib.name}".into()],
                ..Default::default()
            }],
            iterate_over: Some("lib".into()),
            ..Default::default()
        });
        let scope = VarScope::builder()
            .var(
                "lib",
                VarValue::struct_seq([
                    vec![("name", VarValue::Str("z".into()))],
                    vec![("name", VarValue::Str("m".into()))],
                ]),
            )
            .build();
        assert_eq!(vec!["-lz", "-lm"], expand(&g, &scope));
    }

    #[test]
    fn test_mixed_group_rejected() {
        let res = FlagGroup::from_decl(&FlagGroupDecl {
            flags: vec!["-a".into()],
            flag_groups: vec![FlagGroupDecl::default()],
            ..Default::default()
        });
        assert!(res.is_err());
    }

    #[test]
    fn test_expand_if_all_available() {
        let g = group(FlagGroupDecl {
            flags: vec!["-x".into()],
            expand_if_all_available: vec!["v".into()],
            ..Default::default()
        });
        assert!(expand(&g, &VarScope::empty()).is_empty());
        let scope = VarScope::builder().string("v", "").build();
        assert_eq!(vec!["-x"], expand(&g, &scope));
    }

    #[test]
    fn test_expand_if_none_available() {
        let g = group(FlagGroupDecl {
            flags: vec!["-x".into()],
            expand_if_none_available: vec!["v".into()],
            ..Default::default()
        });
        assert_eq!(vec!["-x"], expand(&g, &VarScope::empty()));
        let scope = VarScope::builder().string("v", "set").build();
        assert!(expand(&g, &scope).is_empty());
    }

    #[test]
    fn test_expand_if_true_and_false() {
        let yes = group(FlagGroupDecl {
            flags: vec!["-x".into()],
            expand_if_true: Some("v".into()),
            ..Default::default()
        });
        let no = group(FlagGroupDecl {
            flags: vec!["-x".into()],
            expand_if_false: Some("v".into()),
            ..Default::default()
        });
        let truthy = VarScope::builder().integer("v", 1).build();
        let falsy = VarScope::builder().integer("v", 0).build();
        assert_eq!(vec!["-x"], expand(&yes, &truthy));
        assert!(expand(&yes, &falsy).is_empty());
        assert!(expand(&yes, &VarScope::empty()).is_empty());
        assert_eq!(vec!["-x"], expand(&no, &falsy));
        assert!(expand(&no, &truthy).is_empty());
        // an unbound variable fails both gates:
        assert!(expand(&no, &VarScope::empty()).is_empty());
    }

    #[test]
    fn test_expand_if_equal() {
        let g = group(FlagGroupDecl {
            flags: vec!["-x".into()],
            expand_if_equal: Some(VariableWithValueDecl {
                variable: "v".into(),
                value: "yes".into(),
            }),
            ..Default::default()
        });
        let matching = VarScope::builder().string("v", "yes").build();
        let other = VarScope::builder().string("v", "no").build();
        assert_eq!(vec!["-x"], expand(&g, &matching));
        assert!(expand(&g, &other).is_empty());
        // unbound is a skip, not an error:
        assert!(expand(&g, &VarScope::empty()).is_empty());
    }

    #[test]
    fn test_flag_set_gating() {
        let fs = FlagSet::from_decl(&FlagSetDecl {
            actions: vec!["compile".into()],
            with_features: vec![WithFeatureSetDecl {
                features: vec!["opt".into()],
                ..Default::default()
            }],
            flag_groups: vec![FlagGroupDecl {
                flags: vec!["-O2".into()],
                ..Default::default()
            }],
            ..Default::default()
        })
        .unwrap();

        let scope = VarScope::empty();
        let mut out = Vec::new();
        fs.expand("compile", &scope, &enabled(&["opt"]), None, &mut out).unwrap();
        assert_eq!(vec!["-O2"], out);

        let mut out = Vec::new();
        fs.expand("link", &scope, &enabled(&["opt"]), None, &mut out).unwrap();
        assert!(out.is_empty(), "action mismatch");

        let mut out = Vec::new();
        fs.expand("compile", &scope, &enabled(&[]), None, &mut out).unwrap();
        assert!(out.is_empty(), "with_features unsatisfied");
    }

    #[test]
    fn test_with_features_predicate() {
        let preds = vec![
            WithFeatures {
                features: vec!["a".into(), "b".into()],
                not_features: vec![],
            },
            WithFeatures {
                features: vec!["c".into()],
                not_features: vec!["d".into()],
            },
        ];
        assert!(with_features_satisfied(&[], &enabled(&[])));
        assert!(with_features_satisfied(&preds, &enabled(&["a", "b"])));
        assert!(with_features_satisfied(&preds, &enabled(&["c"])));
        assert!(!with_features_satisfied(&preds, &enabled(&["a"])));
        assert!(!with_features_satisfied(&preds, &enabled(&["c", "d"])));
    }

    #[test]
    fn test_env_set_overwrites() {
        let es = EnvSet::from_decl(&EnvSetDecl {
            actions: vec!["link".into()],
            env_entries: vec![
                crate::decl::EnvEntryDecl {
                    key: "PATH".into(),
                    value: "first".into(),
                },
                crate::decl::EnvEntryDecl {
                    key: "PATH".into(),
                    value: "%{v}".into(),
                },
            ],
            ..Default::default()
        })
        .unwrap();

        let scope = VarScope::builder().string("v", "second").build();
        let mut env = BTreeMap::new();
        es.expand("link", &scope, &enabled(&[]), &mut env).unwrap();
        assert_eq!("second", env["PATH"]);

        let mut env = BTreeMap::new();
        es.expand("compile", &scope, &enabled(&[]), &mut env).unwrap();
        assert!(env.is_empty());
    }
}
