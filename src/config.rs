//! The resolved result of feature selection: which selectables are
//! enabled for one requested set, and the command lines, environments,
//! and tools they produce.

use std::collections::BTreeMap;
use std::sync::Arc;

use util::HashSet;

use crate::id::SelectableId;
use crate::selectable::{ActionConfig, Feature, Selectable, Tool};
use crate::toolchain::FeatureTable;
use crate::vars::{ArtifactExpander, ExpandError, VarScope};
use crate::Error;

/// The set of enabled features and action configs computed for one
/// requested selectable set. Immutable; shared between callers via `Arc`.
#[derive(Debug)]
pub struct FeatureConfiguration {
    table: Arc<FeatureTable>,
    /// Enabled selectables in declaration order.
    enabled: Vec<SelectableId>,
    enabled_feature_names: HashSet<String>,
    /// Action names covered by an enabled action config.
    configured_actions: HashSet<String>,
}

impl FeatureConfiguration {
    pub(crate) fn new(table: Arc<FeatureTable>, enabled: Vec<SelectableId>) -> Self {
        let mut enabled_feature_names = HashSet::default();
        let mut configured_actions = HashSet::default();
        for &id in &enabled {
            match table.selectable(id) {
                Selectable::Feature(feature) => {
                    enabled_feature_names.insert(feature.name().to_owned());
                }
                Selectable::ActionConfig(config) => {
                    configured_actions.insert(config.action_name().to_owned());
                }
            }
        }
        Self {
            table,
            enabled,
            enabled_feature_names,
            configured_actions,
        }
    }

    /// Whether the feature with the given name is enabled.
    pub fn is_enabled(&self, feature: &str) -> bool {
        self.enabled_feature_names.contains(feature)
    }

    /// Whether an enabled action config covers the given action.
    pub fn action_is_configured(&self, action: &str) -> bool {
        self.configured_actions.contains(action)
    }

    /// Names of the enabled selectables, in declaration order.
    pub fn enabled_names(&self) -> impl Iterator<Item = &str> {
        self.enabled.iter().map(|&id| self.table.name(id))
    }

    /// The command line for `action`: the action config's flags first (if
    /// the action is configured), then each enabled feature's flags in
    /// declaration order.
    pub fn command_line(
        &self,
        action: &str,
        scope: &VarScope,
        expander: Option<&dyn ArtifactExpander>,
    ) -> Result<Vec<String>, ExpandError> {
        let mut out = Vec::new();
        if let Some(config) = self.action_config(action) {
            config.expand_command_line(scope, &self.enabled_feature_names, expander, &mut out)?;
        }
        for feature in self.enabled_features() {
            feature.expand_command_line(
                action,
                scope,
                &self.enabled_feature_names,
                expander,
                &mut out,
            )?;
        }
        Ok(out)
    }

    /// Same computation as [`command_line`](Self::command_line), but
    /// keeping per-selectable buckets: the action config's bucket first
    /// (if configured), then one bucket per enabled feature in
    /// declaration order.
    pub fn per_feature_expansions(
        &self,
        action: &str,
        scope: &VarScope,
        expander: Option<&dyn ArtifactExpander>,
    ) -> Result<Vec<(String, Vec<String>)>, ExpandError> {
        let mut buckets = Vec::new();
        if let Some(config) = self.action_config(action) {
            let mut out = Vec::new();
            config.expand_command_line(scope, &self.enabled_feature_names, expander, &mut out)?;
            buckets.push((config.name().to_owned(), out));
        }
        for feature in self.enabled_features() {
            let mut out = Vec::new();
            feature.expand_command_line(
                action,
                scope,
                &self.enabled_feature_names,
                expander,
                &mut out,
            )?;
            buckets.push((feature.name().to_owned(), out));
        }
        Ok(buckets)
    }

    /// The environment for `action`, merged over enabled features in
    /// declaration order; later keys overwrite earlier ones.
    pub fn environment_variables(
        &self,
        action: &str,
        scope: &VarScope,
    ) -> Result<BTreeMap<String, String>, ExpandError> {
        let mut env = BTreeMap::new();
        for feature in self.enabled_features() {
            feature.expand_environment(action, scope, &self.enabled_feature_names, &mut env)?;
        }
        Ok(env)
    }

    /// The tool for `action` under this configuration: the first of the
    /// enabled action config's tools whose feature predicates match.
    pub fn tool_for_action(&self, action: &str) -> Result<&Tool, Error> {
        match self.action_config(action) {
            Some(config) => config.tool(&self.enabled_feature_names),
            None => Err(Error::ActionNotConfigured(action.to_owned())),
        }
    }

    fn action_config(&self, action: &str) -> Option<&ActionConfig> {
        self.enabled
            .iter()
            .filter_map(|&id| self.table.selectable(id).as_action_config())
            .find(|config| config.action_name() == action)
    }

    fn enabled_features(&self) -> impl Iterator<Item = &Feature> {
        self.enabled
            .iter()
            .filter_map(|&id| self.table.selectable(id).as_feature())
    }
}
