//! Features and action configs: the two kinds of selectable that
//! participate in the implies/requires/provides graph.

use std::collections::BTreeMap;

use anyhow::Result;
use util::HashSet;

use crate::decl::{ActionConfigDecl, FeatureDecl, ToolDecl};
use crate::flags::{with_features_satisfied, EnvSet, FlagSet, WithFeatures};
use crate::vars::{ArtifactExpander, ExpandError, VarScope};
use crate::Error;

#[derive(Debug)]
pub(crate) enum Selectable {
    Feature(Feature),
    ActionConfig(ActionConfig),
}

impl Selectable {
    pub(crate) fn name(&self) -> &str {
        match self {
            Self::Feature(f) => f.name(),
            Self::ActionConfig(c) => c.name(),
        }
    }

    pub(crate) fn as_feature(&self) -> Option<&Feature> {
        match self {
            Self::Feature(f) => Some(f),
            Self::ActionConfig(_) => None,
        }
    }

    pub(crate) fn as_action_config(&self) -> Option<&ActionConfig> {
        match self {
            Self::Feature(_) => None,
            Self::ActionConfig(c) => Some(c),
        }
    }
}

/// A named bundle of flag sets and env sets.
#[derive(Debug)]
pub(crate) struct Feature {
    name: String,
    flag_sets: Vec<FlagSet>,
    env_sets: Vec<EnvSet>,
}

impl Feature {
    pub(crate) fn from_decl(decl: &FeatureDecl) -> Result<Self> {
        let mut flag_sets = Vec::with_capacity(decl.flag_sets.len());
        for flag_set in &decl.flag_sets {
            flag_sets.push(FlagSet::from_decl(flag_set)?);
        }
        let mut env_sets = Vec::with_capacity(decl.env_sets.len());
        for env_set in &decl.env_sets {
            env_sets.push(EnvSet::from_decl(env_set)?);
        }
        Ok(Self {
            name: decl.name.clone(),
            flag_sets,
            env_sets,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn expand_command_line(
        &self,
        action: &str,
        scope: &VarScope,
        enabled: &HashSet<String>,
        expander: Option<&dyn ArtifactExpander>,
        out: &mut Vec<String>,
    ) -> Result<(), ExpandError> {
        for flag_set in &self.flag_sets {
            flag_set.expand(action, scope, enabled, expander, out)?;
        }
        Ok(())
    }

    pub(crate) fn expand_environment(
        &self,
        action: &str,
        scope: &VarScope,
        enabled: &HashSet<String>,
        env: &mut BTreeMap<String, String>,
    ) -> Result<(), ExpandError> {
        for env_set in &self.env_sets {
            env_set.expand(action, scope, enabled, env)?;
        }
        Ok(())
    }
}

/// An executable invoked for a configured action, with the feature
/// predicates under which it applies and its execution requirement hints.
#[derive(Debug, Clone)]
pub struct Tool {
    path: String,
    with_features: Vec<WithFeatures>,
    execution_requirements: Vec<String>,
}

impl Tool {
    fn from_decl(decl: &ToolDecl) -> Self {
        Self {
            path: decl.tool_path.clone(),
            with_features: decl.with_features.iter().map(WithFeatures::from_decl).collect(),
            execution_requirements: decl.execution_requirements.clone(),
        }
    }

    /// Path to the tool, relative to the toolchain root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Requirement hints that apply to executions of this tool.
    pub fn execution_requirements(&self) -> &[String] {
        &self.execution_requirements
    }
}

/// A named bundle of flag sets applying to one build action, plus an
/// ordered tool list: the first tool whose predicates match the enabled
/// feature set is the tool for the action.
#[derive(Debug)]
pub(crate) struct ActionConfig {
    config_name: String,
    action_name: String,
    tools: Vec<Tool>,
    flag_sets: Vec<FlagSet>,
}

impl ActionConfig {
    pub(crate) fn from_decl(decl: &ActionConfigDecl) -> Result<Self> {
        let mut flag_sets = Vec::with_capacity(decl.flag_sets.len());
        for flag_set in &decl.flag_sets {
            // flag sets in an action config implicitly apply to the
            // configured action and must not name actions themselves:
            if !flag_set.actions.is_empty() {
                return Err(Error::FlagSetWithActions(decl.config_name.clone()).into());
            }
            flag_sets.push(FlagSet::for_action(flag_set, &decl.action_name)?);
        }
        Ok(Self {
            config_name: decl.config_name.clone(),
            action_name: decl.action_name.clone(),
            tools: decl.tools.iter().map(Tool::from_decl).collect(),
            flag_sets,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.config_name
    }

    pub(crate) fn action_name(&self) -> &str {
        &self.action_name
    }

    /// First tool in declaration order whose predicates match.
    pub(crate) fn tool(&self, enabled: &HashSet<String>) -> Result<&Tool, Error> {
        self.tools
            .iter()
            .find(|tool| with_features_satisfied(&tool.with_features, enabled))
            .ok_or_else(|| Error::NoMatchingTool(self.action_name.clone()))
    }

    pub(crate) fn expand_command_line(
        &self,
        scope: &VarScope,
        enabled: &HashSet<String>,
        expander: Option<&dyn ArtifactExpander>,
        out: &mut Vec<String>,
    ) -> Result<(), ExpandError> {
        for flag_set in &self.flag_sets {
            flag_set.expand(&self.action_name, scope, enabled, expander, out)?;
        }
        Ok(())
    }
}
