//! Plain-data representation of a toolchain declaration.
//!
//! These structs mirror the wire-level toolchain message; the loader that
//! produces them (protobuf, TOML, tests building them by hand) lives
//! outside this crate. Everything is serde-deserializable so callers can
//! read declarations from config files directly.

use serde::{Deserialize, Serialize};

/// A full toolchain declaration: features, action configs, and artifact
/// name patterns, in declaration order.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainDecl {
    pub features: Vec<FeatureDecl>,
    pub action_configs: Vec<ActionConfigDecl>,
    pub artifact_name_patterns: Vec<ArtifactNamePatternDecl>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureDecl {
    pub name: String,
    /// Whether this feature is part of the default selectable set.
    pub enabled: bool,
    pub flag_sets: Vec<FlagSetDecl>,
    pub env_sets: Vec<EnvSetDecl>,
    pub implies: Vec<String>,
    /// Disjunction of conjunctions: satisfied if at least one group is
    /// fully enabled.
    pub requires: Vec<FeatureSetDecl>,
    pub provides: Vec<String>,
}

/// One conjunction in a `requires` list.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSetDecl {
    pub features: Vec<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfigDecl {
    pub config_name: String,
    pub action_name: String,
    /// Whether this action config is part of the default selectable set.
    pub enabled: bool,
    pub tools: Vec<ToolDecl>,
    pub implies: Vec<String>,
    /// Flag sets here must not declare their own `actions` list; they
    /// implicitly apply to `action_name`.
    pub flag_sets: Vec<FlagSetDecl>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDecl {
    pub tool_path: String,
    pub with_features: Vec<WithFeatureSetDecl>,
    pub execution_requirements: Vec<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagSetDecl {
    pub actions: Vec<String>,
    pub with_features: Vec<WithFeatureSetDecl>,
    pub expand_if_all_available: Vec<String>,
    pub flag_groups: Vec<FlagGroupDecl>,
}

/// A flag group holds either plain flags or nested groups, never both.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagGroupDecl {
    pub flags: Vec<String>,
    pub flag_groups: Vec<FlagGroupDecl>,
    pub iterate_over: Option<String>,
    pub expand_if_all_available: Vec<String>,
    pub expand_if_none_available: Vec<String>,
    pub expand_if_true: Option<String>,
    pub expand_if_false: Option<String>,
    pub expand_if_equal: Option<VariableWithValueDecl>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableWithValueDecl {
    pub variable: String,
    pub value: String,
}

/// A predicate over the enabled feature set: all of `features` must be
/// enabled and none of `not_features`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WithFeatureSetDecl {
    pub features: Vec<String>,
    pub not_features: Vec<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvSetDecl {
    pub actions: Vec<String>,
    pub with_features: Vec<WithFeatureSetDecl>,
    pub env_entries: Vec<EnvEntryDecl>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvEntryDecl {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactNamePatternDecl {
    pub category_name: String,
    pub pattern: String,
}
