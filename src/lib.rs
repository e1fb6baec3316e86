//! Toolchain feature configuration engine for C/C++ builds.
//!
//! A toolchain declaration enumerates *features* and *action configs*
//! (collectively *selectables*) along with `implies`/`requires`/`provides`
//! relations between them, per-action command-line flag templates, and
//! environment bindings. Given a requested set of selectable names, this
//! crate computes which selectables end up enabled, and for any build
//! action expands the matching flag templates against a hierarchical
//! variable scope into a deterministic command line and environment.

/// Artifact categories and per-category name patterns
mod artifact;
/// Memo cache for resolved configurations
mod cache;
/// The resolved result object for one requested set
mod config;
/// Toolchain declaration input structs
mod decl;
/// Load-error aggregation
mod errors;
/// Flag sets, flag groups, env sets, and their expansion
mod flags;
/// Typed ids
mod id;
/// The feature selection algorithm
mod select;
/// Features, action configs, and tools
mod selectable;
/// The immutable feature table and its public entry point
mod toolchain;
/// Build variables: values and scopes
mod vars;

pub use artifact::ArtifactCategory;
pub use config::FeatureConfiguration;
pub use decl::{
    ActionConfigDecl, ArtifactNamePatternDecl, EnvEntryDecl, EnvSetDecl, FeatureDecl,
    FeatureSetDecl, FlagGroupDecl, FlagSetDecl, ToolDecl, ToolchainDecl, VariableWithValueDecl,
    WithFeatureSetDecl,
};
pub use errors::{AggregatedErrors, Errors};
pub use select::CollidingProvidesError;
pub use selectable::Tool;
pub use toolchain::ToolchainFeatures;
pub use vars::{
    Artifact, ArtifactExpander, ExpandError, LazyStrings, LibraryToLink, LinkType, VarScope,
    VarScopeBuilder, VarValue,
};

/// A logical error in a toolchain declaration, fatal at load time.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("feature or action config '{0}' was specified multiple times")]
    DuplicateSelectable(String),
    #[error("multiple action configs for action '{0}'")]
    DuplicateActionName(String),
    #[error("feature '{name}', which is referenced from feature '{referenced_from}', is not defined")]
    UndefinedSelectable { name: String, referenced_from: String },
    #[error(
        "action_config '{0}' specifies actions; an action_config's flag sets \
        automatically apply to the configured action"
    )]
    FlagSetWithActions(String),
    #[error("a flag_group must not contain both a flag and another flag_group")]
    MixedFlagGroup,
    #[error("artifact category '{0}' not recognized")]
    UnknownArtifactCategory(String),
    #[error("toolchain must provide artifact_name_pattern for category '{0}'")]
    MissingArtifactNamePattern(String),
    #[error("action '{0}' does not have an enabled configuration in the toolchain")]
    ActionNotConfigured(String),
    #[error("matching tool for action '{0}' not found for given feature configuration")]
    NoMatchingTool(String),
}
