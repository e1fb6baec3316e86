//! The immutable feature table built from a toolchain declaration, and
//! the public entry point wrapping it with a configuration cache.

use std::sync::Arc;

use anyhow::Result;
use util::{HashMap, IdTable};

use crate::artifact::{ArtifactCategory, ArtifactNamePattern};
use crate::cache::ConfigCache;
use crate::config::FeatureConfiguration;
use crate::decl::ToolchainDecl;
use crate::errors::Errors;
use crate::id::SelectableId;
use crate::select::{CollidingProvidesError, FeatureSelection};
use crate::selectable::{ActionConfig, Feature, Selectable};
use crate::Error;

/// Upper bound on distinct requested sets kept in the memo cache.
const CONFIG_CACHE_CAPACITY: usize = 10_000;

/// All selectables of a toolchain in declaration order, their
/// implies/requires/provides relations as id-keyed edge lists, and the
/// artifact name patterns. Immutable once built.
#[derive(Debug)]
pub(crate) struct FeatureTable {
    selectables: IdTable<SelectableId, Selectable>,
    by_name: HashMap<String, SelectableId>,
    /// Direct implies edges, per selectable.
    implies: IdTable<SelectableId, Vec<SelectableId>>,
    /// Reverse of `implies`.
    implied_by: IdTable<SelectableId, Vec<SelectableId>>,
    /// Disjunction of conjunctions, per selectable.
    requires: IdTable<SelectableId, Vec<Vec<SelectableId>>>,
    /// Selectables naming this one in any requires group.
    required_by: IdTable<SelectableId, Vec<SelectableId>>,
    /// Symbol -> providing selectables, in declaration order.
    provides: Vec<(String, Vec<SelectableId>)>,
    artifact_name_patterns: Vec<ArtifactNamePattern>,
    /// Names of selectables enabled by default, in declaration order.
    default_selectables: Vec<String>,
}

impl FeatureTable {
    pub(crate) fn id_of(&self, name: &str) -> Option<SelectableId> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn selectable(&self, id: SelectableId) -> &Selectable {
        self.selectables.get(id)
    }

    pub(crate) fn name(&self, id: SelectableId) -> &str {
        self.selectables.get(id).name()
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = SelectableId> {
        self.selectables.ids()
    }

    pub(crate) fn implies(&self, id: SelectableId) -> &[SelectableId] {
        self.implies.get(id)
    }

    pub(crate) fn implied_by(&self, id: SelectableId) -> &[SelectableId] {
        self.implied_by.get(id)
    }

    pub(crate) fn requires(&self, id: SelectableId) -> &[Vec<SelectableId>] {
        self.requires.get(id)
    }

    pub(crate) fn required_by(&self, id: SelectableId) -> &[SelectableId] {
        self.required_by.get(id)
    }

    pub(crate) fn provides(&self) -> &[(String, Vec<SelectableId>)] {
        &self.provides
    }
}

/// Access to the features supported by a specific toolchain.
///
/// Built once from a [`ToolchainDecl`]; fully immutable afterwards except
/// for the internal memo cache, which is safe for concurrent use. The
/// cache is process-local and transient: it is never part of any
/// serialized state.
#[derive(Debug)]
pub struct ToolchainFeatures {
    table: Arc<FeatureTable>,
    cache: ConfigCache,
}

impl ToolchainFeatures {
    /// Build the feature table, validating the whole declaration. All
    /// configuration errors found are logged; the first pass must be
    /// clean before cross-references are resolved.
    pub fn new(decl: &ToolchainDecl) -> Result<Self> {
        let table = build_table(decl)?;
        log::debug!(
            "loaded toolchain: {} features, {} action configs, {} artifact name patterns",
            decl.features.len(),
            decl.action_configs.len(),
            table.artifact_name_patterns.len(),
        );
        Ok(Self {
            table: Arc::new(table),
            cache: ConfigCache::with_capacity(CONFIG_CACHE_CAPACITY),
        })
    }

    /// The configuration enabling everything the toolchain supports among
    /// `requested` plus whatever that implies. Requested names unknown to
    /// this toolchain are silently ignored; a requested selectable whose
    /// requirements cannot be met is simply absent from the result.
    pub fn feature_configuration<S: AsRef<str>>(
        &self,
        requested: &[S],
    ) -> Result<Arc<FeatureConfiguration>, CollidingProvidesError> {
        let mut key: Vec<String> = requested.iter().map(|s| s.as_ref().to_owned()).collect();
        key.sort();
        key.dedup();

        if let Some(config) = self.cache.get(&key) {
            log::trace!("configuration cache hit for {key:?}");
            return Ok(config);
        }

        let enabled = FeatureSelection::new(&self.table, &key).run()?;
        let config = Arc::new(FeatureConfiguration::new(self.table.clone(), enabled));
        self.cache.insert(key, config.clone());
        Ok(config)
    }

    /// Names of the selectables flagged enabled-by-default, in
    /// declaration order.
    pub fn default_features_and_action_configs(&self) -> &[String] {
        &self.table.default_selectables
    }

    /// Names of all defined selectables, in declaration order.
    pub fn selectable_names(&self) -> impl Iterator<Item = &str> {
        self.table.selectables.rows().map(Selectable::name)
    }

    /// Whether the toolchain defines a name pattern for `category`.
    pub fn has_pattern_for_category(&self, category: ArtifactCategory) -> bool {
        self.table
            .artifact_name_patterns
            .iter()
            .any(|p| p.category() == category)
    }

    /// The artifact name the toolchain selects for `category` and
    /// `output_name`.
    pub fn artifact_name_for_category(
        &self,
        category: ArtifactCategory,
        output_name: &str,
    ) -> Result<String> {
        let pattern = self
            .table
            .artifact_name_patterns
            .iter()
            .find(|p| p.category() == category)
            .ok_or_else(|| {
                Error::MissingArtifactNamePattern(category.category_name().to_owned())
            })?;
        Ok(pattern.expand(output_name)?)
    }
}

fn build_table(decl: &ToolchainDecl) -> Result<FeatureTable> {
    let mut errors = Errors::default();

    // First pass: register every selectable by name, so that earlier
    // selectables can reference later ones in their relations.
    let mut selectables: IdTable<SelectableId, Selectable> =
        IdTable::with_capacity(decl.features.len() + decl.action_configs.len());
    let mut by_name: HashMap<String, SelectableId> = HashMap::default();
    let mut action_names: HashMap<String, SelectableId> = HashMap::default();
    let mut default_selectables = Vec::new();

    for feature_decl in &decl.features {
        match Feature::from_decl(feature_decl) {
            Ok(feature) => {
                let id = selectables.push(Selectable::Feature(feature));
                if by_name.insert(feature_decl.name.clone(), id).is_some() {
                    errors.add(Error::DuplicateSelectable(feature_decl.name.clone()).into());
                }
                if feature_decl.enabled {
                    default_selectables.push(feature_decl.name.clone());
                }
            }
            Err(e) => errors.add_context(e, format!("in feature '{}'", feature_decl.name)),
        }
    }
    for config_decl in &decl.action_configs {
        match ActionConfig::from_decl(config_decl) {
            Ok(config) => {
                let id = selectables.push(Selectable::ActionConfig(config));
                if by_name.insert(config_decl.config_name.clone(), id).is_some() {
                    errors.add(Error::DuplicateSelectable(config_decl.config_name.clone()).into());
                }
                if action_names.insert(config_decl.action_name.clone(), id).is_some() {
                    errors.add(Error::DuplicateActionName(config_decl.action_name.clone()).into());
                }
                if config_decl.enabled {
                    default_selectables.push(config_decl.config_name.clone());
                }
            }
            Err(e) => {
                errors.add_context(e, format!("in action_config '{}'", config_decl.config_name))
            }
        }
    }

    let mut artifact_name_patterns = Vec::with_capacity(decl.artifact_name_patterns.len());
    for pattern_decl in &decl.artifact_name_patterns {
        match ArtifactNamePattern::from_decl(pattern_decl) {
            Ok(pattern) => artifact_name_patterns.push(pattern),
            Err(e) => errors.add_context(
                e,
                format!("in artifact_name_pattern for '{}'", pattern_decl.category_name),
            ),
        }
    }

    errors.into_result("building the selectable table")?;

    // Second pass: resolve all implies/requires/provides cross-references.
    let mut implies: IdTable<SelectableId, Vec<SelectableId>> = IdTable::parallel_to(&selectables);
    let mut implied_by: IdTable<SelectableId, Vec<SelectableId>> =
        IdTable::parallel_to(&selectables);
    let mut requires: IdTable<SelectableId, Vec<Vec<SelectableId>>> =
        IdTable::parallel_to(&selectables);
    let mut required_by: IdTable<SelectableId, Vec<SelectableId>> =
        IdTable::parallel_to(&selectables);
    let mut provides: Vec<(String, Vec<SelectableId>)> = Vec::new();

    let mut errors = Errors::default();
    let resolve = |name: &str, referenced_from: &str, errors: &mut Errors| {
        let id = by_name.get(name).copied();
        if id.is_none() {
            errors.add(
                Error::UndefinedSelectable {
                    name: name.to_owned(),
                    referenced_from: referenced_from.to_owned(),
                }
                .into(),
            );
        }
        id
    };

    for feature_decl in &decl.features {
        let id = by_name[&feature_decl.name];
        for group in &feature_decl.requires {
            let mut all_of = Vec::with_capacity(group.features.len());
            for required_name in &group.features {
                if let Some(required) = resolve(required_name, &feature_decl.name, &mut errors) {
                    all_of.push(required);
                    required_by.get_mut(required).push(id);
                }
            }
            requires.get_mut(id).push(all_of);
        }
        for implied_name in &feature_decl.implies {
            if let Some(implied) = resolve(implied_name, &feature_decl.name, &mut errors) {
                implies.get_mut(id).push(implied);
                implied_by.get_mut(implied).push(id);
            }
        }
        for symbol in &feature_decl.provides {
            match provides.iter_mut().find(|(s, _)| s == symbol) {
                Some((_, providers)) => providers.push(id),
                None => provides.push((symbol.clone(), vec![id])),
            }
        }
    }
    for config_decl in &decl.action_configs {
        let id = by_name[&config_decl.config_name];
        for implied_name in &config_decl.implies {
            if let Some(implied) = resolve(implied_name, &config_decl.config_name, &mut errors) {
                implies.get_mut(id).push(implied);
                implied_by.get_mut(implied).push(id);
            }
        }
    }

    errors.into_result("resolving selectable relations")?;

    Ok(FeatureTable {
        selectables,
        by_name,
        implies,
        implied_by,
        requires,
        required_by,
        provides,
        artifact_name_patterns,
        default_selectables,
    })
}
