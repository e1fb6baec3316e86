//! The feature selection algorithm.
//!
//! Selection first enables everything reachable over `implies` edges from
//! the requested selectables, then iteratively prunes selectables whose
//! requirements are no longer met, and finally checks that no symbol is
//! provided by two enabled selectables.

use std::collections::VecDeque;

use colored::Colorize;
use util::HashSet;

use crate::id::SelectableId;
use crate::toolchain::FeatureTable;

/// Raised when multiple enabled selectables provide the same symbol.
/// Reported to the caller, who may surface it and continue analysis.
#[derive(Debug, thiserror::Error)]
#[error("Symbol {symbol} is provided by all of the following features: {names}")]
pub struct CollidingProvidesError {
    pub symbol: String,
    /// Space-joined names of the colliding selectables, in declaration order.
    pub names: String,
}

pub(crate) struct FeatureSelection<'a> {
    table: &'a FeatureTable,
    /// Selectables the caller would like enabled; unknown requested names
    /// have already been dropped (they may come from newer toolchains).
    requested: HashSet<SelectableId>,
    enabled: HashSet<SelectableId>,
}

impl<'a> FeatureSelection<'a> {
    pub(crate) fn new(table: &'a FeatureTable, requested_names: &[String]) -> Self {
        let requested = requested_names
            .iter()
            .filter_map(|name| table.id_of(name))
            .collect();
        Self {
            table,
            requested,
            enabled: HashSet::default(),
        }
    }

    /// Compute the enabled selectables, in declaration order.
    pub(crate) fn run(mut self) -> Result<Vec<SelectableId>, CollidingProvidesError> {
        for id in self.requested.iter().copied().collect::<Vec<_>>() {
            self.enable_all_implied(id);
        }
        self.prune_unsupported();

        // command lines must come out in declaration order, so the enabled
        // list follows the toolchain, not the discovery order:
        let enabled_in_order: Vec<SelectableId> = self
            .table
            .ids()
            .filter(|id| self.enabled.contains(id))
            .collect();

        for (symbol, providers) in self.table.provides() {
            let conflicts: Vec<&str> = providers
                .iter()
                .filter(|id| self.enabled.contains(*id))
                .map(|&id| self.table.name(id))
                .collect();
            if conflicts.len() > 1 {
                return Err(CollidingProvidesError {
                    symbol: symbol.clone(),
                    names: conflicts.join(" "),
                });
            }
        }

        Ok(enabled_in_order)
    }

    /// Transitively and unconditionally enable `id` and everything it
    /// implies.
    fn enable_all_implied(&mut self, id: SelectableId) {
        if !self.enabled.insert(id) {
            return;
        }
        for &implied in self.table.implies(id) {
            self.enable_all_implied(implied);
        }
    }

    /// Re-check every enabled selectable until the set is stable. Each
    /// pass either removes a selectable or drains the queue, so this
    /// terminates.
    fn prune_unsupported(&mut self) {
        let mut queue: VecDeque<SelectableId> = self.enabled.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if !self.enabled.contains(&id) || self.is_satisfied(id) {
                continue;
            }
            self.enabled.remove(&id);
            log::debug!(
                "feature selection: disabling '{}', its requirements are not met",
                self.table.name(id).yellow()
            );
            // everything that implied, required, or was implied by the
            // removed selectable may now be unsupported too:
            for &neighbor in self.table.implied_by(id) {
                queue.push_back(neighbor);
            }
            for &neighbor in self.table.required_by(id) {
                queue.push_back(neighbor);
            }
            for &neighbor in self.table.implies(id) {
                queue.push_back(neighbor);
            }
        }
    }

    fn is_satisfied(&self, id: SelectableId) -> bool {
        (self.requested.contains(&id) || self.implied_by_enabled(id))
            && self.all_implications_enabled(id)
            && self.requirements_met(id)
    }

    fn implied_by_enabled(&self, id: SelectableId) -> bool {
        self.table.implied_by(id).iter().any(|i| self.enabled.contains(i))
    }

    fn all_implications_enabled(&self, id: SelectableId) -> bool {
        self.table.implies(id).iter().all(|i| self.enabled.contains(i))
    }

    /// An empty requires list is met; otherwise at least one conjunction
    /// must be fully enabled.
    fn requirements_met(&self, id: SelectableId) -> bool {
        let groups = self.table.requires(id);
        groups.is_empty()
            || groups
                .iter()
                .any(|group| group.iter().all(|r| self.enabled.contains(r)))
    }
}
