use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Permission matrix: group name -> action name -> allowed.
///
/// Stored per role as a set of overrides; the same shape describes the
/// baseline template and the merged (effective) result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMatrix(BTreeMap<String, BTreeMap<String, bool>>);

impl PermissionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`PermissionMatrix::set`].
    pub fn with(mut self, group: impl Into<String>, action: impl Into<String>, allowed: bool) -> Self {
        self.set(group, action, allowed);
        self
    }

    pub fn set(&mut self, group: impl Into<String>, action: impl Into<String>, allowed: bool) {
        self.0
            .entry(group.into())
            .or_default()
            .insert(action.into(), allowed);
    }

    pub fn get(&self, group: &str, action: &str) -> Option<bool> {
        self.0.get(group).and_then(|actions| actions.get(action)).copied()
    }

    /// Whether `key` is explicitly granted. Absent pairs are denied.
    pub fn allows(&self, key: &PermissionKey) -> bool {
        self.get(&key.group, &key.action).unwrap_or(false)
    }

    pub fn contains_group(&self, group: &str) -> bool {
        self.0.contains_key(group)
    }

    /// Group names in sorted order, including groups with no actions.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// All `(group, action, allowed)` triples in sorted order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, bool)> {
        self.0.iter().flat_map(|(group, actions)| {
            actions
                .iter()
                .map(move |(action, allowed)| (group.as_str(), action.as_str(), *allowed))
        })
    }

    /// Number of `(group, action)` pairs.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single `(group, action)` pair that a route requires.
///
/// Only obtainable through [`BaselineTemplate::key`], so every key in use is
/// known to the template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PermissionKey {
    group: String,
    action: String,
}

impl PermissionKey {
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

impl core::fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.group, self.action)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("unknown permission group '{0}'")]
    UnknownGroup(String),

    #[error("unknown permission action '{group}.{action}'")]
    UnknownAction { group: String, action: String },

    #[error("permission template is empty")]
    EmptyTemplate,

    #[error("malformed permission template: {0}")]
    Malformed(String),
}

/// The baseline template (`prePermission`).
///
/// Enumerates every known `(group, action)` pair with its default value.
/// Role overrides are validated against it and merged over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineTemplate(PermissionMatrix);

/// Record groups and the CRUD actions each of them exposes.
const DEFAULT_GROUPS: [&str; 4] = ["customers", "projects", "expenses", "users"];
const DEFAULT_ACTIONS: [&str; 4] = ["view", "add", "edit", "delete"];

impl BaselineTemplate {
    pub fn new(matrix: PermissionMatrix) -> Result<Self, PermissionError> {
        if matrix.is_empty() {
            return Err(PermissionError::EmptyTemplate);
        }
        Ok(Self(matrix))
    }

    /// Parse a template from its JSON form (`{"group": {"action": bool}}`).
    pub fn from_json(raw: &str) -> Result<Self, PermissionError> {
        let matrix: PermissionMatrix =
            serde_json::from_str(raw).map_err(|e| PermissionError::Malformed(e.to_string()))?;
        Self::new(matrix)
    }

    pub fn matrix(&self) -> &PermissionMatrix {
        &self.0
    }

    /// Resolve a route requirement, failing fast on unknown names.
    pub fn key(&self, group: &str, action: &str) -> Result<PermissionKey, PermissionError> {
        self.check_pair(group, action)?;
        Ok(PermissionKey {
            group: group.to_string(),
            action: action.to_string(),
        })
    }

    /// Every override must name a pair present in the template. A group
    /// listed without actions must still be a known group.
    pub fn validate(&self, overrides: &PermissionMatrix) -> Result<(), PermissionError> {
        if let Some(group) = overrides.groups().find(|g| !self.0.contains_group(g)) {
            return Err(PermissionError::UnknownGroup(group.to_string()));
        }
        overrides
            .entries()
            .try_for_each(|(group, action, _)| self.check_pair(group, action))
    }

    /// Baseline overlaid with `overrides`.
    ///
    /// The result holds an explicit value for every baseline pair and nothing
    /// else; override values win, unspecified pairs keep the baseline default.
    pub fn effective(&self, overrides: &PermissionMatrix) -> Result<PermissionMatrix, PermissionError> {
        self.validate(overrides)?;

        let mut merged = self.0.clone();
        for (group, action, allowed) in overrides.entries() {
            merged.set(group, action, allowed);
        }
        Ok(merged)
    }

    /// The template with every pair granted (super-role view).
    pub fn grant_all(&self) -> PermissionMatrix {
        let mut all = PermissionMatrix::new();
        for (group, action, _) in self.0.entries() {
            all.set(group, action, true);
        }
        all
    }

    fn check_pair(&self, group: &str, action: &str) -> Result<(), PermissionError> {
        if !self.0.contains_group(group) {
            return Err(PermissionError::UnknownGroup(group.to_string()));
        }
        if self.0.get(group, action).is_none() {
            return Err(PermissionError::UnknownAction {
                group: group.to_string(),
                action: action.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for BaselineTemplate {
    /// Deny-by-default CRUD template over the built-in record groups.
    fn default() -> Self {
        let mut matrix = PermissionMatrix::new();
        for group in DEFAULT_GROUPS {
            for action in DEFAULT_ACTIONS {
                matrix.set(group, action, false);
            }
        }
        Self(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn documents_baseline() -> BaselineTemplate {
        BaselineTemplate::new(
            PermissionMatrix::new()
                .with("documents", "write", false)
                .with("documents", "read", true),
        )
        .unwrap()
    }

    #[test]
    fn override_wins_and_unspecified_falls_back() {
        let baseline = documents_baseline();
        let editor = PermissionMatrix::new().with("documents", "write", true);

        let effective = baseline.effective(&editor).unwrap();

        assert_eq!(
            effective,
            PermissionMatrix::new()
                .with("documents", "write", true)
                .with("documents", "read", true)
        );
    }

    #[test]
    fn explicit_false_override_revokes_baseline_grant() {
        let baseline = documents_baseline();
        let overrides = PermissionMatrix::new().with("documents", "read", false);

        let effective = baseline.effective(&overrides).unwrap();
        assert_eq!(effective.get("documents", "read"), Some(false));
    }

    #[test]
    fn unknown_group_without_actions_is_rejected() {
        let baseline = BaselineTemplate::default();
        let overrides: PermissionMatrix = serde_json::from_str(r#"{"bogus": {}}"#).unwrap();

        let err = baseline.validate(&overrides).unwrap_err();
        assert_eq!(err, PermissionError::UnknownGroup("bogus".into()));

        let known: PermissionMatrix = serde_json::from_str(r#"{"customers": {}}"#).unwrap();
        assert!(baseline.validate(&known).is_ok());
    }

    #[test]
    fn misspelled_action_fails_fast() {
        let baseline = documents_baseline();
        let overrides = PermissionMatrix::new().with("documents", "wirte", true);

        let err = baseline.effective(&overrides).unwrap_err();
        assert_eq!(
            err,
            PermissionError::UnknownAction {
                group: "documents".into(),
                action: "wirte".into()
            }
        );
    }

    #[test]
    fn unknown_group_is_rejected_for_keys() {
        let baseline = documents_baseline();
        assert!(matches!(
            baseline.key("invoices", "read"),
            Err(PermissionError::UnknownGroup(_))
        ));
        assert_eq!(baseline.key("documents", "read").unwrap().to_string(), "documents.read");
    }

    #[test]
    fn template_loads_from_json() {
        let baseline =
            BaselineTemplate::from_json(r#"{"documents": {"read": true, "write": false}}"#).unwrap();
        assert_eq!(baseline, documents_baseline());
        assert_eq!(BaselineTemplate::from_json("{}"), Err(PermissionError::EmptyTemplate));
    }

    #[test]
    fn default_template_denies_everything() {
        let baseline = BaselineTemplate::default();
        assert_eq!(baseline.matrix().len(), 16);
        assert!(baseline.matrix().entries().all(|(_, _, allowed)| !allowed));
        assert!(baseline.grant_all().entries().all(|(_, _, allowed)| allowed));
    }

    fn arb_baseline() -> impl Strategy<Value = BaselineTemplate> {
        prop::collection::btree_map(
            "[a-d]",
            prop::collection::btree_map("[p-t]", any::<bool>(), 1..4),
            1..4,
        )
        .prop_map(|groups| {
            let mut matrix = PermissionMatrix::new();
            for (group, actions) in groups {
                for (action, allowed) in actions {
                    matrix.set(group.clone(), action, allowed);
                }
            }
            BaselineTemplate::new(matrix).unwrap()
        })
    }

    /// Baseline plus a random subset of its pairs overridden with random values.
    fn arb_case() -> impl Strategy<Value = (BaselineTemplate, PermissionMatrix)> {
        arb_baseline().prop_flat_map(|baseline| {
            let pairs: Vec<(String, String)> = baseline
                .matrix()
                .entries()
                .map(|(g, a, _)| (g.to_string(), a.to_string()))
                .collect();
            let n = pairs.len();
            (
                Just(baseline),
                prop::collection::vec((any::<bool>(), any::<bool>()), n),
                Just(pairs),
            )
                .prop_map(|(baseline, picks, pairs)| {
                    let mut overrides = PermissionMatrix::new();
                    for ((group, action), (pick, value)) in pairs.into_iter().zip(picks) {
                        if pick {
                            overrides.set(group, action, value);
                        }
                    }
                    (baseline, overrides)
                })
        })
    }

    proptest! {
        #[test]
        fn merge_is_total_over_baseline((baseline, overrides) in arb_case()) {
            let effective = baseline.effective(&overrides).unwrap();

            prop_assert_eq!(effective.len(), baseline.matrix().len());
            for (group, action, default) in baseline.matrix().entries() {
                let expected = overrides.get(group, action).unwrap_or(default);
                prop_assert_eq!(effective.get(group, action), Some(expected));
            }
        }

        #[test]
        fn merge_is_idempotent((baseline, overrides) in arb_case()) {
            let once = baseline.effective(&overrides).unwrap();
            let twice = baseline.effective(&once).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
