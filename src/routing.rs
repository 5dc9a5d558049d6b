//! Routing rules.
//!
//! A rule maps a set of watched file paths to a downstream notification
//! URL. Matching is exact string equality on the full relative path; by
//! the time a rule exists, wildcard-looking patterns have already been
//! dropped at config load (see [`crate::config`]).

use std::collections::BTreeSet;

/// A named routing rule.
///
/// The name is the unique key used in commit-status contexts and for
/// `retest <service>/<name>` filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub name: String,
    pub url: String,
    exact: BTreeSet<String>,
}

impl RouteRule {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        exact: impl IntoIterator<Item = String>,
    ) -> Self {
        RouteRule {
            name: name.into(),
            url: url.into(),
            exact: exact.into_iter().collect(),
        }
    }

    /// The subset of `changed` this rule watches. Pure; an empty watch
    /// set matches nothing.
    pub fn return_matches(&self, changed: &BTreeSet<String>) -> BTreeSet<String> {
        self.exact.intersection(changed).cloned().collect()
    }

    /// The watched path set.
    pub fn exact(&self) -> &BTreeSet<String> {
        &self.exact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rule(paths: &[&str]) -> RouteRule {
        RouteRule::new(
            "alarms",
            "https://alarms.internal/notify",
            paths.iter().map(|s| s.to_string()),
        )
    }

    #[test]
    fn intersects_exactly() {
        let rule = rule(&["alarms.yml", "config/alerts.yml"]);
        let changed = BTreeSet::from([
            "alarms.yml".to_string(),
            "unrelated.txt".to_string(),
        ]);

        assert_eq!(
            rule.return_matches(&changed),
            BTreeSet::from(["alarms.yml".to_string()])
        );
    }

    #[test]
    fn no_glob_semantics() {
        // Exact equality only: a watched directory prefix does not match
        // files under it.
        let rule = rule(&["config"]);
        let changed = BTreeSet::from(["config/alerts.yml".to_string()]);

        assert!(rule.return_matches(&changed).is_empty());
    }

    proptest! {
        /// An empty watch set never matches, whatever changed.
        #[test]
        fn empty_rule_never_matches(changed in proptest::collection::btree_set("[a-z./]{1,20}", 0..8)) {
            let rule = rule(&[]);
            prop_assert!(rule.return_matches(&changed).is_empty());
        }

        /// Matches are always a subset of both the watch set and the input.
        #[test]
        fn matches_are_subset(
            watched in proptest::collection::vec("[a-z./]{1,20}", 0..8),
            changed in proptest::collection::btree_set("[a-z./]{1,20}", 0..8),
        ) {
            let rule = RouteRule::new("r", "https://example.org", watched);
            let matches = rule.return_matches(&changed);
            prop_assert!(matches.is_subset(rule.exact()));
            prop_assert!(matches.is_subset(&changed));
        }
    }
}
