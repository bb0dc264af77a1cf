//! Two-level grouping of panels by metric name segments.
//!
//! Metric names cluster into a (group, subgroup) hierarchy derived from
//! their underscore-delimited segments. The split is a heuristic: a
//! namespace that itself contains underscores will be cut mid-namespace.
//! That imprecision is accepted and documented, not corrected; the
//! [`Strategy`] trait is the substitution point for anything stricter.

use std::collections::BTreeMap;

use crate::panel::Panel;

/// Classifies one metric name into its (group, subgroup) pair.
pub trait Strategy {
    /// The (group, subgroup) placement for `name`.
    fn classify(&self, name: &str) -> (String, String);
}

/// The canonical underscore-segment heuristic.
///
/// The first underscore-delimited segment is the group and the second,
/// when present, the subgroup. A name with no second segment is its own
/// subgroup.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnderscoreStrategy;

impl Strategy for UnderscoreStrategy {
    fn classify(&self, name: &str) -> (String, String) {
        let mut segments = name.splitn(3, '_');
        let group = segments.next().unwrap_or(name).to_string();
        let subgroup = segments
            .next()
            .map_or_else(|| group.clone(), ToOwned::to_owned);
        (group, subgroup)
    }
}

/// Assign a group and subgroup to every panel.
///
/// `panels` must already be sorted by name: rendering treats a change of
/// group as a section boundary, which only lines up when names arrive
/// contiguous by segment.
pub fn assign(panels: &mut [Panel], strategy: &dyn Strategy) {
    for panel in panels {
        let (group, subgroup) = strategy.classify(&panel.name);
        panel.group = group;
        panel.subgroup = subgroup;
    }
}

/// Group hierarchy over a name sequence: group, then subgroup, then the
/// names that landed in that bucket, in input order.
pub type Hierarchy = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Build the group hierarchy for a name-sorted sequence.
///
/// Consecutive names sharing a first segment but differing in their
/// second land in distinct subgroup buckets; a bare name is its own
/// subgroup. This is the inspection view of what [`assign`] does to a
/// panel list.
#[must_use]
pub fn hierarchy<S: AsRef<str>>(names: &[S], strategy: &dyn Strategy) -> Hierarchy {
    let mut tree = Hierarchy::new();

    for name in names {
        let name = name.as_ref();
        let (group, subgroup) = strategy.classify(name);
        tree.entry(group)
            .or_default()
            .entry(subgroup)
            .or_default()
            .push(name.to_string());
    }

    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(name: &str) -> (String, String) {
        UnderscoreStrategy.classify(name)
    }

    #[test]
    fn first_segment_is_group_second_is_subgroup() {
        assert_eq!(classify("a_b_c"), ("a".to_string(), "b".to_string()));
        assert_eq!(classify("http_requests_total"), ("http".to_string(), "requests".to_string()));
    }

    #[test]
    fn two_segment_name() {
        assert_eq!(classify("queue_depth"), ("queue".to_string(), "depth".to_string()));
    }

    #[test]
    fn bare_name_is_its_own_subgroup() {
        assert_eq!(classify("c"), ("c".to_string(), "c".to_string()));
    }

    #[test]
    fn extra_segments_stay_in_the_remainder() {
        // Only the first two segments matter; the tail is not split further.
        assert_eq!(
            classify("request_duration_seconds_bucket"),
            ("request".to_string(), "duration".to_string())
        );
    }

    fn tree(entries: &[(&str, &[(&str, &[&str])])]) -> Hierarchy {
        entries
            .iter()
            .map(|(group, subgroups)| {
                (
                    (*group).to_string(),
                    subgroups
                        .iter()
                        .map(|(subgroup, names)| {
                            (
                                (*subgroup).to_string(),
                                names.iter().map(|n| (*n).to_string()).collect(),
                            )
                        })
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn simple_hierarchy() {
        let names = ["a_b_c", "a_b_d"];
        let expected = tree(&[("a", &[("b", &["a_b_c", "a_b_d"])])]);
        assert_eq!(hierarchy(&names, &UnderscoreStrategy), expected);
    }

    #[test]
    fn complex_hierarchy() {
        let names = ["a_b_c", "a_b_d", "b_c_d", "b_d_e", "c"];
        let expected = tree(&[
            ("a", &[("b", &["a_b_c", "a_b_d"])]),
            ("b", &[("c", &["b_c_d"]), ("d", &["b_d_e"])]),
            ("c", &[("c", &["c"])]),
        ]);
        assert_eq!(hierarchy(&names, &UnderscoreStrategy), expected);
    }
}
