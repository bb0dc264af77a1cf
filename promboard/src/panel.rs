//! Panel descriptors and query expression synthesis.
//!
//! One [`Panel`] is built per metric family: name, display title, a
//! synthesized query expression appropriate to the family's statistical
//! type, and the (group, subgroup) placement pair assigned afterwards by
//! [`crate::group`].

use std::collections::BTreeSet;

use promboard_exposition::{MetricFamily, MetricType};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::warn;

use crate::group::{self, Strategy};

/// Display format hint attached to every panel.
const SHORT_FORMAT: &str = "short";

/// The unit of information a dashboard renderer needs to draw one chart.
///
/// Serializes with exactly the field names the renderer consumes:
/// `name`, `title`, `expr`, `format`, `group`, `subgroup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    /// Metric name
    pub name: String,
    /// Human-readable label, derived from the family's help text
    pub title: String,
    /// Synthesized query expression, empty when the type gives us nothing
    /// to plot
    pub expr: String,
    /// Display format hint
    pub format: String,
    /// First-level placement group
    pub group: String,
    /// Second-level placement group
    pub subgroup: String,
}

/// Per-type tally accumulated while building the panel list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TypeTally {
    /// Families declared counter
    pub counter: usize,
    /// Families declared gauge
    pub gauge: usize,
    /// Families declared histogram
    pub histogram: usize,
    /// Families declared summary
    pub summary: usize,
    /// Families declared untyped
    pub untyped: usize,
    /// Families with no TYPE declaration at all
    pub undeclared: usize,
}

impl TypeTally {
    fn record(&mut self, kind: Option<MetricType>) {
        match kind {
            Some(MetricType::Counter) => self.counter += 1,
            Some(MetricType::Gauge) => self.gauge += 1,
            Some(MetricType::Histogram) => self.histogram += 1,
            Some(MetricType::Summary) => self.summary += 1,
            Some(MetricType::Untyped) => self.untyped += 1,
            None => self.undeclared += 1,
        }
    }

    /// Tally entries as (type name, count) pairs, for reporting.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, usize); 6] {
        [
            ("counter", self.counter),
            ("gauge", self.gauge),
            ("histogram", self.histogram),
            ("summary", self.summary),
            ("untyped", self.untyped),
            ("undeclared", self.undeclared),
        ]
    }

    /// Total number of families tallied.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counter + self.gauge + self.histogram + self.summary + self.untyped + self.undeclared
    }
}

/// Distinct label names observed on a family's first sample.
///
/// All samples of one family are assumed to share a label schema, so only
/// the first sample is consulted. The `le` bucket-boundary label is
/// structural and excluded here; expression synthesis re-appends it.
/// Names come back sorted so generated expressions are stable across runs.
#[must_use]
pub fn label_names(family: &MetricFamily) -> Vec<String> {
    let mut names = BTreeSet::new();

    if let Some(sample) = family.samples.first() {
        for (name, _) in &sample.labels {
            if name != "le" {
                names.insert(name.clone());
            }
        }
    }

    names.into_iter().collect()
}

/// Synthesize the query expression for a metric of the given type.
///
/// Counters become 5-minute rates, gauges plot directly, histograms
/// become a 95th-percentile `histogram_quantile` over their bucket
/// counters grouped by `labels` plus `le`, and summaries reconstruct an
/// average from their running sum and count. Untyped metrics, and
/// families with no declared type, produce an empty expression.
#[must_use]
pub fn expression(name: &str, kind: Option<MetricType>, labels: &[String]) -> String {
    match kind {
        Some(MetricType::Counter) => format!("rate({name}[5m])"),
        Some(MetricType::Gauge) => name.to_string(),
        Some(MetricType::Histogram) => {
            let mut by: Vec<&str> = labels.iter().map(String::as_str).collect();
            by.push("le");
            format!(
                "histogram_quantile(0.95, sum(rate({name}_bucket[5m])) by ({}))",
                by.join(",")
            )
        }
        Some(MetricType::Summary) => {
            format!("rate({name}_sum[5m]) / rate({name}_count[5m])")
        }
        Some(MetricType::Untyped) | None => String::new(),
    }
}

/// Build one panel per metric family, in no particular order.
///
/// Families with no declared type are surfaced with a warning and counted
/// in the tally; their panel is still emitted with an empty expression.
/// Callers apply the name sort, group assignment and group sort afterwards,
/// or use [`dashboard_list`] which does all four steps.
#[must_use]
pub fn build(families: &FxHashMap<String, MetricFamily>) -> (Vec<Panel>, TypeTally) {
    let mut panels = Vec::with_capacity(families.len());
    let mut tally = TypeTally::default();

    for (key, family) in families {
        tally.record(family.kind);
        if family.kind.is_none() {
            warn!(
                "metric family {key} has no declared type, emitting an empty expression"
            );
        }

        let name = if family.name.is_empty() {
            key.clone()
        } else {
            family.name.clone()
        };

        let title = match &family.help {
            Some(help) => help.strip_suffix('.').unwrap_or(help).to_string(),
            None => name.clone(),
        };

        let labels = label_names(family);
        let expr = expression(&name, family.kind, &labels);

        panels.push(Panel {
            name,
            title,
            expr,
            format: SHORT_FORMAT.to_string(),
            group: String::new(),
            subgroup: String::new(),
        });
    }

    (panels, tally)
}

/// Sort panels by name, lexicographic byte order.
///
/// Group assignment assumes names arrive contiguous by segment, which this
/// ordering establishes.
pub fn sort_by_name(panels: &mut [Panel]) {
    panels.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Sort panels into final presentation order by (group, subgroup).
///
/// The sort is stable, so panels tied on both keys keep the name order
/// established before group assignment.
pub fn sort_by_group(panels: &mut [Panel]) {
    panels.sort_by(|a, b| {
        (a.group.as_str(), a.subgroup.as_str()).cmp(&(b.group.as_str(), b.subgroup.as_str()))
    });
}

/// The full descriptor pipeline: build, name sort, group, group sort.
#[must_use]
pub fn dashboard_list(
    families: &FxHashMap<String, MetricFamily>,
    strategy: &dyn Strategy,
) -> (Vec<Panel>, TypeTally) {
    let (mut panels, tally) = build(families);
    sort_by_name(&mut panels);
    group::assign(&mut panels, strategy);
    sort_by_group(&mut panels);
    (panels, tally)
}
