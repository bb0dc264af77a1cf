//! Prometheus text exposition parsing and the metric family model.
//!
//! This library supports the promboard binary found elsewhere in this
//! project. Raw exposition text is parsed line by line and folded into
//! [`MetricFamily`] records: one per metric name, carrying the declared
//! statistical type, the help text and the member samples.

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::multiple_crate_versions)]

pub mod parser;

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::Serialize;

pub use parser::{ParseError, Parser, SampleLine};

/// Statistical type of a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// A cumulative metric that only ever increases
    Counter,
    /// A point-in-time value that can go up and down
    Gauge,
    /// Observations counted in configurable buckets
    Histogram,
    /// Observations summarized as streaming quantiles plus sum and count
    Summary,
    /// A metric with no declared semantics
    Untyped,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
            Self::Summary => "summary",
            Self::Untyped => "untyped",
        };
        f.write_str(name)
    }
}

impl FromStr for MetricType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(Self::Counter),
            "gauge" => Ok(Self::Gauge),
            "histogram" => Ok(Self::Histogram),
            "summary" => Ok(Self::Summary),
            "untyped" => Ok(Self::Untyped),
            _ => Err(ParseError::UnknownMetricType(s.to_string())),
        }
    }
}

/// One observation belonging to a metric family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Label pairs in exposition order
    pub labels: Vec<(String, String)>,
    /// Sample value
    pub value: f64,
    /// Optional timestamp in milliseconds since the Unix epoch
    pub timestamp: Option<i64>,
}

/// A named group of samples sharing a statistical type and label schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricFamily {
    /// Family name
    pub name: String,
    /// Help text from the family's HELP line, when one was present
    pub help: Option<String>,
    /// Declared type from the family's TYPE line. `None` records that no
    /// TYPE line was seen; callers decide how loudly to surface that.
    pub kind: Option<MetricType>,
    /// Member samples in exposition order
    pub samples: Vec<Sample>,
}

/// Metric families recovered from one exposition scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Exposition {
    /// Families keyed by base name
    pub families: FxHashMap<String, MetricFamily>,
    /// Per-line failures encountered during the scan
    pub line_errors: Vec<ParseError>,
}

/// Errors produced by [`parse_families`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The text yielded no metric family at all
    #[error("no metric families found in exposition text")]
    NoFamilies,
}

/// Fold exposition text into metric families keyed by base name.
///
/// Histogram and summary series named `<base>_bucket`, `<base>_sum` and
/// `<base>_count` fold into the `<base>` family. Families declared by a
/// TYPE or HELP line but carrying no samples are still present in the
/// result. Malformed sample lines degrade per line and are reported in
/// [`Exposition::line_errors`] without aborting the scan.
///
/// # Errors
///
/// Returns [`Error::NoFamilies`] when the scan recovers nothing at all,
/// the whole-text parse failure callers treat as fatal.
pub fn parse_families(text: &str) -> Result<Exposition, Error> {
    let mut parser = Parser::new();
    let parsed = parser.parse_text(text);

    let mut families: FxHashMap<String, MetricFamily> = FxHashMap::default();
    let mut line_errors = Vec::new();

    for result in parsed {
        let sample = match result {
            Ok(sample) => sample,
            Err(e) => {
                line_errors.push(e);
                continue;
            }
        };

        let base = parser.base_name(&sample.name).to_owned();
        let family = families.entry(base.clone()).or_insert_with(|| MetricFamily {
            name: base.clone(),
            help: parser.help_text(&base).map(ToOwned::to_owned),
            kind: parser.declared_type(&base),
            samples: Vec::new(),
        });
        family.samples.push(Sample {
            labels: sample.labels.unwrap_or_default(),
            value: sample.value,
            timestamp: sample.timestamp,
        });
    }

    // Families declared by TYPE or HELP lines but without samples still
    // participate downstream.
    for (name, kind) in parser.declared() {
        families.entry(name.to_owned()).or_insert_with(|| MetricFamily {
            name: name.to_owned(),
            help: parser.help_text(name).map(ToOwned::to_owned),
            kind: Some(kind),
            samples: Vec::new(),
        });
    }
    for name in parser.helped() {
        families.entry(name.to_owned()).or_insert_with(|| MetricFamily {
            name: name.to_owned(),
            help: parser.help_text(name).map(ToOwned::to_owned),
            kind: parser.declared_type(name),
            samples: Vec::new(),
        });
    }

    if families.is_empty() {
        return Err(Error::NoFamilies);
    }

    Ok(Exposition {
        families,
        line_errors,
    })
}

#[allow(clippy::needless_raw_string_hashes)] // Test data is more readable with consistent raw string format
#[cfg(test)]
mod tests {
    use super::*;

    const COUNTER_AND_GAUGE: &str = r#"
    # HELP http_requests_total The total number of HTTP requests.
    # TYPE http_requests_total counter
    http_requests_total{method="post",code="200"} 1027
    http_requests_total{method="post",code="400"} 3
    # TYPE queue_depth gauge
    queue_depth 12
    "#;

    const HISTOGRAM: &str = r#"
    # HELP request_duration_seconds Request latency.
    # TYPE request_duration_seconds histogram
    request_duration_seconds_bucket{method="GET",le="0.1"} 5
    request_duration_seconds_bucket{method="GET",le="+Inf"} 9
    request_duration_seconds_sum{method="GET"} 1.2
    request_duration_seconds_count{method="GET"} 9
    "#;

    const SUMMARY: &str = r#"
    # TYPE response_size_bytes summary
    response_size_bytes{quantile="0.5"} 120
    response_size_bytes_sum 5400
    response_size_bytes_count 45
    "#;

    #[test]
    fn counter_and_gauge_families() {
        let exposition = parse_families(COUNTER_AND_GAUGE).expect("families expected");
        assert_eq!(exposition.families.len(), 2);
        assert!(exposition.line_errors.is_empty());

        let requests = &exposition.families["http_requests_total"];
        assert_eq!(requests.kind, Some(MetricType::Counter));
        assert_eq!(
            requests.help.as_deref(),
            Some("The total number of HTTP requests.")
        );
        assert_eq!(requests.samples.len(), 2);
        assert_eq!(requests.samples[0].value, 1027.0);

        let depth = &exposition.families["queue_depth"];
        assert_eq!(depth.kind, Some(MetricType::Gauge));
        assert_eq!(depth.help, None);
        assert_eq!(depth.samples.len(), 1);
    }

    #[test]
    fn histogram_series_fold_into_base_family() {
        let exposition = parse_families(HISTOGRAM).expect("families expected");
        assert_eq!(exposition.families.len(), 1);

        let family = &exposition.families["request_duration_seconds"];
        assert_eq!(family.kind, Some(MetricType::Histogram));
        assert_eq!(family.help.as_deref(), Some("Request latency."));
        assert_eq!(family.samples.len(), 4);
        // Bucket samples keep their structural le label.
        assert!(
            family.samples[0]
                .labels
                .iter()
                .any(|(name, _)| name == "le")
        );
    }

    #[test]
    fn summary_series_fold_into_base_family() {
        let exposition = parse_families(SUMMARY).expect("families expected");
        assert_eq!(exposition.families.len(), 1);

        let family = &exposition.families["response_size_bytes"];
        assert_eq!(family.kind, Some(MetricType::Summary));
        assert_eq!(family.samples.len(), 3);
    }

    #[test]
    fn sample_without_type_line_has_no_kind() {
        let exposition = parse_families("build_info 1").expect("families expected");
        let family = &exposition.families["build_info"];
        assert_eq!(family.kind, None);
        assert_eq!(family.samples.len(), 1);
    }

    #[test]
    fn declared_family_without_samples_is_present() {
        let text = "# TYPE connections_active gauge";
        let exposition = parse_families(text).expect("families expected");
        let family = &exposition.families["connections_active"];
        assert_eq!(family.kind, Some(MetricType::Gauge));
        assert!(family.samples.is_empty());
    }

    #[test]
    fn help_only_family_is_present() {
        let text = "# HELP mystery_metric Undocumented elsewhere.";
        let exposition = parse_families(text).expect("families expected");
        let family = &exposition.families["mystery_metric"];
        assert_eq!(family.kind, None);
        assert_eq!(family.help.as_deref(), Some("Undocumented elsewhere."));
    }

    #[test]
    fn help_text_is_stored_verbatim() {
        // Trailing-period trimming is a presentation concern, not a parsing one.
        let text = "# HELP total_requests Total requests.\ntotal_requests 4";
        let exposition = parse_families(text).expect("families expected");
        assert_eq!(
            exposition.families["total_requests"].help.as_deref(),
            Some("Total requests.")
        );
    }

    #[test]
    fn empty_text_is_a_parse_failure() {
        assert_eq!(parse_families(""), Err(Error::NoFamilies));
    }

    #[test]
    fn unparseable_text_is_a_parse_failure() {
        assert_eq!(parse_families("{} {} {}"), Err(Error::NoFamilies));
    }

    #[test]
    fn malformed_lines_degrade_per_line() {
        let text = "queue_depth 12\nqueue_depth foobar";
        let exposition = parse_families(text).expect("families expected");
        assert_eq!(exposition.families["queue_depth"].samples.len(), 1);
        assert_eq!(exposition.line_errors.len(), 1);
    }

    #[test]
    fn metric_type_round_trips_through_display() {
        for kind in [
            MetricType::Counter,
            MetricType::Gauge,
            MetricType::Histogram,
            MetricType::Summary,
            MetricType::Untyped,
        ] {
            let parsed: MetricType = kind.to_string().parse().expect("display output must parse");
            assert_eq!(parsed, kind);
        }
    }
}
