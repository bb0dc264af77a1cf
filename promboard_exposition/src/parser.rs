//! Prometheus text exposition parser
//!
//! Line-oriented parser for the text exposition format:
//! <https://github.com/prometheus/docs/blob/main/content/docs/instrumenting/exposition_formats.md>
//!
//! Unlike scrape-only parsers this one keeps `# HELP` and `# TYPE`
//! metadata around, since dashboard titles and expression synthesis are
//! driven by it.

use rustc_hash::FxHashMap;

use crate::MetricType;

/// Label pairs as they appear on a sample line.
pub type LabelPairs = Vec<(String, String)>;

/// Errors produced while parsing exposition text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A TYPE line named a type this parser does not know
    #[error("unknown metric type: {0}")]
    UnknownMetricType(String),
    /// The line structure could not be understood
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    /// A sample value could not be parsed as a number
    #[error("invalid sample value: {0}")]
    InvalidValue(String),
    /// A sample line carried no value
    #[error("missing value in sample line")]
    MissingValue,
    /// A sample line carried no metric name
    #[error("missing metric name in sample line")]
    MissingName,
    /// A label pair was malformed
    #[error("invalid label: {0}")]
    InvalidLabel(String),
}

/// One parsed sample line.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleLine {
    /// Series name as written on the line
    pub name: String,
    /// Declared type of the series, when a TYPE line preceded it
    pub kind: Option<MetricType>,
    /// Sample value
    pub value: f64,
    /// Label pairs, when the line carried any
    pub labels: Option<LabelPairs>,
    /// Optional timestamp in milliseconds since the Unix epoch
    pub timestamp: Option<i64>,
}

/// Stateful exposition parser.
///
/// TYPE and HELP comment lines feed metadata maps that are consulted while
/// sample lines parse. A histogram or summary declaration for `<name>`
/// also covers the derived `<name>_bucket`, `<name>_sum` and
/// `<name>_count` series names.
#[derive(Debug, Default)]
pub struct Parser {
    types: FxHashMap<String, MetricType>,
    series_base: FxHashMap<String, String>,
    help: FxHashMap<String, String>,
}

impl Parser {
    /// Create a new parser instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a complete exposition text, one result per sample line.
    pub fn parse_text(&mut self, text: &str) -> Vec<Result<SampleLine, ParseError>> {
        let mut results = Vec::new();

        for line in text.lines() {
            if let Some(result) = self.parse_line(line) {
                results.push(result);
            }
        }

        results
    }

    /// Parse a single exposition line.
    ///
    /// Comment lines and blank lines yield `None`; TYPE and HELP lines are
    /// absorbed into the parser's metadata maps.
    pub fn parse_line(&mut self, line: &str) -> Option<Result<SampleLine, ParseError>> {
        let line = line.trim();

        if line.is_empty() {
            return None;
        }

        if let Some(rest) = line.strip_prefix("# HELP")
            && rest.starts_with(char::is_whitespace)
        {
            return match self.record_help(rest) {
                Ok(()) => None,
                Err(e) => Some(Err(e)),
            };
        }

        if let Some(rest) = line.strip_prefix("# TYPE")
            && rest.starts_with(char::is_whitespace)
        {
            return match self.record_type(rest) {
                Ok(()) => None,
                Err(e) => Some(Err(e)),
            };
        }

        // Any other comment line is ignored per the format.
        if line.starts_with('#') {
            return None;
        }

        Some(self.parse_sample_line(line))
    }

    /// Resolve a series name to its family's base name.
    ///
    /// `<base>_bucket`, `<base>_sum` and `<base>_count` map back to
    /// `<base>` when a histogram or summary TYPE line declared it; any
    /// other name is its own base.
    #[must_use]
    pub fn base_name<'a>(&'a self, series: &'a str) -> &'a str {
        self.series_base.get(series).map_or(series, String::as_str)
    }

    /// The type declared for a base family name, if any TYPE line was seen.
    #[must_use]
    pub fn declared_type(&self, base: &str) -> Option<MetricType> {
        self.types.get(base).copied()
    }

    /// The help text recorded for a base family name.
    #[must_use]
    pub fn help_text(&self, base: &str) -> Option<&str> {
        self.help.get(base).map(String::as_str)
    }

    /// All families declared by TYPE lines, whether or not samples followed.
    pub fn declared(&self) -> impl Iterator<Item = (&str, MetricType)> {
        self.types.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// All families that carried a HELP line.
    pub fn helped(&self) -> impl Iterator<Item = &str> {
        self.help.keys().map(String::as_str)
    }

    fn record_type(&mut self, rest: &str) -> Result<(), ParseError> {
        let mut parts = rest.split_ascii_whitespace();

        let name = parts.next().ok_or_else(|| {
            ParseError::InvalidFormat("TYPE line without metric name".to_string())
        })?;
        let kind_str = parts.next().ok_or_else(|| {
            ParseError::InvalidFormat("TYPE line without metric type".to_string())
        })?;

        let kind: MetricType = kind_str.parse()?;

        if matches!(kind, MetricType::Histogram | MetricType::Summary) {
            for suffix in ["_bucket", "_sum", "_count"] {
                self.series_base
                    .insert(format!("{name}{suffix}"), name.to_string());
            }
        }

        self.types.insert(name.to_string(), kind);
        Ok(())
    }

    fn record_help(&mut self, rest: &str) -> Result<(), ParseError> {
        let rest = rest.trim_start();
        let (name, text) = match rest.split_once(char::is_whitespace) {
            Some((name, text)) => (name, text.trim()),
            None => (rest, ""),
        };

        if name.is_empty() {
            return Err(ParseError::InvalidFormat(
                "HELP line without metric name".to_string(),
            ));
        }

        // A HELP line with no docstring carries no information worth keeping.
        if !text.is_empty() {
            self.help.insert(name.to_string(), unescape_help(text));
        }
        Ok(())
    }

    fn parse_sample_line(&self, line: &str) -> Result<SampleLine, ParseError> {
        let (series, labels, rest) = Self::split_series(line)?;
        let (value, timestamp) = Self::parse_value_and_timestamp(rest)?;

        let kind = self.declared_type(self.base_name(series));

        Ok(SampleLine {
            name: series.to_string(),
            kind,
            value,
            labels,
            timestamp,
        })
    }

    fn split_series(line: &str) -> Result<(&str, Option<LabelPairs>, &str), ParseError> {
        if let Some(open) = line.find('{') {
            let close = line
                .find('}')
                .filter(|close| *close > open)
                .ok_or_else(|| ParseError::InvalidFormat("unclosed label bracket".to_string()))?;

            let series = line[..open].trim();
            if series.is_empty() {
                return Err(ParseError::MissingName);
            }

            let labels = Self::parse_labels(&line[open + 1..close])?;
            let rest = line[close + 1..].trim();
            if rest.is_empty() {
                return Err(ParseError::MissingValue);
            }

            Ok((series, Some(labels), rest))
        } else {
            let (series, rest) = line
                .split_once(char::is_whitespace)
                .ok_or(ParseError::MissingValue)?;

            let series = series.trim();
            if series.is_empty() {
                return Err(ParseError::MissingName);
            }

            Ok((series, None, rest.trim()))
        }
    }

    fn parse_labels(labels_str: &str) -> Result<LabelPairs, ParseError> {
        let mut labels = Vec::new();

        for label in labels_str.split(',') {
            let label = label.trim();
            if label.is_empty() {
                continue;
            }

            let (name, value) = label
                .split_once('=')
                .ok_or_else(|| ParseError::InvalidLabel(format!("label missing '=': {label}")))?;

            if name.is_empty() {
                return Err(ParseError::InvalidLabel("empty label name".to_string()));
            }
            // Label names starting with __ are reserved for internal use.
            if name.starts_with("__") {
                return Err(ParseError::InvalidLabel(format!(
                    "label name is reserved: {name}"
                )));
            }

            let value = Self::parse_label_value(value)?;
            labels.push((name.to_string(), value));
        }

        Ok(labels)
    }

    fn parse_label_value(value: &str) -> Result<String, ParseError> {
        let value = value.trim();

        let inner = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .ok_or_else(|| ParseError::InvalidLabel("label value must be quoted".to_string()))?;

        let mut result = String::with_capacity(inner.len());
        let mut chars = inner.chars();

        while let Some(ch) = chars.next() {
            if ch == '\\' {
                match chars.next() {
                    Some('\\') => result.push('\\'),
                    Some('"') => result.push('"'),
                    Some('n') => result.push('\n'),
                    Some(c) => {
                        return Err(ParseError::InvalidLabel(format!(
                            "invalid escape sequence: \\{c}"
                        )));
                    }
                    None => {
                        return Err(ParseError::InvalidLabel(
                            "backslash at end of label value".to_string(),
                        ));
                    }
                }
            } else if ch == '"' {
                return Err(ParseError::InvalidLabel(
                    "unescaped quote in label value".to_string(),
                ));
            } else {
                result.push(ch);
            }
        }

        Ok(result)
    }

    fn parse_value_and_timestamp(value_str: &str) -> Result<(f64, Option<i64>), ParseError> {
        let mut parts = value_str.split_whitespace();

        let value_part = parts.next().ok_or(ParseError::MissingValue)?;

        if value_part.contains('#') {
            return Err(ParseError::InvalidFormat(
                "value contains comment marker".to_string(),
            ));
        }

        // Special float values per the exposition format.
        let value = match value_part {
            "NaN" => f64::NAN,
            "+Inf" => f64::INFINITY,
            "-Inf" => f64::NEG_INFINITY,
            _ => value_part
                .parse::<f64>()
                .map_err(|_| ParseError::InvalidValue(value_part.to_string()))?,
        };

        let timestamp = if let Some(ts_str) = parts.next() {
            Some(
                ts_str
                    .parse::<i64>()
                    .map_err(|_| ParseError::InvalidFormat(format!("invalid timestamp: {ts_str}")))?,
            )
        } else {
            None
        };

        Ok((value, timestamp))
    }
}

/// Undo HELP docstring escaping: `\\` becomes a backslash, `\n` a newline.
/// Unknown escape sequences pass through untouched.
fn unescape_help(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('\\') => result.push('\\'),
                Some('n') => result.push('\n'),
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(ch);
        }
    }

    result
}
