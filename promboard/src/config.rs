//! End-user configuration.
//!
//! A small record deserialized from an optional YAML file and overridden
//! by CLI flags. Exactly one snapshot source, URL or local file, must be
//! configured.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Errors produced by [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
    /// The config file was not valid YAML for this schema
    #[error("failed to deserialize yaml: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
    /// Neither or both of url and input were configured
    #[error("exactly one of url or input must be set")]
    Source,
}

fn default_timeout_secs() -> u64 {
    10
}

/// Main configuration struct for this program.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// URL of the metrics endpoint to scrape
    pub url: Option<String>,
    /// Path to a local exposition snapshot, an alternative to `url`
    pub input: Option<PathBuf>,
    /// Dashboard title
    pub title: Option<String>,
    /// Seconds to wait for the metrics endpoint before giving up
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            input: None,
            title: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Where the exposition snapshot comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source<'a> {
    /// Scrape a live endpoint
    Url(&'a str),
    /// Read a saved snapshot
    File(&'a Path),
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not deserialize into
    /// this schema.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// The configured snapshot source.
    ///
    /// # Errors
    ///
    /// Fails unless exactly one of `url` and `input` is set.
    pub fn source(&self) -> Result<Source<'_>, Error> {
        match (self.url.as_deref(), self.input.as_deref()) {
            (Some(url), None) => Ok(Source::Url(url)),
            (None, Some(path)) => Ok(Source::File(path)),
            _ => Err(Error::Source),
        }
    }

    /// The fetch timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.timeout_secs, 10);
        assert!(config.url.is_none());
        assert!(config.title.is_none());
    }

    #[test]
    fn deserializes_from_yaml() {
        let contents = r"
url: http://localhost:9090/metrics
title: Billing Service
timeout_secs: 3
";
        let config: Config = serde_yaml::from_str(contents).expect("yaml must deserialize");
        assert_eq!(config.url.as_deref(), Some("http://localhost:9090/metrics"));
        assert_eq!(config.title.as_deref(), Some("Billing Service"));
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let contents = "url: http://localhost:9090/metrics\nretries: 3\n";
        let result: Result<Config, _> = serde_yaml::from_str(contents);
        assert!(result.is_err());
    }

    #[test]
    fn source_requires_exactly_one_of_url_and_input() {
        let neither = Config::default();
        assert!(matches!(neither.source(), Err(Error::Source)));

        let both = Config {
            url: Some("http://localhost:9090/metrics".to_string()),
            input: Some(PathBuf::from("snapshot.prom")),
            ..Config::default()
        };
        assert!(matches!(both.source(), Err(Error::Source)));

        let url_only = Config {
            url: Some("http://localhost:9090/metrics".to_string()),
            ..Config::default()
        };
        assert!(matches!(url_only.source(), Ok(Source::Url(_))));

        let input_only = Config {
            input: Some(PathBuf::from("snapshot.prom")),
            ..Config::default()
        };
        assert!(matches!(input_only.source(), Ok(Source::File(_))));
    }
}
