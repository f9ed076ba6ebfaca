// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for test-splitter.
//!
//! Configuration is layered: the embedded default config is read first, and a repository-specific
//! file (`.config/test-splitter.toml`, or the file passed in with `--config-file`) is merged on
//! top of it.

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::Utf8Path;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use swrite::{SWrite, swrite};
use tracing::warn;

/// Trait for handling configuration warnings.
///
/// This allows warnings to be logged (the default behavior) or collected for testing purposes.
pub trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Default implementation of [`ConfigWarnings`] that logs warnings using the tracing crate.
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if let [key] = unknown.iter().collect::<Vec<_>>().as_slice() {
            // Print this on the same line.
            swrite!(unknown_str, "key: {key}");
        } else {
            unknown_str.push_str("keys:\n");
            for ignored_key in unknown {
                swrite!(unknown_str, "\n  - {ignored_key}");
            }
        }

        warn!("in config file {config_file}, ignoring unknown configuration {unknown_str}");
    }
}

/// Overall configuration for test-splitter.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct SplitterConfig {
    /// How test sources and test reports are found.
    pub discovery: DiscoveryConfig,
}

impl SplitterConfig {
    /// The default location of the config within the current directory: `.config/test-splitter.toml`.
    pub const CONFIG_PATH: &'static str = ".config/test-splitter.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the test-splitter config from the given file, or if not specified from
    /// `.config/test-splitter.toml` under `dir`.
    ///
    /// If no config file is specified and `dir` doesn't have `.config/test-splitter.toml`, uses
    /// the default config options.
    pub fn from_sources(
        dir: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_with_warnings(dir, config_file, &mut DefaultConfigWarnings)
    }

    /// Load configuration from the given sources with custom warning handling.
    pub fn from_sources_with_warnings(
        dir: &Utf8Path,
        config_file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = dir.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(&config_file, &unknown);
        }

        Ok(config)
    }

    /// Returns the default config.
    pub fn default_config() -> Result<Self, ConfigParseError> {
        let (config, _unknown) = Self::build_and_deserialize_config(&Self::make_default_config())
            .map_err(|kind| ConfigParseError::new("<default config>", kind))?;
        Ok(config)
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(Self, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: SplitterConfig =
            serde_path_to_error::deserialize(ignored_de).map_err(|error| {
                // Both serde_path_to_error and the config crate report the key. Drop the key from
                // the config error so it's only printed once.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

/// Patterns used to discover test sources and test reports.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Glob matched against the file names of test sources.
    pub test_pattern: String,

    /// Glob matched against the file names of test reports.
    pub report_pattern: String,

    /// File names (or globs) that are always excluded.
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct TestConfigWarnings {
        unknown_keys: Vec<(String, BTreeSet<String>)>,
    }

    impl ConfigWarnings for TestConfigWarnings {
        fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
            self.unknown_keys
                .push((config_file.to_string(), unknown.clone()));
        }
    }

    fn write_config(dir: &Utf8TempDir, contents: &str) {
        let config_dir = dir.path().join(".config");
        fs_err::create_dir_all(&config_dir).expect("created .config");
        fs_err::write(config_dir.join("test-splitter.toml"), contents).expect("wrote config");
    }

    #[test]
    fn default_config_is_valid() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let mut warnings = TestConfigWarnings::default();
        let config = SplitterConfig::from_sources_with_warnings(dir.path(), None, &mut warnings)
            .expect("default config is valid");

        assert_eq!(
            config,
            SplitterConfig::default_config().expect("default config is valid")
        );
        assert_eq!(config.discovery.test_pattern, "*Test.kt");
        assert_eq!(config.discovery.report_pattern, "*.xml");
        assert!(config.discovery.exclude.is_empty());
        assert!(
            warnings.unknown_keys.is_empty(),
            "default config has no unknown keys"
        );
    }

    #[test]
    fn repository_config_overrides_defaults() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        write_config(
            &dir,
            indoc! {r#"
                [discovery]
                test-pattern = "*Test.java"
                exclude = ["SlowTest.java", "Flaky*.java"]
            "#},
        );

        let config = SplitterConfig::from_sources_with_warnings(
            dir.path(),
            None,
            &mut TestConfigWarnings::default(),
        )
        .expect("config is valid");
        assert_eq!(config.discovery.test_pattern, "*Test.java");
        assert_eq!(config.discovery.report_pattern, "*.xml");
        assert_eq!(config.discovery.exclude, ["SlowTest.java", "Flaky*.java"]);
    }

    #[test]
    fn unknown_keys_are_reported() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        write_config(
            &dir,
            indoc! {r#"
                [discovery]
                test-patern = "*Spec.kt"

                [output]
                format = "json"
            "#},
        );

        let mut warnings = TestConfigWarnings::default();
        SplitterConfig::from_sources_with_warnings(dir.path(), None, &mut warnings)
            .expect("unknown keys are not an error");

        assert_eq!(warnings.unknown_keys.len(), 1);
        let (config_file, keys) = &warnings.unknown_keys[0];
        assert!(config_file.ends_with(".config/test-splitter.toml"));
        let keys: Vec<_> = keys.iter().map(String::as_str).collect();
        assert_eq!(keys, ["discovery.test-patern", "output"]);
    }

    #[test]
    fn explicit_config_file_is_required() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let missing = dir.path().join("missing.toml");
        let err = SplitterConfig::from_sources(dir.path(), Some(&missing))
            .expect_err("missing explicit config file is an error");
        assert_eq!(err.config_file(), &missing);
        assert!(
            matches!(err.kind(), ConfigParseErrorKind::BuildError(_)),
            "unexpected error kind: {:?}",
            err.kind()
        );
    }

    #[test]
    fn invalid_type_names_the_key() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        write_config(
            &dir,
            indoc! {r#"
                [discovery]
                exclude = "SlowTest.kt"
            "#},
        );

        let err = SplitterConfig::from_sources(dir.path(), None)
            .expect_err("exclude must be a list");
        match err.kind() {
            ConfigParseErrorKind::DeserializeError(error) => {
                assert_eq!(error.path().to_string(), "discovery.exclude");
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }
}
