//! Configuration loading for the lintmux CLI.
//!
//! Extensions come from two sources, merged in order: the JSON
//! configuration file (explicit `--config`, or `./lintmux.json` when
//! present) and repeatable `--plugin NAME=COMMAND [ARGS...]` flags.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use lintmux_host::{ExtensionManifest, ExtensionRegistry};

use crate::errors::AppError;

/// Name tried in the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "lintmux.json";

/// The on-disk configuration shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct HostConfig {
    #[serde(default)]
    pub(crate) extensions: Vec<ExtensionManifest>,
    #[serde(default = "default_include_built_in_lints")]
    pub(crate) include_built_in_lints: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            include_built_in_lints: default_include_built_in_lints(),
        }
    }
}

const fn default_include_built_in_lints() -> bool {
    true
}

/// Loads the configuration file.
///
/// An explicit path must exist and parse; the implicit default file is
/// only used when present.
pub(crate) fn load(explicit: Option<&Path>) -> Result<HostConfig, AppError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(HostConfig::default());
            }
            default
        }
    };
    let text = std::fs::read_to_string(&path).map_err(|source| AppError::LoadConfiguration {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| AppError::ParseConfiguration { path, source })
}

/// Parses a `--plugin NAME=COMMAND [ARGS...]` flag value.
pub(crate) fn parse_plugin_flag(raw: &str) -> Result<ExtensionManifest, AppError> {
    let invalid = |message: &str| AppError::InvalidPlugin {
        raw: raw.to_owned(),
        message: message.to_owned(),
    };
    let (name, command_line) = raw
        .split_once('=')
        .ok_or_else(|| invalid("expected NAME=COMMAND"))?;
    let mut words = command_line.split_whitespace();
    let command = words
        .next()
        .ok_or_else(|| invalid("the command must not be empty"))?;
    let args: Vec<String> = words.map(str::to_owned).collect();
    Ok(ExtensionManifest::new(
        name.trim(),
        PathBuf::from(command),
        args,
    ))
}

/// Builds the registry from the configuration and `--plugin` flags.
pub(crate) fn build_registry(
    config: &HostConfig,
    plugin_flags: &[String],
) -> Result<ExtensionRegistry, AppError> {
    let mut registry = ExtensionRegistry::new();
    for manifest in &config.extensions {
        registry.register(manifest.clone())?;
    }
    for flag in plugin_flags {
        registry.register(parse_plugin_flag(flag)?)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn default_config_includes_builtin_lints() {
        let config = HostConfig::default();
        assert!(config.include_built_in_lints);
        assert!(config.extensions.is_empty());
    }

    #[test]
    fn loads_a_config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(
            file,
            r#"{{"extensions":[{{"name":"alpha","command":"/usr/bin/alpha"}}],"includeBuiltInLints":false}}"#
        )
        .expect("write config");
        let config = load(Some(file.path())).expect("load config");
        assert_eq!(config.extensions.len(), 1);
        assert!(!config.include_built_in_lints);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = load(Some(Path::new("/nonexistent/lintmux.json"))).expect_err("missing file");
        assert!(matches!(err, AppError::LoadConfiguration { .. }));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(file, "{{not json").expect("write config");
        let err = load(Some(file.path())).expect_err("malformed file");
        assert!(matches!(err, AppError::ParseConfiguration { .. }));
    }

    #[test]
    fn parses_a_plugin_flag_with_arguments() {
        let manifest = parse_plugin_flag("alpha=/usr/bin/alpha --strict --fast")
            .expect("valid flag");
        assert_eq!(manifest.name(), "alpha");
        assert_eq!(manifest.command(), Path::new("/usr/bin/alpha"));
        assert_eq!(manifest.args(), ["--strict", "--fast"]);
    }

    #[test]
    fn rejects_a_plugin_flag_without_separator() {
        let err = parse_plugin_flag("alpha").expect_err("missing separator");
        assert!(matches!(err, AppError::InvalidPlugin { .. }));
    }

    #[test]
    fn rejects_an_empty_plugin_command() {
        let err = parse_plugin_flag("alpha=").expect_err("empty command");
        assert!(matches!(err, AppError::InvalidPlugin { .. }));
    }

    #[test]
    fn duplicate_names_across_sources_are_rejected() {
        let config = HostConfig {
            extensions: vec![ExtensionManifest::new(
                "alpha",
                PathBuf::from("/usr/bin/alpha"),
                Vec::new(),
            )],
            include_built_in_lints: true,
        };
        let err = build_registry(&config, &["alpha=/usr/bin/other".to_owned()])
            .expect_err("duplicate name");
        assert!(matches!(err, AppError::Registry(_)));
    }
}
