use crate::{
    clock::Clock,
    component::ComponentConfig,
    error::{ConfigError, FormatError, VersionError},
    parse::{compile_parse_pattern, pattern_labels, DEFAULT_PARSE_PATTERN},
    spec::VersionSpec,
    template::Template,
};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// The configuration file looked up by default.
pub const DEFAULT_CONFIG_FILE: &str = ".bumpspec.toml";

pub const DEFAULT_SERIALIZE: &str = "{major}.{minor}.{patch}";

pub const DEFAULT_TAG_NAME: &str = "v{new_version}";

pub const DEFAULT_MESSAGE: &str = "Bump version: {current_version} → {new_version}";

/// Prefix of the environment variables that override configuration values.
pub const ENV_PREFIX: &str = "BUMPSPEC_";

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(one) => vec![one],
        OneOrMany::Many(many) => many,
    })
}

/// Everything needed to parse, bump and serialize a version, usually read from
/// [DEFAULT_CONFIG_FILE].
///
/// ```toml
/// current_version = "1.0b1"
/// parse = '(?P<major>\d+)\.(?P<minor>\d+)((?P<prerel>[a-z]+)(?P<prerelversion>\d+))?'
/// serialize = ["{major}.{minor}{prerel}{prerelversion}", "{major}.{minor}"]
/// tag_name = "release-{new_version}"
///
/// [parts.prerel]
/// values = ["dev", "a", "b", "c", "rc", "d"]
/// optional_value = "d"
/// ```
///
/// Components named by the parse pattern that have no `[parts.<name>]` table are numeric.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub current_version: Option<String>,

    /// Regex with named groups, one per component.
    pub parse: String,

    /// Candidate serialization formats, best fit wins. A single string is accepted too.
    #[serde(deserialize_with = "one_or_many")]
    pub serialize: Vec<String>,

    /// Component order. Empty means parse-group order followed by the order of `parts`.
    pub order: Vec<String>,

    pub tag_name: String,

    pub message: String,

    pub parts: IndexMap<String, ComponentConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            current_version: None,
            parse: DEFAULT_PARSE_PATTERN.to_owned(),
            serialize: vec![DEFAULT_SERIALIZE.to_owned()],
            order: Vec::new(),
            tag_name: DEFAULT_TAG_NAME.to_owned(),
            message: DEFAULT_MESSAGE.to_owned(),
            parts: IndexMap::new(),
        }
    }
}

#[derive(Deserialize, Default)]
struct PyProject {
    #[serde(default)]
    tool: PyProjectTools,
}

#[derive(Deserialize, Default)]
struct PyProjectTools {
    #[serde(default)]
    bumpspec: Option<Config>,
}

impl Config {
    /// # Errors
    ///
    /// [ConfigError::Toml] if `content` is not valid TOML or does not describe a configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads the configuration from a `pyproject.toml`, under `[tool.bumpspec]`. A file without
    /// that table gives the default configuration.
    pub fn from_pyproject_str(content: &str) -> Result<Self, ConfigError> {
        let pyproject: PyProject = toml::from_str(content)?;
        Ok(pyproject.tool.bumpspec.unwrap_or_else(|| {
            tracing::warn!("no [tool.bumpspec] table in pyproject.toml, using defaults");
            Self::default()
        }))
    }

    /// Loads a configuration file. Files named `pyproject.toml` are read from their
    /// `[tool.bumpspec]` table.
    ///
    /// # Errors
    ///
    /// - [ConfigError::Io] if the file cannot be read.
    /// - [ConfigError::Toml] if it is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "loading config");

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = if path.file_name().is_some_and(|name| name == "pyproject.toml") {
            Self::from_pyproject_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };

        tracing::debug!(path = %path.display(), parts = config.parts.len(), "config loaded");
        Ok(config)
    }

    /// Overrides values from `BUMPSPEC_*` variables: `CURRENT_VERSION`, `PARSE`, `SERIALIZE`
    /// (one format per line), `TAG_NAME` and `MESSAGE`. Other variables are ignored.
    pub fn apply_env<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.into();
            match name {
                "CURRENT_VERSION" => self.current_version = Some(value),
                "PARSE" => self.parse = value,
                "SERIALIZE" => {
                    self.serialize = value
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_owned)
                        .collect();
                }
                "TAG_NAME" => self.tag_name = value,
                "MESSAGE" => self.message = value,
                _ => continue,
            }
            tracing::debug!(variable = key.as_ref(), "configuration overridden from environment");
        }
    }

    /// # Errors
    ///
    /// [ConfigError::MissingCurrentVersion] if there is no current version, or it is empty.
    pub fn current_version(&self) -> Result<&str, ConfigError> {
        self.current_version
            .as_deref()
            .filter(|version| !version.is_empty())
            .ok_or(ConfigError::MissingCurrentVersion)
    }

    pub fn parse_regex(&self) -> Result<Regex, VersionError> {
        compile_parse_pattern(&self.parse)
    }

    pub fn serialize_templates(&self) -> Result<Vec<Template>, FormatError> {
        if self.serialize.is_empty() {
            return Err(FormatError::NoSerializeFormats);
        }
        self.serialize.iter().map(|format| Template::parse(format)).collect()
    }

    /// Every component: those captured by the parse pattern, in group order, then the
    /// configured parts the pattern does not capture.
    ///
    /// # Errors
    ///
    /// [ConfigError::Version] if the parse pattern is invalid.
    pub fn component_configs(&self) -> Result<IndexMap<String, ComponentConfig>, ConfigError> {
        let regex = self.parse_regex()?;

        let mut configs: IndexMap<String, ComponentConfig> = pattern_labels(&regex)
            .map(|label| {
                let config = self.parts.get(label).cloned().unwrap_or_default();
                (label.to_owned(), config)
            })
            .collect();
        for (name, config) in &self.parts {
            if !configs.contains_key(name) {
                configs.insert(name.clone(), config.clone());
            }
        }
        Ok(configs)
    }

    /// Builds the version spec. Calendar components read dates from `clock`.
    ///
    /// # Errors
    ///
    /// - [ConfigError::Version] if the parse pattern is invalid.
    /// - [ConfigError::Spec] if the components do not make a valid spec.
    pub fn version_spec(&self, clock: Clock) -> Result<VersionSpec, ConfigError> {
        let configs = self.component_configs()?;
        Ok(VersionSpec::with_clock(&configs, &self.order, clock)?)
    }
}
