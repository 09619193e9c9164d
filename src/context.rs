use crate::{clock::Clock, error::FormatError, template::TextSpec, version::Version};
use chrono::{
    format::{Item, StrftimeItems},
    DateTime, FixedOffset, Utc,
};
use core::fmt::{self, Display, Write};
use indexmap::IndexMap;
use std::path::PathBuf;

/// A value that can be substituted into a [Template](crate::Template).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextValue {
    /// Plain text. Format specs are fill, align, width and precision (`{x:>5}`, `{x:.3}`).
    Text(String),
    /// A point in time. Format specs are strftime patterns (`{now:%Y-%m-%d}`).
    DateTime(DateTime<FixedOffset>),
}

impl ContextValue {
    pub(crate) fn write_formatted(
        &self,
        out: &mut String,
        key: &str,
        spec: Option<&str>,
    ) -> Result<(), FormatError> {
        let invalid = || FormatError::InvalidFormatSpec {
            key: key.to_owned(),
            spec: spec.unwrap_or_default().to_owned(),
        };

        match (self, spec) {
            (ContextValue::Text(text), None) => out.push_str(text),
            (ContextValue::Text(text), Some(spec)) => {
                TextSpec::parse(spec).ok_or_else(invalid)?.apply(text, out);
            }
            (ContextValue::DateTime(dt), None) => {
                write!(out, "{dt}").map_err(|_| invalid())?;
            }
            (ContextValue::DateTime(dt), Some(spec)) => {
                let items: Vec<Item<'_>> = StrftimeItems::new(spec).collect();
                if items.iter().any(|item| matches!(item, Item::Error)) {
                    return Err(invalid());
                }
                write!(out, "{}", dt.format_with_items(items.into_iter()))
                    .map_err(|_| invalid())?;
            }
        }
        Ok(())
    }
}

impl Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Text(text) => f.write_str(text),
            ContextValue::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<DateTime<FixedOffset>> for ContextValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::DateTime(value)
    }
}

impl From<DateTime<Utc>> for ContextValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value.fixed_offset())
    }
}

/// Facts about the working copy, supplied by whatever talks to the version control system.
///
/// Only fields that are set end up in the [Context].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScmInfo {
    pub tool: Option<String>,
    pub commit_sha: Option<String>,
    pub distance_to_latest_tag: u64,
    pub current_tag: Option<String>,
    pub branch_name: Option<String>,
    pub short_branch_name: Option<String>,
    pub repository_root: Option<PathBuf>,
    pub dirty: Option<bool>,
}

impl ScmInfo {
    /// The short branch name: either the explicit one, or the branch name lowercased, stripped
    /// of everything but ASCII alphanumerics and cut to 20 characters.
    pub fn short_branch_name(&self) -> Option<String> {
        self.short_branch_name.clone().or_else(|| {
            self.branch_name.as_ref().map(|branch| {
                branch
                    .chars()
                    .filter(char::is_ascii_alphanumeric)
                    .map(|c| c.to_ascii_lowercase())
                    .take(20)
                    .collect()
            })
        })
    }
}

/// The values available to templates, keyed by field name.
///
/// A context is assembled from a few sources, each with its own key convention:
///
/// | Source | Keys |
/// |---|---|
/// | [Context::with_clock] | `now`, `utcnow` |
/// | [Context::with_env] | `$NAME` for every environment variable `NAME` |
/// | [Context::with_scm] | `tool`, `commit_sha`, `distance_to_latest_tag`, `current_tag`, `branch_name`, `short_branch_name`, `repository_root`, `dirty` |
/// | [Context::with_version] | `<prefix>_<component>`, e.g. `current_major` |
///
/// When a version is serialized, its component values are layered on top of the context under
/// their bare names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    values: IndexMap<String, ContextValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the value previously stored under `key`.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ContextValue>,
    ) -> Option<ContextValue> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Adds `now` (in the clock's timezone) and `utcnow`.
    pub fn with_clock(mut self, clock: &Clock) -> Self {
        let now = clock.now();
        self.insert("utcnow", now.with_timezone(&Utc));
        self.insert("now", now);
        self
    }

    /// Adds every `(name, value)` pair as `$name`.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in vars {
            self.insert(format!("${}", name.as_ref()), value.into());
        }
        self
    }

    pub fn with_scm(mut self, scm: &ScmInfo) -> Self {
        let optional = [
            ("tool", scm.tool.clone()),
            ("commit_sha", scm.commit_sha.clone()),
            ("current_tag", scm.current_tag.clone()),
            ("branch_name", scm.branch_name.clone()),
            ("short_branch_name", scm.short_branch_name()),
            (
                "repository_root",
                scm.repository_root
                    .as_ref()
                    .map(|root| root.display().to_string()),
            ),
            ("dirty", scm.dirty.map(|dirty| dirty.to_string())),
        ];
        self.insert(
            "distance_to_latest_tag",
            scm.distance_to_latest_tag.to_string(),
        );
        for (key, value) in optional {
            if let Some(value) = value {
                self.insert(key, value);
            }
        }
        self
    }

    /// Adds each component of `version` as `<prefix>_<name>`.
    pub fn with_version(mut self, prefix: &str, version: &Version<'_>) -> Self {
        for (name, component) in version.iter() {
            self.insert(format!("{prefix}_{name}"), component.value());
        }
        self
    }

    /// Returns a copy of this context with `overrides` inserted as text, replacing existing keys.
    pub fn layered<'a>(&self, overrides: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut layered = self.clone();
        layered.extend(overrides);
        layered
    }
}

impl<K: Into<String>, V: Into<ContextValue>> Extend<(K, V)> for Context {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<ContextValue>> FromIterator<(K, V)> for Context {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut context = Self::new();
        context.extend(iter);
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_clock() {
        let clock = Clock::fixed(2020, 5, 1).unwrap();
        let context = Context::new().with_clock(&clock);
        assert_eq!(
            "2020-05-01 00:00:00 +00:00",
            context.get("now").unwrap().to_string()
        );
        assert!(context.contains_key("utcnow"));
    }

    #[test]
    fn test_with_env() {
        let context = Context::new().with_env([("BUILD_NUMBER", "42"), ("USER", "ci")]);
        assert_eq!(Some(&ContextValue::from("42")), context.get("$BUILD_NUMBER"));
        assert_eq!(Some(&ContextValue::from("ci")), context.get("$USER"));
        assert_eq!(None, context.get("BUILD_NUMBER"));
    }

    #[test]
    fn test_with_scm() {
        let scm = ScmInfo {
            tool: Some("git".to_string()),
            commit_sha: Some("abc123".to_string()),
            distance_to_latest_tag: 3,
            branch_name: Some("Feature/JIRA-1234_add-a-very-long-name".to_string()),
            dirty: Some(false),
            ..Default::default()
        };
        let context = Context::new().with_scm(&scm);

        let get = |key| context.get(key).map(ToString::to_string);
        assert_eq!(Some("git".to_string()), get("tool"));
        assert_eq!(Some("3".to_string()), get("distance_to_latest_tag"));
        assert_eq!(Some("false".to_string()), get("dirty"));
        assert_eq!(
            Some("featurejira1234addav".to_string()),
            get("short_branch_name")
        );
        assert_eq!(None, get("current_tag"));
        assert_eq!(None, get("repository_root"));
    }

    #[test]
    fn test_layered_does_not_touch_original() {
        let base: Context = [("major", "1"), ("now", "never")].into_iter().collect();
        let layered = base.layered([("major", "2")]);
        assert_eq!(Some(&ContextValue::from("1")), base.get("major"));
        assert_eq!(Some(&ContextValue::from("2")), layered.get("major"));
        assert_eq!(Some(&ContextValue::from("never")), layered.get("now"));
    }
}
