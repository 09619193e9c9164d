use crate::{
    component::VersionComponent,
    context::Context,
    error::{BumpError, FormatError},
    serialize,
    spec::VersionSpec,
    template::Template,
};
use core::{
    fmt::{self, Display},
    ops::Index,
};
use indexmap::IndexMap;
use std::collections::HashSet;

/// A version: the components of a [VersionSpec], in the spec's order, with their values.
///
/// Versions never change. [Version::bump] returns a new version and leaves this one as it was,
/// also when it fails.
///
/// # Examples
///
/// ```
/// use bumpspec::{ComponentConfig, Context, Template, VersionSpec};
/// use indexmap::IndexMap;
/// use regex::Regex;
///
/// let configs: IndexMap<String, ComponentConfig> = ["major", "minor", "patch"]
///     .into_iter()
///     .map(|name| (name.to_string(), ComponentConfig::default()))
///     .collect();
/// let spec = VersionSpec::new(&configs, &[]).unwrap();
/// let regex = Regex::new(r"(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)").unwrap();
///
/// let version = spec.parse_version("1.2.3", &regex).unwrap();
/// let next = version.bump("minor").unwrap();
///
/// let formats = [Template::parse("{major}.{minor}.{patch}").unwrap()];
/// assert_eq!("1.3.0", next.serialize(&formats, &Context::new()).unwrap());
/// assert_eq!("2", version["minor"].value());
/// ```
#[derive(Debug, Clone)]
pub struct Version<'s> {
    spec: &'s VersionSpec,
    components: IndexMap<String, VersionComponent<'s>>,
    original: Option<String>,
}

impl<'s> Version<'s> {
    pub(crate) fn new(
        spec: &'s VersionSpec,
        components: IndexMap<String, VersionComponent<'s>>,
    ) -> Self {
        Self {
            spec,
            components,
            original: None,
        }
    }

    /// Sets the text this version was parsed from.
    pub fn with_original(mut self, original: impl Into<String>) -> Self {
        self.original = Some(original.into());
        self
    }

    /// The text this version was parsed from, if it was parsed.
    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    pub fn spec(&self) -> &'s VersionSpec {
        self.spec
    }

    pub fn get(&self, name: &str) -> Option<&VersionComponent<'s>> {
        self.components.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VersionComponent<'s>)> {
        self.components
            .iter()
            .map(|(name, component)| (name.as_str(), component))
    }

    /// The rendered value of each component, in order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> + use<'_, 's> {
        self.iter()
            .map(|(name, component)| (name, component.value()))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// See [VersionSpec::required_components].
    pub fn required_components(&self) -> Vec<&'s str> {
        self.spec.required_components(self)
    }

    /// Returns a new version with component `name` bumped.
    ///
    /// Components flagged `always_increment` are bumped first. If that changes one of them, its
    /// dependents are reset, and `name` too if it is one of them. Otherwise `name` is bumped and
    /// its dependents are reset. Independent components are never reset. Everything else is
    /// carried over unchanged.
    ///
    /// # Errors
    ///
    /// - [BumpError::InvalidVersionPart] if `name` is not a component of this version.
    /// - Any error bumping a component.
    pub fn bump(&self, name: &str) -> Result<Self, BumpError> {
        let Some(target) = self.components.get(name) else {
            return Err(BumpError::InvalidVersionPart {
                name: name.to_owned(),
                valid: self.components.keys().cloned().collect(),
            });
        };

        let spec = self.spec;
        let mut components = self.components.clone();
        let mut to_reset: HashSet<&str> = HashSet::new();

        for always in spec.always_increment() {
            let current = &self.components[always.as_str()];
            let bumped = current.bump()?;
            if bumped != *current {
                to_reset.extend(spec.get_dependents(always).iter().map(String::as_str));
            }
            components.insert(always.clone(), bumped);
        }

        if !to_reset.contains(name) {
            if !target.spec().always_increment() {
                components.insert(name.to_owned(), target.bump()?);
            }
            to_reset.extend(spec.get_dependents(name).iter().map(String::as_str));
        }

        for reset in to_reset {
            let component = &self.components[reset];
            if !component.is_independent() {
                components.insert(reset.to_owned(), component.null());
            }
        }

        let bumped = Self {
            spec,
            components,
            original: self.original.clone(),
        };
        tracing::debug!(part = name, from = %self, to = %bumped, "bumped version");
        Ok(bumped)
    }

    /// Serializes this version with the best fitting of `formats`. See [serialize()](crate::serialize()).
    pub fn serialize(&self, formats: &[Template], context: &Context) -> Result<String, FormatError> {
        serialize::serialize(self, context, formats)
    }
}

impl<'s> Index<&str> for Version<'s> {
    type Output = VersionComponent<'s>;

    /// # Panics
    ///
    /// If `name` is not a component of this version.
    fn index(&self, name: &str) -> &Self::Output {
        &self.components[name]
    }
}

impl PartialEq for Version<'_> {
    /// Versions are equal when they hold the same components with the same values.
    fn eq(&self, other: &Self) -> bool {
        self.components.len() == other.components.len()
            && self.values().zip(other.values()).all(|(a, b)| a == b)
    }
}

impl Eq for Version<'_> {}

impl Display for Version<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values()).finish()
    }
}
