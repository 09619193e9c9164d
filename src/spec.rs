use crate::{
    clock::Clock,
    component::{ComponentConfig, ComponentSpec},
    error::{SpecError, VersionError},
    parse::{capture_raw_version, RawVersion},
    version::Version,
};
use indexmap::IndexMap;
use regex::Regex;
use std::{
    borrow::Cow,
    collections::{HashMap, HashSet, VecDeque},
};

/// The grammar of a version: its components, their order and which components reset when
/// another one is bumped.
///
/// Built once from configuration and never changed afterwards. [Version]s borrow their spec.
///
/// ```
/// use bumpspec::{ComponentConfig, VersionSpec};
/// use indexmap::IndexMap;
///
/// let configs: IndexMap<String, ComponentConfig> = ["major", "minor", "patch"]
///     .into_iter()
///     .map(|name| (name.to_string(), ComponentConfig::default()))
///     .collect();
/// let spec = VersionSpec::new(&configs, &[]).unwrap();
/// assert_eq!(["minor", "patch"], spec.get_dependents("major"));
/// assert!(spec.get_dependents("patch").is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpec {
    components: IndexMap<String, ComponentSpec>,
    order: Vec<String>,
    dependency_map: HashMap<String, Vec<String>>,
    always_increment: Vec<String>,
    clock: Clock,
}

impl VersionSpec {
    /// Builds a spec using the system clock in UTC. See [VersionSpec::with_clock].
    pub fn new(
        configs: &IndexMap<String, ComponentConfig>,
        order: &[String],
    ) -> Result<Self, SpecError> {
        Self::with_clock(configs, order, Clock::default())
    }

    /// Builds a spec from component configurations.
    ///
    /// `order` is either empty, to keep the order of `configs`, or lists every component exactly
    /// once. Calendar components read dates from `clock`.
    ///
    /// # Errors
    ///
    /// - [SpecError::NoComponents] if `configs` is empty.
    /// - [SpecError::UnknownComponentInOrder], [SpecError::DuplicateComponentInOrder] or
    ///   [SpecError::ComponentMissingFromOrder] if `order` is not a permutation of the
    ///   components.
    /// - [SpecError::UnknownDependency] if a `depends_on` names no other component.
    /// - Any error building a component.
    pub fn with_clock(
        configs: &IndexMap<String, ComponentConfig>,
        order: &[String],
        clock: Clock,
    ) -> Result<Self, SpecError> {
        if configs.is_empty() {
            return Err(SpecError::NoComponents);
        }
        let order = Self::validate_order(configs, order)?;

        let components: IndexMap<String, ComponentSpec> = order
            .iter()
            .map(|name| {
                ComponentSpec::new(name, &configs[name.as_str()], clock)
                    .map(|spec| (name.clone(), spec))
            })
            .collect::<Result<_, _>>()?;

        for spec in components.values() {
            if let Some(depends_on) = spec.depends_on() {
                if depends_on == spec.name() || !components.contains_key(depends_on) {
                    return Err(SpecError::UnknownDependency {
                        component: spec.name().to_owned(),
                        depends_on: depends_on.to_owned(),
                    });
                }
            }
        }

        let dependency_map = Self::build_dependency_map(&components);
        let always_increment = components
            .values()
            .filter(|spec| spec.always_increment())
            .map(|spec| spec.name().to_owned())
            .collect();

        tracing::debug!(?order, ?dependency_map, "built version spec");

        Ok(Self {
            components,
            order,
            dependency_map,
            always_increment,
            clock,
        })
    }

    fn validate_order(
        configs: &IndexMap<String, ComponentConfig>,
        order: &[String],
    ) -> Result<Vec<String>, SpecError> {
        if order.is_empty() {
            return Ok(configs.keys().cloned().collect());
        }

        let mut seen = HashSet::new();
        for name in order {
            if !configs.contains_key(name) {
                return Err(SpecError::UnknownComponentInOrder { name: name.clone() });
            }
            if !seen.insert(name.as_str()) {
                return Err(SpecError::DuplicateComponentInOrder { name: name.clone() });
            }
        }
        if let Some(name) = configs.keys().find(|name| !seen.contains(name.as_str())) {
            return Err(SpecError::ComponentMissingFromOrder { name: name.clone() });
        }

        Ok(order.to_vec())
    }

    /// Maps every component to the components that reset when it is bumped.
    ///
    /// Edges run along the order: each non-independent component hangs off the previous
    /// non-independent one (the head counts whatever its flags), or off its `depends_on`. The
    /// map holds the transitive closure of those edges, sorted by order.
    fn build_dependency_map(
        components: &IndexMap<String, ComponentSpec>,
    ) -> HashMap<String, Vec<String>> {
        let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut specs = components.values();
        if let Some(head) = specs.next() {
            let mut previous = head.name();
            for spec in specs {
                if spec.is_independent() {
                    continue;
                }
                let parent = spec.depends_on().unwrap_or(previous);
                edges.entry(parent).or_default().push(spec.name());
                previous = spec.name();
            }
        }

        components
            .keys()
            .map(|name| {
                let mut stack: VecDeque<&str> =
                    edges.get(name.as_str()).cloned().unwrap_or_default().into();
                let mut visited: HashSet<&str> = HashSet::new();
                while let Some(dependent) = stack.pop_front() {
                    if dependent != name.as_str() && visited.insert(dependent) {
                        stack.extend(edges.get(dependent).into_iter().flatten().copied());
                    }
                }

                let mut dependents: Vec<&str> = visited.into_iter().collect();
                dependents.sort_by_key(|dependent| components.get_index_of(*dependent));
                (
                    name.clone(),
                    dependents.into_iter().map(str::to_owned).collect(),
                )
            })
            .collect()
    }

    /// The components that reset when `name` is bumped, in order. Unknown names have none.
    pub fn get_dependents(&self, name: &str) -> &[String] {
        self.dependency_map
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The components that must appear in a serialization of `version`: every component in order
    /// up to and including the last one that is not optional.
    ///
    /// An optional component followed by a required one is still required, since leaving it out
    /// would make the version ambiguous.
    pub fn required_components(&self, version: &Version<'_>) -> Vec<&str> {
        let last_required = self.order.iter().rposition(|name| {
            version
                .get(name)
                .is_some_and(|component| !component.is_optional())
        });

        match last_required {
            Some(idx) => self.order[..=idx].iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    /// Creates a version from raw values. Components without a raw value take their first
    /// value.
    pub fn create_version(&self, raw: &RawVersion) -> Version<'_> {
        let components = self
            .components
            .iter()
            .map(|(name, spec)| {
                let value = raw
                    .get(name)
                    .map(|value| Cow::Borrowed(value.as_str()))
                    .unwrap_or_else(|| spec.function().first_value());
                (name.clone(), spec.create_component(Some(value.as_ref())))
            })
            .collect();

        Version::new(self, components)
    }

    /// Parses `version` with `regex` and creates a version from the captured values, keeping
    /// the matched text as its original.
    ///
    /// # Errors
    ///
    /// [VersionError::VersionFormatMismatch] if `version` is empty or `regex` is not found in it.
    pub fn parse_version(&self, version: &str, regex: &Regex) -> Result<Version<'_>, VersionError> {
        let (matched, raw) = capture_raw_version(version, regex).ok_or_else(|| {
            VersionError::VersionFormatMismatch {
                version_string: version.to_owned(),
                pattern: regex.as_str().to_owned(),
            }
        })?;

        Ok(self.create_version(&raw).with_original(matched))
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn component(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.get(name)
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.components.values()
    }

    /// The components that are bumped whenever any component is, in order.
    pub fn always_increment(&self) -> &[String] {
        &self.always_increment
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    fn configs(pairs: &[(&str, ComponentConfig)]) -> IndexMap<String, ComponentConfig> {
        pairs
            .iter()
            .map(|(name, config)| (name.to_string(), config.clone()))
            .collect()
    }

    fn semver() -> IndexMap<String, ComponentConfig> {
        configs(&[
            ("major", ComponentConfig::default()),
            ("minor", ComponentConfig::default()),
            ("patch", ComponentConfig::default()),
        ])
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn raw(pairs: &[(&str, &str)]) -> RawVersion {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_no_components() {
        assert_eq!(
            Err(SpecError::NoComponents),
            VersionSpec::new(&IndexMap::new(), &[])
        );
    }

    #[test]
    fn test_every_permutation_is_a_valid_order() {
        let configs = semver();
        for order in configs.keys().cloned().permutations(3) {
            let spec = VersionSpec::new(&configs, &order).unwrap();
            assert_eq!(order, spec.order());
            assert_eq!(
                order[1..].to_vec(),
                spec.get_dependents(&order[0]),
                "{order:?}"
            );
        }
    }

    #[test]
    fn test_invalid_orders() {
        let configs = semver();
        let args = [
            (
                strings(&["major", "minor", "patch", "build"]),
                SpecError::UnknownComponentInOrder {
                    name: "build".to_string(),
                },
            ),
            (
                strings(&["major", "minor"]),
                SpecError::ComponentMissingFromOrder {
                    name: "patch".to_string(),
                },
            ),
            (
                strings(&["major", "minor", "minor", "patch"]),
                SpecError::DuplicateComponentInOrder {
                    name: "minor".to_string(),
                },
            ),
        ];

        for (order, err) in args {
            assert_eq!(Err(err), VersionSpec::new(&configs, &order));
        }
    }

    #[test]
    fn test_dependency_map_skips_independent_components() {
        let configs = configs(&[
            ("major", ComponentConfig::default()),
            ("minor", ComponentConfig::default()),
            ("build", ComponentConfig::default().with_independent(true)),
            ("patch", ComponentConfig::default()),
            (
                "release",
                ComponentConfig::default().with_values(["dev", "final"]),
            ),
        ]);
        let spec = VersionSpec::new(&configs, &[]).unwrap();

        let args = [
            ("major", strings(&["minor", "patch", "release"])),
            ("minor", strings(&["patch", "release"])),
            ("build", strings(&[])),
            ("patch", strings(&["release"])),
            ("release", strings(&[])),
            ("unknown", strings(&[])),
        ];
        for (name, expected) in args {
            assert_eq!(expected, spec.get_dependents(name), "{name}");
        }
    }

    #[test]
    fn test_independent_head_still_resets_chain() {
        let configs = configs(&[
            (
                "date",
                ComponentConfig::default()
                    .with_calver_format("{YYYY}.{MM}")
                    .with_always_increment(true),
            ),
            ("patch", ComponentConfig::default()),
        ]);
        let spec = VersionSpec::new(&configs, &[]).unwrap();
        assert_eq!(strings(&["patch"]), spec.get_dependents("date"));
        assert_eq!(strings(&["date"]), spec.always_increment());
    }

    #[test]
    fn test_depends_on() {
        let configs = configs(&[
            ("major", ComponentConfig::default()),
            ("minor", ComponentConfig::default()),
            ("patch", ComponentConfig::default()),
            ("dev", ComponentConfig::default().with_depends_on("major")),
        ]);
        let spec = VersionSpec::new(&configs, &[]).unwrap();

        assert_eq!(strings(&["minor", "patch", "dev"]), spec.get_dependents("major"));
        assert_eq!(strings(&["patch"]), spec.get_dependents("minor"));
        assert!(spec.get_dependents("patch").is_empty());

        let mut bad = configs.clone();
        bad.insert(
            "post".to_string(),
            ComponentConfig::default().with_depends_on("epoch"),
        );
        assert_eq!(
            Err(SpecError::UnknownDependency {
                component: "post".to_string(),
                depends_on: "epoch".to_string(),
            }),
            VersionSpec::new(&bad, &[])
        );
    }

    #[test]
    fn test_create_version_uses_first_values() {
        let configs = configs(&[
            ("major", ComponentConfig::default()),
            ("minor", ComponentConfig::default().with_first_value("1")),
            (
                "release",
                ComponentConfig::default().with_values(["alpha", "final"]),
            ),
        ]);
        let spec = VersionSpec::new(&configs, &[]).unwrap();
        let version = spec.create_version(&raw(&[("major", "3"), ("unknown", "7")]));

        assert_eq!(
            vec![("major", "3"), ("minor", "1"), ("release", "alpha")],
            version.values().collect::<Vec<_>>()
        );
        assert_eq!(None, version.original());
    }

    #[test]
    fn test_required_components_high_water_mark() {
        let configs = configs(&[
            ("major", ComponentConfig::default()),
            ("minor", ComponentConfig::default()),
            ("build", ComponentConfig::default().with_independent(true)),
            ("patch", ComponentConfig::default()),
        ]);
        let spec = VersionSpec::new(&configs, &[]).unwrap();

        let args = [
            (
                raw(&[("major", "0"), ("minor", "0"), ("build", "0"), ("patch", "1")]),
                vec!["major", "minor", "build", "patch"],
            ),
            (
                raw(&[("major", "0"), ("minor", "2"), ("build", "0"), ("patch", "0")]),
                vec!["major", "minor"],
            ),
            (
                raw(&[("major", "0"), ("minor", "0"), ("build", "5"), ("patch", "0")]),
                vec!["major", "minor", "build"],
            ),
            (raw(&[]), vec![]),
        ];

        for (raw, expected) in args {
            let version = spec.create_version(&raw);
            assert_eq!(expected, spec.required_components(&version), "{raw:?}");
        }
    }

    #[test]
    fn test_parse_version() {
        let spec = VersionSpec::new(&semver(), &[]).unwrap();
        let regex = Regex::new(crate::parse::DEFAULT_PARSE_PATTERN).unwrap();

        let version = spec.parse_version("v1.2.3", &regex).unwrap();
        assert_eq!(Some("1.2.3"), version.original());
        assert_eq!("2", version["minor"].value());

        assert_eq!(
            Err(VersionError::VersionFormatMismatch {
                version_string: "1.2".to_string(),
                pattern: crate::parse::DEFAULT_PARSE_PATTERN.to_string(),
            }),
            spec.parse_version("1.2", &regex)
        );
    }
}
