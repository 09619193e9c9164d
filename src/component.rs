use crate::{
    clock::Clock,
    error::{BumpError, SpecError},
    function::{
        contains_digit, CalVerFunction, ComponentFunction, ComponentKind, IndependentFunction,
        NumericFunction, ValuesFunction,
    },
};
use core::fmt::{self, Display};
use serde::{Deserialize, Deserializer};

/// A TOML scalar written either as a string or as an integer (`first_value = 1`).
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(text) => text,
            Scalar::Integer(int) => int.to_string(),
        }
    }
}

fn optional_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
}

fn optional_scalars<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Ok(Option::<Vec<Scalar>>::deserialize(deserializer)?
        .map(|values| values.into_iter().map(String::from).collect()))
}

/// The configuration of one version component, as written under `[parts.<name>]`.
///
/// ```
/// use bumpspec::ComponentConfig;
///
/// let release: ComponentConfig = toml::from_str(r#"
///     values = ["alpha", "beta", "final"]
///     optional_value = "final"
/// "#).unwrap();
/// assert_eq!(
///     release,
///     ComponentConfig::default()
///         .with_values(["alpha", "beta", "final"])
///         .with_optional_value("final"),
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComponentConfig {
    #[serde(deserialize_with = "optional_scalars")]
    pub values: Option<Vec<String>>,

    #[serde(deserialize_with = "optional_scalar")]
    pub optional_value: Option<String>,

    #[serde(deserialize_with = "optional_scalar")]
    pub first_value: Option<String>,

    pub independent: bool,

    /// Bump on every bump of any component. Implies `independent`.
    pub always_increment: bool,

    pub calver_format: Option<String>,

    /// Reset when this component is bumped, instead of when the previous one in the order is.
    pub depends_on: Option<String>,
}

impl ComponentConfig {
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_optional_value(mut self, value: impl Into<String>) -> Self {
        self.optional_value = Some(value.into());
        self
    }

    pub fn with_first_value(mut self, value: impl Into<String>) -> Self {
        self.first_value = Some(value.into());
        self
    }

    pub fn with_independent(mut self, independent: bool) -> Self {
        self.independent = independent;
        self
    }

    pub fn with_always_increment(mut self, always_increment: bool) -> Self {
        self.always_increment = always_increment;
        self
    }

    pub fn with_calver_format(mut self, format: impl Into<String>) -> Self {
        self.calver_format = Some(format.into());
        self
    }

    pub fn with_depends_on(mut self, component: impl Into<String>) -> Self {
        self.depends_on = Some(component.into());
        self
    }

    /// The kind of component this configuration builds.
    pub fn kind(&self) -> ComponentKind {
        if self.values.is_some() {
            ComponentKind::Values
        } else if self.calver_format.is_some() {
            ComponentKind::CalVer
        } else if self.is_independent()
            && self
                .first_value
                .as_deref()
                .is_some_and(|first| !contains_digit(first))
        {
            ComponentKind::Independent
        } else {
            ComponentKind::Numeric
        }
    }

    fn is_independent(&self) -> bool {
        self.independent || self.always_increment
    }
}

/// A validated component: its name, function and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    name: String,
    function: ComponentFunction,
    independent: bool,
    always_increment: bool,
    depends_on: Option<String>,
}

impl ComponentSpec {
    /// Builds the spec of component `name`. Calendar components read dates from `clock`.
    ///
    /// # Errors
    ///
    /// Any [SpecError] raised by the component's function.
    pub fn new(name: &str, config: &ComponentConfig, clock: Clock) -> Result<Self, SpecError> {
        let first_value = config.first_value.as_deref();
        let optional_value = config.optional_value.as_deref();

        let function = match config.kind() {
            ComponentKind::Values => ComponentFunction::Values(ValuesFunction::new(
                name,
                config.values.as_deref().unwrap_or_default(),
                first_value,
                optional_value,
            )?),
            ComponentKind::CalVer => ComponentFunction::CalVer(CalVerFunction::new(
                config.calver_format.as_deref().unwrap_or_default(),
                clock,
            )?),
            ComponentKind::Independent => ComponentFunction::Independent(
                IndependentFunction::new(first_value, optional_value),
            ),
            ComponentKind::Numeric => ComponentFunction::Numeric(NumericFunction::new(
                name,
                first_value,
                optional_value,
            )?),
        };

        Ok(Self {
            name: name.to_owned(),
            function,
            independent: config.is_independent(),
            always_increment: config.always_increment,
            depends_on: config.depends_on.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function(&self) -> &ComponentFunction {
        &self.function
    }

    pub fn kind(&self) -> ComponentKind {
        self.function.kind()
    }

    pub fn is_independent(&self) -> bool {
        self.independent
    }

    pub fn always_increment(&self) -> bool {
        self.always_increment
    }

    pub fn depends_on(&self) -> Option<&str> {
        self.depends_on.as_deref()
    }

    /// Creates a component with the given value. Without a value, the component displays its
    /// optional value, except calendar components, which take today's value right away.
    pub fn create_component(&self, value: Option<&str>) -> VersionComponent<'_> {
        let value = match (value, &self.function) {
            (Some(value), _) => Some(value.to_owned()),
            (None, ComponentFunction::CalVer(calver)) => Some(calver.first_value()),
            (None, _) => None,
        };
        VersionComponent { spec: self, value }
    }
}

/// One component of a [Version](crate::Version): a spec and its current value.
///
/// Two components are equal when their rendered values are equal, whatever their specs.
#[derive(Debug, Clone)]
pub struct VersionComponent<'s> {
    spec: &'s ComponentSpec,
    value: Option<String>,
}

impl<'s> VersionComponent<'s> {
    pub fn spec(&self) -> &'s ComponentSpec {
        self.spec
    }

    pub fn name(&self) -> &'s str {
        self.spec.name()
    }

    /// The rendered value: the stored value, or the optional value if there is none.
    pub fn value(&self) -> &str {
        self.value
            .as_deref()
            .unwrap_or_else(|| self.spec.function.optional_value())
    }

    /// Whether a value was set, rather than falling back to the optional value.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Returns a new component holding the next value.
    ///
    /// # Errors
    ///
    /// Any [BumpError] raised by the component's function.
    pub fn bump(&self) -> Result<Self, BumpError> {
        Ok(Self {
            spec: self.spec,
            value: Some(self.spec.function.bump(self.value())?),
        })
    }

    /// Returns a new component reset to the first value.
    pub fn null(&self) -> Self {
        Self {
            spec: self.spec,
            value: Some(self.spec.function.first_value().into_owned()),
        }
    }

    /// Whether the component may be left out of a serialization. Calendar components never are.
    pub fn is_optional(&self) -> bool {
        match self.spec.function {
            ComponentFunction::CalVer(_) => false,
            _ => self.value() == self.spec.function.optional_value(),
        }
    }

    pub fn is_independent(&self) -> bool {
        self.spec.is_independent()
    }
}

impl PartialEq for VersionComponent<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for VersionComponent<'_> {}

impl Display for VersionComponent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}
