use crate::{
    calver::CalendarFormat,
    clock::Clock,
    error::{BumpError, SpecError},
};
use core::fmt::{self, Display};
use regex::Regex;
use std::{borrow::Cow, sync::LazyLock};

static FIRST_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?P<prefix>[^0-9]*)(?P<number>[0-9]+)(?P<suffix>.*)$")
        .expect("first numeric regex is valid")
});

/// The optional value of calendar components. No rendered calendar value can equal it.
pub const CALVER_NO_OPTIONAL_VALUE: &str = "There isn't an optional value for CalVer.";

pub(crate) fn contains_digit(value: &str) -> bool {
    FIRST_NUMERIC.is_match(value)
}

/// The strategy a component uses to increment, fixed when its spec is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Numeric,
    Values,
    Independent,
    CalVer,
}

impl Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentKind::Numeric => "numeric",
            ComponentKind::Values => "values",
            ComponentKind::Independent => "independent",
            ComponentKind::CalVer => "calver",
        };
        f.write_str(name)
    }
}

/// Increments the first run of digits in a value, keeping what comes before and after it.
///
/// `"r3-beta"` bumps to `"r4-beta"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericFunction {
    first_value: String,
    optional_value: String,
}

impl NumericFunction {
    /// # Errors
    ///
    /// [SpecError::FirstValueNotNumeric] if `first_value` (default `"0"`) has no digit.
    pub fn new(
        component: &str,
        first_value: Option<&str>,
        optional_value: Option<&str>,
    ) -> Result<Self, SpecError> {
        let first_value = first_value.unwrap_or("0");
        if !contains_digit(first_value) {
            return Err(SpecError::FirstValueNotNumeric {
                component: component.to_owned(),
                value: first_value.to_owned(),
            });
        }

        Ok(Self {
            first_value: first_value.to_owned(),
            optional_value: optional_value.unwrap_or(first_value).to_owned(),
        })
    }

    pub fn first_value(&self) -> &str {
        &self.first_value
    }

    pub fn optional_value(&self) -> &str {
        &self.optional_value
    }

    /// # Errors
    ///
    /// - [BumpError::NoDigits] if `value` has no digit.
    /// - [BumpError::BelowFirstValue] if the number in `value` is lower than the first value's.
    /// - [BumpError::Overflow] if the number does not fit in, or cannot be incremented within,
    ///   a `u64`.
    pub fn bump(&self, value: &str) -> Result<String, BumpError> {
        let caps = FIRST_NUMERIC
            .captures(value)
            .ok_or_else(|| BumpError::NoDigits {
                value: value.to_owned(),
            })?;
        let overflow = || BumpError::Overflow {
            value: value.to_owned(),
        };

        let number: u64 = caps["number"].parse().map_err(|_| overflow())?;
        let first_number = FIRST_NUMERIC
            .captures(&self.first_value)
            .and_then(|first| first["number"].parse::<u64>().ok());
        if first_number.is_some_and(|first| number < first) {
            return Err(BumpError::BelowFirstValue {
                value: value.to_owned(),
                first_value: self.first_value.clone(),
            });
        }

        let bumped = number.checked_add(1).ok_or_else(overflow)?;
        Ok(format!("{}{bumped}{}", &caps["prefix"], &caps["suffix"]))
    }
}

/// Steps through a fixed list of values, like `["alpha", "beta", "rc", "final"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesFunction {
    values: Vec<String>,
    first_value: String,
    optional_value: String,
}

impl ValuesFunction {
    /// # Errors
    ///
    /// - [SpecError::EmptyValues] if `values` is empty.
    /// - [SpecError::FirstValueNotInValues] or [SpecError::OptionalValueNotInValues] if either
    ///   value is given but is not one of `values`.
    pub fn new(
        component: &str,
        values: &[String],
        first_value: Option<&str>,
        optional_value: Option<&str>,
    ) -> Result<Self, SpecError> {
        let Some(head) = values.first() else {
            return Err(SpecError::EmptyValues {
                component: component.to_owned(),
            });
        };

        let first_value = first_value.unwrap_or(head.as_str());
        if !values.iter().any(|v| v == first_value) {
            return Err(SpecError::FirstValueNotInValues {
                component: component.to_owned(),
                value: first_value.to_owned(),
                values: values.to_vec(),
            });
        }

        let optional_value = optional_value.unwrap_or(first_value);
        if !values.iter().any(|v| v == optional_value) {
            return Err(SpecError::OptionalValueNotInValues {
                component: component.to_owned(),
                value: optional_value.to_owned(),
                values: values.to_vec(),
            });
        }

        Ok(Self {
            values: values.to_vec(),
            first_value: first_value.to_owned(),
            optional_value: optional_value.to_owned(),
        })
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn first_value(&self) -> &str {
        &self.first_value
    }

    pub fn optional_value(&self) -> &str {
        &self.optional_value
    }

    /// Returns the value after `value` in the list.
    ///
    /// # Errors
    ///
    /// - [BumpError::ValueNotInValues] if `value` is not in the list.
    /// - [BumpError::MaximumValue] if `value` is the last entry.
    pub fn bump(&self, value: &str) -> Result<String, BumpError> {
        let idx = self
            .values
            .iter()
            .position(|v| v == value)
            .ok_or_else(|| BumpError::ValueNotInValues {
                value: value.to_owned(),
                values: self.values.clone(),
            })?;

        self.values
            .get(idx + 1)
            .cloned()
            .ok_or_else(|| BumpError::MaximumValue {
                values: self.values.clone(),
            })
    }
}

/// A free-form label that is set from outside and never derived from other components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndependentFunction {
    first_value: String,
    optional_value: String,
}

impl IndependentFunction {
    pub fn new(first_value: Option<&str>, optional_value: Option<&str>) -> Self {
        let first_value = first_value.unwrap_or_default();
        Self {
            first_value: first_value.to_owned(),
            optional_value: optional_value.unwrap_or(first_value).to_owned(),
        }
    }

    pub fn first_value(&self) -> &str {
        &self.first_value
    }

    pub fn optional_value(&self) -> &str {
        &self.optional_value
    }

    /// Returns `value` unchanged, or the first value when `value` is empty.
    pub fn bump(&self, value: &str) -> String {
        if value.is_empty() {
            self.first_value.clone()
        } else {
            value.to_owned()
        }
    }
}

/// Renders the clock's current date through a [CalendarFormat].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalVerFunction {
    format: CalendarFormat,
    clock: Clock,
}

impl CalVerFunction {
    /// # Errors
    ///
    /// Any error of [CalendarFormat::parse].
    pub fn new(format: &str, clock: Clock) -> Result<Self, SpecError> {
        Ok(Self {
            format: CalendarFormat::parse(format)?,
            clock,
        })
    }

    pub fn format(&self) -> &CalendarFormat {
        &self.format
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Today's value. It changes with the clock.
    pub fn first_value(&self) -> String {
        self.format.render(&self.clock.today())
    }

    pub fn optional_value(&self) -> &str {
        CALVER_NO_OPTIONAL_VALUE
    }

    /// Returns today's value. `_value` is ignored: a calendar component always moves to the
    /// clock's date, whatever it was before.
    pub fn bump(&self, _value: &str) -> String {
        self.first_value()
    }
}

/// How a component increments, resets and decides whether it is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentFunction {
    Numeric(NumericFunction),
    Values(ValuesFunction),
    Independent(IndependentFunction),
    CalVer(CalVerFunction),
}

impl ComponentFunction {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentFunction::Numeric(_) => ComponentKind::Numeric,
            ComponentFunction::Values(_) => ComponentKind::Values,
            ComponentFunction::Independent(_) => ComponentKind::Independent,
            ComponentFunction::CalVer(_) => ComponentKind::CalVer,
        }
    }

    /// The value a component takes when it is created without a value or reset.
    pub fn first_value(&self) -> Cow<'_, str> {
        match self {
            ComponentFunction::Numeric(f) => Cow::Borrowed(f.first_value()),
            ComponentFunction::Values(f) => Cow::Borrowed(f.first_value()),
            ComponentFunction::Independent(f) => Cow::Borrowed(f.first_value()),
            ComponentFunction::CalVer(f) => Cow::Owned(f.first_value()),
        }
    }

    /// The value at which a component may be left out of a serialization.
    pub fn optional_value(&self) -> &str {
        match self {
            ComponentFunction::Numeric(f) => f.optional_value(),
            ComponentFunction::Values(f) => f.optional_value(),
            ComponentFunction::Independent(f) => f.optional_value(),
            ComponentFunction::CalVer(f) => f.optional_value(),
        }
    }

    pub fn bump(&self, value: &str) -> Result<String, BumpError> {
        match self {
            ComponentFunction::Numeric(f) => f.bump(value),
            ComponentFunction::Values(f) => f.bump(value),
            ComponentFunction::Independent(f) => Ok(f.bump(value)),
            ComponentFunction::CalVer(f) => Ok(f.bump(value)),
        }
    }
}
