use std::path::PathBuf;

/// Errors raised while building a [`VersionSpec`](crate::VersionSpec) from component
/// configurations. These are fatal: a spec that fails to build cannot be used at all.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum SpecError {
    #[error("A version spec must have at least one component")]
    NoComponents,

    #[error("Values of component `{component}` cannot be empty")]
    EmptyValues { component: String },

    #[error("Optional value `{value}` of component `{component}` must be one of {values:?}")]
    OptionalValueNotInValues {
        component: String,
        value: String,
        values: Vec<String>,
    },

    #[error("First value `{value}` of component `{component}` must be one of {values:?}")]
    FirstValueNotInValues {
        component: String,
        value: String,
        values: Vec<String>,
    },

    #[error("The given first value `{value}` of component `{component}` does not contain any digit")]
    FirstValueNotNumeric { component: String, value: String },

    #[error("Component order refers to `{name}`, which is not a configured component")]
    UnknownComponentInOrder { name: String },

    #[error("Component `{name}` is configured but missing from the component order")]
    ComponentMissingFromOrder { name: String },

    #[error("Component `{name}` appears more than once in the component order")]
    DuplicateComponentInOrder { name: String },

    #[error("Component `{component}` depends on `{depends_on}`, which is not a configured component")]
    UnknownDependency {
        component: String,
        depends_on: String,
    },

    #[error("Unknown calendar specifier `{{{specifier}}}` in calendar format `{format}`")]
    UnknownCalendarSpecifier { specifier: String, format: String },

    #[error("Calendar format `{format}` is invalid: {source}")]
    InvalidCalendarFormat {
        format: String,
        #[source]
        source: FormatError,
    },
}

/// Errors raised when bumping a version or one of its components. A failed bump never changes
/// the version it was called on.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum BumpError {
    #[error("Invalid version part `{name}`: must be one of {valid:?}")]
    InvalidVersionPart { name: String, valid: Vec<String> },

    #[error("The component has already the maximum value among {values:?} and cannot be bumped.")]
    MaximumValue { values: Vec<String> },

    #[error("The value `{value}` must be one of {values:?}")]
    ValueNotInValues { value: String, values: Vec<String> },

    #[error("The given value `{value}` does not contain any digit")]
    NoDigits { value: String },

    #[error("The given value `{value}` is lower than the first value `{first_value}` and cannot be bumped.")]
    BelowFirstValue { value: String, first_value: String },

    #[error("The numeric part of `{value}` is too large to be bumped")]
    Overflow { value: String },
}

/// Errors raised while parsing or rendering a template, and while serializing a version.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum FormatError {
    #[error("Field in template should be terminated with a closing brace (`}}`): {template}")]
    UnterminatedField { template: String },

    #[error("Single `}}` encountered in template (escape it as `}}}}`): {template}")]
    UnmatchedClosingBrace { template: String },

    #[error("Empty field name in template: {template}")]
    EmptyFieldName { template: String },

    #[error("Unsupported conversion `!{conversion}` in template: {template}")]
    UnsupportedConversion {
        conversion: String,
        template: String,
    },

    #[error("Invalid format spec `{spec}` for field `{key}`")]
    InvalidFormatSpec { key: String, spec: String },

    #[error("Did not find key `{key}` in context when rendering `{template}`")]
    MissingValue { key: String, template: String },

    #[error("At least one serialization format is required")]
    NoSerializeFormats,
}

/// Errors raised while turning a version string into a [`Version`](crate::Version).
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum VersionError {
    #[error("Version string `{version_string}` does not match parse pattern `{pattern}`")]
    VersionFormatMismatch {
        version_string: String,
        pattern: String,
    },

    #[error("Parse pattern `{pattern}` is not a valid regular expression: {message}")]
    InvalidParsePattern { pattern: String, message: String },
}

#[derive(thiserror::Error, Debug, PartialEq, Clone)]
pub enum DateError {
    #[error("Explicit year ({year}), month ({month}), and day ({day}) arguments cannot be made into a valid date")]
    InvalidDateArguments { year: i32, month: u32, day: u32 },

    #[error("Unable to parse date `{date}`: {source}")]
    UnparseableDate {
        date: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Year {year} is outside the supported range of 1 to 9999")]
    YearOutOfRange { year: i32 },
}

/// Errors raised while loading a configuration file or assembling a configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("No current version: set `current_version` in the configuration or pass it explicitly")]
    MissingCurrentVersion,

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Version(#[from] VersionError),
}

/// The union of every error this crate can return, used by the bump workflow and the CLI.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Bump(#[from] BumpError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Date(#[from] DateError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maximum_value_message() {
        let err = BumpError::MaximumValue {
            values: vec!["dev".to_string(), "gamma".to_string()],
        };
        assert_eq!(
            r#"The component has already the maximum value among ["dev", "gamma"] and cannot be bumped."#,
            err.to_string()
        );
    }

    #[test]
    fn test_unknown_calendar_specifier_message() {
        let err = SpecError::UnknownCalendarSpecifier {
            specifier: "YYYYY".to_string(),
            format: "{YYYYY}.{MM}".to_string(),
        };
        assert_eq!(
            "Unknown calendar specifier `{YYYYY}` in calendar format `{YYYYY}.{MM}`",
            err.to_string()
        );
    }

    #[test]
    fn test_error_is_transparent() {
        let err: Error = BumpError::NoDigits {
            value: "abc".to_string(),
        }
        .into();
        assert_eq!("The given value `abc` does not contain any digit", err.to_string());

        let err: Error = ConfigError::from(SpecError::NoComponents).into();
        assert_eq!("A version spec must have at least one component", err.to_string());
    }
}
