use crate::{
    clock::Clock,
    config::Config,
    context::{Context, ScmInfo},
    error::Error,
    template::Template,
};
use core::fmt::{self, Display};

/// What to bump to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BumpTarget {
    /// Bump the named component.
    Part(String),

    /// Use this version instead of bumping. It must match the parse pattern.
    NewVersion(String),
}

impl Display for BumpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BumpTarget::Part(part) => write!(f, "part `{part}`"),
            BumpTarget::NewVersion(version) => write!(f, "version `{version}`"),
        }
    }
}

/// The result of planning a bump. Nothing has been written anywhere yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpOutcome {
    pub current_version: String,
    pub new_version: String,
    pub tag_name: String,
    pub message: String,

    /// Every value available to templates: the clock, the environment, SCM facts, the
    /// `current_*` and `new_*` components and both serialized versions.
    pub context: Context,
}

/// Computes the next version for `config` and renders the tag name and commit message.
///
/// `env` entries become `$NAME` context values. `scm` is optional since not every working copy is
/// under version control.
///
/// # Errors
///
/// - [ConfigError::MissingCurrentVersion](crate::ConfigError::MissingCurrentVersion) if the
///   configuration has no current version.
/// - A [VersionError](crate::VersionError) if the current or new version does not match the
///   parse pattern.
/// - A [BumpError](crate::BumpError) if the part cannot be bumped.
/// - A [FormatError](crate::FormatError) if the version, tag name or message cannot be rendered.
///
/// # Examples
///
/// ```
/// use bumpspec::{plan_bump, BumpTarget, Clock, Config};
///
/// let config = Config::from_toml_str(r#"current_version = "1.4.2""#).unwrap();
/// let outcome = plan_bump(
///     &config,
///     &BumpTarget::Part("minor".to_string()),
///     Clock::default(),
///     std::iter::empty::<(String, String)>(),
///     None,
/// )
/// .unwrap();
///
/// assert_eq!("1.5.0", outcome.new_version);
/// assert_eq!("v1.5.0", outcome.tag_name);
/// assert_eq!("Bump version: 1.4.2 → 1.5.0", outcome.message);
/// ```
pub fn plan_bump<I, K, V>(
    config: &Config,
    target: &BumpTarget,
    clock: Clock,
    env: I,
    scm: Option<&ScmInfo>,
) -> Result<BumpOutcome, Error>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let current_text = config.current_version()?;
    let regex = config.parse_regex()?;
    let formats = config.serialize_templates()?;
    let spec = config.version_spec(clock)?;

    let current = spec.parse_version(current_text, &regex)?;
    tracing::debug!(current = %current, %target, "planning bump");

    let mut context = Context::new().with_clock(&clock).with_env(env);
    if let Some(scm) = scm {
        context = context.with_scm(scm);
    }
    context = context.with_version("current", &current);
    context.insert("current_version", current_text);

    let new = match target {
        BumpTarget::Part(part) => current.bump(part)?,
        BumpTarget::NewVersion(text) => spec.parse_version(text, &regex)?,
    };
    let new_version = new.serialize(&formats, &context)?;

    let mut context = context.with_version("new", &new);
    context.insert("new_version", new_version.as_str());

    let tag_name = Template::parse(&config.tag_name)?.render(&context)?;
    let message = Template::parse(&config.message)?.render(&context)?;

    tracing::info!(
        current_version = current_text,
        new_version = new_version.as_str(),
        tag_name = tag_name.as_str(),
        "planned bump"
    );

    Ok(BumpOutcome {
        current_version: current_text.to_owned(),
        new_version,
        tag_name,
        message,
        context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::ContextValue,
        error::{BumpError, ConfigError, FormatError, VersionError},
    };
    use rstest::{fixture, rstest};

    const NO_ENV: [(&str, &str); 0] = [];

    #[fixture]
    fn prerelease() -> Config {
        Config::from_toml_str(
            r#"
            current_version = "1.0b1"
            parse = '(?P<major>\d+)\.(?P<minor>\d+)((?P<prerel>[a-z]+)(?P<prerelversion>\d+))?'
            serialize = ["{major}.{minor}{prerel}{prerelversion}", "{major}.{minor}"]
            tag_name = "release-{new_version}"
            message = "{current_major}.{current_minor} -> {new_major}.{new_minor} ({$USER})"

            [parts.prerel]
            values = ["dev", "a", "b", "c", "rc", "d"]
            optional_value = "d"
            "#,
        )
        .unwrap()
    }

    fn clock() -> Clock {
        Clock::fixed(2020, 5, 1).unwrap()
    }

    fn part(name: &str) -> BumpTarget {
        BumpTarget::Part(name.to_string())
    }

    #[rstest]
    #[case("prerelversion", "1.0b2")]
    #[case("prerel", "1.0c0")]
    #[case("minor", "1.1dev0")]
    #[case("major", "2.0dev0")]
    fn test_plan_bump_parts(prerelease: Config, #[case] name: &str, #[case] expected: &str) {
        let outcome = plan_bump(&prerelease, &part(name), clock(), [("USER", "ci")], None).unwrap();
        assert_eq!("1.0b1", outcome.current_version);
        assert_eq!(expected, outcome.new_version);
        assert_eq!(format!("release-{expected}"), outcome.tag_name);
    }

    #[rstest]
    fn test_message_uses_both_versions(prerelease: Config) {
        let outcome = plan_bump(&prerelease, &part("major"), clock(), [("USER", "ci")], None)
            .unwrap();
        assert_eq!("1.0 -> 2.0 (ci)", outcome.message);
        assert_eq!(
            Some(&ContextValue::from("1.0b1")),
            outcome.context.get("current_version")
        );
        assert_eq!(Some(&ContextValue::from("dev")), outcome.context.get("new_prerel"));
    }

    #[rstest]
    fn test_release_drops_optional_components(mut prerelease: Config) {
        prerelease.current_version = Some("1.0rc3".to_string());
        let outcome = plan_bump(&prerelease, &part("prerel"), clock(), [("USER", "ci")], None)
            .unwrap();
        assert_eq!("1.0", outcome.new_version);
    }

    #[rstest]
    fn test_explicit_new_version(prerelease: Config) {
        let target = BumpTarget::NewVersion("3.2a7".to_string());
        let outcome = plan_bump(&prerelease, &target, clock(), [("USER", "ci")], None).unwrap();
        assert_eq!("3.2a7", outcome.new_version);

        let target = BumpTarget::NewVersion("three".to_string());
        assert!(matches!(
            plan_bump(&prerelease, &target, clock(), NO_ENV, None),
            Err(Error::Version(VersionError::VersionFormatMismatch { .. }))
        ));
    }

    #[rstest]
    fn test_missing_env_value_in_message(prerelease: Config) {
        assert!(matches!(
            plan_bump(&prerelease, &part("minor"), clock(), NO_ENV, None),
            Err(Error::Format(FormatError::MissingValue { ref key, .. })) if key == "$USER"
        ));
    }

    #[rstest]
    fn test_maximum_value(mut prerelease: Config) {
        prerelease.current_version = Some("1.0d0".to_string());
        assert!(matches!(
            plan_bump(&prerelease, &part("prerel"), clock(), NO_ENV, None),
            Err(Error::Bump(BumpError::MaximumValue { .. }))
        ));
    }

    #[test]
    fn test_missing_current_version() {
        assert!(matches!(
            plan_bump(&Config::default(), &part("patch"), clock(), NO_ENV, None),
            Err(Error::Config(ConfigError::MissingCurrentVersion))
        ));
    }

    #[test]
    fn test_calver_with_scm() {
        let config = Config::from_toml_str(
            r#"
            current_version = "2019.12.3"
            parse = '(?P<release>\d+\.\d+)\.(?P<patch>\d+)'
            serialize = "{release}.{patch}"
            tag_name = "{new_version}-{short_branch_name}.{distance_to_latest_tag}"
            message = "{now:%Y-%m-%d}"

            [parts.release]
            calver_format = "{YYYY}.{MM}"
            "#,
        )
        .unwrap();
        let scm = ScmInfo {
            branch_name: Some("Feature/New-Thing".to_string()),
            distance_to_latest_tag: 4,
            ..ScmInfo::default()
        };

        let outcome = plan_bump(&config, &part("release"), clock(), NO_ENV, Some(&scm)).unwrap();
        assert_eq!("2020.5.0", outcome.new_version);
        assert_eq!("2020.5.0-featurenewthing.4", outcome.tag_name);
        assert_eq!("2020-05-01", outcome.message);
    }
}
