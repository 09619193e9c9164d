use crate::error::VersionError;
use indexmap::IndexMap;
use regex::Regex;

/// Component values captured from a version string, keyed by component name, in the order the
/// parse pattern declares its groups.
pub type RawVersion = IndexMap<String, String>;

/// Parses `MAJOR.MINOR.PATCH`.
pub const DEFAULT_PARSE_PATTERN: &str = r"(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)";

/// Compiles a parse pattern. Named groups become component names.
///
/// # Errors
///
/// [VersionError::InvalidParsePattern] if the pattern is not a valid regex.
pub fn compile_parse_pattern(pattern: &str) -> Result<Regex, VersionError> {
    Regex::new(pattern).map_err(|err| VersionError::InvalidParsePattern {
        pattern: pattern.to_owned(),
        message: err.to_string(),
    })
}

/// The component names a parse pattern captures, in declaration order.
pub fn pattern_labels(regex: &Regex) -> impl Iterator<Item = &str> {
    regex.capture_names().flatten()
}

/// Searches `version` for `regex` and returns its named groups. Groups that did not participate
/// in the match, or matched an empty string, are left out.
///
/// Returns [None] if `version` is empty or the pattern is not found.
///
/// ```
/// use bumpspec::{compile_parse_pattern, parse_raw_version};
///
/// let regex = compile_parse_pattern(r"(?P<major>\d+)(\.(?P<minor>\d+))?").unwrap();
/// let raw = parse_raw_version("v0.9", &regex).unwrap();
/// assert_eq!(Some("9"), raw.get("minor").map(String::as_str));
///
/// let raw = parse_raw_version("v3", &regex).unwrap();
/// assert_eq!(None, raw.get("minor"));
/// ```
pub fn parse_raw_version(version: &str, regex: &Regex) -> Option<RawVersion> {
    capture_raw_version(version, regex).map(|(_, raw)| raw)
}

/// Like [parse_raw_version], also returning the text the whole pattern matched.
pub(crate) fn capture_raw_version<'t>(
    version: &'t str,
    regex: &Regex,
) -> Option<(&'t str, RawVersion)> {
    if version.is_empty() {
        tracing::warn!("version string is empty");
        return None;
    }

    tracing::debug!(version, pattern = regex.as_str(), "parsing version");

    let Some(caps) = regex.captures(version) else {
        tracing::debug!(
            version,
            pattern = regex.as_str(),
            "pattern does not match version"
        );
        return None;
    };

    let raw: RawVersion = pattern_labels(regex)
        .filter_map(|name| {
            caps.name(name)
                .filter(|value| !value.is_empty())
                .map(|value| (name.to_owned(), value.as_str().to_owned()))
        })
        .collect();

    tracing::debug!(?raw, "parsed version");

    // group 0 always participates in a match
    let matched = caps.get(0).map_or(version, |m| m.as_str());
    Some((matched, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawVersion {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_default_pattern() {
        let regex = compile_parse_pattern(DEFAULT_PARSE_PATTERN).unwrap();
        let args = [
            (
                "1.2.3",
                Some(raw(&[("major", "1"), ("minor", "2"), ("patch", "3")])),
            ),
            (
                "version 10.20.30-rc",
                Some(raw(&[("major", "10"), ("minor", "20"), ("patch", "30")])),
            ),
            ("1.2", None),
            ("", None),
        ];

        for (version, expected) in args {
            assert_eq!(expected, parse_raw_version(version, &regex), "{version}");
        }
    }

    #[test]
    fn test_optional_groups_are_skipped() {
        let regex = compile_parse_pattern(
            r"(?P<major>\d+)\.(?P<minor>\d+)(?P<prerel>[a-z]*)(?P<prerelversion>\d*)",
        )
        .unwrap();
        assert_eq!(
            Some(raw(&[("major", "1"), ("minor", "0")])),
            parse_raw_version("1.0", &regex)
        );
        assert_eq!(
            Some(raw(&[
                ("major", "1"),
                ("minor", "0"),
                ("prerel", "b"),
                ("prerelversion", "1")
            ])),
            parse_raw_version("1.0b1", &regex)
        );
    }

    #[test]
    fn test_capture_keeps_matched_text() {
        let regex = compile_parse_pattern(DEFAULT_PARSE_PATTERN).unwrap();
        let (matched, _) = capture_raw_version("release-4.5.6+meta", &regex).unwrap();
        assert_eq!("4.5.6", matched);
    }

    #[test]
    fn test_invalid_pattern() {
        let err = compile_parse_pattern(r"(?P<major>\d+").unwrap_err();
        assert!(matches!(
            err,
            VersionError::InvalidParsePattern { ref pattern, .. } if pattern == r"(?P<major>\d+"
        ));
    }

    #[test]
    fn test_pattern_labels() {
        let regex = compile_parse_pattern(r"(?P<major>\d+)(\.(?P<minor>\d+))?").unwrap();
        assert_eq!(vec!["major", "minor"], pattern_labels(&regex).collect::<Vec<_>>());
    }
}
