use crate::{context::Context, error::FormatError, template::Template, version::Version};
use std::collections::HashSet;

/// Serializes `version` with the best fitting of `formats`.
///
/// Each format is rendered with the version's component values layered over `context`. Among
/// the formats that render and reference every [required component](Version::required_components),
/// the one with the fewest distinct fields wins, the earliest on a tie. If no format references
/// every required component, the first format that renders is used and a warning is logged.
///
/// # Errors
///
/// - [FormatError::NoSerializeFormats] if `formats` is empty.
/// - [FormatError::MissingValue] of the first format if no format renders because of a missing
///   value.
/// - Any other rendering error, as soon as a format raises it.
///
/// # Examples
///
/// ```
/// use bumpspec::{serialize, Config, Clock, Context};
///
/// let config = Config::from_toml_str(r#"
///     current_version = "0.9"
///     parse = '(?P<major>\d+)(\.(?P<minor>\d+))?(\.(?P<patch>\d+))?'
///     serialize = ["{major}.{minor}.{patch}", "{major}.{minor}", "{major}"]
/// "#).unwrap();
/// let spec = config.version_spec(Clock::default()).unwrap();
/// let version = spec.parse_version("0.9", &config.parse_regex().unwrap()).unwrap();
/// let formats = config.serialize_templates().unwrap();
///
/// let minor = version.bump("minor").unwrap();
/// assert_eq!("0.10", serialize(&minor, &Context::new(), &formats).unwrap());
/// ```
pub fn serialize(
    version: &Version<'_>,
    context: &Context,
    formats: &[Template],
) -> Result<String, FormatError> {
    if formats.is_empty() {
        return Err(FormatError::NoSerializeFormats);
    }

    let context = context.layered(version.values());
    let required: HashSet<&str> = version.required_components().into_iter().collect();
    tracing::debug!(%version, ?required, "serializing");

    let mut first_missing = None;
    let mut rendered = Vec::with_capacity(formats.len());
    for template in formats {
        match template.render(&context) {
            Ok(text) => rendered.push((template, text)),
            Err(err @ FormatError::MissingValue { .. }) => {
                tracing::debug!(format = template.as_str(), %err, "format does not render");
                first_missing.get_or_insert(err);
            }
            Err(err) => return Err(err),
        }
    }

    let best = rendered
        .iter()
        .enumerate()
        .filter_map(|(idx, (template, _))| {
            let labels: HashSet<&str> = template.labels().collect();
            required.is_subset(&labels).then_some((labels.len(), idx))
        })
        .min();

    if let Some((_, idx)) = best {
        let (template, text) = rendered.swap_remove(idx);
        tracing::debug!(format = template.as_str(), serialized = text.as_str(), "serialized version");
        return Ok(text);
    }

    match rendered.into_iter().next() {
        Some((template, text)) => {
            tracing::warn!(
                format = template.as_str(),
                serialized = text.as_str(),
                ?required,
                "no format represents every required component, using the first one that renders"
            );
            Ok(text)
        }
        None => Err(first_missing.unwrap_or(FormatError::NoSerializeFormats)),
    }
}
