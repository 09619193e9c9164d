use crate::{context::Context, error::FormatError};
use core::{
    fmt::{self, Display},
    str::FromStr,
};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TemplateToken {
    /// Unescaped literal text, rendered verbatim.
    Literal(String),

    /// A replacement field. `spec` is everything after the first `:`, and is interpreted by the
    /// value that gets substituted (strftime for dates, fill/align/width for text).
    Field { name: String, spec: Option<String> },
}

/// A template describes a string made of *literal text* and named *replacement fields*, using
/// brace syntax: `{name}` or `{name:spec}`, with `{{` and `}}` for literal braces.
///
/// Templates are used for serialization formats (`{major}.{minor}.{patch}`), calendar formats
/// (`{YYYY}.{MM}`), tag names and commit messages.
///
/// # Examples
///
/// ```
/// use bumpspec::{Context, Template};
///
/// let template = Template::parse("v{major}.{minor} {{stable}}").unwrap();
/// assert_eq!(vec!["major", "minor"], template.labels().collect::<Vec<_>>());
///
/// let mut context = Context::new();
/// context.insert("major", "1");
/// context.insert("minor", "2");
/// assert_eq!("v1.2 {stable}", template.render(&context).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    tokens: Vec<TemplateToken>,
}

impl Template {
    /// Parses a template string.
    ///
    /// # Errors
    ///
    /// - [FormatError::UnterminatedField] if a `{` is never closed.
    /// - [FormatError::UnmatchedClosingBrace] if a lone `}` appears outside a field.
    /// - [FormatError::EmptyFieldName] for positional fields like `{}` or `{:>3}`.
    /// - [FormatError::UnsupportedConversion] for conversions other than `!s`.
    pub fn parse(template: &str) -> Result<Self, FormatError> {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    if chars.next_if_eq(&'{').is_some() {
                        literal.push('{');
                        continue;
                    }

                    let mut field = String::new();
                    let mut terminated = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            terminated = true;
                            break;
                        }
                        field.push(c);
                    }
                    if !terminated {
                        return Err(FormatError::UnterminatedField {
                            template: template.to_owned(),
                        });
                    }

                    if !literal.is_empty() {
                        tokens.push(TemplateToken::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(Self::parse_field(&field, template)?);
                }
                '}' => {
                    if chars.next_if_eq(&'}').is_none() {
                        return Err(FormatError::UnmatchedClosingBrace {
                            template: template.to_owned(),
                        });
                    }
                    literal.push('}');
                }
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            tokens.push(TemplateToken::Literal(literal));
        }

        Ok(Self {
            source: template.to_owned(),
            tokens,
        })
    }

    fn parse_field(field: &str, template: &str) -> Result<TemplateToken, FormatError> {
        let (head, spec) = match field.split_once(':') {
            Some((head, spec)) => (head, Some(spec)),
            None => (field, None),
        };
        let name = match head.split_once('!') {
            Some((name, "s")) => name,
            Some((_, conversion)) => {
                return Err(FormatError::UnsupportedConversion {
                    conversion: conversion.to_owned(),
                    template: template.to_owned(),
                })
            }
            None => head,
        };

        if name.trim().is_empty() {
            return Err(FormatError::EmptyFieldName {
                template: template.to_owned(),
            });
        }

        Ok(TemplateToken::Field {
            name: name.trim().to_owned(),
            spec: spec.filter(|spec| !spec.is_empty()).map(str::to_owned),
        })
    }

    /// The template string this was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the names of the fields referenced by this template, without duplicates, in the
    /// order they first appear.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        let mut seen = HashSet::new();
        self.tokens.iter().filter_map(move |token| match token {
            TemplateToken::Field { name, .. } if seen.insert(name.as_str()) => Some(name.as_str()),
            _ => None,
        })
    }

    pub(crate) fn tokens(&self) -> &[TemplateToken] {
        &self.tokens
    }

    /// Renders this template, substituting every field with its value from `context`.
    ///
    /// # Errors
    ///
    /// - [FormatError::MissingValue] if a field is not present in `context`.
    /// - [FormatError::InvalidFormatSpec] if a field's spec cannot be applied to its value.
    pub fn render(&self, context: &Context) -> Result<String, FormatError> {
        let mut rendered = String::with_capacity(self.source.len());

        for token in &self.tokens {
            match token {
                TemplateToken::Literal(text) => rendered.push_str(text),
                TemplateToken::Field { name, spec } => {
                    let value = context.get(name).ok_or_else(|| FormatError::MissingValue {
                        key: name.clone(),
                        template: self.source.clone(),
                    })?;
                    value.write_formatted(&mut rendered, name, spec.as_deref())?;
                }
            }
        }

        Ok(rendered)
    }
}

impl FromStr for Template {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Template {
    /// Display a template as its template string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

/// A format spec for text values:
/// `[[fill]align][0][width][.precision][s]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextSpec {
    fill: char,
    align: Align,
    width: usize,
    precision: Option<usize>,
}

impl TextSpec {
    pub(crate) fn parse(spec: &str) -> Option<Self> {
        fn align_of(c: char) -> Option<Align> {
            match c {
                '<' => Some(Align::Left),
                '>' => Some(Align::Right),
                '^' => Some(Align::Center),
                _ => None,
            }
        }

        let chars: Vec<char> = spec.chars().collect();
        let mut idx = 0;
        let mut fill = ' ';
        let mut align = Align::Left;

        if let Some(a) = chars.get(1).copied().and_then(align_of) {
            fill = chars[0];
            align = a;
            idx = 2;
        } else if let Some(a) = chars.first().copied().and_then(align_of) {
            align = a;
            idx = 1;
        } else if chars.first() == Some(&'0') {
            fill = '0';
            idx = 1;
        }

        // `None` if the number does not fit, `Some(None)` if there are no digits at all
        fn number(chars: &[char], idx: &mut usize) -> Option<Option<usize>> {
            let start = *idx;
            while chars.get(*idx).is_some_and(char::is_ascii_digit) {
                *idx += 1;
            }
            if start == *idx {
                return Some(None);
            }
            chars[start..*idx]
                .iter()
                .collect::<String>()
                .parse()
                .ok()
                .map(Some)
        }

        let width = number(&chars, &mut idx)?.unwrap_or(0);
        let precision = if chars.get(idx) == Some(&'.') {
            idx += 1;
            Some(number(&chars, &mut idx)??)
        } else {
            None
        };
        if chars.get(idx) == Some(&'s') {
            idx += 1;
        }

        (idx == chars.len()).then_some(Self {
            fill,
            align,
            width,
            precision,
        })
    }

    pub(crate) fn apply(&self, text: &str, out: &mut String) {
        let truncated: String = match self.precision {
            Some(precision) => text.chars().take(precision).collect(),
            None => text.to_owned(),
        };
        let padding = self.width.saturating_sub(truncated.chars().count());
        let (left, right) = match self.align {
            Align::Left => (0, padding),
            Align::Right => (padding, 0),
            Align::Center => (padding / 2, padding - padding / 2),
        };
        out.extend(std::iter::repeat(self.fill).take(left));
        out.push_str(&truncated);
        out.extend(std::iter::repeat(self.fill).take(right));
    }
}
