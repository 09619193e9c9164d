use crate::{
    error::{FormatError, SpecError},
    template::{Template, TemplateToken},
};
use chrono::{Datelike, NaiveDate};
use core::fmt::{self, Display};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn two_digit_pad(num: u32) -> String {
    format!("{num:02}")
}

fn short_year(year: i32) -> u32 {
    year.rem_euclid(100) as u32
}

fn weeks_from_sunday(date: &impl Datelike) -> u32 {
    let days_from_sunday = date.weekday().num_days_from_sunday();
    (6 + date.ordinal() - days_from_sunday) / 7
}

fn weeks_from_monday(date: &impl Datelike) -> u32 {
    let days_from_monday = date.weekday().num_days_from_monday();
    (6 + date.ordinal() - days_from_monday) / 7
}

fn quarter(date: &impl Datelike) -> u32 {
    date.month0() / 3 + 1
}

/// A placeholder that may appear in a calendar format, like `{YYYY}` or `{0W}`.
#[derive(Debug)]
pub(crate) struct CalendarSpecifier {
    /// The name of the placeholder, without braces.
    pub(crate) name: &'static str,

    /// A regex pattern that matches exactly the values this specifier can produce.
    pub(crate) version_pattern: &'static str,

    /// Renders the date as this specifier's value.
    pub(crate) format_fn: fn(&NaiveDate) -> String,
}

impl CalendarSpecifier {
    pub(crate) fn format(&self, date: &NaiveDate) -> String {
        (self.format_fn)(date)
    }

    fn from_name(name: &str) -> Option<&'static CalendarSpecifier> {
        ALL.iter().copied().find(|spec| spec.name == name)
    }
}

/// Full year - 2006, 2016, 2106
static FULL_YEAR: CalendarSpecifier = CalendarSpecifier {
    name: "YYYY",
    version_pattern: "[0-9]{4}",
    format_fn: |date| format!("{:04}", date.year()),
};

/// Short year - 0, 6, 16
static SHORT_YEAR: CalendarSpecifier = CalendarSpecifier {
    name: "YY",
    version_pattern: "[1-9]?[0-9]",
    format_fn: |date| short_year(date.year()).to_string(),
};

/// Zero-padded year - 00, 06, 16
static ZERO_PADDED_YEAR: CalendarSpecifier = CalendarSpecifier {
    name: "0Y",
    version_pattern: "[0-9]{2}",
    format_fn: |date| two_digit_pad(short_year(date.year())),
};

/// Abbreviated month name - Jan, Feb ... Dec
static MONTH_NAME: CalendarSpecifier = CalendarSpecifier {
    name: "MMM",
    version_pattern: "Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec",
    format_fn: |date| MONTH_ABBREVIATIONS[date.month0() as usize].to_string(),
};

/// Short month - 1, 2 ... 11, 12
static SHORT_MONTH: CalendarSpecifier = CalendarSpecifier {
    name: "MM",
    version_pattern: "1[0-2]|[1-9]",
    format_fn: |date| date.month().to_string(),
};

/// Zero-padded month - 01, 02 ... 11, 12
static ZERO_PADDED_MONTH: CalendarSpecifier = CalendarSpecifier {
    name: "0M",
    version_pattern: "1[0-2]|0[1-9]",
    format_fn: |date| two_digit_pad(date.month()),
};

/// Short day - 1, 2 ... 30, 31
static SHORT_DAY: CalendarSpecifier = CalendarSpecifier {
    name: "DD",
    version_pattern: "3[01]|[12][0-9]|[1-9]",
    format_fn: |date| date.day().to_string(),
};

/// Zero-padded day - 01, 02 ... 30, 31
static ZERO_PADDED_DAY: CalendarSpecifier = CalendarSpecifier {
    name: "0D",
    version_pattern: "3[01]|[12][0-9]|0[1-9]",
    format_fn: |date| two_digit_pad(date.day()),
};

/// Short day of year - 1, 2 ... 365, 366
static SHORT_DAY_OF_YEAR: CalendarSpecifier = CalendarSpecifier {
    name: "JJJ",
    version_pattern: "36[0-6]|3[0-5][0-9]|[12][0-9]{2}|[1-9][0-9]|[1-9]",
    format_fn: |date| date.ordinal().to_string(),
};

/// Zero-padded day of year - 001, 002 ... 365, 366
static ZERO_PADDED_DAY_OF_YEAR: CalendarSpecifier = CalendarSpecifier {
    name: "00J",
    version_pattern: "36[0-6]|3[0-5][0-9]|[12][0-9]{2}|0[1-9][0-9]|00[1-9]",
    format_fn: |date| format!("{:03}", date.ordinal()),
};

/// Quarter - 1, 2, 3, 4
static QUARTER: CalendarSpecifier = CalendarSpecifier {
    name: "Q",
    version_pattern: "[1-4]",
    format_fn: |date| quarter(date).to_string(),
};

/// Short week, weeks starting on Monday - 0, 1 ... 53
static SHORT_WEEK: CalendarSpecifier = CalendarSpecifier {
    name: "WW",
    version_pattern: "5[0-3]|[1-4][0-9]|[0-9]",
    format_fn: |date| weeks_from_monday(date).to_string(),
};

/// Zero-padded week, weeks starting on Monday - 00, 01 ... 53
static ZERO_PADDED_WEEK: CalendarSpecifier = CalendarSpecifier {
    name: "0W",
    version_pattern: "5[0-3]|[0-4][0-9]",
    format_fn: |date| two_digit_pad(weeks_from_monday(date)),
};

/// Short week, weeks starting on Sunday - 0, 1 ... 53
static SHORT_SUNDAY_WEEK: CalendarSpecifier = CalendarSpecifier {
    name: "UU",
    version_pattern: "5[0-3]|[1-4][0-9]|[0-9]",
    format_fn: |date| weeks_from_sunday(date).to_string(),
};

/// Zero-padded week, weeks starting on Sunday - 00, 01 ... 53
static ZERO_PADDED_SUNDAY_WEEK: CalendarSpecifier = CalendarSpecifier {
    name: "0U",
    version_pattern: "5[0-3]|[0-4][0-9]",
    format_fn: |date| two_digit_pad(weeks_from_sunday(date)),
};

/// Short ISO week - 1, 2 ... 53
static SHORT_ISO_WEEK: CalendarSpecifier = CalendarSpecifier {
    name: "VV",
    version_pattern: "5[0-3]|[1-4][0-9]|[1-9]",
    format_fn: |date| date.iso_week().week().to_string(),
};

/// Zero-padded ISO week - 01, 02 ... 53
static ZERO_PADDED_ISO_WEEK: CalendarSpecifier = CalendarSpecifier {
    name: "0V",
    version_pattern: "5[0-3]|[1-4][0-9]|0[1-9]",
    format_fn: |date| two_digit_pad(date.iso_week().week()),
};

/// Full ISO week-numbering year - 2019, 2020
static FULL_ISO_YEAR: CalendarSpecifier = CalendarSpecifier {
    name: "GGGG",
    version_pattern: "[0-9]{4}",
    format_fn: |date| format!("{:04}", date.iso_week().year()),
};

/// Short ISO week-numbering year - 0, 19, 20
static SHORT_ISO_YEAR: CalendarSpecifier = CalendarSpecifier {
    name: "GG",
    version_pattern: "[1-9]?[0-9]",
    format_fn: |date| short_year(date.iso_week().year()).to_string(),
};

/// Zero-padded ISO week-numbering year - 00, 19, 20
static ZERO_PADDED_ISO_YEAR: CalendarSpecifier = CalendarSpecifier {
    name: "0G",
    version_pattern: "[0-9]{2}",
    format_fn: |date| two_digit_pad(short_year(date.iso_week().year())),
};

pub(crate) static ALL: &[&CalendarSpecifier] = &[
    &FULL_YEAR,
    &SHORT_YEAR,
    &ZERO_PADDED_YEAR,
    &MONTH_NAME,
    &SHORT_MONTH,
    &ZERO_PADDED_MONTH,
    &SHORT_DAY,
    &ZERO_PADDED_DAY,
    &SHORT_DAY_OF_YEAR,
    &ZERO_PADDED_DAY_OF_YEAR,
    &QUARTER,
    &SHORT_WEEK,
    &ZERO_PADDED_WEEK,
    &SHORT_SUNDAY_WEEK,
    &ZERO_PADDED_SUNDAY_WEEK,
    &SHORT_ISO_WEEK,
    &ZERO_PADDED_ISO_WEEK,
    &FULL_ISO_YEAR,
    &SHORT_ISO_YEAR,
    &ZERO_PADDED_ISO_YEAR,
];

#[derive(Debug, Clone)]
enum CalendarToken {
    Literal(String),
    Specifier(&'static CalendarSpecifier),
}

impl PartialEq for CalendarToken {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CalendarToken::Literal(a), CalendarToken::Literal(b)) => a == b,
            (CalendarToken::Specifier(a), CalendarToken::Specifier(b)) => core::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

impl Eq for CalendarToken {}

/// A calendar format such as `{YYYY}.{MM}.{DD}`, made of literal text and calendar placeholders.
///
/// ```
/// use bumpspec::CalendarFormat;
/// use chrono::NaiveDate;
///
/// let format = CalendarFormat::parse("{YYYY}.{MM}.{DD}").unwrap();
/// let date = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
/// assert_eq!("2020.5.1", format.render(&date));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarFormat {
    source: String,
    tokens: Vec<CalendarToken>,
}

impl CalendarFormat {
    /// Parses a calendar format.
    ///
    /// # Errors
    ///
    /// - [SpecError::InvalidCalendarFormat] if the format is not a valid template, or a
    ///   placeholder carries a format spec.
    /// - [SpecError::UnknownCalendarSpecifier] if a placeholder is not a calendar specifier.
    pub fn parse(format: &str) -> Result<Self, SpecError> {
        let template = Template::parse(format).map_err(|source| SpecError::InvalidCalendarFormat {
            format: format.to_owned(),
            source,
        })?;

        let tokens: Vec<CalendarToken> = template
            .tokens()
            .iter()
            .map(|token| match token {
                TemplateToken::Literal(text) => Ok(CalendarToken::Literal(text.clone())),
                TemplateToken::Field {
                    name,
                    spec: Some(spec),
                } => Err(SpecError::InvalidCalendarFormat {
                    format: format.to_owned(),
                    source: FormatError::InvalidFormatSpec {
                        key: name.clone(),
                        spec: spec.clone(),
                    },
                }),
                TemplateToken::Field { name, spec: None } => CalendarSpecifier::from_name(name)
                    .map(CalendarToken::Specifier)
                    .ok_or_else(|| SpecError::UnknownCalendarSpecifier {
                        specifier: name.clone(),
                        format: format.to_owned(),
                    }),
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            source: format.to_owned(),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn render(&self, date: &NaiveDate) -> String {
        self.tokens
            .iter()
            .map(|token| match token {
                CalendarToken::Literal(text) => text.clone(),
                CalendarToken::Specifier(spec) => spec.format(date),
            })
            .collect()
    }

    /// Returns a regex pattern (unanchored, without capture groups) matching the values this
    /// format renders to.
    pub fn regex(&self) -> String {
        self.tokens
            .iter()
            .map(|token| match token {
                CalendarToken::Literal(text) => regex::escape(text),
                CalendarToken::Specifier(spec) => format!("(?:{})", spec.version_pattern),
            })
            .collect()
    }
}

impl Display for CalendarFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
