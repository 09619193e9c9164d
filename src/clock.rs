use crate::error::DateError;
use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use core::{
    fmt::{self, Display},
    str::FromStr,
};

/// The source of "now" for calendar components and date context values.
///
/// Calendar versioning is the only part of a bump that is not a pure function of its input, so
/// callers that need reproducible output (tests, release pipelines replaying a build) pin the
/// clock with [Clock::Fixed].
///
/// ```
/// use bumpspec::Clock;
///
/// let utc = Clock::Utc;
/// let local = Clock::Local;
/// let fixed = Clock::fixed(2020, 5, 1).unwrap();
/// assert_eq!("2020-05-01", fixed.today().to_string());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// The system clock, in UTC.
    #[default]
    Utc,
    /// The system clock, in the system's local timezone.
    Local,
    /// A frozen point in time, interpreted as UTC.
    Fixed(NaiveDateTime),
}

impl Clock {
    /// Returns a [Clock::Fixed] at midnight of the given date.
    ///
    /// # Errors
    ///
    /// - [DateError::InvalidDateArguments] if the arguments are not a date.
    /// - [DateError::YearOutOfRange] if the year is outside 1 to 9999.
    pub fn fixed(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(DateError::InvalidDateArguments { year, month, day })
            .and_then(|date| Self::checked(date.and_time(NaiveTime::MIN)))
    }

    // calendar placeholders, ISO week years included, render and match four digit years
    fn checked(naive: NaiveDateTime) -> Result<Self, DateError> {
        match naive.year() {
            1..=9999 => Ok(Self::Fixed(naive)),
            year => Err(DateError::YearOutOfRange { year }),
        }
    }

    /// The current instant, carrying the offset of this clock.
    pub fn now(&self) -> DateTime<FixedOffset> {
        match self {
            Clock::Utc => Utc::now().fixed_offset(),
            Clock::Local => Local::now().fixed_offset(),
            Clock::Fixed(naive) => naive.and_utc().fixed_offset(),
        }
    }

    /// The current instant in UTC.
    pub fn utc_now(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }

    /// The current calendar date, as seen from this clock's timezone.
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

impl FromStr for Clock {
    type Err = DateError;

    /// Parses a fixed clock from either a `YYYY-MM-DD` date (midnight UTC) or an RFC 3339
    /// timestamp.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(date) = NaiveDate::from_str(s) {
            return Self::checked(date.and_time(NaiveTime::MIN));
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|source| DateError::UnparseableDate {
            date: s.to_owned(),
            source,
        })?;
        Self::checked(dt.naive_utc())
    }
}

impl Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clock::Utc => f.write_str("utc"),
            Clock::Local => f.write_str("local"),
            Clock::Fixed(naive) => write!(f, "{}", naive.and_utc().to_rfc3339()),
        }
    }
}
