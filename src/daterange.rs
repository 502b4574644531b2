//! Date range parsing
//!
//! Turns a keyword (`yesterday`, `thisweek`, `lastmonth`, ...) or an explicit
//! pair of `YYYYMMDD` bounds into an ordered list of calendar dates. Keyword
//! resolution is relative to a caller-supplied "today" so results are
//! reproducible; [`DateRange::resolve_now`] uses the current UTC date.
//!
//! Weeks start on Sunday. Month and year ranges use real calendar lengths.

use chrono::{Datelike, Days, Months, NaiveDate, Utc};

use crate::config::MAX_RANGE_DAYS;

/// Date range errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DateRangeError {
    /// Malformed date or keyword
    #[error("parse error: {0}")]
    Parse(String),

    /// Range expands to more days than allowed
    #[error("range of {0} days exceeds the maximum allowed")]
    TooLong(i64),
}

/// Explicit date format (`20170529`)
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Ordered, gap-free, duplicate-free sequence of calendar dates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    dates: Vec<NaiveDate>,
}

impl DateRange {
    /// Inclusive range between two dates.
    pub fn between(begin: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if begin > end {
            return Err(DateRangeError::Parse(format!(
                "begin {} is after end {}",
                begin.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            )));
        }

        let span = (end - begin).num_days() + 1;
        if span > MAX_RANGE_DAYS {
            return Err(DateRangeError::TooLong(span));
        }

        let dates = begin.iter_days().take_while(|d| *d <= end).collect();
        Ok(Self { dates })
    }

    /// Parse explicit `YYYYMMDD` bounds; a missing end means a single day.
    pub fn parse(begin: &str, end: Option<&str>) -> Result<Self, DateRangeError> {
        let begin_date = parse_date(begin)?;
        let end_date = match end {
            Some(end) if !end.trim().is_empty() => parse_date(end)?,
            _ => begin_date,
        };
        Self::between(begin_date, end_date)
    }

    /// Expand a keyword relative to `today`.
    pub fn parse_keyword(keyword: &str, today: NaiveDate) -> Result<Self, DateRangeError> {
        let (begin, end) = match keyword.trim().to_ascii_lowercase().as_str() {
            "today" => (today, today),
            "yesterday" => {
                let d = shift_days(today, -1)?;
                (d, d)
            }
            "tomorrow" => {
                let d = shift_days(today, 1)?;
                (d, d)
            }
            "thisweek" => week_of(today)?,
            "lastweek" => week_of(shift_days(today, -7)?)?,
            "nextweek" => week_of(shift_days(today, 7)?)?,
            "thismonth" => month_of(today)?,
            "lastmonth" => month_of(shift_months(today, -1)?)?,
            "nextmonth" => month_of(shift_months(today, 1)?)?,
            "thisyear" => year_of(today.year())?,
            "lastyear" => year_of(today.year() - 1)?,
            "nextyear" => year_of(today.year() + 1)?,
            other => return Err(DateRangeError::Parse(format!("unknown keyword: {:?}", other))),
        };
        Self::between(begin, end)
    }

    /// Resolve either a keyword or explicit bounds relative to `today`.
    ///
    /// A `begin` made only of ASCII letters is treated as a keyword and `end`
    /// is ignored.
    pub fn resolve(begin: &str, end: Option<&str>, today: NaiveDate) -> Result<Self, DateRangeError> {
        let begin = begin.trim();
        if !begin.is_empty() && begin.chars().all(|c| c.is_ascii_alphabetic()) {
            Self::parse_keyword(begin, today)
        } else {
            Self::parse(begin, end)
        }
    }

    /// [`DateRange::resolve`] against the current UTC date.
    pub fn resolve_now(begin: &str, end: Option<&str>) -> Result<Self, DateRangeError> {
        Self::resolve(begin, end, Utc::now().date_naive())
    }

    /// Dates in increasing order
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Iterate dates in increasing order
    pub fn iter(&self) -> std::slice::Iter<'_, NaiveDate> {
        self.dates.iter()
    }

    /// Number of dates
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the range is empty (never true for a parsed range)
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl IntoIterator for DateRange {
    type Item = NaiveDate;
    type IntoIter = std::vec::IntoIter<NaiveDate>;

    fn into_iter(self) -> Self::IntoIter {
        self.dates.into_iter()
    }
}

/// Parse a single `YYYYMMDD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateRangeError> {
    let input = input.trim();
    if input.len() != 8 || !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(DateRangeError::Parse(format!("expected YYYYMMDD, got {:?}", input)));
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|e| DateRangeError::Parse(format!("invalid date {:?}: {}", input, e)))
}

fn shift_days(date: NaiveDate, days: i64) -> Result<NaiveDate, DateRangeError> {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    shifted.ok_or_else(|| DateRangeError::Parse(format!("date out of range: {} {:+} days", date, days)))
}

fn shift_months(date: NaiveDate, months: i32) -> Result<NaiveDate, DateRangeError> {
    // anchor on the 1st so e.g. March 31 minus one month is still in February
    let first = date.with_day(1).unwrap_or(date);
    let shifted = if months >= 0 {
        first.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        first.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.ok_or_else(|| DateRangeError::Parse(format!("date out of range: {} {:+} months", date, months)))
}

fn week_of(date: NaiveDate) -> Result<(NaiveDate, NaiveDate), DateRangeError> {
    let offset = i64::from(date.weekday().num_days_from_sunday());
    let sunday = shift_days(date, -offset)?;
    Ok((sunday, shift_days(sunday, 6)?))
}

fn month_of(date: NaiveDate) -> Result<(NaiveDate, NaiveDate), DateRangeError> {
    let first = date
        .with_day(1)
        .ok_or_else(|| DateRangeError::Parse(format!("no first day for {}", date)))?;
    let last = shift_months(first, 1)?
        .pred_opt()
        .ok_or_else(|| DateRangeError::Parse(format!("no last day for {}", date)))?;
    Ok((first, last))
}

fn year_of(year: i32) -> Result<(NaiveDate, NaiveDate), DateRangeError> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1);
    let last = NaiveDate::from_ymd_opt(year, 12, 31);
    first
        .zip(last)
        .ok_or_else(|| DateRangeError::Parse(format!("year out of range: {}", year)))
}
