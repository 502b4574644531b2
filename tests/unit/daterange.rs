//! Date range expansion through the public API

use chrono::NaiveDate;
use gameday_ingest::daterange::{DateRange, DateRangeError};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn explicit_range_crosses_month_boundary() {
    let range = DateRange::parse("20170530", Some("20170602")).unwrap();
    assert_eq!(
        range.dates(),
        &[ymd(2017, 5, 30), ymd(2017, 5, 31), ymd(2017, 6, 1), ymd(2017, 6, 2)]
    );
}

#[test]
fn missing_or_blank_end_is_a_single_day() {
    assert_eq!(DateRange::parse("20170529", None).unwrap().len(), 1);
    assert_eq!(DateRange::parse("20170529", Some("  ")).unwrap().len(), 1);
}

#[test]
fn keyword_ignores_end() {
    let today = ymd(2017, 5, 30);
    let range = DateRange::resolve("yesterday", Some("20990101"), today).unwrap();
    assert_eq!(range.dates(), &[ymd(2017, 5, 29)]);
}

#[test]
fn last_month_from_march_31() {
    let range = DateRange::resolve("lastmonth", None, ymd(2017, 3, 31)).unwrap();
    assert_eq!(range.dates().first(), Some(&ymd(2017, 2, 1)));
    assert_eq!(range.dates().last(), Some(&ymd(2017, 2, 28)));
}

#[test]
fn leap_year_covers_366_days() {
    let range = DateRange::resolve("thisyear", None, ymd(2016, 7, 4)).unwrap();
    assert_eq!(range.len(), 366);
}

#[test]
fn errors() {
    assert!(matches!(DateRange::parse("2017-05-29", None), Err(DateRangeError::Parse(_))));
    assert!(matches!(DateRange::parse("20170230", None), Err(DateRangeError::Parse(_))));
    assert!(matches!(
        DateRange::resolve("someday", None, ymd(2017, 5, 29)),
        Err(DateRangeError::Parse(_))
    ));
    assert!(matches!(
        DateRange::parse("19000101", Some("20170529")),
        Err(DateRangeError::TooLong(_))
    ));
}
