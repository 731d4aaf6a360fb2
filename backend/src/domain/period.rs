//! Calendar windows for revenue reporting.
//!
//! All calendar boundaries (midnight, Monday, first of month) are taken in a
//! fixed UTC offset and converted back to UTC instants.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::{ParkingError, ParkingResult};

/// Number of buckets in every period report
pub const PERIOD_BUCKETS: u32 = 7;

/// Half-open interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevenueWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl RevenueWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> ParkingResult<Self> {
        if start >= end {
            return Err(ParkingError::validation("Window start must be before its end"));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn today(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let date = local_date(now, offset);
        Self::spanning_days(date, 1, offset)
    }

    /// Monday 00:00 to the next Monday
    pub fn this_week(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self::spanning_days(week_start(local_date(now, offset)), 7, offset)
    }

    pub fn this_month(now: DateTime<Utc>, offset: FixedOffset) -> ParkingResult<Self> {
        let first = month_start(local_date(now, offset))?;
        let next = add_months(first, 1)?;
        Ok(Self {
            start: local_midnight(first, offset),
            end: local_midnight(next, offset),
        })
    }

    pub fn preset(preset: WindowPreset, now: DateTime<Utc>, offset: FixedOffset) -> ParkingResult<Self> {
        match preset {
            WindowPreset::Today => Ok(Self::today(now, offset)),
            WindowPreset::ThisWeek => Ok(Self::this_week(now, offset)),
            WindowPreset::ThisMonth => Self::this_month(now, offset),
        }
    }

    fn spanning_days(first: NaiveDate, days: i64, offset: FixedOffset) -> Self {
        let start = local_midnight(first, offset);
        Self {
            start,
            end: start + Duration::days(days),
        }
    }
}

/// Named windows relative to "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPreset {
    Today,
    ThisWeek,
    ThisMonth,
}

impl FromStr for WindowPreset {
    type Err = ParkingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(WindowPreset::Today),
            "this_week" => Ok(WindowPreset::ThisWeek),
            "this_month" => Ok(WindowPreset::ThisMonth),
            other => Err(ParkingError::Validation(format!(
                "Unknown period '{}', expected today, this_week or this_month",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodGranularity {
    Daily,
    Weekly,
    Monthly,
}

impl PeriodGranularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodGranularity::Daily => "daily",
            PeriodGranularity::Weekly => "weekly",
            PeriodGranularity::Monthly => "monthly",
        }
    }
}

impl fmt::Display for PeriodGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodGranularity {
    type Err = ParkingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(PeriodGranularity::Daily),
            "weekly" => Ok(PeriodGranularity::Weekly),
            "monthly" => Ok(PeriodGranularity::Monthly),
            other => Err(ParkingError::Validation(format!(
                "Unknown granularity '{}', expected daily, weekly or monthly",
                other
            ))),
        }
    }
}

/// One calendar bucket of a period report
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBucket {
    pub label: String,
    /// First local calendar day of the bucket
    pub date: NaiveDate,
    pub window: RevenueWindow,
}

/// The last [`PERIOD_BUCKETS`] days, weeks or months up to and including the
/// current one, oldest first
pub fn period_buckets(
    granularity: PeriodGranularity,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> ParkingResult<Vec<PeriodBucket>> {
    let today = local_date(now, offset);
    let back = (PERIOD_BUCKETS - 1) as i64;

    (0..=back)
        .map(|i| -> ParkingResult<PeriodBucket> {
            let (date, next, label) = match granularity {
                PeriodGranularity::Daily => {
                    let date = today - Duration::days(back - i);
                    (date, date + Duration::days(1), date.format("%a").to_string())
                }
                PeriodGranularity::Weekly => {
                    let date = week_start(today) - Duration::weeks(back - i);
                    let label = format!("Week {}", date.iso_week().week());
                    (date, date + Duration::weeks(1), label)
                }
                PeriodGranularity::Monthly => {
                    let current = month_start(today)?;
                    let date = current
                        .checked_sub_months(Months::new((back - i) as u32))
                        .ok_or_else(out_of_range)?;
                    (date, add_months(date, 1)?, date.format("%b").to_string())
                }
            };
            Ok(PeriodBucket {
                label,
                date,
                window: RevenueWindow {
                    start: local_midnight(date, offset),
                    end: local_midnight(next, offset),
                },
            })
        })
        .collect()
}

fn local_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&(local - Duration::seconds(offset.local_minus_utc() as i64)))
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn month_start(date: NaiveDate) -> ParkingResult<NaiveDate> {
    date.with_day(1).ok_or_else(out_of_range)
}

fn add_months(date: NaiveDate, months: u32) -> ParkingResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(out_of_range)
}

fn out_of_range() -> ParkingError {
    ParkingError::validation("Date is outside the supported calendar range")
}
