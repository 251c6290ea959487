//! Temporal filtering of canonical records.

use crate::models::{CanonicalRecord, Period, PeriodQuery};
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Utc};

const WEEK_DAYS: i64 = 7;
const MONTH_DAYS: i64 = 30;

/// Keep records whose start date falls inside the requested window.
///
/// Rolling windows end at the current UTC instant.
#[allow(dead_code)] // Reports pin "now" through filter_period_at
pub fn filter_period(records: &[CanonicalRecord], query: &PeriodQuery) -> Vec<CanonicalRecord> {
    filter_period_at(records, query, Utc::now().naive_utc())
}

/// Same as [`filter_period`], with an explicit "now" for rolling windows.
pub fn filter_period_at(
    records: &[CanonicalRecord],
    query: &PeriodQuery,
    now: NaiveDateTime,
) -> Vec<CanonicalRecord> {
    records
        .iter()
        .filter(|r| match r.start_dt {
            Some(dt) => in_window(dt, query, now),
            None => false,
        })
        .cloned()
        .collect()
}

fn in_window(dt: chrono::NaiveDate, query: &PeriodQuery, now: NaiveDateTime) -> bool {
    match query.period {
        Period::Weekly => match query.explicit_week() {
            Some((start, end)) => start <= dt && dt <= end,
            None => dt.and_time(NaiveTime::MIN) >= now - Duration::days(WEEK_DAYS),
        },
        Period::Monthly => match query.explicit_month() {
            Some((month, year)) => dt.year() == year && dt.month() == month,
            None => dt.and_time(NaiveTime::MIN) >= now - Duration::days(MONTH_DAYS),
        },
    }
}
