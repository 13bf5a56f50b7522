// periods.rs
// Calendar boundaries in the business time zone, returned as UTC instants
// for MongoDB range queries.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Tz;

/// Local midnight of the given day, as UTC.
fn local_midnight(tz: Tz, year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    tz.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .earliest()
        .map(|d| d.with_timezone(&Utc))
}

/// `[Jan 1 year, Jan 1 year+1)` in local time.
pub fn year_bounds(tz: Tz, year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    Some((
        local_midnight(tz, year, 1, 1)?,
        local_midnight(tz, year + 1, 1, 1)?,
    ))
}

/// `[first of month, first of next month)` in local time.
pub fn month_bounds(tz: Tz, year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    Some((
        local_midnight(tz, year, month, 1)?,
        local_midnight(tz, next_year, next_month, 1)?,
    ))
}

/// Local `(year, month)` of an instant.
pub fn local_year_month(tz: Tz, at: DateTime<Utc>) -> (i32, u32) {
    let local = at.with_timezone(&tz);
    (local.year(), local.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Guayaquil;

    #[test]
    fn guayaquil_year_starts_at_five_utc() {
        let (start, end) = year_bounds(Guayaquil, 2024).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 5, 0, 0).unwrap());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let (start, end) = month_bounds(Guayaquil, 2024, 12).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 5, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 5, 0, 0).unwrap());
    }

    #[test]
    fn late_utc_evening_belongs_to_local_month() {
        // 2024-04-01 02:00 UTC is still March 31 in Guayaquil.
        let at = Utc.with_ymd_and_hms(2024, 4, 1, 2, 0, 0).unwrap();
        assert_eq!(local_year_month(Guayaquil, at), (2024, 3));
    }
}
