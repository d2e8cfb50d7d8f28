use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use now::DateTimeNow;

/// Returns start of the next day.
pub fn next_day_start<Tz: TimeZone>(date: DateTime<Tz>) -> DateTime<Tz> {
    let next = date + Duration::days(1);
    // Midnight doesn't exist on some DST switches; the day then starts at the first valid moment.
    next.with_time(NaiveTime::MIN)
        .earliest()
        .unwrap_or_else(|| next.beginning_of_day())
}

/// Returns the UTC range `[start, end)` covering the calendar day of `date` in its own timezone.
pub fn day_bounds<Tz: TimeZone>(date: DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.beginning_of_day();
    let end = next_day_start(date);
    (start.with_timezone(&Utc), end.with_timezone(&Utc))
}
