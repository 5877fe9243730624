use std::path::Path;
use std::str::FromStr;

use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta,
    TimeZone, Utc,
};
use chrono_tz::Tz;

/// A UTC time of day projected into a recipient's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    /// Local calendar date the projection landed on.
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub offset: FixedOffset,
}

/// Best guess at the user's timezone from the environment.
///
/// Checks `TZ`, then `/etc/timezone`, then the `/etc/localtime` symlink, and
/// falls back to UTC.
pub fn guess_timezone() -> Tz {
    let from_env = std::env::var("TZ").ok().and_then(|v| parse_timezone(&v));
    if let Some(tz) = from_env {
        return tz;
    }

    let from_file = std::fs::read_to_string("/etc/timezone")
        .ok()
        .and_then(|v| parse_timezone(&v));
    if let Some(tz) = from_file {
        return tz;
    }

    std::fs::read_link("/etc/localtime")
        .ok()
        .and_then(|target| zone_from_path(&target))
        .unwrap_or_else(|| {
            log::debug!("Could not determine system timezone, defaulting to UTC");
            Tz::UTC
        })
}

/// Parse an IANA name. Accepts the POSIX `:Area/City` form used in `TZ`.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    let name = name.trim().trim_start_matches(':');
    if name.is_empty() {
        return None;
    }
    Tz::from_str(name).ok()
}

/// Extract the zone from a zoneinfo path such as
/// `/usr/share/zoneinfo/Europe/Berlin`.
pub fn zone_from_path(path: &Path) -> Option<Tz> {
    let s = path.to_str()?;
    let idx = s.find("zoneinfo/")?;
    parse_timezone(&s[idx + "zoneinfo/".len()..])
}

/// Every timezone name the picker offers, in database order.
pub fn supported_timezones() -> Vec<&'static str> {
    chrono_tz::TZ_VARIANTS.iter().map(|tz| tz.name()).collect()
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .ok()
}

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Project a stored UTC time of day onto `date` (a UTC date) in `tz`.
pub fn convert_to_local(utc: NaiveTime, tz: Tz, date: NaiveDate) -> LocalTime {
    let instant: DateTime<Utc> = Utc.from_utc_datetime(&date.and_time(utc));
    let local = instant.with_timezone(&tz);
    LocalTime {
        date: local.date_naive(),
        time: local.time(),
        offset: local.offset().fix(),
    }
}

/// Convert a recipient-local time of day on `date` (a local date) to UTC.
///
/// Only the time of day is stored, so the offset used is whatever `tz` has on
/// `date`. A conversion made in winter and a dispatch made in summer can
/// differ by the DST shift.
///
/// A repeated wall time (DST fall-back) resolves to the earlier instant. A
/// wall time inside a DST gap is read with the offset in effect before it.
pub fn convert_to_utc(local: NaiveTime, tz: Tz, date: NaiveDate) -> NaiveTime {
    let naive = date.and_time(local);
    let offset = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.offset().fix(),
        LocalResult::Ambiguous(earliest, _) => earliest.offset().fix(),
        LocalResult::None => offset_before_gap(tz, naive),
    };
    (naive - TimeDelta::seconds(i64::from(offset.local_minus_utc()))).time()
}

fn offset_before_gap(tz: Tz, naive: NaiveDateTime) -> FixedOffset {
    tz.offset_from_utc_datetime(&(naive - TimeDelta::days(1))).fix()
}

/// Offset in effect in `tz` at `at`.
pub fn utc_offset(tz: Tz, at: DateTime<Utc>) -> FixedOffset {
    tz.offset_from_utc_datetime(&at.naive_utc()).fix()
}

/// `UTC-05:00` style label for the timezone picker.
pub fn format_offset(offset: FixedOffset) -> String {
    format!("UTC{}", offset)
}

/// 12-hour display form, e.g. `08:00 AM`.
pub fn format_clock(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}

/// Coarse "how long ago" bucket for timestamps shown in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Age {
    JustNow,
    Minutes(i64),
    Hours(i64),
    Days(i64),
}

pub fn age_since(then: DateTime<Utc>, now: DateTime<Utc>) -> Age {
    let elapsed = now - then;
    if elapsed < TimeDelta::minutes(1) {
        Age::JustNow
    } else if elapsed < TimeDelta::hours(1) {
        Age::Minutes(elapsed.num_minutes())
    } else if elapsed < TimeDelta::days(1) {
        Age::Hours(elapsed.num_hours())
    } else {
        Age::Days(elapsed.num_days())
    }
}
