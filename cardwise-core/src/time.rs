//! Time utilities: UTC day bounds and timezone-aware instant parsing.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// 00:00:00 UTC on `date`.
pub fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// 23:59:59.999 UTC on `date`.
pub fn end_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(last))
}

/// Parse a local time like "2026-02-20 23:59" in an IANA tz like "America/Chicago",
/// returning UTC.
pub fn parse_local_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;

    let ndt = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M")
        .map_err(|e| anyhow::anyhow!("invalid local datetime '{local}': {e}"))?;

    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {local} {tz}"))?;

    Ok(local_dt.with_timezone(&Utc))
}

/// Parse a purchase instant.
///
/// Accepts, in order:
/// - RFC 3339 (`2026-04-10T18:30:00Z`), taken as-is
/// - `YYYY-MM-DD HH:MM`, local to `tz`
/// - `YYYY-MM-DD`, noon local to `tz`
pub fn parse_instant(s: &str, tz: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() {
        return parse_local_to_utc(&format!("{s} 12:00"), tz);
    }
    parse_local_to_utc(s, tz)
}

/// Helper: format a UTC time into RFC3339.
pub fn to_rfc3339_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chicago_local() {
        // Feb is CST (UTC-6)
        let utc = parse_local_to_utc("2026-02-20 23:59", "America/Chicago").unwrap();
        assert_eq!(utc.to_rfc3339(), "2026-02-21T05:59:00+00:00");
    }

    #[test]
    fn test_day_bounds() {
        let d = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        assert_eq!(to_rfc3339_utc(start_of_day_utc(d)), "2026-06-30T00:00:00+00:00");
        assert_eq!(
            end_of_day_utc(d).to_rfc3339(),
            "2026-06-30T23:59:59.999+00:00"
        );
    }

    #[test]
    fn test_parse_instant_forms() {
        let a = parse_instant("2026-04-10T18:30:00Z", "America/Chicago").unwrap();
        assert_eq!(a.to_rfc3339(), "2026-04-10T18:30:00+00:00");

        // April is CDT (UTC-5)
        let b = parse_instant("2026-04-10", "America/Chicago").unwrap();
        assert_eq!(b.to_rfc3339(), "2026-04-10T17:00:00+00:00");

        let c = parse_instant("2026-04-10 08:15", "UTC").unwrap();
        assert_eq!(c.to_rfc3339(), "2026-04-10T08:15:00+00:00");

        assert!(parse_instant("next tuesday", "UTC").is_err());
        assert!(parse_instant("2026-04-10", "Mars/Olympus").is_err());
    }
}
