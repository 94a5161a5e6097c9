//! Tolerant field decoding for catalog records.
//!
//! Catalog data is hand-maintained JSON. A bad field degrades to its
//! documented default instead of rejecting the whole record:
//!
//! - numbers: JSON number or numeric string; anything else (or non-finite) is `None`
//! - cents: same as numbers, rounded to whole cents
//! - dates: `YYYY-MM-DD` or RFC 3339; anything else is `None` (unbounded)
//! - flags: `true`/`false`, `"true"`/`"false"`, or a number (non-zero = true)
//! - lists: an array keeps its well-formed entries; a bare string is a one-item list
//! - rate maps: object entries whose value is not a number are dropped

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::time::start_of_day_utc;

/// Read a finite number out of a JSON value.
pub fn number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|x| x.is_finite())
}

/// First finite candidate in declared order.
pub fn first_finite<const N: usize>(candidates: [Option<f64>; N]) -> Option<f64> {
    candidates.into_iter().flatten().find(|x| x.is_finite())
}

/// First present candidate in declared order.
pub fn first_present<T, const N: usize>(candidates: [Option<T>; N]) -> Option<T> {
    candidates.into_iter().flatten().next()
}

fn date(v: &Value) -> Option<NaiveDate> {
    let s = v.as_str()?.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

fn instant(v: &Value) -> Option<DateTime<Utc>> {
    let s = v.as_str()?.trim();
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(start_of_day_utc)
        })
}

pub fn opt_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(number))
}

pub fn opt_cents<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(number).map(|x| x.round() as i64))
}

pub fn opt_date<'de, D>(d: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(date))
}

/// Instants accept RFC 3339, or a bare date meaning 00:00 UTC that day.
pub fn opt_instant<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.as_ref().and_then(instant))
}

pub fn flag<'de, D>(d: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(n @ Value::Number(_)) => number(&n).is_some_and(|x| x != 0.0),
        _ => false,
    })
}

pub fn string_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|i| i.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    })
}

pub fn rates<'de, D>(d: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    let Some(Value::Object(map)) = v else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .iter()
        .filter_map(|(k, v)| number(v).map(|rate| (k.clone(), rate)))
        .collect())
}

/// Decode an array of records, dropping entries that do not parse.
pub fn records<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Option::<Value>::deserialize(d)?;
    let Some(Value::Array(items)) = v else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<T>(item) {
            Ok(rec) => Some(rec),
            Err(e) => {
                tracing::warn!(index = i, error = %e, "dropping malformed record");
                None
            }
        })
        .collect())
}

/// Decode a nested object, falling back to its `Default` if it is malformed.
pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.and_then(|v| serde_json::from_value(v).ok()).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_f64")]
        rate: Option<f64>,
        #[serde(default, deserialize_with = "opt_cents")]
        cap: Option<i64>,
        #[serde(default, deserialize_with = "opt_date")]
        start: Option<NaiveDate>,
        #[serde(default, deserialize_with = "flag")]
        on: bool,
        #[serde(default, deserialize_with = "string_list")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "rates")]
        categories: BTreeMap<String, f64>,
    }

    fn probe(v: Value) -> Probe {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_numbers_accept_strings_and_reject_garbage() {
        assert_eq!(probe(json!({"rate": "2.5"})).rate, Some(2.5));
        assert_eq!(probe(json!({"rate": 3})).rate, Some(3.0));
        assert_eq!(probe(json!({"rate": "lots"})).rate, None);
        assert_eq!(probe(json!({"rate": null})).rate, None);
        assert_eq!(probe(json!({})).rate, None);
        assert_eq!(probe(json!({"cap": 1500.4})).cap, Some(1500));
    }

    #[test]
    fn test_dates_accept_plain_and_rfc3339() {
        let d = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        assert_eq!(probe(json!({"start": "2026-04-01"})).start, Some(d));
        assert_eq!(probe(json!({"start": "2026-04-01T10:00:00Z"})).start, Some(d));
        assert_eq!(probe(json!({"start": "April"})).start, None);
    }

    #[test]
    fn test_flags_and_lists() {
        assert!(probe(json!({"on": "TRUE"})).on);
        assert!(probe(json!({"on": 1})).on);
        assert!(!probe(json!({"on": "nope"})).on);
        assert_eq!(probe(json!({"tags": "grocery"})).tags, vec!["grocery"]);
        assert_eq!(probe(json!({"tags": ["gas", 7, ""]})).tags, vec!["gas"]);
        assert!(probe(json!({"tags": {"a": 1}})).tags.is_empty());
    }

    #[test]
    fn test_rates_drop_non_numeric_entries() {
        let p = probe(json!({"categories": {"grocery": 3, "gas": "2", "travel": "n/a"}}));
        assert_eq!(p.categories.len(), 2);
        assert_eq!(p.categories["gas"], 2.0);
    }

    #[test]
    fn test_first_finite_skips_missing_and_nan() {
        assert_eq!(first_finite([None, Some(f64::NAN), Some(1.25)]), Some(1.25));
        assert_eq!(first_finite::<2>([None, None]), None);
        assert_eq!(first_present([None, Some(5), Some(9)]), Some(5));
    }
}
