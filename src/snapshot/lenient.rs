//! Field-level parsing helpers for backend payloads.
//!
//! The backend hands out loosely typed JSON. Individual fields that are
//! missing or malformed degrade to zero/empty instead of failing the whole
//! snapshot; only structural problems are reported by the caller.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

use super::types::{CacheNumber, ExtrasItemId, FinalScore};

/// Interpret a JSON value as an integer.
///
/// Accepts integers, floats (rounded), numeric strings and booleans.
pub fn int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Interpret a JSON value as a boolean flag (non-zero numbers are true).
pub fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(_) => int(value).is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        _ => false,
    }
}

pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

pub fn de_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(int(&value).unwrap_or(0))
}

pub fn de_opt_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(int(&value))
}

pub fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(flag(&value))
}

pub fn de_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(text(&value))
}

/// Integer list where unparseable entries count as zero.
pub fn de_int_list<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().map(|v| int(v).unwrap_or(0)).collect(),
        _ => Vec::new(),
    })
}

/// Per-cache find flags; index 0 is cache 1.
pub fn de_flags<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().map(flag).collect(),
        _ => Vec::new(),
    })
}

/// Sorted, de-duplicated list of positive cache numbers.
pub fn de_cache_numbers<'de, D>(deserializer: D) -> Result<Vec<CacheNumber>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let mut numbers: Vec<CacheNumber> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(int)
            .filter_map(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .map(CacheNumber)
            .collect(),
        _ => Vec::new(),
    };
    numbers.sort();
    numbers.dedup();
    Ok(numbers)
}

/// Extras counts keyed by item id. Keys arrive as strings ("7"), values may
/// be numbers or numeric strings.
pub fn de_extras_counts<'de, D>(deserializer: D) -> Result<BTreeMap<ExtrasItemId, i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let mut counts = BTreeMap::new();
    if let Value::Object(map) = value {
        for (key, count) in map {
            if let (Ok(id), Some(count)) = (key.trim().parse::<i64>(), int(&count)) {
                counts.insert(ExtrasItemId(id), count);
            }
        }
    }
    Ok(counts)
}

/// Team reference on a cache; zero or negative ids mean "not allocated".
pub fn de_opt_team_id<'de, D>(deserializer: D) -> Result<Option<super::types::TeamId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(int(&value)
        .filter(|id| *id > 0)
        .map(super::types::TeamId))
}

pub fn de_final_score<'de, D>(deserializer: D) -> Result<FinalScore, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(FinalScore::from_tenths(int(&value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_accepts_numbers_and_strings() {
        assert_eq!(int(&json!(7)), Some(7));
        assert_eq!(int(&json!(2.6)), Some(3));
        assert_eq!(int(&json!(" 15 ")), Some(15));
        assert_eq!(int(&json!(true)), Some(1));
        assert_eq!(int(&json!("abc")), None);
        assert_eq!(int(&Value::Null), None);
    }

    #[test]
    fn test_flag_values() {
        assert!(flag(&json!(1)));
        assert!(flag(&json!(true)));
        assert!(flag(&json!("true")));
        assert!(!flag(&json!(0)));
        assert!(!flag(&Value::Null));
        assert!(!flag(&json!("nope")));
    }

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "de_extras_counts")]
        extras: BTreeMap<ExtrasItemId, i64>,
        #[serde(default, deserialize_with = "de_cache_numbers")]
        caches: Vec<CacheNumber>,
    }

    #[test]
    fn test_extras_counts_skip_bad_keys() {
        let probe: Probe =
            serde_json::from_value(json!({"extras": {"7": 3, "x": 1, "-1": "12"}})).unwrap();
        assert_eq!(probe.extras.get(&ExtrasItemId(7)), Some(&3));
        assert_eq!(probe.extras.get(&ExtrasItemId(-1)), Some(&12));
        assert_eq!(probe.extras.len(), 2);
    }

    #[test]
    fn test_cache_numbers_sorted_and_deduplicated() {
        let probe: Probe = serde_json::from_value(json!({"caches": [12, 3, 12, 0, -4, "7"]})).unwrap();
        assert_eq!(probe.caches, vec![CacheNumber(3), CacheNumber(7), CacheNumber(12)]);
        assert!(probe.extras.is_empty());
    }
}
