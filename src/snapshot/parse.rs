//! Boundary parsing of the `get_scores.cgi` payload into a [`Snapshot`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::lenient;
use super::types::{Cache, CacheNumber, ExtrasItem, PointSource, RejectedRecord, Snapshot, Team};

/// Upper bound on `number_game_caches`; cache slots are allocated up front.
pub const MAX_GAME_CACHES: u32 = 10_000;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot must be a JSON object")]
    NotAnObject,
    #[error("backend reported an error: {0}")]
    Backend(String),
    #[error("snapshot is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("snapshot field '{0}' must be an array")]
    NotAnArray(&'static str),
    #[error("invalid setting for number_game_caches = {0}")]
    InvalidCacheCount(i64),
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Validate the structure of a backend payload and parse its records.
    ///
    /// The top-level arrays and the cache count are required. Individual
    /// records that fail to parse are skipped and listed in `rejected`.
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        let obj = value.as_object().ok_or(SnapshotError::NotAnObject)?;

        if let Some(false) = obj.get("success").and_then(Value::as_bool) {
            let message = obj
                .get("error")
                .or_else(|| obj.get("message"))
                .map(lenient::text)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(SnapshotError::Backend(message));
        }

        let raw_count = obj
            .get("number_game_caches")
            .ok_or(SnapshotError::MissingField("number_game_caches"))?;
        let count = lenient::int(raw_count).unwrap_or(0);
        let number_game_caches = u32::try_from(count)
            .ok()
            .filter(|n| (1..=MAX_GAME_CACHES).contains(n))
            .ok_or(SnapshotError::InvalidCacheCount(count))?;

        let mut rejected = Vec::new();

        let teams: Vec<Team> = parse_records(obj, "teams", &mut rejected)?;
        let trad_points: Vec<PointSource> = parse_records(obj, "trad_points", &mut rejected)?;
        let extras_points: Vec<ExtrasItem> = parse_records(obj, "extras_points", &mut rejected)?;
        let cache_list = parse_cache_list(obj, number_game_caches, &mut rejected)?;

        let unallocated_caches = obj
            .get("unallocated_caches")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(lenient::int)
                    .filter_map(|n| u32::try_from(n).ok())
                    .map(CacheNumber)
                    .collect()
            })
            .unwrap_or_default();

        let flag = |key: &str| obj.get(key).map(lenient::flag).unwrap_or(false);

        for record in &rejected {
            warn!(
                "Skipping malformed {} record #{}: {}",
                record.section, record.index, record.reason
            );
        }
        debug!(
            "Parsed snapshot: {} teams, {} caches, {} point sources, {} extras items",
            teams.len(),
            number_game_caches,
            trad_points.len(),
            extras_points.len()
        );

        Ok(Snapshot {
            number_game_caches,
            teams,
            cache_list,
            trad_points,
            extras_points,
            use_totals_for_best_cache_calculation: flag("use_totals_for_best_cache_calculation"),
            warning_cache_not_in_handout: flag("warning_cache_not_in_handout"),
            warning_cache_not_in_gpx: flag("warning_cache_not_in_gpx"),
            unallocated_caches,
            rejected,
        })
    }
}

fn required_array<'a>(
    obj: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a Vec<Value>, SnapshotError> {
    obj.get(key)
        .ok_or(SnapshotError::MissingField(key))?
        .as_array()
        .ok_or(SnapshotError::NotAnArray(key))
}

fn parse_records<T: DeserializeOwned>(
    obj: &Map<String, Value>,
    key: &'static str,
    rejected: &mut Vec<RejectedRecord>,
) -> Result<Vec<T>, SnapshotError> {
    let items = required_array(obj, key)?;
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match T::deserialize(item) {
            Ok(record) => records.push(record),
            Err(e) => rejected.push(RejectedRecord {
                section: key,
                index,
                reason: e.to_string(),
            }),
        }
    }
    Ok(records)
}

/// Slot caches by their own cache number, falling back to list position.
fn parse_cache_list(
    obj: &Map<String, Value>,
    number_game_caches: u32,
    rejected: &mut Vec<RejectedRecord>,
) -> Result<Vec<Option<Cache>>, SnapshotError> {
    let items = required_array(obj, "cache_list")?;
    let mut slots: Vec<Option<Cache>> = vec![None; number_game_caches as usize];

    for (index, item) in items.iter().enumerate() {
        if item.is_null() {
            continue;
        }
        let mut cache = match Cache::deserialize(item) {
            Ok(c) => c,
            Err(e) => {
                rejected.push(RejectedRecord {
                    section: "cache_list",
                    index,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if cache.cache_number.0 == 0 {
            cache.cache_number = CacheNumber::from_index(index);
        }
        match cache.cache_number.index().and_then(|i| slots.get_mut(i)) {
            Some(slot) => *slot = Some(cache),
            None => rejected.push(RejectedRecord {
                section: "cache_list",
                index,
                reason: format!(
                    "cache number {} exceeds number_game_caches ({})",
                    cache.cache_number, number_game_caches
                ),
            }),
        }
    }

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::types::{ExtrasItemId, FinalScore, PointKind, TeamId};

    const SAMPLE: &str = r#"{
        "number_game_caches": 4,
        "cache_list": [
            {"cache_number": 1, "team_id": 10, "has_coordinates": true, "handout": true, "returned": true, "total_hide_points": 0, "total_find_points": 3},
            {"cache_number": 2, "team_id": 10, "has_coordinates": true, "handout": true, "returned": false, "total_hide_points": 5, "total_find_points": 2},
            null,
            {"cache_number": 4, "team_id": 0, "has_coordinates": false, "handout": true, "returned": true, "total_hide_points": 3, "total_find_points": 1}
        ],
        "teams": [
            {"team_id": 10, "team_name": "Alpha", "competing": true, "caches": [1, 2],
             "trad_finds": [1, 0, 0, 1], "extra_finds": {"7": 3, "-1": 4},
             "not_returned_caches": 1, "final_score": 370},
            {"team_name": "No id"}
        ],
        "trad_points": [
            {"id": 1, "item_name": "Find points", "hide_or_find": "F", "points_list": [3, 2, 0, 1]},
            {"id": 4, "item_name": "Creative", "hide_or_find": "H", "points_list": [0, 5, 0, 3]}
        ],
        "extras_points": [
            {"id": 7, "short_name": "P1", "long_name": "Puzzle 1", "point_value": 2}
        ],
        "use_totals_for_best_cache_calculation": false,
        "warning_cache_not_in_handout": false,
        "warning_cache_not_in_gpx": true,
        "unallocated_caches": [4]
    }"#;

    #[test]
    fn test_parse_sample_snapshot() {
        let snapshot = Snapshot::from_json(SAMPLE).unwrap();
        assert_eq!(snapshot.number_game_caches, 4);
        assert_eq!(snapshot.teams.len(), 1);
        assert_eq!(snapshot.cache_list.len(), 4);
        assert!(snapshot.cache_list[2].is_none());
        assert!(snapshot.warning_cache_not_in_gpx);
        assert_eq!(snapshot.unallocated_caches, vec![CacheNumber(4)]);

        let team = &snapshot.teams[0];
        assert_eq!(team.team_id, TeamId(10));
        assert_eq!(team.final_score, FinalScore::Tenths(370));
        assert_eq!(team.extra_count(ExtrasItemId(7)), 3);
        assert_eq!(team.late_minutes(), 4);

        assert_eq!(snapshot.trad_points[1].hide_or_find, PointKind::Hide);
        assert_eq!(snapshot.cache(CacheNumber(4)).unwrap().team_id, None);
    }

    #[test]
    fn test_team_without_id_is_rejected_not_fatal() {
        let snapshot = Snapshot::from_json(SAMPLE).unwrap();
        assert_eq!(snapshot.rejected.len(), 1);
        assert_eq!(snapshot.rejected[0].section, "teams");
        assert_eq!(snapshot.rejected[0].index, 1);
    }

    #[test]
    fn test_missing_teams_is_fatal() {
        let json = r#"{"number_game_caches": 2, "cache_list": [], "trad_points": [], "extras_points": []}"#;
        let err = Snapshot::from_json(json).unwrap_err();
        assert!(matches!(err, SnapshotError::MissingField("teams")));
    }

    #[test]
    fn test_invalid_cache_count_is_fatal() {
        let json = r#"{"number_game_caches": 0, "teams": [], "cache_list": [], "trad_points": [], "extras_points": []}"#;
        let err = Snapshot::from_json(json).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidCacheCount(0)));
    }

    #[test]
    fn test_oversized_cache_count_is_fatal() {
        let json = r#"{"number_game_caches": 4000000000, "teams": [], "cache_list": [], "trad_points": [], "extras_points": []}"#;
        let err = Snapshot::from_json(json).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidCacheCount(4_000_000_000)));

        let json = r#"{"number_game_caches": 10001, "teams": [], "cache_list": [], "trad_points": [], "extras_points": []}"#;
        assert!(Snapshot::from_json(json).is_err());

        let json = r#"{"number_game_caches": 10000, "teams": [], "cache_list": [], "trad_points": [], "extras_points": []}"#;
        assert_eq!(Snapshot::from_json(json).unwrap().number_game_caches, MAX_GAME_CACHES);
    }

    #[test]
    fn test_backend_error_envelope() {
        let json = r#"{"success": false, "error": "You do not have permission to view this area"}"#;
        let err = Snapshot::from_json(json).unwrap_err();
        assert!(err.to_string().contains("permission"));
    }

    #[test]
    fn test_malformed_team_fields_default_to_zero() {
        let json = r#"{
            "number_game_caches": 2,
            "cache_list": [],
            "teams": [{"team_id": 3, "team_name": "Beta", "late": "soon", "not_returned_caches": null, "trad_finds": "oops", "final_score": null}],
            "trad_points": [],
            "extras_points": []
        }"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        let team = &snapshot.teams[0];
        assert_eq!(team.late_minutes(), 0);
        assert_eq!(team.not_returned_caches, 0);
        assert!(team.trad_finds.is_empty());
        assert_eq!(team.final_score, FinalScore::Unset);
        assert!(snapshot.cache_list.iter().all(Option::is_none));
    }

    #[test]
    fn test_cache_slotted_by_number() {
        let json = r#"{
            "number_game_caches": 3,
            "cache_list": [{"cache_number": 3, "has_coordinates": 1}, {"cache_number": 9}],
            "teams": [], "trad_points": [], "extras_points": []
        }"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        assert!(snapshot.cache(CacheNumber(3)).unwrap().has_coordinates);
        assert!(snapshot.cache(CacheNumber(1)).is_none());
        assert_eq!(snapshot.rejected.len(), 1);
        assert_eq!(snapshot.rejected[0].section, "cache_list");
    }
}
