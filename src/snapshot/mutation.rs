//! Point updates to team records.
//!
//! A [`Mutation`] is sent to the backend as a single request, or applied to a
//! saved snapshot file. Either way the caller re-loads the full snapshot
//! afterwards instead of patching its in-memory copy.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

use super::lenient;
use super::types::{CacheNumber, ExtrasItemId, FinalScore, TeamId};

#[derive(Debug, Error, PartialEq)]
pub enum MutationError {
    #[error("team {0} does not exist in the snapshot")]
    UnknownTeam(TeamId),
    #[error("count must not be negative (got {0})")]
    NegativeCount(i64),
    #[error("minutes late must not be negative (got {0})")]
    NegativeMinutes(i64),
    #[error("cache number must be at least 1")]
    InvalidCache,
    #[error("cache {cache} is out of range (game has {max} caches)")]
    CacheOutOfRange { cache: CacheNumber, max: i64 },
    #[error("extras item -1 is reserved for minutes late; use set-late instead")]
    ReservedItem,
    #[error("invalid final score '{0}': expected points, 'dsq' or empty")]
    InvalidScore(String),
    #[error("invalid minutes late '{0}': expected minutes or a duration like 1h15m")]
    InvalidMinutes(String),
    #[error("snapshot document has no 'teams' array")]
    MissingTeams,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SetFinalScore {
        team_id: TeamId,
        final_score: FinalScore,
    },
    SetExtraFindCount {
        team_id: TeamId,
        item_id: ExtrasItemId,
        count: i64,
    },
    SetLateMinutes {
        team_id: TeamId,
        minutes: i64,
    },
    SetTradFind {
        team_id: TeamId,
        cache: CacheNumber,
        found: bool,
    },
}

impl Mutation {
    pub fn team_id(&self) -> TeamId {
        match self {
            Mutation::SetFinalScore { team_id, .. }
            | Mutation::SetExtraFindCount { team_id, .. }
            | Mutation::SetLateMinutes { team_id, .. }
            | Mutation::SetTradFind { team_id, .. } => *team_id,
        }
    }

    pub fn validate(&self) -> Result<(), MutationError> {
        match *self {
            Mutation::SetFinalScore { .. } => Ok(()),
            Mutation::SetExtraFindCount { item_id, count, .. } => {
                if item_id == ExtrasItemId::LATE {
                    Err(MutationError::ReservedItem)
                } else if count < 0 {
                    Err(MutationError::NegativeCount(count))
                } else {
                    Ok(())
                }
            }
            Mutation::SetLateMinutes { minutes, .. } if minutes < 0 => {
                Err(MutationError::NegativeMinutes(minutes))
            }
            Mutation::SetLateMinutes { .. } => Ok(()),
            Mutation::SetTradFind { cache, .. } if cache.0 == 0 => Err(MutationError::InvalidCache),
            Mutation::SetTradFind { .. } => Ok(()),
        }
    }

    /// Backend script handling this update, relative to the API base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Mutation::SetFinalScore { .. } => "save_team_info.cgi",
            _ => "set_find_value.cgi",
        }
    }

    pub fn request_body(&self) -> Value {
        match *self {
            Mutation::SetFinalScore {
                team_id,
                final_score,
            } => json!({ "team_id": team_id, "final_score": final_score }),
            Mutation::SetExtraFindCount {
                team_id,
                item_id,
                count,
            } => json!({ "team_id": team_id, "extras_id": item_id, "value": count }),
            Mutation::SetLateMinutes { team_id, minutes } => {
                json!({ "team_id": team_id, "extras_id": ExtrasItemId::LATE, "value": minutes })
            }
            Mutation::SetTradFind {
                team_id,
                cache,
                found,
            } => json!({ "team_id": team_id, "cache_number": cache, "value": i64::from(found) }),
        }
    }

    /// Apply this update to a raw snapshot document, leaving every unrelated
    /// field untouched.
    pub fn apply_to_value(&self, doc: &mut Value) -> Result<(), MutationError> {
        self.validate()?;

        if let Mutation::SetTradFind { cache, .. } = self {
            let max = doc
                .get("number_game_caches")
                .and_then(lenient::int)
                .unwrap_or(i64::MAX);
            if i64::from(cache.0) > max {
                return Err(MutationError::CacheOutOfRange { cache: *cache, max });
            }
        }

        let team = find_team_mut(doc, self.team_id())?;

        match *self {
            Mutation::SetFinalScore { final_score, .. } => {
                team.insert("final_score".to_string(), json!(final_score));
            }
            Mutation::SetExtraFindCount { item_id, count, .. } => {
                if let Some(extras) = extras_object(team) {
                    extras.insert(item_id.to_string(), json!(count));
                }
            }
            Mutation::SetLateMinutes { minutes, .. } => {
                team.insert("late".to_string(), json!(minutes));
                let late_key = ExtrasItemId::LATE.to_string();
                if let Some(extras) = team.get_mut("extra_finds").and_then(Value::as_object_mut) {
                    if extras.contains_key(&late_key) {
                        extras.insert(late_key, json!(minutes));
                    }
                }
            }
            Mutation::SetTradFind { cache, found, .. } => {
                let finds = team
                    .entry("trad_finds")
                    .or_insert_with(|| Value::Array(Vec::new()));
                if !finds.is_array() {
                    *finds = Value::Array(Vec::new());
                }
                if let (Some(list), Some(index)) = (finds.as_array_mut(), cache.index()) {
                    if list.len() <= index {
                        list.resize(index + 1, json!(0));
                    }
                    list[index] = json!(i64::from(found));
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::SetFinalScore {
                team_id,
                final_score: FinalScore::Unset,
            } => write!(f, "clear final score of team {}", team_id),
            Mutation::SetFinalScore {
                team_id,
                final_score,
            } => write!(f, "set final score of team {} to {}", team_id, final_score),
            Mutation::SetExtraFindCount {
                team_id,
                item_id,
                count,
            } => write!(f, "set extras item {} of team {} to {}", item_id, team_id, count),
            Mutation::SetLateMinutes { team_id, minutes } => {
                write!(f, "set team {} late by {} min", team_id, minutes)
            }
            Mutation::SetTradFind {
                team_id,
                cache,
                found,
            } => {
                let verb = if *found { "mark" } else { "unmark" };
                write!(f, "{} cache {} as found by team {}", verb, cache, team_id)
            }
        }
    }
}

fn find_team_mut(doc: &mut Value, team_id: TeamId) -> Result<&mut Map<String, Value>, MutationError> {
    doc.get_mut("teams")
        .and_then(Value::as_array_mut)
        .ok_or(MutationError::MissingTeams)?
        .iter_mut()
        .filter_map(Value::as_object_mut)
        .find(|t| t.get("team_id").and_then(lenient::int) == Some(team_id.0))
        .ok_or(MutationError::UnknownTeam(team_id))
}

fn extras_object(team: &mut Map<String, Value>) -> Option<&mut Map<String, Value>> {
    let extras = team
        .entry("extra_finds")
        .or_insert_with(|| Value::Object(Map::new()));
    if !extras.is_object() {
        *extras = Value::Object(Map::new());
    }
    extras.as_object_mut()
}

/// Parse a lateness value: whole minutes ("15") or a duration ("1h15m").
/// Partial minutes round up.
pub fn parse_late_minutes(input: &str) -> Result<i64, MutationError> {
    let input = input.trim();
    if let Ok(minutes) = input.parse::<i64>() {
        return Ok(minutes);
    }
    let duration = humantime::parse_duration(input)
        .map_err(|_| MutationError::InvalidMinutes(input.to_string()))?;
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    let minutes = secs.div_ceil(60);
    i64::try_from(minutes).map_err(|_| MutationError::InvalidMinutes(input.to_string()))
}

/// Scalar input that may be written as a number or a string in YAML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(f64),
    Text(String),
}

/// One entry of a batch file.
///
/// ```yaml
/// - op: set-final-score
///   team: 12
///   score: 37.5
/// - op: set-extra
///   team: 12
///   item: 7
///   count: 3
/// - op: set-late
///   team: 12
///   minutes: 1h15m
/// - op: set-find
///   team: 12
///   cache: 4
///   found: true
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum BatchOp {
    SetFinalScore {
        team: i64,
        #[serde(default)]
        score: Option<InputValue>,
    },
    SetExtra {
        team: i64,
        item: i64,
        count: i64,
    },
    SetLate {
        team: i64,
        minutes: InputValue,
    },
    SetFind {
        team: i64,
        cache: u32,
        #[serde(default = "default_found")]
        found: bool,
    },
}

fn default_found() -> bool {
    true
}

impl BatchOp {
    pub fn into_mutation(self) -> Result<Mutation, MutationError> {
        let mutation = match self {
            BatchOp::SetFinalScore { team, score } => {
                let final_score = match score {
                    None => FinalScore::Unset,
                    Some(InputValue::Number(points)) => FinalScore::from_points(points),
                    Some(InputValue::Text(text)) => {
                        FinalScore::parse_points(&text).ok_or(MutationError::InvalidScore(text))?
                    }
                };
                Mutation::SetFinalScore {
                    team_id: TeamId(team),
                    final_score,
                }
            }
            BatchOp::SetExtra { team, item, count } => Mutation::SetExtraFindCount {
                team_id: TeamId(team),
                item_id: ExtrasItemId(item),
                count,
            },
            BatchOp::SetLate { team, minutes } => {
                let minutes = match minutes {
                    InputValue::Number(n) if n.fract() == 0.0 => n as i64,
                    InputValue::Number(n) => return Err(MutationError::InvalidMinutes(n.to_string())),
                    InputValue::Text(text) => parse_late_minutes(&text)?,
                };
                Mutation::SetLateMinutes {
                    team_id: TeamId(team),
                    minutes,
                }
            }
            BatchOp::SetFind { team, cache, found } => Mutation::SetTradFind {
                team_id: TeamId(team),
                cache: CacheNumber(cache),
                found,
            },
        };
        mutation.validate()?;
        Ok(mutation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> Value {
        json!({
            "number_game_caches": 5,
            "teams": [
                {"team_id": 10, "team_name": "Alpha", "trad_finds": [1, 0], "extra_finds": {"7": 1, "-1": 5}},
                {"team_id": "11", "team_name": "Beta"}
            ],
            "cache_list": [],
            "custom_field": "kept"
        })
    }

    #[test]
    fn test_request_bodies() {
        let m = Mutation::SetFinalScore {
            team_id: TeamId(10),
            final_score: FinalScore::Tenths(375),
        };
        assert_eq!(m.endpoint(), "save_team_info.cgi");
        assert_eq!(m.request_body(), json!({"team_id": 10, "final_score": 375}));

        let m = Mutation::SetFinalScore {
            team_id: TeamId(10),
            final_score: FinalScore::Unset,
        };
        assert_eq!(m.request_body(), json!({"team_id": 10, "final_score": null}));

        let m = Mutation::SetLateMinutes {
            team_id: TeamId(3),
            minutes: 15,
        };
        assert_eq!(m.endpoint(), "set_find_value.cgi");
        assert_eq!(m.request_body(), json!({"team_id": 3, "extras_id": -1, "value": 15}));

        let m = Mutation::SetTradFind {
            team_id: TeamId(3),
            cache: CacheNumber(4),
            found: true,
        };
        assert_eq!(m.request_body(), json!({"team_id": 3, "cache_number": 4, "value": 1}));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let m = Mutation::SetExtraFindCount {
            team_id: TeamId(1),
            item_id: ExtrasItemId(7),
            count: -1,
        };
        assert_eq!(m.validate(), Err(MutationError::NegativeCount(-1)));

        let m = Mutation::SetExtraFindCount {
            team_id: TeamId(1),
            item_id: ExtrasItemId::LATE,
            count: 3,
        };
        assert_eq!(m.validate(), Err(MutationError::ReservedItem));

        let m = Mutation::SetTradFind {
            team_id: TeamId(1),
            cache: CacheNumber(0),
            found: true,
        };
        assert_eq!(m.validate(), Err(MutationError::InvalidCache));
    }

    #[test]
    fn test_apply_final_score_preserves_other_fields() {
        let mut doc = sample_doc();
        Mutation::SetFinalScore {
            team_id: TeamId(11),
            final_score: FinalScore::Disqualified,
        }
        .apply_to_value(&mut doc)
        .unwrap();
        assert_eq!(doc["teams"][1]["final_score"], json!(-1000));
        assert_eq!(doc["teams"][1]["team_name"], json!("Beta"));
        assert_eq!(doc["custom_field"], json!("kept"));
    }

    #[test]
    fn test_apply_extra_and_late() {
        let mut doc = sample_doc();
        Mutation::SetExtraFindCount {
            team_id: TeamId(10),
            item_id: ExtrasItemId(8),
            count: 2,
        }
        .apply_to_value(&mut doc)
        .unwrap();
        Mutation::SetLateMinutes {
            team_id: TeamId(10),
            minutes: 12,
        }
        .apply_to_value(&mut doc)
        .unwrap();

        let extras = &doc["teams"][0]["extra_finds"];
        assert_eq!(extras["7"], json!(1));
        assert_eq!(extras["8"], json!(2));
        assert_eq!(extras["-1"], json!(12));
        assert_eq!(doc["teams"][0]["late"], json!(12));
    }

    #[test]
    fn test_apply_trad_find_extends_list() {
        let mut doc = sample_doc();
        Mutation::SetTradFind {
            team_id: TeamId(10),
            cache: CacheNumber(4),
            found: true,
        }
        .apply_to_value(&mut doc)
        .unwrap();
        assert_eq!(doc["teams"][0]["trad_finds"], json!([1, 0, 0, 1]));

        let err = Mutation::SetTradFind {
            team_id: TeamId(10),
            cache: CacheNumber(6),
            found: true,
        }
        .apply_to_value(&mut doc)
        .unwrap_err();
        assert_eq!(
            err,
            MutationError::CacheOutOfRange {
                cache: CacheNumber(6),
                max: 5
            }
        );
    }

    #[test]
    fn test_apply_unknown_team() {
        let mut doc = sample_doc();
        let err = Mutation::SetLateMinutes {
            team_id: TeamId(99),
            minutes: 1,
        }
        .apply_to_value(&mut doc)
        .unwrap_err();
        assert_eq!(err, MutationError::UnknownTeam(TeamId(99)));
    }

    #[test]
    fn test_parse_late_minutes() {
        assert_eq!(parse_late_minutes("15"), Ok(15));
        assert_eq!(parse_late_minutes("1h 15m"), Ok(75));
        assert_eq!(parse_late_minutes("90s"), Ok(2));
        assert_eq!(parse_late_minutes("2m"), Ok(2));
        assert!(parse_late_minutes("late").is_err());
    }

    #[test]
    fn test_batch_ops_from_yaml() {
        let yaml = r#"
- op: set-final-score
  team: 12
  score: 37.5
- op: set-final-score
  team: 13
  score: dsq
- op: set-final-score
  team: 14
- op: set-extra
  team: 12
  item: 7
  count: 3
- op: set-late
  team: 12
  minutes: 1h15m
- op: set-find
  team: 12
  cache: 4
"#;
        let ops: Vec<BatchOp> = serde_saphyr::from_str(yaml).unwrap();
        let mutations: Vec<Mutation> = ops
            .into_iter()
            .map(|op| op.into_mutation().unwrap())
            .collect();

        assert_eq!(
            mutations,
            vec![
                Mutation::SetFinalScore {
                    team_id: TeamId(12),
                    final_score: FinalScore::Tenths(375)
                },
                Mutation::SetFinalScore {
                    team_id: TeamId(13),
                    final_score: FinalScore::Disqualified
                },
                Mutation::SetFinalScore {
                    team_id: TeamId(14),
                    final_score: FinalScore::Unset
                },
                Mutation::SetExtraFindCount {
                    team_id: TeamId(12),
                    item_id: ExtrasItemId(7),
                    count: 3
                },
                Mutation::SetLateMinutes {
                    team_id: TeamId(12),
                    minutes: 75
                },
                Mutation::SetTradFind {
                    team_id: TeamId(12),
                    cache: CacheNumber(4),
                    found: true
                },
            ]
        );
    }

    #[test]
    fn test_batch_op_invalid_score() {
        let op = BatchOp::SetFinalScore {
            team: 1,
            score: Some(InputValue::Text("lots".to_string())),
        };
        assert_eq!(
            op.into_mutation(),
            Err(MutationError::InvalidScore("lots".to_string()))
        );
    }
}
