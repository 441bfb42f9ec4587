use serde::Serialize;
use std::fmt;

use crate::snapshot::{CacheNumber, ExtrasItemId, TeamId};

/// A data inconsistency found while scoring. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringWarning {
    FindOnCacheNotInGpx {
        team_id: TeamId,
        cache: CacheNumber,
    },
    FindOnMissingCache {
        team_id: TeamId,
        cache: CacheNumber,
    },
    HideOnMissingCache {
        team_id: TeamId,
        cache: CacheNumber,
    },
    UnknownExtrasItem {
        team_id: TeamId,
        item_id: ExtrasItemId,
        count: i64,
    },
    CacheNotInHandout {
        cache: CacheNumber,
        team_id: TeamId,
    },
    CacheNotInGpx {
        cache: CacheNumber,
        team_id: TeamId,
    },
    UnallocatedCache {
        cache: CacheNumber,
    },
    EmptyCacheSlot {
        cache: CacheNumber,
    },
    DuplicateTeamId {
        team_id: TeamId,
    },
    RejectedRecord {
        section: String,
        index: usize,
        reason: String,
    },
    BackendFlag {
        flag: &'static str,
    },
}

impl ScoringWarning {
    /// The team the warning concerns, if any.
    pub fn team_id(&self) -> Option<TeamId> {
        match self {
            ScoringWarning::FindOnCacheNotInGpx { team_id, .. }
            | ScoringWarning::FindOnMissingCache { team_id, .. }
            | ScoringWarning::HideOnMissingCache { team_id, .. }
            | ScoringWarning::UnknownExtrasItem { team_id, .. }
            | ScoringWarning::CacheNotInHandout { team_id, .. }
            | ScoringWarning::CacheNotInGpx { team_id, .. }
            | ScoringWarning::DuplicateTeamId { team_id } => Some(*team_id),
            _ => None,
        }
    }
}

impl fmt::Display for ScoringWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringWarning::FindOnCacheNotInGpx { team_id, cache } => write!(
                f,
                "Team {} has a find on cache {}, which is not in the GPX file",
                team_id, cache
            ),
            ScoringWarning::FindOnMissingCache { team_id, cache } => write!(
                f,
                "Team {} has a find on cache {}, which does not exist",
                team_id, cache
            ),
            ScoringWarning::HideOnMissingCache { team_id, cache } => write!(
                f,
                "Team {} hid cache {}, which is missing from the cache list",
                team_id, cache
            ),
            ScoringWarning::UnknownExtrasItem {
                team_id,
                item_id,
                count,
            } => write!(
                f,
                "Team {} has {} of extras item {}, which is not configured",
                team_id, count, item_id
            ),
            ScoringWarning::CacheNotInHandout { cache, team_id } => write!(
                f,
                "Cache {} (team {}) is not in the handout",
                cache, team_id
            ),
            ScoringWarning::CacheNotInGpx { cache, team_id } => write!(
                f,
                "Cache {} (team {}) is not in the GPX file",
                cache, team_id
            ),
            ScoringWarning::UnallocatedCache { cache } => {
                write!(f, "Cache {} has not been allocated to a team", cache)
            }
            ScoringWarning::EmptyCacheSlot { cache } => {
                write!(f, "Cache {} is missing from the cache list", cache)
            }
            ScoringWarning::DuplicateTeamId { team_id } => {
                write!(f, "Team id {} appears more than once", team_id)
            }
            ScoringWarning::RejectedRecord {
                section,
                index,
                reason,
            } => write!(f, "Skipped {} record #{}: {}", section, index, reason),
            ScoringWarning::BackendFlag { flag } => {
                write!(f, "Backend reports {} without naming a cache", flag)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = ScoringWarning::FindOnCacheNotInGpx {
            team_id: TeamId(4),
            cache: CacheNumber(9),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "find_on_cache_not_in_gpx", "team_id": 4, "cache": 9})
        );
    }

    #[test]
    fn test_warning_display_and_team() {
        let warning = ScoringWarning::UnallocatedCache {
            cache: CacheNumber(3),
        };
        assert_eq!(warning.to_string(), "Cache 3 has not been allocated to a team");
        assert_eq!(warning.team_id(), None);

        let warning = ScoringWarning::CacheNotInHandout {
            cache: CacheNumber(3),
            team_id: TeamId(8),
        };
        assert_eq!(warning.team_id(), Some(TeamId(8)));
    }
}
