use std::collections::BTreeSet;

use super::warnings::ScoringWarning;
use crate::snapshot::{CacheNumber, Snapshot};

/// Snapshot-wide data checks that do not belong to a single team's score.
pub fn check_snapshot(snapshot: &Snapshot) -> Vec<ScoringWarning> {
    let mut warnings = Vec::new();

    for record in &snapshot.rejected {
        warnings.push(ScoringWarning::RejectedRecord {
            section: record.section.to_string(),
            index: record.index,
            reason: record.reason.clone(),
        });
    }

    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for team in &snapshot.teams {
        if !seen.insert(team.team_id) {
            duplicates.insert(team.team_id);
        }
    }
    for team_id in duplicates {
        warnings.push(ScoringWarning::DuplicateTeamId { team_id });
    }

    let mut allocated: BTreeSet<CacheNumber> = snapshot
        .teams
        .iter()
        .flat_map(|t| t.caches.iter().copied())
        .collect();
    allocated.extend(snapshot.caches().filter(|c| c.team_id.is_some()).map(|c| c.cache_number));

    let mut unallocated: BTreeSet<CacheNumber> = snapshot
        .unallocated_caches
        .iter()
        .copied()
        .filter(|n| n.0 >= 1 && n.0 <= snapshot.number_game_caches)
        .collect();

    let mut not_in_handout = false;
    let mut not_in_gpx = false;

    for (index, slot) in snapshot.cache_list.iter().enumerate() {
        let number = CacheNumber::from_index(index);
        let Some(cache) = slot else {
            warnings.push(ScoringWarning::EmptyCacheSlot { cache: number });
            continue;
        };
        match cache.team_id {
            Some(team_id) => {
                if !cache.handout {
                    not_in_handout = true;
                    warnings.push(ScoringWarning::CacheNotInHandout {
                        cache: number,
                        team_id,
                    });
                }
                if !cache.has_coordinates {
                    not_in_gpx = true;
                    warnings.push(ScoringWarning::CacheNotInGpx {
                        cache: number,
                        team_id,
                    });
                }
            }
            None if !allocated.contains(&number) => {
                unallocated.insert(number);
            }
            None => {}
        }
    }

    for cache in unallocated {
        warnings.push(ScoringWarning::UnallocatedCache { cache });
    }

    if snapshot.warning_cache_not_in_handout && !not_in_handout {
        warnings.push(ScoringWarning::BackendFlag {
            flag: "warning_cache_not_in_handout",
        });
    }
    if snapshot.warning_cache_not_in_gpx && !not_in_gpx {
        warnings.push(ScoringWarning::BackendFlag {
            flag: "warning_cache_not_in_gpx",
        });
    }

    warnings
}
