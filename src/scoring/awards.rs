use serde::Serialize;
use std::collections::BTreeSet;

use super::config::HideMode;
use crate::snapshot::{CacheNumber, PointSourceId, Snapshot, TeamId};

/// Which per-cache hide value a best-cache award is judged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum HideSelector {
    Category(PointSourceId),
    CombinedTotal,
}

/// Caches sharing the maximum positive value. Ties are not broken; an
/// all-zero (or empty) table gives no award.
pub fn best_caches_by_points(points: &[(CacheNumber, i64)]) -> BTreeSet<CacheNumber> {
    let Some(best) = points.iter().map(|(_, p)| *p).max().filter(|p| *p > 0) else {
        return BTreeSet::new();
    };
    points
        .iter()
        .filter(|(_, p)| *p == best)
        .map(|(n, _)| *n)
        .collect()
}

fn hide_values(snapshot: &Snapshot, selector: HideSelector) -> Vec<(CacheNumber, i64)> {
    let numbers = (1..=snapshot.number_game_caches).map(CacheNumber);
    match selector {
        HideSelector::Category(id) => match snapshot.point_source(id) {
            Some(source) => numbers.map(|n| (n, source.points_for(n))).collect(),
            None => Vec::new(),
        },
        HideSelector::CombinedTotal => numbers
            .map(|n| (n, snapshot.cache(n).map_or(0, |c| c.total_hide_points)))
            .collect(),
    }
}

pub fn determine_best_cache_awards(snapshot: &Snapshot, selector: HideSelector) -> BTreeSet<CacheNumber> {
    best_caches_by_points(&hide_values(snapshot, selector))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwardedCache {
    pub cache: CacheNumber,
    pub team_id: Option<TeamId>,
    pub team_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestCacheAward {
    pub category: String,
    pub selector: HideSelector,
    /// Winning value; zero when nobody earned any points
    pub points: i64,
    pub caches: Vec<AwardedCache>,
}

/// One award per hide point source, or a single award on combined totals.
pub fn best_cache_awards(snapshot: &Snapshot, mode: HideMode) -> Vec<BestCacheAward> {
    let selectors: Vec<(String, HideSelector)> = match mode {
        HideMode::PerCategory => snapshot
            .hide_sources()
            .map(|s| (s.item_name.clone(), HideSelector::Category(s.id)))
            .collect(),
        HideMode::CombinedTotal => vec![("Best cache".to_string(), HideSelector::CombinedTotal)],
    };

    selectors
        .into_iter()
        .map(|(category, selector)| {
            let values = hide_values(snapshot, selector);
            let winners = best_caches_by_points(&values);
            let points = values
                .iter()
                .filter(|(n, _)| winners.contains(n))
                .map(|(_, p)| *p)
                .next()
                .unwrap_or(0);
            let caches = winners
                .into_iter()
                .map(|cache| {
                    let team_id = snapshot.cache(cache).and_then(|c| c.team_id);
                    AwardedCache {
                        cache,
                        team_id,
                        team_name: team_id
                            .and_then(|id| snapshot.team(id))
                            .map(|t| t.team_name.clone()),
                    }
                })
                .collect();
            BestCacheAward {
                category,
                selector,
                points,
                caches,
            }
        })
        .collect()
}
