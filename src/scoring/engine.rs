use serde::Serialize;

use super::config::{HideMode, ScoringOptions};
use super::reconcile::{reconcile, ReconciliationStatus};
use super::warnings::ScoringWarning;
use crate::snapshot::{CacheNumber, ExtrasItemId, PointSource, Snapshot, Team};

/// Points per cache not returned at the end of the game.
pub const CACHE_NOT_RETURNED_PENALTY: i64 = -2;
/// Points per minute late back to base.
pub const MINUTES_LATE_PENALTY: i64 = -1;

/// Per-category subtotals for one team, in whole points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub trad_find_points: i64,
    pub extra_find_points: i64,
    pub hide_points: i64,
    pub penalties: i64,
}

impl CategoryTotals {
    pub fn total(&self) -> i64 {
        self.trad_find_points
            .saturating_add(self.extra_find_points)
            .saturating_add(self.hide_points)
            .saturating_add(self.penalties)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryContribution {
    pub label: String,       // e.g. "Extras: Puzzle 1", "Hide: Creative"
    pub description: String, // e.g. "3 x 2", "caches 2, 3"
    pub points: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub contributions: Vec<CategoryContribution>,
}

impl ScoreBreakdown {
    fn push(&mut self, label: impl Into<String>, description: impl Into<String>, points: i64) {
        self.contributions.push(CategoryContribution {
            label: label.into(),
            description: description.into(),
            points,
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub totals: CategoryTotals,
    pub computed_total: i64,
    pub status: ReconciliationStatus,
    pub breakdown: ScoreBreakdown,
    pub warnings: Vec<ScoringWarning>,
}

/// Compute the four category subtotals for a team.
pub fn compute_category_totals(team: &Team, snapshot: &Snapshot, options: &ScoringOptions) -> CategoryTotals {
    calculate_score(team, snapshot, options).totals
}

/// Score one team against a snapshot and reconcile the result with its
/// final score. Inconsistent records are skipped and reported as warnings.
pub fn calculate_score(team: &Team, snapshot: &Snapshot, options: &ScoringOptions) -> ScoreResult {
    let mut breakdown = ScoreBreakdown::default();
    let mut warnings = Vec::new();

    let totals = CategoryTotals {
        trad_find_points: trad_find_points(team, snapshot, &mut breakdown, &mut warnings),
        extra_find_points: extra_find_points(team, snapshot, &mut breakdown, &mut warnings),
        hide_points: hide_points(team, snapshot, options, &mut breakdown, &mut warnings),
        penalties: penalties(team, &mut breakdown),
    };
    let computed_total = totals.total();

    ScoreResult {
        totals,
        computed_total,
        status: reconcile(computed_total, team.final_score),
        breakdown,
        warnings,
    }
}

fn trad_find_points(
    team: &Team,
    snapshot: &Snapshot,
    breakdown: &mut ScoreBreakdown,
    warnings: &mut Vec<ScoringWarning>,
) -> i64 {
    let mut points = 0;
    let mut counted = 0;

    for number in team.found_caches() {
        match snapshot.cache(number) {
            None => warnings.push(ScoringWarning::FindOnMissingCache {
                team_id: team.team_id,
                cache: number,
            }),
            Some(cache) if !cache.has_coordinates => {
                warnings.push(ScoringWarning::FindOnCacheNotInGpx {
                    team_id: team.team_id,
                    cache: number,
                })
            }
            Some(cache) => {
                points = saturating_sum([points, cache.total_find_points]);
                counted += 1;
            }
        }
    }

    breakdown.push("Traditional finds", format!("{} caches found", counted), points);
    points
}

fn extra_find_points(
    team: &Team,
    snapshot: &Snapshot,
    breakdown: &mut ScoreBreakdown,
    warnings: &mut Vec<ScoringWarning>,
) -> i64 {
    let mut points = 0;

    for item in snapshot.extras_points.iter().filter(|i| i.id != ExtrasItemId::LATE) {
        let count = team.extra_count(item.id);
        if count == 0 {
            continue;
        }
        let item_points = count.saturating_mul(item.point_value);
        points = saturating_sum([points, item_points]);
        breakdown.push(
            format!("Extras: {}", item.display_name()),
            format!("{} x {}", count, item.point_value),
            item_points,
        );
    }

    for (&item_id, &count) in &team.extra_finds {
        if item_id != ExtrasItemId::LATE && count != 0 && snapshot.extras_item(item_id).is_none() {
            warnings.push(ScoringWarning::UnknownExtrasItem {
                team_id: team.team_id,
                item_id,
                count,
            });
        }
    }

    points
}

fn hide_points(
    team: &Team,
    snapshot: &Snapshot,
    options: &ScoringOptions,
    breakdown: &mut ScoreBreakdown,
    warnings: &mut Vec<ScoringWarning>,
) -> i64 {
    for &number in &team.caches {
        if snapshot.cache(number).is_none() {
            warnings.push(ScoringWarning::HideOnMissingCache {
                team_id: team.team_id,
                cache: number,
            });
        }
    }

    match options.hide_mode {
        HideMode::PerCategory => snapshot
            .hide_sources()
            .map(|source| category_hide_points(team, source, options.counted_hides, breakdown))
            .fold(0, i64::saturating_add),
        HideMode::CombinedTotal => {
            let values: Vec<(CacheNumber, i64)> = team
                .caches
                .iter()
                .map(|&n| (n, snapshot.cache(n).map_or(0, |c| c.total_hide_points)))
                .collect();
            let counted = select_counted_hides(values, options.counted_hides);
            let points = saturating_sum(counted.iter().map(|(_, p)| *p));
            breakdown.push("Hide points", describe_caches(&counted), points);
            points
        }
    }
}

fn category_hide_points(
    team: &Team,
    source: &PointSource,
    limit: Option<usize>,
    breakdown: &mut ScoreBreakdown,
) -> i64 {
    let values = team
        .caches
        .iter()
        .map(|&n| (n, source.points_for(n)))
        .collect();
    let counted = select_counted_hides(values, limit);
    let points = saturating_sum(counted.iter().map(|(_, p)| *p));
    breakdown.push(
        format!("Hide: {}", source.item_name),
        describe_caches(&counted),
        points,
    );
    points
}

/// Keep the `limit` highest-scoring caches (all of them when unset).
/// Equal values keep the lower cache number first.
fn select_counted_hides(
    mut values: Vec<(CacheNumber, i64)>,
    limit: Option<usize>,
) -> Vec<(CacheNumber, i64)> {
    if let Some(limit) = limit {
        values.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        values.truncate(limit);
        values.sort_by_key(|(n, _)| *n);
    }
    values
}

fn describe_caches(counted: &[(CacheNumber, i64)]) -> String {
    if counted.is_empty() {
        return "no caches".to_string();
    }
    let numbers: Vec<String> = counted.iter().map(|(n, _)| n.to_string()).collect();
    format!("caches {}", numbers.join(", "))
}

fn penalties(team: &Team, breakdown: &mut ScoreBreakdown) -> i64 {
    let not_returned = team.not_returned_caches.saturating_mul(CACHE_NOT_RETURNED_PENALTY);
    let late = team.late_minutes().saturating_mul(MINUTES_LATE_PENALTY);

    if not_returned != 0 {
        breakdown.push(
            "Caches not returned",
            format!("{} x {}", team.not_returned_caches, CACHE_NOT_RETURNED_PENALTY),
            not_returned,
        );
    }
    if late != 0 {
        breakdown.push(
            "Late",
            format!("{} min x {}", team.late_minutes(), MINUTES_LATE_PENALTY),
            late,
        );
    }

    not_returned.saturating_add(late)
}

/// Out-of-range counts from the backend clamp at the i64 bounds.
fn saturating_sum(values: impl IntoIterator<Item = i64>) -> i64 {
    values.into_iter().fold(0, i64::saturating_add)
}
