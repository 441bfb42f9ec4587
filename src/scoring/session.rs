use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::awards::{best_cache_awards, BestCacheAward};
use super::config::{HideMode, RankingStyle, ScoringConfig, ScoringOptions};
use super::consistency::check_snapshot;
use super::engine::{calculate_score, ScoreBreakdown};
use super::podium::Podium;
use super::ranking::{rank_teams, LeaderboardEntry};
use super::reconcile::ReconciliationStatus;
use super::warnings::ScoringWarning;
use crate::snapshot::{FinalScore, Snapshot, Team, TeamId};

/// Per-team result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamScore {
    pub team_id: TeamId,
    pub team_name: String,
    pub competing: bool,
    pub trad_find_points: i64,
    pub extra_find_points: i64,
    pub hide_points: i64,
    pub penalties: i64,
    pub computed_total: i64,
    /// Tenths of a point; -1000 when disqualified, null when not entered
    pub final_score: FinalScore,
    pub reconciliation_status: ReconciliationStatus,
    #[serde(skip)]
    pub breakdown: ScoreBreakdown,
    #[serde(skip)]
    pub warnings: Vec<ScoringWarning>,
}

/// Everything `export` writes to disk.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringReport {
    pub generated_at: DateTime<Utc>,
    pub hide_mode: HideMode,
    pub ranking: RankingStyle,
    pub teams: Vec<TeamScore>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub best_caches: Vec<BestCacheAward>,
    pub podium: Podium,
    pub warnings: Vec<ScoringWarning>,
}

/// A snapshot plus the options it is scored with. Re-create the session
/// after every refresh; it never changes once built.
#[derive(Debug, Clone)]
pub struct ScoringSession {
    snapshot: Snapshot,
    options: ScoringOptions,
}

impl ScoringSession {
    pub fn new(snapshot: Snapshot, options: ScoringOptions) -> Self {
        Self { snapshot, options }
    }

    pub fn from_config(snapshot: Snapshot, config: &ScoringConfig) -> Self {
        let options = ScoringOptions::resolve(config, &snapshot);
        Self::new(snapshot, options)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn options(&self) -> &ScoringOptions {
        &self.options
    }

    fn score_team(&self, team: &Team) -> TeamScore {
        let result = calculate_score(team, &self.snapshot, &self.options);
        TeamScore {
            team_id: team.team_id,
            team_name: team.team_name.clone(),
            competing: team.competing,
            trad_find_points: result.totals.trad_find_points,
            extra_find_points: result.totals.extra_find_points,
            hide_points: result.totals.hide_points,
            penalties: result.totals.penalties,
            computed_total: result.computed_total,
            final_score: team.final_score,
            reconciliation_status: result.status,
            breakdown: result.breakdown,
            warnings: result.warnings,
        }
    }

    /// Scores for every team, ordered by name (case-insensitive).
    pub fn team_scores(&self) -> Vec<TeamScore> {
        let mut scores: Vec<TeamScore> = self.snapshot.teams.iter().map(|t| self.score_team(t)).collect();
        scores.sort_by(|a, b| {
            a.team_name
                .to_lowercase()
                .cmp(&b.team_name.to_lowercase())
                .then(a.team_id.cmp(&b.team_id))
        });
        debug!(
            "Scored {} teams, {} mismatched",
            scores.len(),
            scores.iter().filter(|s| s.reconciliation_status.is_mismatch()).count()
        );
        scores
    }

    pub fn team_score(&self, team_id: TeamId) -> Option<TeamScore> {
        self.snapshot.team(team_id).map(|t| self.score_team(t))
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        rank_teams(
            &self.snapshot.teams,
            self.options.ranking,
            self.options.include_non_competing,
        )
    }

    /// Award data always covers competing teams only.
    pub fn podium(&self) -> Podium {
        Podium::from_leaderboard(&rank_teams(&self.snapshot.teams, self.options.ranking, false))
    }

    pub fn best_cache_awards(&self) -> Vec<BestCacheAward> {
        best_cache_awards(&self.snapshot, self.options.hide_mode)
    }

    /// Snapshot-level warnings followed by each team's scoring warnings.
    pub fn warnings(&self) -> Vec<ScoringWarning> {
        let mut warnings = check_snapshot(&self.snapshot);
        for team in &self.snapshot.teams {
            warnings.extend(calculate_score(team, &self.snapshot, &self.options).warnings);
        }
        warnings
    }

    pub fn report(&self, generated_at: DateTime<Utc>) -> ScoringReport {
        ScoringReport {
            generated_at,
            hide_mode: self.options.hide_mode,
            ranking: self.options.ranking,
            teams: self.team_scores(),
            leaderboard: self.leaderboard(),
            best_caches: self.best_cache_awards(),
            podium: self.podium(),
            warnings: self.warnings(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::fixtures;
    use crate::snapshot::CacheNumber;
    use chrono::TimeZone;

    fn session() -> ScoringSession {
        ScoringSession::from_config(fixtures::snapshot(), &ScoringConfig::default())
    }

    #[test]
    fn test_team_scores_sorted_by_name() {
        let scores = session().team_scores();
        let names: Vec<&str> = scores.iter().map(|s| s.team_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "bravo", "Charlie", "Delta"]);

        let statuses: Vec<ReconciliationStatus> =
            scores.iter().map(|s| s.reconciliation_status).collect();
        assert_eq!(
            statuses,
            vec![
                ReconciliationStatus::Consistent,
                ReconciliationStatus::Mismatch,
                ReconciliationStatus::Unset,
                ReconciliationStatus::Disqualified,
            ]
        );
    }

    #[test]
    fn test_team_score_json_shape() {
        let score = session().team_score(TeamId(1)).unwrap();
        let json = serde_json::to_value(&score).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "team_id": 1,
                "team_name": "Alpha",
                "competing": true,
                "trad_find_points": 40,
                "extra_find_points": 6,
                "hide_points": 10,
                "penalties": -19,
                "computed_total": 37,
                "final_score": 370,
                "reconciliation_status": "consistent"
            })
        );
    }

    #[test]
    fn test_leaderboard_excludes_non_competing() {
        let board = session().leaderboard();
        let ids: Vec<TeamId> = board.iter().map(|e| e.team_id).collect();
        assert_eq!(ids, vec![TeamId(1), TeamId(2), TeamId(4)]);

        let config = ScoringConfig {
            include_non_competing: Some(true),
            ..Default::default()
        };
        let session = ScoringSession::from_config(fixtures::snapshot(), &config);
        assert_eq!(session.leaderboard().len(), 4);
    }

    #[test]
    fn test_warnings_combine_snapshot_and_teams() {
        let warnings = session().warnings();
        assert_eq!(
            warnings,
            vec![
                ScoringWarning::UnallocatedCache {
                    cache: CacheNumber(5)
                },
                ScoringWarning::FindOnCacheNotInGpx {
                    team_id: TeamId(1),
                    cache: CacheNumber(5)
                },
                ScoringWarning::UnknownExtrasItem {
                    team_id: TeamId(4),
                    item_id: crate::snapshot::ExtrasItemId(9),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_report_serializes() {
        let generated_at = Utc.with_ymd_and_hms(2026, 5, 2, 18, 30, 0).unwrap();
        let report = session().report(generated_at);
        assert_eq!(report.teams.len(), 4);
        assert_eq!(report.podium.winner().map(|e| e.team_id), Some(TeamId(1)));
        assert!(report.podium.naga().is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["generated_at"], "2026-05-02T18:30:00Z");
        assert_eq!(json["hide_mode"], "per_category");
        assert_eq!(json["ranking"], "competition");
        assert_eq!(json["best_caches"][0]["category"], "Creative");
    }
}
