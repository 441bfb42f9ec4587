pub mod awards;
pub mod config;
pub mod consistency;
pub mod engine;
pub mod podium;
pub mod ranking;
pub mod reconcile;
pub mod session;
pub mod validation;
pub mod warnings;

#[cfg(test)]
pub(crate) mod fixtures;

pub use awards::{best_cache_awards, determine_best_cache_awards, BestCacheAward, HideSelector};
pub use config::*;
pub use consistency::check_snapshot;
pub use engine::{calculate_score, compute_category_totals, CategoryTotals, ScoreResult};
pub use podium::{ordinal, parse_range, Podium};
pub use ranking::{rank_teams, LeaderboardEntry};
pub use reconcile::{reconcile, ReconciliationStatus};
pub use session::{ScoringReport, ScoringSession, TeamScore};
pub use validation::validate_scoring;
pub use warnings::ScoringWarning;
