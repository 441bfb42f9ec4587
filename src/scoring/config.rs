use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

/// Scoring options from the `scoring` section of the config file.
///
/// Every field is optional; unset fields fall back to the snapshot's own
/// settings or to the defaults in [`ScoringOptions`].
///
/// Example YAML:
/// ```yaml
/// scoring:
///   counted_hides: 2
///   use_totals_for_best_cache_calculation: false
///   ranking: competition
///   include_non_competing: false
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Only the N best hidden caches earn hide points (default: all count)
    #[serde(default)]
    pub counted_hides: Option<u32>,

    /// Overrides the snapshot's flag of the same name
    #[serde(default)]
    pub use_totals_for_best_cache_calculation: Option<bool>,

    #[serde(default)]
    pub ranking: Option<RankingStyle>,

    /// Show non-competing teams on the leaderboard
    #[serde(default)]
    pub include_non_competing: Option<bool>,
}

/// How tied scores advance the next position.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RankingStyle {
    /// 1, 1, 3 ("1224")
    #[default]
    Competition,
    /// 1, 1, 2 ("1223")
    Dense,
}

/// Which per-cache hide values feed hide points and best-cache awards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HideMode {
    /// Each hide point source is totaled independently
    #[default]
    PerCategory,
    /// One combined `total_hide_points` value per cache
    CombinedTotal,
}

/// Effective options for one scoring pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringOptions {
    pub hide_mode: HideMode,
    pub counted_hides: Option<usize>,
    pub ranking: RankingStyle,
    pub include_non_competing: bool,
}

impl ScoringOptions {
    pub fn resolve(config: &ScoringConfig, snapshot: &Snapshot) -> Self {
        let use_totals = config
            .use_totals_for_best_cache_calculation
            .unwrap_or(snapshot.use_totals_for_best_cache_calculation);

        Self {
            hide_mode: if use_totals {
                HideMode::CombinedTotal
            } else {
                HideMode::PerCategory
            },
            counted_hides: config.counted_hides.map(|n| n as usize),
            ranking: config.ranking.unwrap_or_default(),
            include_non_competing: config.include_non_competing.unwrap_or(false),
        }
    }
}
