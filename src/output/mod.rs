pub mod formatter;

pub use formatter::{
    format_best_caches, format_leaderboard, format_podium, format_team_detail, format_team_scores,
    format_tsv_leaderboard, format_tsv_scores, format_warnings, should_use_colors,
};
