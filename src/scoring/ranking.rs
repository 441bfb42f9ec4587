use serde::Serialize;
use std::cmp::Ordering;

use super::config::RankingStyle;
use crate::snapshot::{FinalScore, Team, TeamId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// Blank for disqualified teams and teams without a final score
    pub position: Option<u32>,
    pub team_id: TeamId,
    pub team_name: String,
    pub team_members: String,
    pub final_score: FinalScore,
    pub competing: bool,
}

fn score_class(score: &FinalScore) -> u8 {
    match score {
        FinalScore::Tenths(_) => 0,
        FinalScore::Disqualified => 1,
        FinalScore::Unset => 2,
    }
}

fn compare_teams(a: &Team, b: &Team) -> Ordering {
    score_class(&a.final_score)
        .cmp(&score_class(&b.final_score))
        .then_with(|| match (a.final_score, b.final_score) {
            (FinalScore::Tenths(x), FinalScore::Tenths(y)) => y.cmp(&x),
            _ => Ordering::Equal,
        })
        .then_with(|| a.team_name.to_lowercase().cmp(&b.team_name.to_lowercase()))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

/// Order teams by final score and assign positions.
///
/// Tied scores share a position. With [`RankingStyle::Competition`] the next
/// score resumes at its list index + 1; with [`RankingStyle::Dense`] it takes
/// the next integer.
pub fn rank_teams(teams: &[Team], style: RankingStyle, include_non_competing: bool) -> Vec<LeaderboardEntry> {
    let mut sorted: Vec<&Team> = teams
        .iter()
        .filter(|t| include_non_competing || t.competing)
        .collect();
    sorted.sort_by(|a, b| compare_teams(a, b));

    let mut previous: Option<(i64, u32)> = None;
    sorted
        .into_iter()
        .enumerate()
        .map(|(index, team)| {
            let position = match team.final_score {
                FinalScore::Tenths(score) => {
                    let position = match (previous, style) {
                        (Some((prev_score, prev_pos)), _) if prev_score == score => prev_pos,
                        (Some((_, prev_pos)), RankingStyle::Dense) => prev_pos + 1,
                        _ => u32::try_from(index + 1).unwrap_or(u32::MAX),
                    };
                    previous = Some((score, position));
                    Some(position)
                }
                _ => None,
            };
            LeaderboardEntry {
                position,
                team_id: team.team_id,
                team_name: team.team_name.clone(),
                team_members: team.team_members.clone(),
                final_score: team.final_score,
                competing: team.competing,
            }
        })
        .collect()
}
