//! Award presentation data derived from the leaderboard.

use serde::Serialize;

use super::ranking::LeaderboardEntry;
use crate::snapshot::FinalScore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Podium {
    /// Teams with a numeric score, best first
    pub places: Vec<LeaderboardEntry>,
    pub disqualified: Vec<LeaderboardEntry>,
}

impl Podium {
    pub fn from_leaderboard(entries: &[LeaderboardEntry]) -> Self {
        let mut podium = Podium::default();
        for entry in entries {
            match entry.final_score {
                FinalScore::Tenths(_) => podium.places.push(entry.clone()),
                FinalScore::Disqualified => podium.disqualified.push(entry.clone()),
                FinalScore::Unset => {}
            }
        }
        podium
    }

    pub fn winner(&self) -> Option<&LeaderboardEntry> {
        self.places.first()
    }

    pub fn runner_up(&self) -> Option<&LeaderboardEntry> {
        self.places.get(1)
    }

    /// Last place, awarded only when at least three teams placed.
    pub fn naga(&self) -> Option<&LeaderboardEntry> {
        if self.places.len() >= 3 {
            self.places.last()
        } else {
            None
        }
    }

    /// Places `start..=end` (1-based) in presentation order, i.e. worst first.
    /// Last place is held back for the NAGA award, so `end` is clamped to the
    /// second-last place.
    pub fn places_range(&self, start: usize, end: usize) -> Vec<&LeaderboardEntry> {
        let last = self.places.len().saturating_sub(1);
        if start == 0 || end == 0 || start > last {
            return Vec::new();
        }
        let end = end.min(last);
        if start > end {
            return Vec::new();
        }
        self.places[start - 1..end].iter().rev().collect()
    }
}

/// Parse a "start-end" place range such as "4-10".
pub fn parse_range(input: &str) -> Option<(usize, usize)> {
    let (start, end) = input.split_once('-')?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 22nd. Negative numbers get no
/// suffix.
pub fn ordinal(n: i64) -> String {
    if n < 0 {
        return n.to_string();
    }
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
