use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::lenient;

/// Final score value that marks a team as disqualified / did not finish.
pub const DISQUALIFIED_SCORE: i64 = -1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub i64);

/// 1-based cache number, as printed on the handout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheNumber(pub u32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtrasItemId(pub i64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointSourceId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CacheNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ExtrasItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PointSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl CacheNumber {
    /// Zero-based index into per-cache tables.
    pub fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }

    pub fn from_index(index: usize) -> Self {
        CacheNumber(u32::try_from(index + 1).unwrap_or(u32::MAX))
    }
}

impl ExtrasItemId {
    /// The backend records minutes late as a find on this pseudo item.
    pub const LATE: ExtrasItemId = ExtrasItemId(-1);
}

/// Manually entered, authoritative team score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FinalScore {
    /// Not entered yet
    #[default]
    Unset,
    /// Disqualified or did not finish
    Disqualified,
    /// Score in tenths of a point
    Tenths(i64),
}

impl FinalScore {
    pub fn from_tenths(value: Option<i64>) -> Self {
        match value {
            None => FinalScore::Unset,
            Some(t) if t <= DISQUALIFIED_SCORE => FinalScore::Disqualified,
            Some(t) => FinalScore::Tenths(t),
        }
    }

    /// The wire representation: null, -1000, or tenths.
    pub fn as_tenths(&self) -> Option<i64> {
        match self {
            FinalScore::Unset => None,
            FinalScore::Disqualified => Some(DISQUALIFIED_SCORE),
            FinalScore::Tenths(t) => Some(*t),
        }
    }

    /// Parse operator input given in points.
    ///
    /// Empty input clears the score, "dsq"/"dnf" disqualifies, anything else
    /// is a decimal number of points stored as `max(round(points * 10), -1000)`.
    pub fn parse_points(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Some(FinalScore::Unset);
        }
        if ["dsq", "dnf", "dsq/dnf"]
            .iter()
            .any(|s| input.eq_ignore_ascii_case(s))
        {
            return Some(FinalScore::Disqualified);
        }
        let points = input.parse::<f64>().ok().filter(|p| p.is_finite())?;
        Some(Self::from_points(points))
    }

    pub fn from_points(points: f64) -> Self {
        let tenths = ((points * 10.0).round() as i64).max(DISQUALIFIED_SCORE);
        FinalScore::from_tenths(Some(tenths))
    }
}

impl fmt::Display for FinalScore {
    /// Blank when unset, "DSQ/DNF" when disqualified, otherwise points with
    /// at most one decimal ("37", "37.5").
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalScore::Unset => Ok(()),
            FinalScore::Disqualified => write!(f, "DSQ/DNF"),
            FinalScore::Tenths(t) => {
                let sign = if *t < 0 { "-" } else { "" };
                let abs = t.unsigned_abs();
                if abs % 10 == 0 {
                    write!(f, "{}{}", sign, abs / 10)
                } else {
                    write!(f, "{}{}.{}", sign, abs / 10, abs % 10)
                }
            }
        }
    }
}

impl Serialize for FinalScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_tenths().serialize(serializer)
    }
}

/// Hide-or-find designation of a per-cache point source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PointKind {
    Hide,
    Find,
    #[default]
    Other,
}

impl From<String> for PointKind {
    fn from(s: String) -> Self {
        match s.trim() {
            "H" | "h" => PointKind::Hide,
            "F" | "f" => PointKind::Find,
            _ => PointKind::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Team {
    pub team_id: TeamId,
    #[serde(default, deserialize_with = "lenient::de_text")]
    pub team_name: String,
    #[serde(default, deserialize_with = "lenient::de_text")]
    pub team_members: String,
    #[serde(default = "default_competing", deserialize_with = "lenient::de_flag")]
    pub competing: bool,
    /// Caches hidden by this team
    #[serde(default, deserialize_with = "lenient::de_cache_numbers")]
    pub caches: Vec<CacheNumber>,
    /// Index 0 is cache 1
    #[serde(default, deserialize_with = "lenient::de_flags")]
    pub trad_finds: Vec<bool>,
    #[serde(default, deserialize_with = "lenient::de_extras_counts")]
    pub extra_finds: BTreeMap<ExtrasItemId, i64>,
    #[serde(default, deserialize_with = "lenient::de_int")]
    pub not_returned_caches: i64,
    #[serde(default, deserialize_with = "lenient::de_opt_int")]
    pub late: Option<i64>,
    #[serde(default, deserialize_with = "lenient::de_final_score")]
    pub final_score: FinalScore,
}

fn default_competing() -> bool {
    true
}

impl Team {
    pub fn found(&self, cache: CacheNumber) -> bool {
        cache
            .index()
            .and_then(|i| self.trad_finds.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// Iterate over the caches this team is recorded as having found.
    pub fn found_caches(&self) -> impl Iterator<Item = CacheNumber> + '_ {
        self.trad_finds
            .iter()
            .enumerate()
            .filter(|(_, found)| **found)
            .map(|(i, _)| CacheNumber::from_index(i))
    }

    pub fn extra_count(&self, item: ExtrasItemId) -> i64 {
        self.extra_finds.get(&item).copied().unwrap_or(0)
    }

    /// Minutes late, falling back to the backend's pseudo extras item.
    pub fn late_minutes(&self) -> i64 {
        self.late
            .or_else(|| self.extra_finds.get(&ExtrasItemId::LATE).copied())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Cache {
    #[serde(default)]
    pub cache_number: CacheNumber,
    #[serde(default, deserialize_with = "lenient::de_opt_team_id")]
    pub team_id: Option<TeamId>,
    /// Present in the published GPX file
    #[serde(default, deserialize_with = "lenient::de_flag")]
    pub has_coordinates: bool,
    /// Present on the handout sheet
    #[serde(default, deserialize_with = "lenient::de_flag")]
    pub handout: bool,
    #[serde(default, deserialize_with = "lenient::de_flag")]
    pub returned: bool,
    #[serde(default, deserialize_with = "lenient::de_int")]
    pub total_hide_points: i64,
    #[serde(default, deserialize_with = "lenient::de_int")]
    pub total_find_points: i64,
}

/// A per-cache point table, e.g. walking distance or creativity points.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PointSource {
    pub id: PointSourceId,
    #[serde(default, deserialize_with = "lenient::de_text")]
    pub item_name: String,
    #[serde(default)]
    pub hide_or_find: PointKind,
    #[serde(default, deserialize_with = "lenient::de_int_list")]
    pub points_list: Vec<i64>,
}

impl PointSource {
    pub fn points_for(&self, cache: CacheNumber) -> i64 {
        cache
            .index()
            .and_then(|i| self.points_list.get(i))
            .copied()
            .unwrap_or(0)
    }
}

/// A bonus item scored by count, e.g. puzzles solved.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtrasItem {
    pub id: ExtrasItemId,
    #[serde(default, deserialize_with = "lenient::de_text")]
    pub short_name: String,
    #[serde(default, deserialize_with = "lenient::de_text")]
    pub long_name: String,
    #[serde(default, deserialize_with = "lenient::de_int")]
    pub point_value: i64,
}

impl ExtrasItem {
    pub fn display_name(&self) -> &str {
        if self.long_name.is_empty() {
            &self.short_name
        } else {
            &self.long_name
        }
    }
}

/// A record that could not be parsed and was left out of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub section: &'static str,
    pub index: usize,
    pub reason: String,
}

/// One consistent view of the scoring data, as served by `get_scores.cgi`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub number_game_caches: u32,
    pub teams: Vec<Team>,
    /// Slot `i` describes cache `i + 1`; empty slots are caches the backend
    /// knows nothing about.
    pub cache_list: Vec<Option<Cache>>,
    pub trad_points: Vec<PointSource>,
    pub extras_points: Vec<ExtrasItem>,
    pub use_totals_for_best_cache_calculation: bool,
    pub warning_cache_not_in_handout: bool,
    pub warning_cache_not_in_gpx: bool,
    pub unallocated_caches: Vec<CacheNumber>,
    pub rejected: Vec<RejectedRecord>,
}

impl Snapshot {
    pub fn cache(&self, number: CacheNumber) -> Option<&Cache> {
        if number.0 > self.number_game_caches {
            return None;
        }
        number
            .index()
            .and_then(|i| self.cache_list.get(i))
            .and_then(Option::as_ref)
    }

    pub fn caches(&self) -> impl Iterator<Item = &Cache> {
        self.cache_list.iter().flatten()
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.team_id == id)
    }

    pub fn hide_sources(&self) -> impl Iterator<Item = &PointSource> {
        self.trad_points
            .iter()
            .filter(|p| p.hide_or_find == PointKind::Hide)
    }

    pub fn point_source(&self, id: PointSourceId) -> Option<&PointSource> {
        self.trad_points.iter().find(|p| p.id == id)
    }

    pub fn extras_item(&self, id: ExtrasItemId) -> Option<&ExtrasItem> {
        self.extras_points.iter().find(|e| e.id == id)
    }
}
