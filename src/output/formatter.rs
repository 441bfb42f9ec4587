use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::scoring::{
    ordinal, BestCacheAward, LeaderboardEntry, Podium, ReconciliationStatus, ScoringWarning,
    TeamScore,
};
use crate::snapshot::FinalScore;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a team name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Width of the name column: the longest name, capped by what the terminal
/// leaves after the fixed columns.
fn name_column_width<'a>(names: impl Iterator<Item = &'a str>, fixed_width: usize) -> usize {
    let longest = names.map(|n| n.chars().count()).max().unwrap_or(0).max(4);
    match get_terminal_width() {
        Some(width) if width > fixed_width + 10 => longest.min(width - fixed_width),
        Some(_) => longest.min(20),
        None => longest,
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

fn final_score_cell(score: &FinalScore) -> String {
    match score {
        FinalScore::Unset => "-".to_string(),
        other => other.to_string(),
    }
}

fn status_cell(status: ReconciliationStatus, width: usize, use_colors: bool) -> String {
    let text = format!("{:<width$}", status.to_string(), width = width);
    if !use_colors {
        return text;
    }
    match status {
        ReconciliationStatus::Consistent => text.green().to_string(),
        ReconciliationStatus::Mismatch => text.red().bold().to_string(),
        ReconciliationStatus::Unset => text.dimmed().to_string(),
        ReconciliationStatus::Disqualified => text.yellow().to_string(),
    }
}

/// Format per-team scores as a table with a header row.
/// Mismatched rows are flagged in the status column.
pub fn format_team_scores(scores: &[TeamScore], use_colors: bool) -> String {
    if scores.is_empty() {
        return "No teams found.".to_string();
    }

    // id(4) + 6 numeric columns of 7 + status(8) + separators
    let fixed_width = 5 + 6 * 8 + 10;
    let name_width = name_column_width(scores.iter().map(|s| s.team_name.as_str()), fixed_width);

    let header = format!(
        "{:>4} {}  {:>7} {:>7} {:>7} {:>7} {:>7} {:>7}  {}",
        "ID", pad("Team", name_width), "Finds", "Extras", "Hides", "Penalty", "Total", "Final", "Status"
    );
    let mut lines = vec![if use_colors {
        header.bold().to_string()
    } else {
        header
    }];

    for score in scores {
        let mut name = truncate_name(&score.team_name, name_width);
        if !score.competing && name.chars().count() + 5 <= name_width {
            name.push_str(" (nc)");
        }
        let name = pad(&name, name_width);
        let name = if use_colors && !score.competing {
            name.dimmed().to_string()
        } else {
            name
        };

        lines.push(format!(
            "{:>4} {}  {:>7} {:>7} {:>7} {:>7} {:>7} {:>7}  {}",
            score.team_id.to_string(),
            name,
            score.trad_find_points,
            score.extra_find_points,
            score.hide_points,
            score.penalties,
            score.computed_total,
            final_score_cell(&score.final_score),
            status_cell(score.reconciliation_status, 8, use_colors).trim_end(),
        ));
    }

    lines.join("\n")
}

/// Multi-line breakdown of one team's score (for verbose mode)
pub fn format_team_detail(score: &TeamScore, use_colors: bool) -> String {
    let title = format!("{} (team {})", score.team_name, score.team_id);
    let mut lines = vec![if use_colors {
        title.bold().to_string()
    } else {
        title
    }];

    for line in &score.breakdown.contributions {
        lines.push(format!(
            "  {:<28} {:>6}  {}",
            line.label, line.points, line.description
        ));
    }
    lines.push(format!("  {:<28} {:>6}", "Computed total", score.computed_total));
    lines.push(format!(
        "  {:<28} {:>6}",
        "Final score",
        final_score_cell(&score.final_score)
    ));
    lines.push(format!(
        "  {:<28} {}",
        "Status",
        status_cell(score.reconciliation_status, 0, use_colors)
    ));

    for warning in &score.warnings {
        let text = format!("  ! {}", warning);
        lines.push(if use_colors {
            text.yellow().to_string()
        } else {
            text
        });
    }

    lines.join("\n")
}

/// Format the leaderboard: position, final score, team name.
/// Disqualified and unscored teams have a blank position.
pub fn format_leaderboard(entries: &[LeaderboardEntry], use_colors: bool) -> String {
    if entries.is_empty() {
        return "No teams on the leaderboard.".to_string();
    }

    let score_width = 7;
    let name_width = name_column_width(entries.iter().map(|e| e.team_name.as_str()), 5 + score_width + 2);

    entries
        .iter()
        .map(|entry| {
            let position = match entry.position {
                Some(p) => format!("{:>3}.", p),
                None => "    ".to_string(),
            };
            let score = format!("{:>width$}", final_score_cell(&entry.final_score), width = score_width);
            let name = truncate_name(&entry.team_name, name_width);

            if use_colors {
                let score = match entry.final_score {
                    FinalScore::Tenths(_) => score.bold().to_string(),
                    FinalScore::Disqualified => score.yellow().to_string(),
                    FinalScore::Unset => score.dimmed().to_string(),
                };
                format!("{} {}  {}", position.dimmed(), score, name)
            } else {
                format!("{} {}  {}", position, score, name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_best_caches(awards: &[BestCacheAward], use_colors: bool) -> String {
    if awards.is_empty() {
        return "No hide point categories configured.".to_string();
    }

    awards
        .iter()
        .map(|award| {
            let heading = if use_colors {
                award.category.bold().to_string()
            } else {
                award.category.clone()
            };
            if award.caches.is_empty() {
                return format!("{}: no award (no cache scored any points)", heading);
            }
            let caches = award
                .caches
                .iter()
                .map(|c| match &c.team_name {
                    Some(name) => format!("cache {} ({})", c.cache, name),
                    None => format!("cache {}", c.cache),
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} ({} points): {}", heading, award.points, caches)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_warnings(warnings: &[ScoringWarning], use_colors: bool) -> String {
    if warnings.is_empty() {
        return "No data warnings.".to_string();
    }

    warnings
        .iter()
        .map(|w| {
            if use_colors {
                format!("{} {}", "!".yellow().bold(), w)
            } else {
                format!("! {}", w)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn place_line(label: &str, entry: &LeaderboardEntry) -> String {
    let place = entry
        .position
        .map(|p| format!(", {} place", ordinal(i64::from(p))))
        .unwrap_or_default();
    let members = if entry.team_members.is_empty() {
        String::new()
    } else {
        format!(" [{}]", entry.team_members)
    };
    format!(
        "{}: {}{} ({} points{})",
        label, entry.team_name, members, entry.final_score, place
    )
}

/// Award ceremony summary: winner, runner-up, NAGA, requested place ranges
/// and disqualified teams.
pub fn format_podium(podium: &Podium, ranges: &[(usize, usize)], use_colors: bool) -> String {
    let mut lines = Vec::new();

    match podium.winner() {
        Some(entry) => lines.push(place_line("Winner", entry)),
        None => lines.push("No final scores entered yet.".to_string()),
    }
    if let Some(entry) = podium.runner_up() {
        lines.push(place_line("Runner-up", entry));
    }
    if let Some(entry) = podium.naga() {
        lines.push(place_line("NAGA", entry));
    }

    for &(start, end) in ranges {
        let places = podium.places_range(start, end);
        if places.is_empty() {
            continue;
        }
        lines.push(String::new());
        let heading = format!("Places {}-{}:", start, end);
        lines.push(if use_colors {
            heading.bold().to_string()
        } else {
            heading
        });
        for entry in places {
            let position = entry.position.map(|p| ordinal(i64::from(p))).unwrap_or_default();
            lines.push(format!(
                "  {:>5}  {}  ({} points)",
                position, entry.team_name, entry.final_score
            ));
        }
    }

    if !podium.disqualified.is_empty() {
        lines.push(String::new());
        let names = podium
            .disqualified
            .iter()
            .map(|e| e.team_name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let text = format!("Disqualified: {}", names);
        lines.push(if use_colors {
            text.yellow().to_string()
        } else {
            text
        });
    }

    lines.join("\n")
}

/// Format team scores as tab-separated values for scripting
/// Columns: team_id, team_name, finds, extras, hides, penalties, computed,
/// final (tenths, empty when unset), status (no headers, no colors)
pub fn format_tsv_scores(scores: &[TeamScore]) -> String {
    scores
        .iter()
        .map(|s| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                s.team_id,
                s.team_name,
                s.trad_find_points,
                s.extra_find_points,
                s.hide_points,
                s.penalties,
                s.computed_total,
                s.final_score.as_tenths().map(|t| t.to_string()).unwrap_or_default(),
                s.reconciliation_status,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Columns: position (empty when blank), final score in points, team_id, team_name
pub fn format_tsv_leaderboard(entries: &[LeaderboardEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "{}\t{}\t{}\t{}",
                e.position.map(|p| p.to_string()).unwrap_or_default(),
                e.final_score,
                e.team_id,
                e.team_name
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
