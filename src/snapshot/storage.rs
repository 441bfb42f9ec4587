use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

use super::mutation::Mutation;
use super::types::Snapshot;

/// Read a saved `get_scores.cgi` response without interpreting it.
pub fn load_snapshot_value(path: &Path) -> Result<Value> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open snapshot file at {}", path.display()))?;
    let value = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse snapshot file at {}", path.display()))?;
    Ok(value)
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let value = load_snapshot_value(path)?;
    let snapshot = Snapshot::from_value(value)
        .with_context(|| format!("Invalid snapshot in {}", path.display()))?;
    debug!("Loaded snapshot from {}", path.display());
    Ok(snapshot)
}

/// Write JSON to `path` atomically, creating the parent directory if needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, value)
        .with_context(|| format!("Failed to serialize JSON for {}", path.display()))?;

    file.commit()
        .with_context(|| format!("Failed to save {}", path.display()))?;

    Ok(())
}

/// Apply updates to a saved snapshot file in one read-modify-write cycle.
///
/// Nothing is written unless every update applies cleanly.
pub fn apply_to_file(path: &Path, mutations: &[Mutation]) -> Result<()> {
    let mut doc = load_snapshot_value(path)?;
    for mutation in mutations {
        mutation
            .apply_to_value(&mut doc)
            .with_context(|| format!("Failed to {}", mutation))?;
    }
    write_json(path, &doc)?;
    debug!("Applied {} update(s) to {}", mutations.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::types::{ExtrasItemId, FinalScore, TeamId};
    use serde_json::json;
    use std::env;

    fn sample() -> Value {
        json!({
            "number_game_caches": 2,
            "teams": [{"team_id": 1, "team_name": "Alpha", "final_score": null}],
            "cache_list": [],
            "trad_points": [],
            "extras_points": [],
            "generated_by": "backup"
        })
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let temp_path = env::temp_dir().join("jlwe_scoring_test_missing.json");
        let _ = fs::remove_file(&temp_path);

        let err = load_snapshot(&temp_path).unwrap_err();
        assert!(err.to_string().contains("Failed to open snapshot file"));
    }

    #[test]
    fn test_apply_to_file_roundtrip() {
        let temp_path = env::temp_dir().join("jlwe_scoring_test_apply.json");
        write_json(&temp_path, &sample()).unwrap();

        let mutations = vec![
            Mutation::SetFinalScore {
                team_id: TeamId(1),
                final_score: FinalScore::Tenths(425),
            },
            Mutation::SetExtraFindCount {
                team_id: TeamId(1),
                item_id: ExtrasItemId(3),
                count: 2,
            },
        ];
        apply_to_file(&temp_path, &mutations).unwrap();

        let snapshot = load_snapshot(&temp_path).unwrap();
        let team = snapshot.team(TeamId(1)).unwrap();
        assert_eq!(team.final_score, FinalScore::Tenths(425));
        assert_eq!(team.extra_count(ExtrasItemId(3)), 2);

        let raw = load_snapshot_value(&temp_path).unwrap();
        assert_eq!(raw["generated_by"], json!("backup"));

        let _ = fs::remove_file(&temp_path);
    }

    #[test]
    fn test_failed_update_leaves_file_untouched() {
        let temp_path = env::temp_dir().join("jlwe_scoring_test_untouched.json");
        write_json(&temp_path, &sample()).unwrap();

        let mutations = vec![
            Mutation::SetLateMinutes {
                team_id: TeamId(1),
                minutes: 5,
            },
            Mutation::SetLateMinutes {
                team_id: TeamId(2),
                minutes: 5,
            },
        ];
        assert!(apply_to_file(&temp_path, &mutations).is_err());

        let raw = load_snapshot_value(&temp_path).unwrap();
        assert!(raw["teams"][0].get("late").is_none());

        let _ = fs::remove_file(&temp_path);
    }
}
