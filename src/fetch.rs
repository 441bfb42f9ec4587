use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::scoring::{ScoringConfig, ScoringSession};
use crate::snapshot::{storage, BackendClient, Mutation, Snapshot};

/// Where scoring data comes from and where updates go.
#[derive(Debug, Clone)]
pub enum ScoreSource {
    Remote(BackendClient),
    /// A saved `get_scores.cgi` response
    File(PathBuf),
}

/// Outcome of one update in a batch.
#[derive(Debug)]
pub struct MutationOutcome {
    pub mutation: Mutation,
    pub result: Result<String>,
}

impl ScoreSource {
    pub async fn load(&self) -> Result<Snapshot> {
        match self {
            ScoreSource::Remote(client) => client
                .fetch_snapshot(true)
                .await
                .context("Failed to fetch scores from the backend"),
            ScoreSource::File(path) => storage::load_snapshot(path),
        }
    }

    /// Load a fresh snapshot and wrap it in a session.
    ///
    /// Non-competing teams are always fetched so their scores can be checked;
    /// the leaderboard leaves them out unless configured otherwise.
    pub async fn load_session(&self, config: &ScoringConfig) -> Result<ScoringSession> {
        let snapshot = self.load().await?;
        if !snapshot.rejected.is_empty() {
            warn!("{} record(s) in the snapshot could not be parsed", snapshot.rejected.len());
        }
        Ok(ScoringSession::from_config(snapshot, config))
    }

    /// Apply a batch of updates.
    ///
    /// Remote updates are sent concurrently and reported individually. File
    /// updates are applied in one read-modify-write cycle, so either all of
    /// them succeed or the file is left as it was.
    pub async fn apply_all(&self, mutations: Vec<Mutation>) -> Vec<MutationOutcome> {
        match self {
            ScoreSource::Remote(client) => {
                let mut futures = FuturesUnordered::new();
                for (index, mutation) in mutations.into_iter().enumerate() {
                    let client = client.clone();
                    futures.push(async move {
                        let result = client
                            .apply(&mutation)
                            .await
                            .with_context(|| format!("Failed to {}", mutation));
                        (index, MutationOutcome { mutation, result })
                    });
                }

                let mut outcomes = Vec::new();
                while let Some(outcome) = futures.next().await {
                    outcomes.push(outcome);
                }
                outcomes.sort_by_key(|(index, _)| *index);
                let outcomes: Vec<MutationOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();

                let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
                info!("Applied {} update(s), {} failed", outcomes.len() - failed, failed);
                outcomes
            }
            ScoreSource::File(path) => match storage::apply_to_file(path, &mutations) {
                Ok(()) => mutations
                    .into_iter()
                    .map(|mutation| MutationOutcome {
                        result: Ok(format!("Saved to {}", path.display())),
                        mutation,
                    })
                    .collect(),
                Err(e) => {
                    let message = format!("{:#}", e);
                    mutations
                        .into_iter()
                        .map(|mutation| MutationOutcome {
                            result: Err(anyhow::anyhow!("Not applied: {}", message)),
                            mutation,
                        })
                        .collect()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::fixtures;
    use crate::snapshot::{FinalScore, TeamId};
    use std::env;

    fn temp_source(name: &str) -> (ScoreSource, PathBuf) {
        let path = env::temp_dir().join(name);
        std::fs::write(&path, fixtures::SNAPSHOT_JSON).unwrap();
        (ScoreSource::File(path.clone()), path)
    }

    #[tokio::test]
    async fn test_file_source_load_session() {
        let (source, path) = temp_source("jlwe_scoring_test_source.json");
        let session = source.load_session(&ScoringConfig::default()).await.unwrap();
        assert_eq!(session.snapshot().teams.len(), 4);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_file_source_apply_then_reload() {
        let (source, path) = temp_source("jlwe_scoring_test_source_apply.json");
        let outcomes = source
            .apply_all(vec![Mutation::SetFinalScore {
                team_id: TeamId(2),
                final_score: FinalScore::Tenths(260),
            }])
            .await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].result.is_ok());

        let session = source.load_session(&ScoringConfig::default()).await.unwrap();
        let bravo = session.team_score(TeamId(2)).unwrap();
        assert_eq!(bravo.final_score, FinalScore::Tenths(260));
        assert!(!bravo.reconciliation_status.is_mismatch());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_file_source_batch_is_all_or_nothing() {
        let (source, path) = temp_source("jlwe_scoring_test_source_batch.json");
        let outcomes = source
            .apply_all(vec![
                Mutation::SetLateMinutes {
                    team_id: TeamId(1),
                    minutes: 0,
                },
                Mutation::SetLateMinutes {
                    team_id: TeamId(42),
                    minutes: 3,
                },
            ])
            .await;
        assert!(outcomes.iter().all(|o| o.result.is_err()));

        let session = source.load_session(&ScoringConfig::default()).await.unwrap();
        assert_eq!(session.snapshot().team(TeamId(1)).unwrap().late_minutes(), 15);

        let _ = std::fs::remove_file(&path);
    }
}
