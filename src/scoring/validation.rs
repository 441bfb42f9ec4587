use super::config::ScoringConfig;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.counted_hides == Some(0) {
        errors.push(
            "scoring.counted_hides: must be at least 1 (omit it to count every hidden cache)"
                .to_string(),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::RankingStyle;

    #[test]
    fn test_valid_config() {
        let config = ScoringConfig {
            counted_hides: Some(2),
            use_totals_for_best_cache_calculation: Some(true),
            ranking: Some(RankingStyle::Dense),
            include_non_competing: None,
        };
        assert!(validate_scoring(&config).is_ok());
        assert!(validate_scoring(&ScoringConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_counted_hides() {
        let config = ScoringConfig {
            counted_hides: Some(0),
            ..Default::default()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("counted_hides"));
    }
}
