use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use super::{ensure_parent_dir, get_config_path, BackendConfig, Config, DEFAULT_TIMEOUT_SECS};
use crate::scoring::{validate_scoring, RankingStyle, ScoringConfig};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

fn parse_ranking(input: &str) -> Option<RankingStyle> {
    match input.trim().to_lowercase().as_str() {
        "competition" | "c" => Some(RankingStyle::Competition),
        "dense" | "d" => Some(RankingStyle::Dense),
        _ => None,
    }
}

fn parse_counted_hides(input: &str) -> Result<Option<u32>, String> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    match input.parse::<u32>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err("expected a whole number or 'all'".to_string()),
    }
}

/// Interactively create a config file.
///
/// Writes to `path`, or to the default config path when None. Refuses to
/// overwrite an existing file unless the user confirms.
pub fn run_init_wizard(path: Option<PathBuf>) -> Result<()> {
    let config_path = match path {
        Some(p) => p,
        None => get_config_path()?,
    };

    println!("JLWE Scoring Configuration");
    println!("==========================");
    println!();

    if config_path.exists()
        && !prompt_yes_no(
            &format!("{} already exists. Overwrite?", config_path.display()),
            false,
        )?
    {
        println!("Aborted; existing config left untouched.");
        return Ok(());
    }

    let use_backend = prompt_yes_no("Fetch scores from the admin backend?", true)?;
    let backend = if use_backend {
        let base_url = loop {
            let input = prompt("Backend CGI base URL (e.g. https://jlwe.example.org/cgi-bin/): ")?;
            match reqwest::Url::parse(&input) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => break input,
                _ => println!("  Invalid: must be an http(s) URL. Try again."),
            }
        };
        println!("  The session cookie can also be set later via {}.", super::SESSION_COOKIE_ENV);
        let cookie = prompt("Session cookie (empty to skip): ")?;
        let timeout_secs = loop {
            let input = prompt_with_default("Request timeout in seconds", &DEFAULT_TIMEOUT_SECS.to_string())?;
            match input.parse::<u64>() {
                Ok(n) if n > 0 => break n,
                _ => println!("  Invalid: must be a positive whole number. Try again."),
            }
        };
        Some(BackendConfig {
            base_url,
            session_cookie: Some(cookie).filter(|c| !c.is_empty()),
            timeout_secs: Some(timeout_secs),
        })
    } else {
        None
    };

    println!();
    let ranking = loop {
        let input = prompt_with_default("Ranking style (competition/dense)", "competition")?;
        match parse_ranking(&input) {
            Some(style) => break style,
            None => println!("  Invalid: enter 'competition' or 'dense'. Try again."),
        }
    };
    let counted_hides = loop {
        let input = prompt_with_default("Hidden caches counted per team", "all")?;
        match parse_counted_hides(&input) {
            Ok(n) => break n,
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };

    let scoring = ScoringConfig {
        counted_hides,
        ranking: Some(ranking),
        ..Default::default()
    };
    if let Err(errors) = validate_scoring(&scoring) {
        anyhow::bail!("Generated scoring config is invalid: {}", errors.join("; "));
    }

    let config = Config {
        backend,
        scoring: Some(scoring),
    };
    let yaml = serde_saphyr::to_string(&config).context("Failed to serialize config")?;

    ensure_parent_dir(&config_path)?;
    std::fs::write(&config_path, yaml)
        .with_context(|| format!("Failed to write config file at {}", config_path.display()))?;

    println!();
    println!("Config written to {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ranking() {
        assert_eq!(parse_ranking("Dense"), Some(RankingStyle::Dense));
        assert_eq!(parse_ranking("c"), Some(RankingStyle::Competition));
        assert_eq!(parse_ranking("olympic"), None);
    }

    #[test]
    fn test_parse_counted_hides() {
        assert_eq!(parse_counted_hides("all"), Ok(None));
        assert_eq!(parse_counted_hides(""), Ok(None));
        assert_eq!(parse_counted_hides("2"), Ok(Some(2)));
        assert!(parse_counted_hides("0").is_err());
        assert!(parse_counted_hides("two").is_err());
    }
}
