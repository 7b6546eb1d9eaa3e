use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Per-run directory for save files written by a scenario.
pub fn run_dir(base: &Path, scenario: &str, seed: u64) -> PathBuf {
    let ts = Utc::now().format("%Y%m%dT%H%M%S%.f");
    base.join(scenario).join(format!("seed-{seed}")).join(ts.to_string())
}

/// Default base directory for scenario saves.
pub fn default_save_base() -> PathBuf {
    std::env::temp_dir().join("dillo-tester")
}

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse decimal or `0x`-prefixed hexadecimal seeds.
pub fn parse_seeds(raw: &str) -> Result<Vec<u64>> {
    split_csv(raw)
        .iter()
        .map(|token| {
            let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
                None => token.replace('_', "").parse::<u64>(),
            };
            parsed.with_context(|| format!("invalid seed {token:?}"))
        })
        .collect()
}
