//! Configuration file support for Sovscan
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.sovscanrc.json` in the working directory
//! 3. `sovscan.config.json` in the working directory
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::scoring::{CategoryWeights, WeightRow};
use crate::services::ServiceCatalog;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default cache freshness window, in hours.
pub const DEFAULT_CACHE_MAX_AGE_HOURS: u64 = 1;

/// Default cache database file name (created in the working directory).
pub const DEFAULT_CACHE_FILE: &str = "sovscan.db";

/// Sovscan configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SovscanConfig {
    /// Path to a known-services table (JSON array of catalog entries).
    /// Relative paths resolve against the config file's directory.
    #[serde(default)]
    pub known_services: Option<PathBuf>,

    /// Category-weight rows; a non-empty list replaces the built-in table
    /// (row order is lookup precedence)
    #[serde(default)]
    pub category_weights: Vec<WeightRow>,

    /// Cache database path (default: `sovscan.db`)
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Cache freshness window in hours (default: 1)
    #[serde(default)]
    pub cache_max_age_hours: Option<u64>,

    /// Only report assessments scoring at or below this value
    #[serde(default)]
    pub max_score: Option<i32>,

    /// Maximum number of results to show
    #[serde(default)]
    pub top: Option<usize>,
}

/// Resolved configuration with loaded tables, ready for use
#[derive(Debug)]
pub struct ResolvedConfig {
    pub catalog: ServiceCatalog,
    pub weights: CategoryWeights,
    pub cache_path: PathBuf,
    pub cache_max_age_hours: u64,
    pub max_score: Option<i32>,
    pub top_n: Option<usize>,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl SovscanConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        for row in &self.category_weights {
            if row.category.trim().is_empty() {
                anyhow::bail!("category_weights entries must name a category");
            }
            if row.weight <= 0.0 {
                anyhow::bail!(
                    "category_weights.{} must be positive (got {})",
                    row.category,
                    row.weight
                );
            }
            if row.weight > 10.0 {
                anyhow::bail!(
                    "category_weights.{} must be at most 10.0 (got {})",
                    row.category,
                    row.weight
                );
            }
        }

        if let Some(max) = self.max_score {
            if !(0..=100).contains(&max) {
                anyhow::bail!("max_score must be between 0 and 100 (got {})", max);
            }
        }

        Ok(())
    }

    /// Resolve config into loaded form ready for use.
    ///
    /// `base_dir` anchors relative paths (the config file's directory, or the
    /// working directory when no config file was found).
    pub fn resolve(&self, base_dir: &Path) -> Result<ResolvedConfig> {
        self.validate()?;

        let catalog = match &self.known_services {
            Some(path) => ServiceCatalog::load(&anchor(base_dir, path))?,
            None => ServiceCatalog::builtin(),
        };

        let weights = if self.category_weights.is_empty() {
            CategoryWeights::default()
        } else {
            CategoryWeights::from_rows(self.category_weights.clone())
        };

        let cache_path = self
            .cache_path
            .as_ref()
            .map(|p| anchor(base_dir, p))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE));

        Ok(ResolvedConfig {
            catalog,
            weights,
            cache_path,
            cache_max_age_hours: self
                .cache_max_age_hours
                .unwrap_or(DEFAULT_CACHE_MAX_AGE_HOURS),
            max_score: self.max_score,
            top_n: self.top,
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        SovscanConfig::default().resolve(Path::new("."))
    }
}

fn anchor(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Discover and load a config file from the working directory
///
/// Search order:
/// 1. `.sovscanrc.json`
/// 2. `sovscan.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(root: &Path) -> Result<Option<(SovscanConfig, PathBuf)>> {
    let rc_path = root.join(".sovscanrc.json");
    if rc_path.exists() {
        let config = load_config_file(&rc_path)?;
        return Ok(Some((config, rc_path)));
    }

    let config_path = root.join("sovscan.config.json");
    if config_path.exists() {
        let config = load_config_file(&config_path)?;
        return Ok(Some((config, config_path)));
    }

    Ok(None)
}

/// Load and parse a config file from an explicit path
pub fn load_config_file(path: &Path) -> Result<SovscanConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: SovscanConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config for a working directory
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from `root`.
/// Returns default config if nothing is found.
pub fn load_and_resolve(root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(root)? {
            Some((config, path)) => (config, Some(path)),
            None => (SovscanConfig::default(), None),
        }
    };

    // Relative paths inside the config resolve against the config file's
    // directory, or the working directory when using defaults.
    let base_dir = source_path
        .as_deref()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(root);

    let mut resolved = config.resolve(base_dir)?;
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_resolves_to_defaults() {
        let resolved = ResolvedConfig::defaults().expect("defaults");
        assert!(!resolved.catalog.is_empty());
        assert_eq!(resolved.weights.weight_for("Payment Processing"), 1.4);
        assert_eq!(resolved.cache_max_age_hours, DEFAULT_CACHE_MAX_AGE_HOURS);
        assert_eq!(resolved.cache_path, PathBuf::from(DEFAULT_CACHE_FILE));
        assert!(resolved.max_score.is_none());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{"cach_max_age_hours": 2}"#;
        assert!(serde_json::from_str::<SovscanConfig>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_weight() {
        let json = r#"{"category_weights": [{"category": "Analytics", "weight": -1.0}]}"#;
        let config: SovscanConfig = serde_json::from_str(json).expect("parse");
        let err = config.validate().expect_err("should fail");
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_max_score() {
        let config = SovscanConfig {
            max_score: Some(250),
            ..SovscanConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weight_rows_replace_builtin_table() {
        let json = r#"{"category_weights": [{"category": "Analytics", "weight": 3.0}]}"#;
        let config: SovscanConfig = serde_json::from_str(json).expect("parse");
        let resolved = config.resolve(Path::new(".")).expect("resolve");
        assert_eq!(resolved.weights.weight_for("Analytics"), 3.0);
        // Rows replace the whole table; everything else falls back to 1.0.
        assert_eq!(resolved.weights.weight_for("Payment Processing"), 1.0);
    }

    #[test]
    fn test_discovery_prefers_rc_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(".sovscanrc.json"), r#"{"top": 1}"#).expect("write rc");
        std::fs::write(
            dir.path().join("sovscan.config.json"),
            r#"{"top": 2}"#,
        )
        .expect("write config");
        let (config, path) = discover_config(dir.path())
            .expect("discover")
            .expect("found");
        assert_eq!(config.top, Some(1));
        assert!(path.ends_with(".sovscanrc.json"));
    }

    #[test]
    fn test_discovery_returns_none_when_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(discover_config(dir.path()).expect("discover").is_none());
    }

    #[test]
    fn test_load_and_resolve_explicit_path_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(".sovscanrc.json"), r#"{"top": 1}"#).expect("write rc");
        std::fs::write(dir.path().join("custom.json"), r#"{"top": 9}"#).expect("write custom");
        let resolved = load_and_resolve(dir.path(), Some(&dir.path().join("custom.json")))
            .expect("load and resolve");
        assert_eq!(resolved.top_n, Some(9));
        assert!(resolved
            .config_path
            .as_deref()
            .expect("config path")
            .ends_with("custom.json"));
    }

    #[test]
    fn test_relative_known_services_path_anchors_to_base_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = r#"[{
            "fragment": "example-analytics.io",
            "name": "Example Analytics",
            "jurisdiction": "Germany (EU)",
            "category": "Analytics",
            "risk_level": "Low"
        }]"#;
        std::fs::write(dir.path().join("services.json"), services).expect("write services");
        let config = SovscanConfig {
            known_services: Some(PathBuf::from("services.json")),
            ..SovscanConfig::default()
        };
        let resolved = config.resolve(dir.path()).expect("resolve");
        assert_eq!(resolved.catalog.len(), 1);
        assert_eq!(
            resolved.catalog.identify("cdn.example-analytics.io").name,
            "Example Analytics"
        );
    }
}
