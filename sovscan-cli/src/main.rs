//! Sovscan CLI - data sovereignty risk scoring for web services

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output
// - Cache failures degrade to uncached runs, never to errors

use anyhow::Context;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use sovscan_core::cache::normalize_target;
use sovscan_core::facts::Vendor;
use sovscan_core::{
    assess_page, config, render_scan_json, render_scan_text, render_text, resources, score_bundle,
    truncate_or_pad, CacheGateway, FactBundle, ScoreResult, ServiceCatalog,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sovscan")]
#[command(about = "Score the data sovereignty risk of web-facing organizations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one or more fact bundle files
    Score {
        /// Fact bundle JSON files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Target URL used as the cache key (single-file runs only)
        #[arg(long)]
        target: Option<String>,

        /// Skip cache lookup and storage
        #[arg(long)]
        no_cache: bool,

        /// Cache database path (overrides config file)
        #[arg(long)]
        cache_path: Option<PathBuf>,

        /// Cache freshness window in hours (overrides config file)
        #[arg(long)]
        max_age_hours: Option<u64>,

        /// Only report assessments scoring at or below this value (overrides config file)
        #[arg(long)]
        max_score: Option<i32>,

        /// Show only top N results, riskiest first (overrides config file)
        #[arg(long)]
        top: Option<usize>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Extract external resources from a saved page and identify their services
    Scan {
        /// Saved page markup (HTML file)
        page: PathBuf,

        /// The page's own URL, for resolving relative references
        #[arg(long)]
        url: String,

        /// Fact bundle to merge detected services into and score
        #[arg(long)]
        bundle: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Identify the services behind one or more domains
    Identify {
        /// Domains to look up
        #[arg(required = true)]
        domains: Vec<String>,

        /// Known-services table (JSON; default: built-in table)
        #[arg(long)]
        services: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Validate or show configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without scoring anything
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            files,
            format,
            target,
            no_cache,
            cache_path,
            max_age_hours,
            max_score,
            top,
            config: config_path,
        } => {
            if target.is_some() && files.len() != 1 {
                anyhow::bail!("--target applies to a single bundle file");
            }

            let root = std::env::current_dir()?;
            let resolved = config::load_and_resolve(&root, config_path.as_deref())
                .context("failed to load configuration")?;
            if let Some(ref p) = resolved.config_path {
                eprintln!("Using config: {}", p.display());
            }

            // CLI flags override config file values
            let effective_cache_path = cache_path.unwrap_or_else(|| resolved.cache_path.clone());
            let effective_max_age = max_age_hours.unwrap_or(resolved.cache_max_age_hours);
            let effective_max_score = max_score.or(resolved.max_score);
            let effective_top = top.or(resolved.top_n);

            // Cache fast path: a fresh entry for the target short-circuits
            // scoring entirely.
            if let Some(ref target) = target {
                if !no_cache {
                    if let Some(hit) =
                        cache_lookup(&effective_cache_path, target, effective_max_age)
                    {
                        eprintln!("cache hit for {}", normalize_target(target));
                        emit_scores(&[(files[0].clone(), Vec::new(), hit)], format)?;
                        return Ok(());
                    }
                }
            }

            let weights = &resolved.weights;
            let mut scored: Vec<(PathBuf, Vec<Vendor>, ScoreResult)> = files
                .par_iter()
                .map(|path| {
                    let json = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read bundle: {}", path.display()))?;
                    let bundle = FactBundle::from_json(&json)
                        .with_context(|| format!("invalid bundle: {}", path.display()))?;
                    let result = score_bundle(&bundle, weights);
                    Ok((path.clone(), bundle.vendors, result))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            if let Some(ref target) = target {
                if !no_cache {
                    cache_store(&effective_cache_path, target, &scored[0].2);
                }
            }

            // Riskiest first, path as tiebreak for deterministic order.
            scored.sort_by(|a, b| a.2.score.cmp(&b.2.score).then_with(|| a.0.cmp(&b.0)));
            if let Some(max) = effective_max_score {
                scored.retain(|(_, _, result)| result.score <= max);
            }
            if let Some(n) = effective_top {
                scored.truncate(n);
            }

            emit_scores(&scored, format)?;
        }
        Commands::Scan {
            page,
            url,
            bundle,
            format,
            config: config_path,
        } => {
            let root = std::env::current_dir()?;
            let resolved = config::load_and_resolve(&root, config_path.as_deref())
                .context("failed to load configuration")?;

            let markup = std::fs::read_to_string(&page)
                .with_context(|| format!("failed to read page: {}", page.display()))?;
            let page_url = normalize_target(&url);

            match bundle {
                None => {
                    let scan = resources::extract(&markup, &page_url, &resolved.catalog);
                    match format {
                        OutputFormat::Text => print!("{}", render_scan_text(&scan)),
                        OutputFormat::Json => println!("{}", render_scan_json(&scan)),
                    }
                }
                Some(bundle_path) => {
                    let json = std::fs::read_to_string(&bundle_path).with_context(|| {
                        format!("failed to read bundle: {}", bundle_path.display())
                    })?;
                    let bundle = FactBundle::from_json(&json)
                        .with_context(|| format!("invalid bundle: {}", bundle_path.display()))?;
                    let assessed = assess_page(
                        &markup,
                        &page_url,
                        &bundle,
                        &resolved.catalog,
                        &resolved.weights,
                    );
                    match format {
                        OutputFormat::Text => {
                            print!("{}", render_scan_text(&assessed.scan));
                            println!();
                            print!(
                                "{}",
                                render_text(&assessed.result, &assessed.bundle.vendors)
                            );
                        }
                        OutputFormat::Json => {
                            let value = serde_json::json!({
                                "scan": assessed.scan,
                                "vendors": assessed.bundle.vendors,
                                "result": assessed.result,
                            });
                            println!("{}", serde_json::to_string_pretty(&value)?);
                        }
                    }
                }
            }
        }
        Commands::Identify {
            domains,
            services,
            format,
        } => {
            let catalog = match services {
                Some(path) => ServiceCatalog::load(&path)?,
                None => ServiceCatalog::builtin(),
            };
            let records: Vec<_> = domains.iter().map(|d| catalog.identify(d)).collect();
            match format {
                OutputFormat::Text => {
                    println!(
                        "{:<28} {:<26} {:<20} {:<14} {}",
                        "SERVICE", "DOMAIN", "CATEGORY", "JURISDICTION", "RISK"
                    );
                    for record in &records {
                        println!(
                            "{:<28} {:<26} {:<20} {:<14} {}",
                            truncate_or_pad(&record.name, 28),
                            truncate_or_pad(&record.domain, 26),
                            truncate_or_pad(&record.category, 20),
                            truncate_or_pad(&record.jurisdiction, 14),
                            record.risk_level
                        );
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let root = std::env::current_dir()?;
                match config::load_and_resolve(&root, path.as_deref()) {
                    Ok(resolved) => {
                        if let Some(ref p) = resolved.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&root, path.as_deref())
                    .context("failed to load configuration")?;

                println!("Configuration:");
                if let Some(ref p) = resolved.config_path {
                    println!("  Source: {}", p.display());
                } else {
                    println!("  Source: defaults (no config file found)");
                }
                println!();
                println!("Known services: {} entries", resolved.catalog.len());
                println!("Category weights: {} rows", resolved.weights.len());
                println!();
                println!("Cache:");
                println!("  path: {}", resolved.cache_path.display());
                println!("  max_age_hours: {}", resolved.cache_max_age_hours);
                println!();
                println!("Filters:");
                println!(
                    "  max_score: {}",
                    resolved
                        .max_score
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "none".to_string())
                );
                println!(
                    "  top: {}",
                    resolved
                        .top_n
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "none".to_string())
                );
            }
        },
    }

    Ok(())
}

/// Non-fatal cache lookup: any failure (including opening the database) is a
/// warning and a miss.
fn cache_lookup(cache_path: &Path, target: &str, max_age_hours: u64) -> Option<ScoreResult> {
    match CacheGateway::open(cache_path) {
        Ok(cache) => cache.lookup(target, max_age_hours),
        Err(e) => {
            eprintln!("warning: cache unavailable (proceeding without cache): {e:#}");
            None
        }
    }
}

/// Non-fatal cache store.
fn cache_store(cache_path: &Path, target: &str, result: &ScoreResult) {
    match CacheGateway::open(cache_path) {
        Ok(mut cache) => cache.store(target, result),
        Err(e) => eprintln!("warning: cache unavailable (result not stored): {e:#}"),
    }
}

/// Print scored bundles in the requested format.
fn emit_scores(
    scored: &[(PathBuf, Vec<Vendor>, ScoreResult)],
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            let show_headers = scored.len() > 1;
            for (i, (path, vendors, result)) in scored.iter().enumerate() {
                if show_headers {
                    if i > 0 {
                        println!();
                    }
                    println!("== {} ==", path.display());
                }
                print!("{}", render_text(result, vendors));
            }
        }
        OutputFormat::Json => {
            let values: Vec<serde_json::Value> = scored
                .iter()
                .map(|(path, _, result)| {
                    serde_json::json!({
                        "file": path.display().to_string(),
                        "result": result,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
    }
    Ok(())
}
