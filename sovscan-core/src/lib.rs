//! Sovscan core library - data sovereignty risk scoring for web services

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Scoring is total: absent or malformed facts are scoring branches, not errors
// - The final score is always clamped to [0, 100]
// - No global mutable state
// - Deterministic output: identical input yields byte-for-byte identical output
// - Network access never happens here; pages and fact bundles arrive as data

pub mod cache;
pub mod config;
pub mod facts;
pub mod jurisdiction;
pub mod merge;
pub mod report;
pub mod resources;
pub mod scoring;
pub mod services;

pub use cache::{normalize_target, CacheGateway};
pub use config::{ResolvedConfig, SovscanConfig};
pub use facts::{FactBundle, Vendor};
pub use report::{render_json, render_scan_json, render_scan_text, render_text, truncate_or_pad};
pub use resources::ResourceScan;
pub use scoring::{score_bundle, CategoryWeights, RiskLevel, ScoreResult};
pub use services::ServiceCatalog;

/// A full page assessment: what was found, what was scored, and the score.
#[derive(Debug, Clone)]
pub struct PageAssessment {
    pub scan: ResourceScan,
    /// The input bundle with detected services merged into its vendor list.
    pub bundle: FactBundle,
    pub result: ScoreResult,
}

/// Assess a page: extract embedded resources from its markup, merge the
/// detected services into the bundle's vendor list, and score the merged
/// bundle.
pub fn assess_page(
    markup: &str,
    page_url: &str,
    bundle: &FactBundle,
    catalog: &ServiceCatalog,
    weights: &CategoryWeights,
) -> PageAssessment {
    let scan = resources::extract(markup, page_url, catalog);
    let vendors = merge::merge_services(&bundle.vendors, &scan.distinct_services());
    let bundle = FactBundle {
        vendors,
        ..bundle.clone()
    };
    let result = score_bundle(&bundle, weights);
    PageAssessment {
        scan,
        bundle,
        result,
    }
}
