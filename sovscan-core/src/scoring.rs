//! Sovereignty scoring algorithm
//!
//! Converts a fact bundle into a bounded 0–100 score, a risk tier, and
//! itemized factor lists. Deterministic rule table: the score starts at 100
//! and every rule applies an additive delta; penalties record a line-item
//! deduction and a risk factor, bonuses record a positive factor.
//!
//! Global invariants enforced:
//! - The final score is always clamped to [0, 100]
//! - The risk level is a pure function of the final score
//! - Scoring never fails: absent and malformed facts are scoring branches,
//!   not errors
//! - A whole group being absent is a stronger signal than a present group
//!   holding an explicit "Unknown" value

use crate::facts::{CompanyInfo, Compliance, DataFlows, FactBundle, Infrastructure, Vendor};
use crate::jurisdiction::{is_eu, is_global, is_unknown, is_us};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Curated EU cloud providers (bonus when matched).
const EU_CLOUD_PROVIDERS: &[&str] = &[
    "HETZNER",
    "OVH",
    "SCALEWAY",
    "IONOS",
    "LEASEWEB",
    "EXOSCALE",
    "UPCLOUD",
    "FUGA",
    "CITY CLOUD",
    "OPEN TELEKOM",
];

/// Curated EU hosting platforms.
const EU_HOSTING_PLATFORMS: &[&str] = &["HETZNER", "OVH", "SCALEWAY", "IONOS"];

/// US hosting platforms other than Fly.io (which has its own EU-region rule).
const US_HOSTING_PLATFORMS: &[&str] = &["HEROKU", "VERCEL", "NETLIFY", "RAILWAY"];

/// Curated US cloud providers.
const US_CLOUD_PROVIDERS: &[&str] = &[
    "AWS",
    "AMAZON",
    "GOOGLE CLOUD",
    "GCP",
    "AZURE",
    "MICROSOFT",
];

/// High-risk AI vendor name markers. This list is deliberately closed — do
/// not extend it without revisiting the extra-penalty budget.
const AI_VENDOR_MARKERS: &[&str] = &["OPENAI", "ANTHROPIC"];

/// Cap on total points deducted across the whole vendor group.
const MAX_VENDOR_PENALTY: i32 = 45;

/// Risk tier derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Tier thresholds: 0–49 High, 50–74 Medium, 75–100 Low.
    pub fn from_score(score: i32) -> Self {
        if score < 50 {
            RiskLevel::High
        } else if score < 75 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Weight multipliers by vendor category. Higher weight = more critical
/// service. Lookup is a first-match substring scan over the table in order,
/// defaulting to 1.0 for unlisted categories.
#[derive(Debug, Clone)]
pub struct CategoryWeights {
    entries: Vec<(String, f64)>,
}

/// One row of an externally loaded weight table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WeightRow {
    pub category: String,
    pub weight: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        const DEFAULT: &[(&str, f64)] = &[
            ("AI/ML", 1.5),
            ("Payment Processing", 1.4),
            ("Database/Storage", 1.4),
            ("Cloud Storage", 1.4),
            ("Cloud Infrastructure", 1.4),
            ("Authentication", 1.3),
            ("Email Service", 1.2),
            ("Email Marketing", 1.2),
            ("Customer Support", 1.2),
            ("SMS/Communications", 1.2),
            ("Analytics", 1.0),
            ("Monitoring", 1.0),
            ("Error Tracking", 1.0),
            ("Session Replay", 1.1),
            ("CDN", 0.8),
            ("CDN/Fonts", 0.7),
            ("Tag Management", 1.1),
            ("Marketing", 0.9),
            ("A/B Testing", 0.8),
            ("Social/Advertising", 0.9),
        ];
        CategoryWeights {
            entries: DEFAULT
                .iter()
                .map(|&(c, w)| (c.to_string(), w))
                .collect(),
        }
    }
}

impl CategoryWeights {
    /// Table with no entries: every category weighs 1.0.
    pub fn empty() -> Self {
        CategoryWeights {
            entries: Vec::new(),
        }
    }

    pub fn from_rows(rows: Vec<WeightRow>) -> Self {
        CategoryWeights {
            entries: rows.into_iter().map(|r| (r.category, r.weight)).collect(),
        }
    }

    /// Deserialize from a JSON array of `{category, weight}` rows (row order
    /// is lookup precedence).
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<WeightRow> =
            serde_json::from_str(json).context("failed to deserialize category-weight table")?;
        Ok(Self::from_rows(rows))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weight for a vendor purpose string; 1.0 when nothing matches.
    pub fn weight_for(&self, purpose: &str) -> f64 {
        if purpose.trim().is_empty() {
            return 1.0;
        }
        let purpose_upper = purpose.to_uppercase();
        for (category, weight) in &self.entries {
            if purpose_upper.contains(&category.to_uppercase()) {
                return *weight;
            }
        }
        1.0
    }
}

/// The scored assessment: bounded score, tier, and itemized factors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ScoreResult {
    pub score: i32,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
    pub positive_factors: Vec<String>,
    /// Line-item ledger of applied penalties ("-N: reason"), for audit.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub deductions: Vec<String>,
}

impl ScoreResult {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to deserialize score result from JSON")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize score result to JSON")
    }
}

/// Running state while the rule table is applied.
struct Tally {
    score: i32,
    deductions: Vec<String>,
    risk_factors: Vec<String>,
    positive_factors: Vec<String>,
    /// Flips false the first time any rule hits an unknown/undisclosed
    /// branch; a flat transparency penalty applies at the end if so.
    complete: bool,
}

impl Tally {
    fn new() -> Self {
        Tally {
            score: 100,
            deductions: Vec::new(),
            risk_factors: Vec::new(),
            positive_factors: Vec::new(),
            complete: true,
        }
    }

    fn penalize(&mut self, points: i32, deduction: String, factor: String) {
        self.score -= points;
        self.deductions.push(format!("-{points}: {deduction}"));
        self.risk_factors.push(factor);
    }

    /// Penalty for an entirely absent fact group: deduction only, no risk
    /// factor (there is nothing specific to name), marks disclosure
    /// incomplete.
    fn penalize_absent(&mut self, points: i32, deduction: &str) {
        self.score -= points;
        self.deductions.push(format!("-{points}: {deduction}"));
        self.complete = false;
    }

    fn reward(&mut self, points: i32, factor: String) {
        self.score += points;
        self.positive_factors.push(factor);
    }
}

/// Score a fact bundle.
///
/// Total function: any combination of present/absent/blank sub-records
/// produces a result.
pub fn score_bundle(bundle: &FactBundle, weights: &CategoryWeights) -> ScoreResult {
    let mut tally = Tally::new();

    score_registration(&mut tally, bundle.company_info.as_ref());
    score_infrastructure(&mut tally, bundle.infrastructure.as_ref());
    score_data_flows(&mut tally, bundle.data_flows.as_ref());
    score_presence(&mut tally, bundle.company_info.as_ref());
    score_vendors(&mut tally, &bundle.vendors, weights);
    score_compliance(&mut tally, bundle.compliance.as_ref());

    if !tally.complete {
        tally.penalize(
            2,
            "Incomplete information disclosure".to_string(),
            "Some information not disclosed (transparency gap)".to_string(),
        );
    }

    let score = tally.score.clamp(0, 100);
    ScoreResult {
        score,
        risk_level: RiskLevel::from_score(score),
        risk_factors: tally.risk_factors,
        positive_factors: tally.positive_factors,
        deductions: tally.deductions,
    }
}

/// Company registration and legal jurisdiction.
fn score_registration(tally: &mut Tally, company_info: Option<&CompanyInfo>) {
    let Some(info) = company_info else {
        tally.penalize_absent(5, "No company registration information available");
        return;
    };

    let registration = info.registration_country.to_uppercase();
    if is_unknown(&registration) {
        tally.penalize(
            5,
            "Company registration country unknown".to_string(),
            "Company registration country not disclosed".to_string(),
        );
        tally.complete = false;
    } else if is_us(&registration) {
        tally.penalize(
            25,
            "Company registered in US (high sovereignty risk)".to_string(),
            "Company is US-registered entity - subject to US jurisdiction".to_string(),
        );
    } else if is_eu(&registration) {
        tally.reward(
            8,
            format!(
                "Company registered in EU ({})",
                title_case(&info.registration_country)
            ),
        );
    } else {
        tally.penalize(
            5,
            "Company registered outside EU".to_string(),
            format!("Company registered in {registration} (non-EU)"),
        );
    }
}

/// Cloud provider, hosting platform, data centers, and CDNs.
fn score_infrastructure(tally: &mut Tally, infrastructure: Option<&Infrastructure>) {
    let Some(infra) = infrastructure else {
        tally.penalize_absent(5, "No infrastructure information available");
        return;
    };

    let cloud = infra.cloud_provider.to_uppercase();
    let hosting = infra.hosting_platform.to_uppercase();
    let all_locations = infra
        .data_centers
        .iter()
        .chain(infra.server_locations.iter())
        .filter(|l| !l.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();

    if is_unknown(&cloud) {
        tally.penalize(
            3,
            "Cloud provider unknown".to_string(),
            "Cloud provider not disclosed".to_string(),
        );
        tally.complete = false;
    }

    if EU_CLOUD_PROVIDERS.iter().any(|p| cloud.contains(p)) {
        tally.reward(
            8,
            format!(
                "EU-based cloud provider: {}",
                title_case(&infra.cloud_provider)
            ),
        );
    }

    if !is_unknown(&hosting) {
        if EU_HOSTING_PLATFORMS.iter().any(|p| hosting.contains(p)) {
            tally.reward(
                5,
                format!(
                    "EU-based hosting platform: {}",
                    title_case(&infra.hosting_platform)
                ),
            );
        }

        // Fly.io is a US company; EU server regions soften the penalty but
        // do not remove the jurisdiction exposure.
        if hosting.contains("FLY.IO") || hosting.contains("FLYIO") {
            if is_eu(&all_locations) {
                tally.penalize(
                    6,
                    "Using Fly.io (US company) with EU server regions".to_string(),
                    format!(
                        "Hosting platform: {hosting} (US company) - subject to US jurisdiction, but using EU regions"
                    ),
                );
            } else {
                tally.penalize(
                    15,
                    "Using Fly.io (US company) without EU region specified".to_string(),
                    format!("Hosting platform: {hosting} (US company), EU region not specified"),
                );
            }
        }

        if US_HOSTING_PLATFORMS.iter().any(|p| hosting.contains(p)) {
            tally.penalize(
                8,
                format!("Using US hosting platform: {hosting}"),
                format!("US hosting platform: {hosting}"),
            );
        }
    }

    if US_CLOUD_PROVIDERS.iter().any(|p| cloud.contains(p)) {
        if is_eu(&all_locations) {
            tally.penalize(
                8,
                "US cloud provider with EU regions (still subject to US jurisdiction)".to_string(),
                format!(
                    "Infrastructure uses US cloud provider: {cloud} (subject to US jurisdiction even with EU regions)"
                ),
            );
        } else {
            tally.penalize(
                20,
                "Using US cloud provider without EU regions specified".to_string(),
                format!("Infrastructure uses US cloud provider: {cloud}, no EU regions mentioned"),
            );
        }
    }

    let mut eu_locations = 0;
    for location in infra
        .data_centers
        .iter()
        .chain(infra.server_locations.iter())
    {
        if location.is_empty() {
            continue;
        }
        if is_us(location) {
            tally.penalize(
                10,
                format!("Data center in US: {location}"),
                format!("Data center located in US: {location}"),
            );
        } else if is_eu(location) {
            eu_locations += 1;
        }
    }
    if eu_locations > 0 {
        tally.reward(
            (eu_locations * 3).min(9),
            format!(
                "Data centers in EU ({eu_locations} location{})",
                plural(eu_locations)
            ),
        );
    }

    for cdn in &infra.cdn_providers {
        if cdn.is_empty() {
            continue;
        }
        let cdn_upper = cdn.to_uppercase();
        if cdn_upper.contains("CLOUDFLARE") {
            tally.penalize(
                3,
                "Cloudflare CDN (US company, but EU PoPs)".to_string(),
                format!("CDN provider: {cdn} (US company with EU presence)"),
            );
        } else if is_us(&cdn_upper) {
            tally.penalize(
                5,
                format!("US-based CDN: {cdn}"),
                format!("US-based CDN provider: {cdn}"),
            );
        }
    }
}

/// Data storage, processing, and residency.
fn score_data_flows(tally: &mut Tally, data_flows: Option<&DataFlows>) {
    let Some(flows) = data_flows else {
        tally.penalize_absent(8, "No data flow information available");
        return;
    };

    let residency = flows.data_residency.to_uppercase();
    if is_unknown(&residency) {
        tally.penalize(
            5,
            "Data residency unknown".to_string(),
            "Data residency not disclosed".to_string(),
        );
        tally.complete = false;
    }

    let mut eu_storage = 0;
    for location in &flows.storage_locations {
        if location.is_empty() {
            continue;
        }
        if is_us(location) {
            tally.penalize(
                12,
                format!("Data stored in US: {location}"),
                format!("Customer data stored in US: {location}"),
            );
        } else if is_eu(location) {
            eu_storage += 1;
        }
    }
    if eu_storage > 0 {
        tally.reward(
            (eu_storage * 5).min(10),
            format!("Data stored in EU ({eu_storage} location{})", plural(eu_storage)),
        );
    }

    let mut eu_processing = 0;
    for location in &flows.processing_locations {
        if location.is_empty() {
            continue;
        }
        if is_us(location) {
            tally.penalize(
                8,
                format!("Data processed in US: {location}"),
                format!("Data processing occurs in US: {location}"),
            );
        } else if is_eu(location) {
            eu_processing += 1;
        }
    }
    if eu_processing > 0 {
        tally.reward(
            (eu_processing * 3).min(6),
            format!(
                "Data processed in EU ({eu_processing} location{})",
                plural(eu_processing)
            ),
        );
    }

    // Exact-match residency classification, not a substring predicate.
    match residency.as_str() {
        "US" => tally.penalize(
            25,
            "Data residency explicitly in US".to_string(),
            "Data residency explicitly in US - high sovereignty risk".to_string(),
        ),
        "GLOBAL" => tally.penalize(
            10,
            "Global data residency (no EU guarantee)".to_string(),
            "Data residency is global, no EU-only guarantee".to_string(),
        ),
        "EU" => tally.reward(10, "EU-only data residency guarantee".to_string()),
        _ => {}
    }

    if flows.storage_locations.is_empty()
        && flows.processing_locations.is_empty()
        && is_unknown(&residency)
    {
        tally.penalize(
            3,
            "No data storage/processing locations disclosed".to_string(),
            "Data storage and processing locations not disclosed".to_string(),
        );
    }
}

/// Employee and office locations. An absent company record is evaluated as
/// empty lists — the non-disclosure penalty still applies.
fn score_presence(tally: &mut Tally, company_info: Option<&CompanyInfo>) {
    let empty: &[String] = &[];
    let (offices, employees) = company_info
        .map(|info| {
            (
                info.office_locations.as_slice(),
                info.employee_locations.as_slice(),
            )
        })
        .unwrap_or((empty, empty));

    let eu_count = offices
        .iter()
        .chain(employees.iter())
        .filter(|l| !l.is_empty() && is_eu(l))
        .count() as i32;
    let us_count = offices
        .iter()
        .chain(employees.iter())
        .filter(|l| !l.is_empty() && is_us(l))
        .count() as i32;

    if eu_count > 0 {
        tally.reward(
            (eu_count * 2).min(6),
            format!(
                "EU office/employee presence ({eu_count} location{})",
                plural(eu_count)
            ),
        );
    }

    // US-based employees can reach data regardless of where it is stored.
    if us_count > 0 {
        tally.penalize(
            (6 + us_count * 2).min(12),
            format!("Employees/offices in US ({us_count} location(s))"),
            format!(
                "Company has {us_count} US office/employee location(s) - US-based employees can access EU data"
            ),
        );
    }

    if offices.is_empty() && employees.is_empty() {
        tally.penalize(
            2,
            "Employee/office locations not disclosed".to_string(),
            "Employee and office locations not disclosed".to_string(),
        );
        tally.complete = false;
    }
}

/// Sub-processors/vendors, with a running cap on total group deductions.
fn score_vendors(tally: &mut Tally, vendors: &[Vendor], weights: &CategoryWeights) {
    let mut us_count = 0;
    let mut eu_count = 0;
    let mut budget_used = 0;

    // Deduct against the remaining budget; the risk factor is recorded even
    // when the budget is exhausted.
    for vendor in vendors {
        let location = vendor.location.to_uppercase();
        let purpose = vendor.purpose.to_uppercase();
        let name = if vendor.name.is_empty() {
            "Unknown"
        } else {
            vendor.name.as_str()
        };

        if is_us(&location) {
            us_count += 1;
            let weighted = (8.0 * weights.weight_for(&vendor.purpose)) as i32;
            let applied = weighted.min(MAX_VENDOR_PENALTY - budget_used);
            if applied > 0 {
                tally.score -= applied;
                budget_used += applied;
                tally
                    .deductions
                    .push(format!("-{applied}: {name} is US-based ({purpose})"));
            }
            tally
                .risk_factors
                .push(format!("US-based sub-processor: {name} ({purpose})"));

            let name_upper = name.to_uppercase();
            if AI_VENDOR_MARKERS.iter().any(|m| name_upper.contains(m)) {
                let applied = 12.min(MAX_VENDOR_PENALTY - budget_used);
                if applied > 0 {
                    tally.score -= applied;
                    budget_used += applied;
                    tally.deductions.push(format!(
                        "-{applied}: {name} is high-risk AI vendor (US jurisdiction)"
                    ));
                }
                tally
                    .risk_factors
                    .push(format!("High-risk AI vendor: {name} (critical sovereignty risk)"));
            }
        } else if is_eu(&location) {
            eu_count += 1;
        } else if is_global(&location) {
            let applied = 5.min(MAX_VENDOR_PENALTY - budget_used);
            if applied > 0 {
                tally.score -= applied;
                budget_used += applied;
                tally.deductions.push(format!(
                    "-{applied}: {name} has Global location (uncertain jurisdiction)"
                ));
            }
            tally
                .risk_factors
                .push(format!("Global sub-processor (uncertain jurisdiction): {name}"));
        } else if is_unknown(&location) {
            let applied = 3.min(MAX_VENDOR_PENALTY - budget_used);
            if applied > 0 {
                tally.score -= applied;
                budget_used += applied;
                tally
                    .deductions
                    .push(format!("-{applied}: {name} location unknown"));
            }
            tally
                .risk_factors
                .push(format!("Sub-processor location unknown: {name}"));
        }
    }

    if eu_count > 0 {
        tally.reward(
            (eu_count * 2).min(10),
            format!("{eu_count} EU-based sub-processor{}", plural(eu_count)),
        );
    }

    // Many US vendors compound the exposure beyond their individual weights.
    if us_count > 5 {
        let extra = (us_count - 5).min(5);
        tally.penalize(
            extra,
            format!("High US vendor concentration ({us_count} total)"),
            format!(
                "High concentration of US sub-processors ({us_count}) increases cumulative sovereignty risk"
            ),
        );
    }
}

/// GDPR status, certifications, incidents, residency guarantees.
fn score_compliance(tally: &mut Tally, compliance: Option<&Compliance>) {
    let Some(comp) = compliance else {
        tally.penalize_absent(5, "No compliance information available");
        return;
    };

    let gdpr = comp.gdpr_status.to_uppercase();
    if is_unknown(&gdpr) {
        tally.penalize(
            5,
            "GDPR compliance status unknown".to_string(),
            "GDPR compliance status not disclosed".to_string(),
        );
        tally.complete = false;
    } else if gdpr.contains("NON-COMPLIANT") || gdpr.contains("NOT COMPLIANT") {
        tally.penalize(
            20,
            "GDPR non-compliant".to_string(),
            "GDPR non-compliance - critical risk".to_string(),
        );
    } else if gdpr.contains("COMPLIANT") || gdpr.contains("COMPLIANCE") {
        tally.reward(5, "GDPR compliance stated".to_string());
    }

    let cert_count = comp.certifications.len() as i32;
    if cert_count > 0 {
        let listed = comp
            .certifications
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        tally.reward(
            (cert_count * 2).min(5),
            format!(
                "{cert_count} compliance certification{} ({listed})",
                plural(cert_count)
            ),
        );
    } else {
        tally.penalize(
            3,
            "No compliance certifications disclosed".to_string(),
            "No compliance certifications (SOC 2, ISO 27001, etc.) disclosed".to_string(),
        );
    }

    let incident_count = comp.recent_incidents.len() as i32;
    if incident_count > 0 {
        tally.penalize(
            (incident_count * 6).min(15),
            format!("Recent security incidents ({incident_count} reported)"),
            format!("Recent security incidents: {incident_count} reported"),
        );
    }

    let guarantees = comp.data_residency_guarantees.to_uppercase();
    if !is_unknown(&guarantees) && !guarantees.contains("NONE") {
        tally.reward(3, "Data residency guarantees disclosed".to_string());
    } else if is_unknown(&guarantees) {
        tally.penalize(
            3,
            "Data residency guarantees not disclosed".to_string(),
            "Data residency guarantees not disclosed".to_string(),
        );
    }
}

fn plural(count: i32) -> &'static str {
    if count > 1 {
        "s"
    } else {
        ""
    }
}

/// Title-case a location string for display: first letter of each alphabetic
/// run upper-cased, the rest lowered.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{Compliance, CompanyInfo, DataFlows, FactBundle, Infrastructure};

    fn us_vendor(name: &str, purpose: &str) -> Vendor {
        Vendor {
            name: name.to_string(),
            purpose: purpose.to_string(),
            location: "United States".to_string(),
            risk: "High".to_string(),
        }
    }

    /// All five groups absent: 100 −5 (registration) −5 (infrastructure)
    /// −8 (data flows) −2 (employee/office) −5 (compliance) −2 (completeness).
    #[test]
    fn test_empty_bundle_scores_73_medium() {
        let result = score_bundle(&FactBundle::default(), &CategoryWeights::default());
        assert_eq!(result.score, 73);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert!(result
            .risk_factors
            .iter()
            .any(|f| f.contains("transparency gap")));
        assert!(result.positive_factors.is_empty());
    }

    #[test]
    fn test_single_us_vendor_weighted_penalty() {
        let bundle = FactBundle {
            vendors: vec![us_vendor("Stripe", "Payment Processing")],
            ..FactBundle::default()
        };
        let result = score_bundle(&bundle, &CategoryWeights::default());
        // floor(8 × 1.4) = 11 below the empty-bundle baseline of 73.
        assert_eq!(result.score, 62);
        assert!(result
            .deductions
            .iter()
            .any(|d| d == "-11: Stripe is US-based (PAYMENT PROCESSING)"));
        assert!(result
            .risk_factors
            .iter()
            .any(|f| f == "US-based sub-processor: Stripe (PAYMENT PROCESSING)"));
    }

    #[test]
    fn test_ai_vendor_extra_penalty() {
        let bundle = FactBundle {
            vendors: vec![us_vendor("OpenAI", "AI/ML")],
            ..FactBundle::default()
        };
        let result = score_bundle(&bundle, &CategoryWeights::default());
        // floor(8 × 1.5) = 12 plus the 12-point AI-vendor penalty.
        assert_eq!(result.score, 73 - 12 - 12);
        assert!(result
            .risk_factors
            .iter()
            .any(|f| f == "High-risk AI vendor: OpenAI (critical sovereignty risk)"));
    }

    #[test]
    fn test_vendor_penalties_capped_at_45_with_concentration() {
        let vendors: Vec<Vendor> = (0..7).map(|i| us_vendor(&format!("Vendor{i}"), "")).collect();
        let bundle = FactBundle {
            vendors,
            ..FactBundle::default()
        };
        let result = score_bundle(&bundle, &CategoryWeights::default());
        // 5×8 + min(8, 5) = 45 capped, plus min(5, 7−5) = 2 concentration.
        assert_eq!(result.score, 73 - 45 - 2);
        assert_eq!(result.risk_level, RiskLevel::High);
        // Every vendor is still named even after the budget runs out.
        let named = result
            .risk_factors
            .iter()
            .filter(|f| f.starts_with("US-based sub-processor"))
            .count();
        assert_eq!(named, 7);
        assert!(result
            .risk_factors
            .iter()
            .any(|f| f.contains("High concentration of US sub-processors (7)")));
    }

    #[test]
    fn test_global_and_unknown_vendor_locations() {
        let bundle = FactBundle {
            vendors: vec![
                Vendor {
                    name: "Orbit".to_string(),
                    purpose: "CDN".to_string(),
                    location: "Global".to_string(),
                    risk: "Medium".to_string(),
                },
                Vendor {
                    name: "Mystery".to_string(),
                    purpose: "Other".to_string(),
                    location: String::new(),
                    risk: "Medium".to_string(),
                },
            ],
            ..FactBundle::default()
        };
        let result = score_bundle(&bundle, &CategoryWeights::default());
        assert_eq!(result.score, 73 - 5 - 3);
        assert!(result
            .risk_factors
            .iter()
            .any(|f| f == "Global sub-processor (uncertain jurisdiction): Orbit"));
        assert!(result
            .risk_factors
            .iter()
            .any(|f| f == "Sub-processor location unknown: Mystery"));
    }

    #[test]
    fn test_eu_vendors_earn_capped_bonus() {
        let vendors: Vec<Vendor> = (0..8)
            .map(|i| Vendor {
                name: format!("EuVendor{i}"),
                purpose: "Analytics".to_string(),
                location: "Germany".to_string(),
                risk: "Low".to_string(),
            })
            .collect();
        let bundle = FactBundle {
            vendors,
            ..FactBundle::default()
        };
        let result = score_bundle(&bundle, &CategoryWeights::default());
        // 8 EU vendors would be +16 uncapped; bonus caps at +10.
        assert_eq!(result.score, 73 + 10);
        assert!(result
            .positive_factors
            .iter()
            .any(|f| f == "8 EU-based sub-processors"));
    }

    #[test]
    fn test_eu_registration_bonus() {
        let bundle = FactBundle {
            company_info: Some(CompanyInfo {
                registration_country: "Germany".to_string(),
                ..CompanyInfo::default()
            }),
            ..FactBundle::default()
        };
        let result = score_bundle(&bundle, &CategoryWeights::default());
        // +8 registration replaces the −5 absence penalty: 73 + 5 + 8 = 86.
        assert_eq!(result.score, 86);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result
            .positive_factors
            .iter()
            .any(|f| f == "Company registered in EU (Germany)"));
    }

    #[test]
    fn test_eu_data_center_bonus_is_capped() {
        let bundle = FactBundle {
            infrastructure: Some(Infrastructure {
                data_centers: (0..10).map(|i| format!("Frankfurt DC-{i}, Germany")).collect(),
                ..Infrastructure::default()
            }),
            ..FactBundle::default()
        };
        let result = score_bundle(&bundle, &CategoryWeights::default());
        // Infra present: −3 unknown cloud, +9 capped EU bonus (not +30):
        // 100 − 5 − 3 + 9 − 8 − 2 − 5 − 2 = 84.
        assert_eq!(result.score, 84);
        assert!(result
            .positive_factors
            .iter()
            .any(|f| f == "Data centers in EU (10 locations)"));
    }

    #[test]
    fn test_us_cloud_provider_with_and_without_eu_regions() {
        let with_eu = FactBundle {
            infrastructure: Some(Infrastructure {
                cloud_provider: "AWS".to_string(),
                server_locations: vec!["eu-west-1 (Ireland)".to_string()],
                ..Infrastructure::default()
            }),
            ..FactBundle::default()
        };
        let without_eu = FactBundle {
            infrastructure: Some(Infrastructure {
                cloud_provider: "AWS".to_string(),
                ..Infrastructure::default()
            }),
            ..FactBundle::default()
        };
        let weights = CategoryWeights::default();
        let score_with = score_bundle(&with_eu, &weights).score;
        let score_without = score_bundle(&without_eu, &weights).score;
        // −8 with EU evidence vs −20 without, and the EU location also earns
        // the +3 data-center bonus.
        assert_eq!(score_with - score_without, 15);
    }

    #[test]
    fn test_cloudflare_cdn_softer_than_other_us_cdn() {
        let bundle = FactBundle {
            infrastructure: Some(Infrastructure {
                cdn_providers: vec!["Cloudflare".to_string(), "Fastly (US)".to_string()],
                ..Infrastructure::default()
            }),
            ..FactBundle::default()
        };
        let result = score_bundle(&bundle, &CategoryWeights::default());
        assert!(result
            .deductions
            .iter()
            .any(|d| d == "-3: Cloudflare CDN (US company, but EU PoPs)"));
        assert!(result
            .deductions
            .iter()
            .any(|d| d == "-5: US-based CDN: Fastly (US)"));
    }

    #[test]
    fn test_explicit_us_residency_heavy_penalty() {
        let bundle = FactBundle {
            data_flows: Some(DataFlows {
                data_residency: "US".to_string(),
                ..DataFlows::default()
            }),
            ..FactBundle::default()
        };
        let result = score_bundle(&bundle, &CategoryWeights::default());
        // Flows present: −25 residency, −3 no locations disclosed... but the
        // explicit residency means the unknown-residency branch is skipped:
        // 100 − 5 − 5 − 25 − 2 − 5 − 2 = 56.
        assert_eq!(result.score, 56);
        assert!(result
            .risk_factors
            .iter()
            .any(|f| f == "Data residency explicitly in US - high sovereignty risk"));
    }

    #[test]
    fn test_compliance_positive_signals() {
        let bundle = FactBundle {
            compliance: Some(Compliance {
                gdpr_status: "GDPR Compliant".to_string(),
                certifications: vec!["SOC 2 Type II".to_string(), "ISO 27001".to_string()],
                data_residency_guarantees: "EU-only storage guaranteed".to_string(),
                recent_incidents: Vec::new(),
            }),
            ..FactBundle::default()
        };
        let result = score_bundle(&bundle, &CategoryWeights::default());
        // Compliance group contributes +5 +4 +3 instead of −5:
        // 100 − 5 − 5 − 8 − 2 + 5 + 4 + 3 − 2 = 90.
        assert_eq!(result.score, 90);
        assert!(result
            .positive_factors
            .iter()
            .any(|f| f == "2 compliance certifications (SOC 2 Type II, ISO 27001)"));
    }

    #[test]
    fn test_incidents_penalty_is_capped() {
        let bundle = FactBundle {
            compliance: Some(Compliance {
                recent_incidents: (0..5).map(|i| format!("incident-{i}")).collect(),
                ..Compliance::default()
            }),
            ..FactBundle::default()
        };
        let result = score_bundle(&bundle, &CategoryWeights::default());
        // min(15, 5×6) = 15.
        assert!(result
            .deductions
            .iter()
            .any(|d| d == "-15: Recent security incidents (5 reported)"));
    }

    #[test]
    fn test_score_never_leaves_bounds() {
        // Pathologically bad: many US storage locations blow far past zero.
        let bundle = FactBundle {
            data_flows: Some(DataFlows {
                storage_locations: (0..10).map(|_| "US (Virginia)".to_string()).collect(),
                ..DataFlows::default()
            }),
            ..FactBundle::default()
        };
        let result = score_bundle(&bundle, &CategoryWeights::default());
        assert_eq!(result.score, 0);
        assert_eq!(result.risk_level, RiskLevel::High);

        // Pathologically good inputs cannot exceed 100 either.
        let bundle = FactBundle {
            vendors: (0..5)
                .map(|i| Vendor {
                    name: format!("EuVendor{i}"),
                    purpose: "Analytics".to_string(),
                    location: "Netherlands".to_string(),
                    risk: "Low".to_string(),
                })
                .collect(),
            company_info: Some(CompanyInfo {
                registration_country: "Ireland".to_string(),
                legal_entity: "Acme Ltd".to_string(),
                office_locations: vec!["Dublin, Ireland".to_string()],
                employee_locations: vec!["Berlin, Germany".to_string()],
            }),
            infrastructure: Some(Infrastructure {
                cloud_provider: "Hetzner".to_string(),
                hosting_platform: "Hetzner".to_string(),
                data_centers: vec!["Falkenstein, Germany".to_string()],
                server_locations: vec!["Helsinki, Finland".to_string()],
                cdn_providers: vec!["Bunny CDN".to_string()],
            }),
            data_flows: Some(DataFlows {
                storage_locations: vec!["Germany".to_string(), "Finland".to_string()],
                processing_locations: vec!["Germany".to_string()],
                data_residency: "EU".to_string(),
            }),
            compliance: Some(Compliance {
                gdpr_status: "Fully GDPR compliant".to_string(),
                certifications: vec!["ISO 27001".to_string(), "SOC 2".to_string()],
                data_residency_guarantees: "EU-only".to_string(),
                recent_incidents: Vec::new(),
            }),
        };
        let result = score_bundle(&bundle, &CategoryWeights::default());
        assert_eq!(result.score, 100);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(!result
            .risk_factors
            .iter()
            .any(|f| f.contains("transparency gap")));
    }

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(49), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(74), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(75), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::Low);
    }

    #[test]
    fn test_category_weights_first_match_wins() {
        let weights = CategoryWeights::default();
        assert_eq!(weights.weight_for("Payment Processing"), 1.4);
        assert_eq!(weights.weight_for("AI/ML"), 1.5);
        // "CDN" precedes "CDN/Fonts" in the table, so the shorter match wins.
        assert_eq!(weights.weight_for("CDN/Fonts"), 0.8);
        assert_eq!(weights.weight_for("Quantum Astrology"), 1.0);
        assert_eq!(weights.weight_for(""), 1.0);
    }

    #[test]
    fn test_weight_table_from_json() {
        let json = r#"[
            {"category": "Analytics", "weight": 2.0},
            {"category": "CDN", "weight": 0.5}
        ]"#;
        let weights = CategoryWeights::from_json(json).expect("parse weight table");
        assert_eq!(weights.len(), 2);
        assert_eq!(weights.weight_for("Web Analytics"), 2.0);
        assert_eq!(weights.weight_for("CDN/Fonts"), 0.5);
    }

    #[test]
    fn test_empty_weight_table_defaults_to_one() {
        let weights = CategoryWeights::empty();
        assert_eq!(weights.weight_for("Payment Processing"), 1.0);
        let bundle = FactBundle {
            vendors: vec![us_vendor("Stripe", "Payment Processing")],
            ..FactBundle::default()
        };
        let result = score_bundle(&bundle, &weights);
        assert_eq!(result.score, 73 - 8);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("GERMANY"), "Germany");
        assert_eq!(title_case("fly.io"), "Fly.Io");
        assert_eq!(title_case("open telekom cloud"), "Open Telekom Cloud");
    }
}
