//! Fact bundle data model
//!
//! Structured facts about a target organization, assembled by external
//! collaborators (page scraper, fact extractor, resource scan) and consumed
//! by the scoring algorithm.
//!
//! Absence is modeled two ways, and the distinction matters to scoring:
//! - a whole group missing from the bundle is `None` (nothing was found),
//! - a present group with an `"Unknown"` field value is an explicit
//!   non-disclosure, which carries its own (smaller) penalty.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

fn unknown() -> String {
    "Unknown".to_string()
}

/// A third-party vendor or sub-processor the target organization relies on.
///
/// Identity key for deduplication is the case-insensitive `name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Vendor {
    pub name: String,
    /// Service category, e.g. "Payment Processing" or "Analytics".
    pub purpose: String,
    /// Free-text jurisdiction string, e.g. "United States" or "Germany".
    pub location: String,
    /// Risk tier string, e.g. "Low", "Medium", "High", "Critical".
    pub risk: String,
}

/// Corporate registration and physical presence facts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CompanyInfo {
    #[serde(default = "unknown")]
    pub registration_country: String,
    #[serde(default = "unknown")]
    pub legal_entity: String,
    #[serde(default)]
    pub office_locations: Vec<String>,
    #[serde(default)]
    pub employee_locations: Vec<String>,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        CompanyInfo {
            registration_country: unknown(),
            legal_entity: unknown(),
            office_locations: Vec::new(),
            employee_locations: Vec::new(),
        }
    }
}

/// Cloud, hosting, and delivery infrastructure facts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Infrastructure {
    #[serde(default = "unknown")]
    pub cloud_provider: String,
    /// Hosting platform (Fly.io, Heroku, Vercel, ...), distinct from the
    /// underlying cloud provider.
    #[serde(default = "unknown")]
    pub hosting_platform: String,
    #[serde(default)]
    pub data_centers: Vec<String>,
    #[serde(default)]
    pub server_locations: Vec<String>,
    #[serde(default)]
    pub cdn_providers: Vec<String>,
}

impl Default for Infrastructure {
    fn default() -> Self {
        Infrastructure {
            cloud_provider: unknown(),
            hosting_platform: unknown(),
            data_centers: Vec::new(),
            server_locations: Vec::new(),
            cdn_providers: Vec::new(),
        }
    }
}

/// Where customer data is stored and processed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DataFlows {
    #[serde(default)]
    pub storage_locations: Vec<String>,
    #[serde(default)]
    pub processing_locations: Vec<String>,
    /// Single residency classification: "EU", "US", "Global", or "Unknown".
    #[serde(default = "unknown")]
    pub data_residency: String,
}

impl Default for DataFlows {
    fn default() -> Self {
        DataFlows {
            storage_locations: Vec::new(),
            processing_locations: Vec::new(),
            data_residency: unknown(),
        }
    }
}

/// Compliance posture: GDPR status, certifications, incident history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Compliance {
    #[serde(default = "unknown")]
    pub gdpr_status: String,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default = "unknown")]
    pub data_residency_guarantees: String,
    #[serde(default)]
    pub recent_incidents: Vec<String>,
}

impl Default for Compliance {
    fn default() -> Self {
        Compliance {
            gdpr_status: unknown(),
            certifications: Vec::new(),
            data_residency_guarantees: unknown(),
            recent_incidents: Vec::new(),
        }
    }
}

/// The full set of facts fed into the scoring algorithm.
///
/// Every group is optional; an entirely empty bundle still scores (absence of
/// each group is itself a scoring signal).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FactBundle {
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub company_info: Option<CompanyInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub infrastructure: Option<Infrastructure>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data_flows: Option<DataFlows>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub compliance: Option<Compliance>,
}

impl FactBundle {
    /// Deserialize a bundle from JSON. Unrecognized fields are ignored —
    /// upstream extractors are loose about what they emit.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to deserialize fact bundle from JSON")
    }

    /// Serialize to pretty JSON with deterministic field ordering.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize fact bundle to JSON")
    }
}
