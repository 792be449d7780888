//! Known-service identification
//!
//! A curated, ordered table maps domain fragments to third-party service
//! attributes (name, jurisdiction, category, risk tier, EU alternatives).
//! Lookup is a substring match of each fragment against the queried domain,
//! first entry wins — more specific fragments must precede more general ones
//! that share a substring (e.g. `js.stripe.com` before `stripe.com`).
//!
//! Identification is total: an unmatched domain yields a synthetic
//! "Unknown Service" record, never an error. The table is data, not code —
//! it can be replaced wholesale from a JSON file, and an empty table simply
//! degrades every lookup to the synthetic record.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A third-party network origin resolved to a named service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ServiceRecord {
    pub name: String,
    /// The queried domain, not the matched fragment.
    pub domain: String,
    pub jurisdiction: String,
    pub category: String,
    pub risk_level: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub alternatives_eu: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub notes: String,
}

impl ServiceRecord {
    /// Synthetic record for a domain with no curated match.
    pub fn unidentified(domain: &str) -> Self {
        ServiceRecord {
            name: format!("Unknown Service ({domain})"),
            domain: domain.to_string(),
            jurisdiction: "Unknown".to_string(),
            category: "Other".to_string(),
            risk_level: "Medium".to_string(),
            alternatives_eu: Vec::new(),
            notes: "Unidentified third-party service".to_string(),
        }
    }
}

/// One row of the curated table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CatalogEntry {
    /// Lower-case domain fragment matched as a substring of the queried domain.
    pub fragment: String,
    pub name: String,
    pub jurisdiction: String,
    pub category: String,
    pub risk_level: String,
    #[serde(default)]
    pub alternatives_eu: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

/// Ordered known-services table. Iteration order is lookup precedence.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    entries: Vec<CatalogEntry>,
}

impl ServiceCatalog {
    /// Catalog with no entries: every lookup returns the synthetic record.
    pub fn empty() -> Self {
        ServiceCatalog {
            entries: Vec::new(),
        }
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        ServiceCatalog { entries }
    }

    /// Deserialize a catalog from a JSON array of entries (file order is
    /// lookup precedence).
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(json).context("failed to deserialize known-services table")?;
        Ok(ServiceCatalog { entries })
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read known-services table: {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identify the service behind a domain. Total function: unmatched
    /// domains yield [`ServiceRecord::unidentified`].
    pub fn identify(&self, domain: &str) -> ServiceRecord {
        let domain_lower = domain.to_lowercase();
        for entry in &self.entries {
            if domain_lower.contains(&entry.fragment) {
                return ServiceRecord {
                    name: entry.name.clone(),
                    domain: domain.to_string(),
                    jurisdiction: entry.jurisdiction.clone(),
                    category: entry.category.clone(),
                    risk_level: entry.risk_level.clone(),
                    alternatives_eu: entry.alternatives_eu.clone(),
                    notes: entry.notes.clone(),
                };
            }
        }
        ServiceRecord::unidentified(domain)
    }

    /// Built-in default table. Seeded with the services most commonly found
    /// embedded in SaaS marketing pages; external tables replace this
    /// wholesale rather than merging.
    pub fn builtin() -> Self {
        // (fragment, name, jurisdiction, category, risk_level, alternatives)
        const BUILTIN: &[(&str, &str, &str, &str, &str, &[&str])] = &[
            // Analytics / tag management
            (
                "analytics.google.com",
                "Google Analytics",
                "United States",
                "Analytics",
                "High",
                &["Plausible", "Matomo"],
            ),
            (
                "google-analytics.com",
                "Google Analytics",
                "United States",
                "Analytics",
                "High",
                &["Plausible", "Matomo"],
            ),
            (
                "googletagmanager.com",
                "Google Tag Manager",
                "United States",
                "Tag Management",
                "High",
                &["Matomo Tag Manager"],
            ),
            (
                "mixpanel.com",
                "Mixpanel",
                "United States",
                "Analytics",
                "High",
                &["Plausible"],
            ),
            (
                "segment.com",
                "Segment",
                "United States",
                "Analytics",
                "High",
                &[],
            ),
            (
                "plausible.io",
                "Plausible",
                "Estonia (EU)",
                "Analytics",
                "Low",
                &[],
            ),
            // Fonts
            (
                "fonts.googleapis.com",
                "Google Fonts",
                "United States",
                "CDN/Fonts",
                "Medium",
                &["Bunny Fonts", "self-hosting"],
            ),
            (
                "fonts.gstatic.com",
                "Google Fonts CDN",
                "United States",
                "CDN/Fonts",
                "Medium",
                &["Bunny Fonts", "self-hosting"],
            ),
            (
                "use.typekit.net",
                "Adobe Fonts",
                "United States",
                "CDN/Fonts",
                "Medium",
                &[],
            ),
            // Customer support / chat widgets
            (
                "widget.intercom.io",
                "Intercom Widget",
                "United States",
                "Customer Support",
                "Critical",
                &["Crisp"],
            ),
            (
                "intercom.io",
                "Intercom",
                "United States",
                "Customer Support",
                "Critical",
                &["Crisp"],
            ),
            (
                "zendesk.com",
                "Zendesk",
                "United States",
                "Customer Support",
                "High",
                &["Crisp"],
            ),
            (
                "crisp.chat",
                "Crisp",
                "France (EU)",
                "Customer Support",
                "Low",
                &[],
            ),
            (
                "drift.com",
                "Drift",
                "United States",
                "Customer Support",
                "High",
                &["Crisp"],
            ),
            // Payments
            (
                "js.stripe.com",
                "Stripe.js",
                "United States",
                "Payment Processing",
                "Critical",
                &["Mollie", "Adyen"],
            ),
            (
                "stripe.com",
                "Stripe",
                "United States",
                "Payment Processing",
                "Critical",
                &["Mollie", "Adyen"],
            ),
            (
                "paypal.com",
                "PayPal",
                "United States",
                "Payment Processing",
                "Critical",
                &["Mollie"],
            ),
            // AI services
            (
                "api.openai.com",
                "OpenAI",
                "United States",
                "AI/ML",
                "Critical",
                &["Mistral AI", "Aleph Alpha"],
            ),
            (
                "openai.com",
                "OpenAI",
                "United States",
                "AI/ML",
                "Critical",
                &["Mistral AI", "Aleph Alpha"],
            ),
            (
                "api.anthropic.com",
                "Anthropic",
                "United States",
                "AI/ML",
                "Critical",
                &["Mistral AI", "Aleph Alpha"],
            ),
            (
                "anthropic.com",
                "Anthropic",
                "United States",
                "AI/ML",
                "Critical",
                &["Mistral AI", "Aleph Alpha"],
            ),
            // CDN
            (
                "cdnjs.cloudflare.com",
                "Cloudflare CDN",
                "United States",
                "CDN",
                "Medium",
                &["jsDelivr"],
            ),
            (
                "cloudflare.com",
                "Cloudflare",
                "United States",
                "CDN",
                "Medium",
                &["Bunny CDN"],
            ),
            (
                "cdn.jsdelivr.net",
                "jsDelivr",
                "Poland (EU)",
                "CDN",
                "Low",
                &[],
            ),
            (
                "unpkg.com",
                "unpkg",
                "United States",
                "CDN",
                "Medium",
                &["jsDelivr"],
            ),
            // Monitoring / error tracking
            (
                "sentry.io",
                "Sentry",
                "United States",
                "Error Tracking",
                "High",
                &["GlitchTip"],
            ),
            (
                "datadoghq.com",
                "Datadog",
                "United States",
                "Monitoring",
                "High",
                &[],
            ),
            (
                "newrelic.com",
                "New Relic",
                "United States",
                "Monitoring",
                "High",
                &[],
            ),
            // Social / advertising
            (
                "connect.facebook.net",
                "Facebook SDK",
                "United States",
                "Social/Advertising",
                "High",
                &[],
            ),
            (
                "facebook.com",
                "Facebook",
                "United States",
                "Social/Advertising",
                "High",
                &[],
            ),
            (
                "twitter.com",
                "Twitter/X",
                "United States",
                "Social/Advertising",
                "High",
                &[],
            ),
            (
                "linkedin.com",
                "LinkedIn",
                "United States",
                "Social/Advertising",
                "High",
                &[],
            ),
            // Email delivery
            (
                "sendgrid.com",
                "SendGrid",
                "United States",
                "Email Service",
                "High",
                &["Scaleway TEM", "Mailjet"],
            ),
            (
                "mailgun.com",
                "Mailgun",
                "United States",
                "Email Service",
                "High",
                &["Mailjet"],
            ),
        ];

        let entries = BUILTIN
            .iter()
            .map(
                |&(fragment, name, jurisdiction, category, risk_level, alternatives)| {
                    CatalogEntry {
                        fragment: fragment.to_string(),
                        name: name.to_string(),
                        jurisdiction: jurisdiction.to_string(),
                        category: category.to_string(),
                        risk_level: risk_level.to_string(),
                        alternatives_eu: alternatives.iter().map(|a| a.to_string()).collect(),
                        notes: String::new(),
                    }
                },
            )
            .collect();

        ServiceCatalog { entries }
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
