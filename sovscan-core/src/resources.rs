//! Embedded-resource extraction
//!
//! Pure in-memory pattern work over raw page markup: finds externally hosted
//! scripts, stylesheets/fonts, iframes, candidate tracking-pixel hosts, and
//! inline API-call URLs, and resolves each external host to a service record.
//! No network access, no DOM construction — regex matching plus URL
//! resolution only.
//!
//! Extraction is best-effort: references that cannot be resolved to an
//! absolute URL are skipped silently, and malformed markup never fails.

use crate::services::{ServiceCatalog, ServiceRecord};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use url::Url;

/// Image-host categories retained as likely tracking pixels.
const TRACKER_CATEGORIES: &[&str] = &["Analytics", "Tag Management", "Social/Advertising"];

/// An external resource reference found in page markup.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ResourceRef {
    /// Resolved absolute URL.
    pub url: String,
    /// Network authority of the resolved URL.
    pub host: String,
    pub service: ServiceRecord,
}

/// The recognized inline API-call shapes.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApiCallShape {
    /// `fetch("...")`-style call.
    Fetch,
    /// REST-client call with an HTTP-verb method name, e.g. `client.post("...")`.
    RestClient,
    /// AJAX config-object call, e.g. `$.ajax({url: "..."})`.
    AjaxConfig,
}

impl ApiCallShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiCallShape::Fetch => "fetch",
            ApiCallShape::RestClient => "rest_client",
            ApiCallShape::AjaxConfig => "ajax_config",
        }
    }
}

/// An inline API call targeting an external origin.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ApiCallRef {
    pub url: String,
    pub host: String,
    pub shape: ApiCallShape,
    pub service: ServiceRecord,
}

/// A distinct external image host retained as a likely tracking pixel.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PixelRef {
    pub host: String,
    pub service: ServiceRecord,
}

/// Grouped external resource references extracted from one page.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ResourceScan {
    pub external_scripts: Vec<ResourceRef>,
    pub external_fonts: Vec<ResourceRef>,
    pub external_stylesheets: Vec<ResourceRef>,
    pub iframes: Vec<ResourceRef>,
    pub tracking_pixels: Vec<PixelRef>,
    pub api_calls: Vec<ApiCallRef>,
}

impl ResourceScan {
    /// Total number of external references across all groups.
    pub fn total_external(&self) -> usize {
        self.external_scripts.len()
            + self.external_fonts.len()
            + self.external_stylesheets.len()
            + self.iframes.len()
            + self.tracking_pixels.len()
            + self.api_calls.len()
    }

    /// Identified services deduplicated by domain, in encounter order across
    /// the groups. Two references to the same host — even of different
    /// resource kinds — collapse to one entry.
    pub fn distinct_services(&self) -> Vec<ServiceRecord> {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut services = Vec::new();
        let mut push = |record: &ServiceRecord| {
            if seen.insert(record.domain.clone()) {
                services.push(record.clone());
            }
        };
        for r in &self.external_scripts {
            push(&r.service);
        }
        for r in &self.external_fonts {
            push(&r.service);
        }
        for r in &self.external_stylesheets {
            push(&r.service);
        }
        for r in &self.iframes {
            push(&r.service);
        }
        for p in &self.tracking_pixels {
            push(&p.service);
        }
        for c in &self.api_calls {
            push(&c.service);
        }
        services
    }
}

/// Resolve a raw reference against the page origin; return `(url, host)` only
/// for references on a different network authority than the page itself.
fn resolve_external(base: &Url, reference: &str) -> Option<(String, String)> {
    let absolute = base.join(reference).ok()?;
    let host = absolute.host_str()?.to_string();
    if Some(host.as_str()) == base.host_str() {
        return None;
    }
    Some((absolute.to_string(), host))
}

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)<script[^>]*src=["']([^"']+)["']"#).unwrap())
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)<link[^>]*href=["']([^"']+)["']"#).unwrap())
}

fn iframe_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)<iframe[^>]*src=["']([^"']+)["']"#).unwrap())
}

fn img_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)<img[^>]*src=["']([^"']+)["']"#).unwrap())
}

fn fetch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\bfetch\(\s*["']([^"']+)["']"#).unwrap())
}

fn rest_client_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\b[a-z_$][\w$]*\.(?:get|post|put|delete)\(\s*["']([^"']+)["']"#).unwrap()
    })
}

fn ajax_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\$\.ajax\([^)]*url:\s*["']([^"']+)["']"#).unwrap())
}

/// Extract external resource references from raw page markup.
///
/// `page_url` is the page's own resolved absolute URL; same-origin references
/// are discarded before classification. An unparsable `page_url` yields an
/// empty scan — without an origin nothing can be classified as external.
pub fn extract(markup: &str, page_url: &str, catalog: &ServiceCatalog) -> ResourceScan {
    let Ok(base) = Url::parse(page_url) else {
        return ResourceScan::default();
    };

    let mut scan = ResourceScan::default();

    // Scripts: analytics, chat widgets, payment processors.
    for cap in script_re().captures_iter(markup) {
        let reference = &cap[1];
        if let Some((url, host)) = resolve_external(&base, reference) {
            let service = catalog.identify(&host);
            scan.external_scripts.push(ResourceRef { url, host, service });
        }
    }

    // Stylesheets and fonts share the <link href> shape. A reference counts
    // as a font when its path mentions "font" or its host contains "fonts";
    // otherwise a ".css" marker makes it a stylesheet. Everything else
    // (favicons, preconnects, manifests) is dropped.
    for cap in link_re().captures_iter(markup) {
        let reference = &cap[1];
        if let Some((url, host)) = resolve_external(&base, reference) {
            if reference.to_lowercase().contains("font") || host.contains("fonts") {
                let service = catalog.identify(&host);
                scan.external_fonts.push(ResourceRef { url, host, service });
            } else if reference.contains(".css") {
                let service = catalog.identify(&host);
                scan.external_stylesheets
                    .push(ResourceRef { url, host, service });
            }
        }
    }

    // Iframes: chat widgets, payment forms, embedded content.
    for cap in iframe_re().captures_iter(markup) {
        let reference = &cap[1];
        if let Some((url, host)) = resolve_external(&base, reference) {
            let service = catalog.identify(&host);
            scan.iframes.push(ResourceRef { url, host, service });
        }
    }

    // Images are collapsed to a set of distinct external hosts first —
    // multiplicity across many images on one host must not inflate anything.
    // Only hosts identifying as tracker categories are retained.
    let mut image_hosts: BTreeSet<String> = BTreeSet::new();
    for cap in img_re().captures_iter(markup) {
        if let Some((_, host)) = resolve_external(&base, &cap[1]) {
            image_hosts.insert(host);
        }
    }
    for host in image_hosts {
        let service = catalog.identify(&host);
        if TRACKER_CATEGORIES.contains(&service.category.as_str()) {
            scan.tracking_pixels.push(PixelRef { host, service });
        }
    }

    // Inline API calls embedded in page scripts. Only absolute http(s)
    // targets are considered — relative API paths are same-origin by
    // definition.
    let shapes: [(&Regex, ApiCallShape); 3] = [
        (fetch_re(), ApiCallShape::Fetch),
        (rest_client_re(), ApiCallShape::RestClient),
        (ajax_re(), ApiCallShape::AjaxConfig),
    ];
    for (re, shape) in shapes {
        for cap in re.captures_iter(markup) {
            let reference = &cap[1];
            if !reference.starts_with("http") {
                continue;
            }
            if let Some((url, host)) = resolve_external(&base, reference) {
                let service = catalog.identify(&host);
                scan.api_calls.push(ApiCallRef {
                    url,
                    host,
                    shape,
                    service,
                });
            }
        }
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::builtin()
    }

    #[test]
    fn test_extracts_external_script() {
        let markup = r#"<script src="https://js.stripe.com/v3/"></script>"#;
        let scan = extract(markup, "https://example.com/", &catalog());
        assert_eq!(scan.external_scripts.len(), 1);
        let script = &scan.external_scripts[0];
        assert_eq!(script.host, "js.stripe.com");
        assert_eq!(script.service.name, "Stripe.js");
    }

    #[test]
    fn test_same_origin_references_discarded() {
        let markup = r#"
            <script src="/assets/app.js"></script>
            <script src="https://example.com/vendor.js"></script>
            <link href="/style.css" rel="stylesheet">
        "#;
        let scan = extract(markup, "https://example.com/pricing", &catalog());
        assert_eq!(scan.total_external(), 0);
    }

    #[test]
    fn test_relative_reference_resolves_against_origin() {
        // Protocol-relative reference resolves to an external host.
        let markup = r#"<script src="//cdn.jsdelivr.net/npm/vue@3"></script>"#;
        let scan = extract(markup, "https://example.com/", &catalog());
        assert_eq!(scan.external_scripts.len(), 1);
        assert_eq!(scan.external_scripts[0].host, "cdn.jsdelivr.net");
        assert_eq!(scan.external_scripts[0].url, "https://cdn.jsdelivr.net/npm/vue@3");
    }

    #[test]
    fn test_font_vs_stylesheet_split() {
        let markup = r#"
            <link href="https://fonts.googleapis.com/css2?family=Inter" rel="stylesheet">
            <link href="https://cdn.example.net/theme.css" rel="stylesheet">
            <link href="https://cdn.example.net/icon.png" rel="icon">
        "#;
        let scan = extract(markup, "https://example.com/", &catalog());
        assert_eq!(scan.external_fonts.len(), 1);
        assert_eq!(scan.external_fonts[0].service.name, "Google Fonts");
        assert_eq!(scan.external_stylesheets.len(), 1);
        assert_eq!(scan.external_stylesheets[0].host, "cdn.example.net");
        // icon.png matched neither bucket
        assert_eq!(scan.total_external(), 2);
    }

    #[test]
    fn test_image_hosts_deduplicated_and_filtered_to_trackers() {
        let markup = r#"
            <img src="https://www.google-analytics.com/collect?v=1&a=1">
            <img src="https://www.google-analytics.com/collect?v=1&a=2">
            <img src="https://img.example-cdn.org/hero.jpg">
        "#;
        let scan = extract(markup, "https://example.com/", &catalog());
        // Two pixels from one host collapse to one entry; the unidentified
        // image host is not a tracker category and is dropped.
        assert_eq!(scan.tracking_pixels.len(), 1);
        assert_eq!(scan.tracking_pixels[0].host, "www.google-analytics.com");
        assert_eq!(scan.tracking_pixels[0].service.category, "Analytics");
    }

    #[test]
    fn test_inline_api_call_shapes() {
        let markup = r#"
            <script>
                fetch("https://api.openai.com/v1/chat");
                client.post("https://api.segment.com/v1/track", body);
                $.ajax({method: "GET", url: "https://api.mixpanel.com/track"});
                fetch("/internal/api");
            </script>
        "#;
        let scan = extract(markup, "https://example.com/", &catalog());
        assert_eq!(scan.api_calls.len(), 3);
        assert_eq!(scan.api_calls[0].shape, ApiCallShape::Fetch);
        assert_eq!(scan.api_calls[0].service.name, "OpenAI");
        assert_eq!(scan.api_calls[1].shape, ApiCallShape::RestClient);
        assert_eq!(scan.api_calls[2].shape, ApiCallShape::AjaxConfig);
    }

    #[test]
    fn test_distinct_services_dedupe_across_kinds() {
        // Same host referenced as a script and an iframe counts once.
        let markup = r#"
            <script src="https://widget.intercom.io/widget/abc"></script>
            <iframe src="https://widget.intercom.io/frame"></iframe>
        "#;
        let scan = extract(markup, "https://example.com/", &catalog());
        let services = scan.distinct_services();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "Intercom Widget");
    }

    #[test]
    fn test_malformed_markup_does_not_fail() {
        let markup = r#"<script src="ht!tp:/|bad"><link href="%%%"><iframe src=">"#;
        let scan = extract(markup, "https://example.com/", &catalog());
        assert_eq!(scan.total_external(), 0);
    }

    #[test]
    fn test_unparsable_page_url_yields_empty_scan() {
        let markup = r#"<script src="https://js.stripe.com/v3/"></script>"#;
        let scan = extract(markup, "not a url", &catalog());
        assert_eq!(scan.total_external(), 0);
    }
}
