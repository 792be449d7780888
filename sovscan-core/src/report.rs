//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs

use crate::facts::Vendor;
use crate::resources::ResourceScan;
use crate::scoring::ScoreResult;

/// Render a score result as fixed-width text output
pub fn render_text(result: &ScoreResult, vendors: &[Vendor]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Sovereignty score: {}/100 ({} risk)\n",
        result.score,
        result.risk_level.as_str()
    ));

    if !vendors.is_empty() {
        output.push_str(&format!(
            "\n{:<28} {:<24} {:<20} {}\n",
            "VENDOR", "PURPOSE", "LOCATION", "RISK"
        ));
        for vendor in vendors {
            output.push_str(&format!(
                "{:<28} {:<24} {:<20} {}\n",
                truncate_or_pad(&vendor.name, 28),
                truncate_or_pad(&vendor.purpose, 24),
                truncate_or_pad(&vendor.location, 20),
                vendor.risk,
            ));
        }
    }

    if !result.risk_factors.is_empty() {
        output.push_str("\nRisk factors:\n");
        for factor in &result.risk_factors {
            output.push_str(&format!("  - {factor}\n"));
        }
    }

    if !result.positive_factors.is_empty() {
        output.push_str("\nPositive factors:\n");
        for factor in &result.positive_factors {
            output.push_str(&format!("  + {factor}\n"));
        }
    }

    if !result.deductions.is_empty() {
        output.push_str("\nDeductions:\n");
        for deduction in &result.deductions {
            output.push_str(&format!("  {deduction}\n"));
        }
    }

    output
}

/// Render a score result as JSON output
pub fn render_json(result: &ScoreResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
}

/// Render a resource scan as fixed-width text output
pub fn render_scan_text(scan: &ResourceScan) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "External resources: {} ({} scripts, {} fonts, {} stylesheets, {} iframes, {} pixels, {} API calls)\n",
        scan.total_external(),
        scan.external_scripts.len(),
        scan.external_fonts.len(),
        scan.external_stylesheets.len(),
        scan.iframes.len(),
        scan.tracking_pixels.len(),
        scan.api_calls.len(),
    ));

    let services = scan.distinct_services();
    if services.is_empty() {
        return output;
    }

    output.push_str(&format!(
        "\n{:<28} {:<26} {:<20} {:<14} {}\n",
        "SERVICE", "DOMAIN", "CATEGORY", "JURISDICTION", "RISK"
    ));
    for service in &services {
        output.push_str(&format!(
            "{:<28} {:<26} {:<20} {:<14} {}\n",
            truncate_or_pad(&service.name, 28),
            truncate_or_pad(&service.domain, 26),
            truncate_or_pad(&service.category, 20),
            truncate_or_pad(&service.jurisdiction, 14),
            service.risk_level,
        ));
    }

    output
}

/// Render a resource scan as JSON output
pub fn render_scan_json(scan: &ResourceScan) -> String {
    serde_json::to_string_pretty(scan).unwrap_or_else(|_| "{}".to_string())
}

/// Truncate or pad string to fixed width
///
/// Width is measured in characters, so multibyte names truncate cleanly.
pub fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        format!("{:<width$}", s, width = width)
    }
}
