//! Jurisdiction text classification
//!
//! Free-text location strings are matched against curated name lists. The
//! predicates are independent — callers query `is_eu` and `is_us` separately,
//! and a pathological string may satisfy both. Empty or "Unknown" text
//! satisfies neither; callers treat that as an undisclosed-location branch.

use regex::Regex;
use std::sync::OnceLock;

/// The 27 EU member states, matched case-insensitively as substrings.
pub const EU_COUNTRIES: &[&str] = &[
    "GERMANY",
    "FRANCE",
    "IRELAND",
    "NETHERLANDS",
    "ITALY",
    "SPAIN",
    "BELGIUM",
    "AUSTRIA",
    "SWEDEN",
    "DENMARK",
    "FINLAND",
    "POLAND",
    "PORTUGAL",
    "CZECH",
    "ROMANIA",
    "BULGARIA",
    "CROATIA",
    "SLOVENIA",
    "SLOVAKIA",
    "ESTONIA",
    "LATVIA",
    "LITHUANIA",
    "LUXEMBOURG",
    "MALTA",
    "CYPRUS",
    "GREECE",
    "HUNGARY",
];

/// True if the text names an EU/EEA jurisdiction: contains "EU" or "EEA", or
/// any member-state name from [`EU_COUNTRIES`].
pub fn is_eu(text: &str) -> bool {
    let t = text.to_uppercase();
    t.contains("EU") || t.contains("EEA") || EU_COUNTRIES.iter().any(|c| t.contains(c))
}

/// True if the text names a US jurisdiction: contains "USA" or
/// "UNITED STATES", or "US" as a standalone word.
///
/// The word-boundary rule means "US (Virginia)" matches while "AUSTRIA" and
/// "AUSTRALIA" do not — "US" inside a longer token never counts.
pub fn is_us(text: &str) -> bool {
    let t = text.to_uppercase();
    let t = t.trim();
    if t.contains("USA") || t.contains("UNITED STATES") {
        return true;
    }
    static US_WORD: OnceLock<Regex> = OnceLock::new();
    let us_word = US_WORD.get_or_init(|| Regex::new(r"\bUS\b").unwrap());
    us_word.is_match(t)
}

/// True if the text declares a global (jurisdictionally uncertain) footprint.
pub fn is_global(text: &str) -> bool {
    text.to_uppercase().contains("GLOBAL")
}

/// True for empty or explicitly undisclosed location text.
pub fn is_unknown(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || t.eq_ignore_ascii_case("unknown")
}
