//! Vendor-list merging
//!
//! Folds resource-detected services into the vendor list supplied by the
//! external fact extractor. Identity is the case-insensitive vendor name, so
//! a service already disclosed on a sub-processor page is not added twice.
//! The merge is order-preserving and idempotent.

use crate::facts::Vendor;
use crate::services::ServiceRecord;
use std::collections::HashSet;

/// Merge identified services into a vendor list.
///
/// Original vendor order is preserved; services not already present (by
/// case-insensitive name) are appended in encounter order, with the service
/// category as `purpose`, jurisdiction as `location`, and risk tier as `risk`.
pub fn merge_services(vendors: &[Vendor], services: &[ServiceRecord]) -> Vec<Vendor> {
    let mut merged = vendors.to_vec();
    let mut seen: HashSet<String> = vendors.iter().map(|v| v.name.to_lowercase()).collect();

    for service in services {
        if seen.insert(service.name.to_lowercase()) {
            merged.push(Vendor {
                name: service.name.clone(),
                purpose: service.category.clone(),
                location: service.jurisdiction.clone(),
                risk: service.risk_level.clone(),
            });
        }
    }

    merged
}
