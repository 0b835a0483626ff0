//! Builds the component inventory (BOM) from extracted components.
//!
//! Metadata recovery is shallow and conservative: well-known version
//! banners are matched with regexes against the component's bytes, and a
//! component that yields nothing gets an `unknown-<kind>` entry with every
//! optional field absent. Nothing is ever guessed or fabricated.

use crate::analysis::domain::{
    BomCategory, BomEntry, ComponentKind, ExtractedComponent, FirmwareImage,
};
use regex::bytes::Regex;
use std::collections::BTreeMap;

/// Version banners commonly embedded in consumer firmware.
const BANNERS: &[(&str, &str)] = &[
    ("busybox", r"BusyBox v(\d+\.\d+\.\d+)"),
    ("openssl", r"OpenSSL (\d+\.\d+\.\d+[a-z]?)"),
    ("linux-kernel", r"Linux version (\d+\.\d+\.\d+)"),
    ("u-boot", r"U-Boot (\d+\.\d+(?:\.\d+)?)"),
    ("dropbear", r"Dropbear (?:sshd? )?v?(\d{4}\.\d+)"),
    ("dnsmasq", r"[Dd]nsmasq[- ]v?(\d+\.\d+)"),
    ("uclibc", r"uClibc-(\d+\.\d+\.\d+)"),
];

pub struct InventoryBuilder {
    banners: Vec<(&'static str, Regex)>,
}

impl Default for InventoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryBuilder {
    pub fn new() -> Self {
        let banners = BANNERS
            .iter()
            .map(|(name, pattern)| {
                // Patterns are static and known-valid.
                (*name, Regex::new(pattern).expect("invalid banner pattern"))
            })
            .collect();
        Self { banners }
    }

    /// Builds the deduplicated, stably ordered BOM for one analysis run.
    ///
    /// `components` must be in extraction (offset) order; `sources` on each
    /// entry are indices into that list.
    pub fn build(
        &self,
        image: &FirmwareImage,
        components: &[ExtractedComponent],
    ) -> Vec<BomEntry> {
        // Dedup by (name, version), accumulating source back-references.
        let mut entries: BTreeMap<(String, Option<String>), BomEntry> = BTreeMap::new();

        for (index, component) in components.iter().enumerate() {
            for entry in self.entries_for(image, component, index) {
                let key = (entry.name.clone(), entry.version.clone());
                entries
                    .entry(key)
                    .and_modify(|existing| {
                        existing.sources.insert(index);
                    })
                    .or_insert(entry);
            }
        }

        let mut bom: Vec<BomEntry> = entries.into_values().collect();
        // Stable output order: first source offset, then name.
        bom.sort_by(|a, b| {
            let a_first = a.sources.iter().next().copied().unwrap_or(usize::MAX);
            let b_first = b.sources.iter().next().copied().unwrap_or(usize::MAX);
            a_first.cmp(&b_first).then_with(|| a.name.cmp(&b.name))
        });
        bom
    }

    fn entries_for(
        &self,
        image: &FirmwareImage,
        component: &ExtractedComponent,
        index: usize,
    ) -> Vec<BomEntry> {
        let category = category_for(component.kind);
        let mut found = Vec::new();

        if category == BomCategory::Software {
            let bytes = component.slice(image);
            for (name, regex) in &self.banners {
                if let Some(caps) = regex.captures(bytes) {
                    if let Some(version) = caps.get(1) {
                        let version = String::from_utf8_lossy(version.as_bytes()).into_owned();
                        found.push(
                            BomEntry::new(*name, category, index).with_version(version),
                        );
                    }
                }
            }
        }

        if found.is_empty() {
            // No structured metadata recovered: type-derived name only,
            // version/supplier/license stay absent.
            found.push(BomEntry::new(
                format!("unknown-{}", component.kind.label()),
                category,
                index,
            ));
        }
        found
    }
}

fn category_for(kind: ComponentKind) -> BomCategory {
    match kind {
        ComponentKind::DeviceTree => BomCategory::Hardware,
        _ => BomCategory::Software,
    }
}

/// Total bytes claimed by top-level components. Nested components are
/// excluded so overlapping ranges are not double counted.
pub fn total_storage(components: &[ExtractedComponent]) -> usize {
    components
        .iter()
        .filter(|c| !c.nested)
        .map(|c| c.length)
        .sum()
}
