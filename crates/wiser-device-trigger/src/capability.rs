//! Statically known trigger types per entity domain

use wiser_core::domains;

/// One `(entity domain, trigger type)` row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capability {
    pub domain: &'static str,
    pub trigger_type: &'static str,
}

impl Capability {
    pub const fn new(domain: &'static str, trigger_type: &'static str) -> Self {
        Self {
            domain,
            trigger_type,
        }
    }
}

/// Climate events raised by the hub for heating channels
pub const WISER_CAPABILITIES: &[Capability] = &[
    Capability::new(domains::CLIMATE, "boosted"),
    Capability::new(domains::CLIMATE, "boost_cancelled"),
    Capability::new(domains::CLIMATE, "started_heating"),
    Capability::new(domains::CLIMATE, "stopped_heating"),
    Capability::new(domains::CLIMATE, "target_temperature_increased"),
    Capability::new(domains::CLIMATE, "target_temperature_decreased"),
];

/// Read-only view over a set of capability rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityTable {
    rows: &'static [Capability],
}

impl CapabilityTable {
    pub const fn new(rows: &'static [Capability]) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &'static [Capability] {
        self.rows
    }

    pub fn supports_domain(&self, domain: &str) -> bool {
        self.rows.iter().any(|c| c.domain == domain)
    }

    /// Trigger types for `domain` in table order, without duplicates
    pub fn types_for_domain(&self, domain: &str) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = Vec::new();
        for row in self.rows.iter().filter(|c| c.domain == domain) {
            if !types.contains(&row.trigger_type) {
                types.push(row.trigger_type);
            }
        }
        types
    }

    /// Every trigger type in the table, in table order, without duplicates
    pub fn trigger_types(&self) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = Vec::new();
        for row in self.rows {
            if !types.contains(&row.trigger_type) {
                types.push(row.trigger_type);
            }
        }
        types
    }

    pub fn contains_type(&self, trigger_type: &str) -> bool {
        self.rows.iter().any(|c| c.trigger_type == trigger_type)
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::new(WISER_CAPABILITIES)
    }
}
