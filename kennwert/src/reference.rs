//! Read-only reference tables used during a computation run

use crate::config::ServiceLifeMatch;
use crate::model::{
    CostReferenceRow, MaterialMapping, MaterialReferenceRow, ServiceLifeEntry,
};
use std::collections::HashMap;

/// One version of the environmental dataset, keyed by reference id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentalReference {
    version: String,
    rows: HashMap<String, MaterialReferenceRow>,
}

impl EnvironmentalReference {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            rows: HashMap::new(),
        }
    }

    pub fn from_rows(version: impl Into<String>, rows: Vec<MaterialReferenceRow>) -> Self {
        let mut reference = Self::new(version);
        for row in rows {
            reference.insert(row);
        }
        reference
    }

    /// Insert a row; the key is trimmed, a later row replaces an earlier one
    pub fn insert(&mut self, mut row: MaterialReferenceRow) {
        row.key = row.key.trim().to_string();
        self.rows.insert(row.key.clone(), row);
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get(&self, key: &str) -> Option<&MaterialReferenceRow> {
        self.rows.get(key.trim())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows sorted by key
    pub fn rows(&self) -> Vec<&MaterialReferenceRow> {
        let mut rows: Vec<_> = self.rows.values().collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        rows
    }
}

/// Cost rates keyed by classification code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostReference {
    rows: HashMap<String, CostReferenceRow>,
}

impl CostReference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<CostReferenceRow>) -> Self {
        let mut reference = Self::new();
        for row in rows {
            reference.insert(row);
        }
        reference
    }

    pub fn insert(&mut self, mut row: CostReferenceRow) {
        row.code = row.code.trim().to_string();
        self.rows.insert(row.code.clone(), row);
    }

    pub fn get(&self, code: &str) -> Option<&CostReferenceRow> {
        self.rows.get(code.trim())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Many-to-one map from element material names to reference ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialMappings {
    by_material: HashMap<String, String>,
}

impl MaterialMappings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mappings(mappings: Vec<MaterialMapping>) -> Self {
        let mut table = Self::new();
        for mapping in mappings {
            table.insert(mapping.material, mapping.reference_id);
        }
        table
    }

    pub fn insert(&mut self, material: impl Into<String>, reference_id: impl Into<String>) {
        let reference_id: String = reference_id.into();
        self.by_material
            .insert(material.into(), reference_id.trim().to_string());
    }

    pub fn get(&self, material: &str) -> Option<&str> {
        self.by_material.get(material).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_material.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_material.is_empty()
    }
}

/// Service life per classification-code prefix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceLifeTable {
    entries: Vec<ServiceLifeEntry>,
}

impl ServiceLifeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<ServiceLifeEntry>) -> Self {
        let mut table = Self::new();
        for entry in entries {
            table.insert(entry.code, entry.years);
        }
        table
    }

    pub fn insert(&mut self, code: impl Into<String>, years: u32) {
        let code = code.into().trim().to_string();
        self.entries.retain(|entry| entry.code != code);
        self.entries.push(ServiceLifeEntry { code, years });
    }

    /// Years for a classification code, or `None` when no entry matches
    pub fn lookup(&self, code: &str, mode: ServiceLifeMatch) -> Option<u32> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        match mode {
            ServiceLifeMatch::Exact => self
                .entries
                .iter()
                .find(|entry| entry.code == code)
                .map(|entry| entry.years),
            ServiceLifeMatch::LongestPrefix => self
                .entries
                .iter()
                .filter(|entry| !entry.code.is_empty() && code.starts_with(entry.code.as_str()))
                .max_by_key(|entry| entry.code.len())
                .map(|entry| entry.years),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Consistent view of all reference data for one run.
///
/// The environmental version is fixed when the snapshot is taken; later
/// changes to the active version elsewhere do not affect a run holding it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSnapshot {
    pub environmental: EnvironmentalReference,
    pub mappings: MaterialMappings,
    pub service_life: ServiceLifeTable,
    pub cost: CostReference,
    /// Reference-integrity warnings collected while preparing the tables
    pub warnings: Vec<String>,
}

impl ReferenceSnapshot {
    pub fn environmental_version(&self) -> &str {
        self.environmental.version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ServiceLifeTable {
        ServiceLifeTable::from_entries(vec![
            ServiceLifeEntry {
                code: "C".to_string(),
                years: 50,
            },
            ServiceLifeEntry {
                code: "C02".to_string(),
                years: 40,
            },
            ServiceLifeEntry {
                code: "C02.01".to_string(),
                years: 30,
            },
        ])
    }

    #[test]
    fn test_longest_prefix_lookup() {
        let table = table();
        assert_eq!(table.lookup("C02.01", ServiceLifeMatch::LongestPrefix), Some(30));
        assert_eq!(table.lookup("C02.02", ServiceLifeMatch::LongestPrefix), Some(40));
        assert_eq!(table.lookup("C04.01", ServiceLifeMatch::LongestPrefix), Some(50));
        assert_eq!(table.lookup("E01", ServiceLifeMatch::LongestPrefix), None);
    }

    #[test]
    fn test_exact_lookup() {
        let table = table();
        assert_eq!(table.lookup(" C02 ", ServiceLifeMatch::Exact), Some(40));
        assert_eq!(table.lookup("C02.02", ServiceLifeMatch::Exact), None);
        assert_eq!(table.lookup("", ServiceLifeMatch::Exact), None);
    }

    #[test]
    fn test_insert_replaces_existing_code() {
        let mut table = table();
        table.insert("C", 45);
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup("C", ServiceLifeMatch::Exact), Some(45));
    }

    #[test]
    fn test_keys_are_trimmed() {
        let mut reference = EnvironmentalReference::new("2022");
        reference.insert(MaterialReferenceRow {
            key: " ABC ".to_string(),
            name: "Concrete".to_string(),
            gwp: 0.1,
            penre: 0.2,
            ubp: 100.0,
            density: 2300.0,
        });
        assert!(reference.get("ABC").is_some());
        assert!(reference.get(" ABC").is_some());

        let mut mappings = MaterialMappings::new();
        mappings.insert("Concrete", " ABC ");
        assert_eq!(mappings.get("Concrete"), Some("ABC"));
    }
}
