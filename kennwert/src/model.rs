//! Domain records shared by the validation layer and both engines
//!
//! Everything here is immutable during a run. Engines read these records
//! and emit new result components; they never mutate inputs.

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Per-material quantity data on an element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialQuantity {
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub fraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
}

impl MaterialQuantity {
    /// Volume attributable to this material; fraction defaults to 1.0
    pub fn effective_volume(&self) -> f64 {
        self.volume.unwrap_or(0.0) * self.fraction.unwrap_or(1.0)
    }
}

/// Physical quantities reported by the extraction; any may be absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalQuantities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_net: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_gross: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_net: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_gross: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// A building element as consumed by the engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingElement {
    pub id: String,
    pub classification_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ifc_class: Option<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub material_quantities: BTreeMap<String, MaterialQuantity>,
    #[serde(default)]
    pub quantities: PhysicalQuantities,
}

impl BuildingElement {
    pub fn new(id: impl Into<String>, classification_code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            classification_code: classification_code.into(),
            ifc_class: None,
            materials: Vec::new(),
            material_quantities: BTreeMap::new(),
            quantities: PhysicalQuantities::default(),
        }
    }

    /// Add a material with its quantity record, keeping list and map in sync
    pub fn with_material(mut self, name: impl Into<String>, quantity: MaterialQuantity) -> Self {
        let name = name.into();
        self.materials.push(name.clone());
        self.material_quantities.insert(name, quantity);
        self
    }

    pub fn with_quantities(mut self, quantities: PhysicalQuantities) -> Self {
        self.quantities = quantities;
        self
    }

    pub fn material_quantity(&self, material: &str) -> Option<&MaterialQuantity> {
        self.material_quantities.get(material)
    }
}

/// Environmental reference row (one material of one dataset version)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialReferenceRow {
    pub key: String,
    pub name: String,
    /// Global warming potential per kg
    pub gwp: f64,
    /// Non-renewable primary energy per kg
    pub penre: f64,
    /// Environmental pressure points per kg
    pub ubp: f64,
    /// Resolved density; 0.0 means none available
    pub density: f64,
}

/// Quantity basis a cost rate refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostUnit {
    /// Square metres, priced on net area
    Area,
    /// Metres, priced on length
    Length,
}

impl CostUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            CostUnit::Area => "m2",
            CostUnit::Length => "m",
        }
    }
}

impl FromStr for CostUnit {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "m2" | "m²" => Ok(CostUnit::Area),
            "m" => Ok(CostUnit::Length),
            other => Err(RecordError::UnknownUnit(other.to_string())),
        }
    }
}

impl fmt::Display for CostUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Cost reference row keyed by classification code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReferenceRow {
    pub code: String,
    pub unit_rate: f64,
    /// Raw unit tag as found in the source table
    pub unit: String,
}

impl CostReferenceRow {
    /// Parse the unit tag; an unrecognised tag is an error for this row only
    pub fn cost_unit(&self) -> Result<CostUnit, RecordError> {
        self.unit.parse()
    }
}

/// Maps a material name used in element data to an environmental reference key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialMapping {
    pub material: String,
    pub reference_id: String,
}

/// Classification-code prefix to service life in years
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLifeEntry {
    pub code: String,
    pub years: u32,
}
