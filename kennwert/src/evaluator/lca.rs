//! LCA computation
//!
//! Joins each (element, material) pair to an environmental reference row via
//! the material mapping and computes absolute and per-year indicators:
//!
//! 1. effective volume = volume * fraction, must be > 0
//! 2. density from the configured source, must be > 0
//! 3. material name -> reference id via the mapping table
//! 4. reference id -> environmental row
//! 5. amortization years from the service-life table, else the default
//! 6. indicator = volume * density * factor; per year = indicator / years

use super::rounding::{round_to, INDICATOR_DP, UBP_DP};
use crate::aggregate::Aggregator;
use crate::config::{DensitySource, EngineConfig};
use crate::error::RecordError;
use crate::model::BuildingElement;
use crate::reference::{EnvironmentalReference, MaterialMappings, ServiceLifeTable};
use crate::response::{ComponentFailure, ElementResult, LcaComponent, ResultComponent};
use std::collections::HashMap;

/// Evaluates LCA components against one reference snapshot
pub struct LcaEvaluator<'a> {
    environmental: &'a EnvironmentalReference,
    mappings: &'a MaterialMappings,
    service_life: &'a ServiceLifeTable,
    config: &'a EngineConfig,
    /// Amortization years resolved so far, per classification code
    amortization: HashMap<String, u32>,
    warnings: Vec<String>,
}

impl<'a> LcaEvaluator<'a> {
    pub fn new(
        environmental: &'a EnvironmentalReference,
        mappings: &'a MaterialMappings,
        service_life: &'a ServiceLifeTable,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            environmental,
            mappings,
            service_life,
            config,
            amortization: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// One component per listed material, success or failure
    pub fn evaluate_element(&mut self, element: &BuildingElement) -> Vec<ResultComponent> {
        tracing::debug!(
            element = %element.id,
            materials = element.materials.len(),
            "evaluating LCA"
        );
        element
            .materials
            .iter()
            .map(|material| self.evaluate_material(element, material))
            .collect()
    }

    /// Evaluate elements into grouped results; every element id appears
    pub fn evaluate_into(&mut self, elements: &[BuildingElement], aggregator: &mut Aggregator) {
        for element in elements {
            aggregator.ensure(&element.id);
            aggregator.extend(self.evaluate_element(element));
        }
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    fn evaluate_material(&mut self, element: &BuildingElement, material: &str) -> ResultComponent {
        let mut reference_id = None;
        match self.try_material(element, material, &mut reference_id) {
            Ok(component) => component.into(),
            Err(err) => {
                tracing::debug!(element = %element.id, material, error = %err, "LCA component failed");
                ComponentFailure::new(&element.id, &err)
                    .with_material(material)
                    .with_classification_code(&element.classification_code)
                    .with_reference_id(reference_id)
                    .into()
            }
        }
    }

    fn try_material(
        &mut self,
        element: &BuildingElement,
        material: &str,
        reference_id: &mut Option<String>,
    ) -> Result<LcaComponent, RecordError> {
        let quantity = element
            .material_quantity(material)
            .ok_or_else(|| RecordError::MissingVolumeData(material.to_string()))?;

        let volume = quantity.effective_volume();
        if !(volume > 0.0) {
            return Err(RecordError::InvalidVolume(volume));
        }

        let record_density = match self.config.density_source {
            DensitySource::MaterialRecord => Some(checked_density(quantity.density)?),
            DensitySource::Reference => None,
        };

        let key = self
            .mappings
            .get(material)
            .ok_or_else(|| RecordError::MaterialMappingNotFound(material.to_string()))?;
        *reference_id = Some(key.to_string());

        let row = self
            .environmental
            .get(key)
            .ok_or_else(|| RecordError::ReferenceNotFound(key.to_string()))?;

        let density = match record_density {
            Some(density) => density,
            None => checked_density(Some(row.density))?,
        };

        let years = self.amortization_years(&element.classification_code);
        let mass = volume * density;

        let gwp = mass * row.gwp;
        let penr = mass * row.penre;
        let ubp = mass * row.ubp;
        let per_year = |value: f64| value / f64::from(years);

        Ok(LcaComponent {
            element_id: element.id.clone(),
            material: material.to_string(),
            reference_id: row.key.clone(),
            reference_name: row.name.clone(),
            volume: round_to(volume, INDICATOR_DP),
            density: round_to(density, INDICATOR_DP),
            amortization_years: years,
            classification_code: element.classification_code.clone(),
            gwp_absolute: round_to(gwp, INDICATOR_DP),
            gwp_per_year: round_to(per_year(gwp), INDICATOR_DP),
            penr_absolute: round_to(penr, INDICATOR_DP),
            penr_per_year: round_to(per_year(penr), INDICATOR_DP),
            ubp_absolute: round_to(ubp, UBP_DP),
            ubp_per_year: round_to(per_year(ubp), UBP_DP),
        })
    }

    fn amortization_years(&mut self, code: &str) -> u32 {
        if let Some(years) = self.amortization.get(code) {
            return *years;
        }

        let years = match self.service_life.lookup(code, self.config.service_life_match) {
            Some(years) if years > 0 => years,
            _ => {
                let default = self.config.default_amortization_years.max(1);
                tracing::warn!(code, default, "no service-life entry, using default amortization");
                self.warnings.push(format!(
                    "No service life for classification code '{}', using {} years",
                    code, default
                ));
                default
            }
        };
        self.amortization.insert(code.to_string(), years);
        years
    }
}

fn checked_density(density: Option<f64>) -> Result<f64, RecordError> {
    match density {
        Some(value) if value > 0.0 && value.is_finite() => Ok(value),
        other => Err(RecordError::InvalidDensity(other)),
    }
}

/// Compute LCA results for a batch of elements.
///
/// Per-record problems become failed components; the batch always completes.
pub fn compute_lca(
    elements: &[BuildingElement],
    environmental: &EnvironmentalReference,
    mappings: &MaterialMappings,
    service_life: &ServiceLifeTable,
    config: &EngineConfig,
) -> Vec<ElementResult> {
    let mut evaluator = LcaEvaluator::new(environmental, mappings, service_life, config);
    let mut aggregator = Aggregator::new();
    evaluator.evaluate_into(elements, &mut aggregator);
    aggregator.finish()
}
