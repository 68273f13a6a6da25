//! Cost computation
//!
//! One component per element: the classification code selects a cost row,
//! the row's unit selects the quantity basis (net area or length), and the
//! total is quantity times unit rate.

use super::rounding::{round_to, MONEY_DP};
use crate::aggregate::Aggregator;
use crate::error::RecordError;
use crate::model::{BuildingElement, CostUnit};
use crate::reference::CostReference;
use crate::response::{ComponentFailure, CostComponent, ElementResult, ResultComponent};

/// Quantity an element contributes for a given cost unit
pub fn quantity_for(element: &BuildingElement, unit: CostUnit) -> Option<f64> {
    match unit {
        CostUnit::Area => element.quantities.area_net,
        CostUnit::Length => element.quantities.length,
    }
}

/// Evaluate the single cost component for one element
pub fn evaluate_element(element: &BuildingElement, cost: &CostReference) -> ResultComponent {
    match try_element(element, cost) {
        Ok(component) => component.into(),
        Err(err) => {
            tracing::debug!(element = %element.id, code = %element.classification_code, error = %err, "cost component failed");
            ComponentFailure::new(&element.id, &err)
                .with_classification_code(&element.classification_code)
                .into()
        }
    }
}

fn try_element(element: &BuildingElement, cost: &CostReference) -> Result<CostComponent, RecordError> {
    let code = element.classification_code.trim();
    let row = cost
        .get(code)
        .ok_or_else(|| RecordError::CostDataNotFound(code.to_string()))?;

    let unit = row.cost_unit()?;
    let quantity = quantity_for(element, unit)
        .filter(|quantity| quantity.is_finite() && *quantity > 0.0)
        .ok_or_else(|| RecordError::InvalidQuantity {
            element_id: element.id.clone(),
            code: code.to_string(),
        })?;

    Ok(CostComponent {
        element_id: element.id.clone(),
        classification_code: element.classification_code.clone(),
        total_cost: round_to(quantity * row.unit_rate, MONEY_DP),
        unit_cost: round_to(row.unit_rate, MONEY_DP),
        unit: row.unit.trim().to_string(),
    })
}

/// Compute cost results for a batch of elements
pub fn compute_cost(elements: &[BuildingElement], cost: &CostReference) -> Vec<ElementResult> {
    let mut aggregator = Aggregator::new();
    evaluate_into(elements, cost, &mut aggregator);
    aggregator.finish()
}

pub(crate) fn evaluate_into(elements: &[BuildingElement], cost: &CostReference, aggregator: &mut Aggregator) {
    for element in elements {
        aggregator.ensure(&element.id);
        aggregator.push(evaluate_element(element, cost));
    }
}
