//! Totals and failure listing over grouped results

use crate::aggregate::failure_log;
use crate::response::{ComponentPayload, ElementResult, ErrorLogEntry};
use serde::{Deserialize, Serialize};

/// Indicator and cost totals over all successful components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub gwp_absolute: f64,
    pub gwp_per_year: f64,
    pub penr_absolute: f64,
    pub penr_per_year: f64,
    pub ubp_absolute: f64,
    pub ubp_per_year: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_elements: usize,
    /// Elements with at least one successful component
    pub processed_elements: usize,
    /// Elements with at least one failed component
    pub failed_elements: usize,
    pub total_components: usize,
    pub failed_components: usize,
    pub totals: Totals,
    pub failures: Vec<ErrorLogEntry>,
}

fn accumulate(total: &mut f64, value: f64, field: &str, element_id: &str) {
    if value.is_finite() {
        *total += value;
    } else {
        tracing::warn!(element = element_id, field, "ignoring non-finite value in summary");
    }
}

/// Summarize LCA, cost or combined results
pub fn summarize(results: &[ElementResult]) -> RunSummary {
    let mut summary = RunSummary {
        total_elements: results.len(),
        failures: failure_log(results),
        ..RunSummary::default()
    };

    for result in results {
        if result.has_successes() {
            summary.processed_elements += 1;
        }
        if result.has_failures() {
            summary.failed_elements += 1;
        }
        summary.total_components += result.components.len();

        let totals = &mut summary.totals;
        for payload in result.successes() {
            match payload {
                ComponentPayload::Lca(lca) => {
                    let id = lca.element_id.as_str();
                    accumulate(&mut totals.gwp_absolute, lca.gwp_absolute, "gwp_absolute", id);
                    accumulate(&mut totals.gwp_per_year, lca.gwp_per_year, "gwp_per_year", id);
                    accumulate(&mut totals.penr_absolute, lca.penr_absolute, "penr_absolute", id);
                    accumulate(&mut totals.penr_per_year, lca.penr_per_year, "penr_per_year", id);
                    accumulate(&mut totals.ubp_absolute, lca.ubp_absolute, "ubp_absolute", id);
                    accumulate(&mut totals.ubp_per_year, lca.ubp_per_year, "ubp_per_year", id);
                }
                ComponentPayload::Cost(cost) => {
                    accumulate(&mut totals.total_cost, cost.total_cost, "total_cost", &cost.element_id);
                }
            }
        }
    }
    summary.failed_components = summary.failures.len();

    tracing::info!(
        elements = summary.total_elements,
        processed = summary.processed_elements,
        failed = summary.failed_elements,
        "summarized results"
    );
    summary
}
