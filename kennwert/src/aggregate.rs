//! Grouping of result components by element id
//!
//! Grouping is by id, full stop: two records carrying the same id are merged
//! into one result and flagged through `shared_id`.

use crate::error::FailureKind;
use crate::response::{ElementResult, ErrorLogEntry, ResultComponent};
use std::collections::HashMap;

/// Accumulates components into per-element results in first-seen order
#[derive(Debug, Default)]
pub struct Aggregator {
    results: Vec<ElementResult>,
    index: HashMap<String, usize>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element id so it appears even without components
    pub fn ensure(&mut self, element_id: &str) -> &mut ElementResult {
        let position = match self.index.get(element_id).copied() {
            Some(position) => position,
            None => {
                self.results.push(ElementResult::new(element_id));
                self.index
                    .insert(element_id.to_string(), self.results.len() - 1);
                self.results.len() - 1
            }
        };
        &mut self.results[position]
    }

    pub fn push(&mut self, component: ResultComponent) {
        let element_id = component.element_id().to_string();
        self.ensure(&element_id).push(component);
    }

    pub fn extend(&mut self, components: impl IntoIterator<Item = ResultComponent>) {
        for component in components {
            self.push(component);
        }
    }

    pub fn finish(self) -> Vec<ElementResult> {
        self.results
    }
}

/// Group a flat component list by element id
pub fn group_components(components: impl IntoIterator<Item = ResultComponent>) -> Vec<ElementResult> {
    let mut aggregator = Aggregator::new();
    aggregator.extend(components);
    aggregator.finish()
}

/// Flatten results back into their components, in order
pub fn flatten(results: &[ElementResult]) -> Vec<ResultComponent> {
    results
        .iter()
        .flat_map(|result| result.components.iter().cloned())
        .collect()
}

/// Merge LCA and cost results by element id.
///
/// Elements keep the order in which they were first seen (LCA first), and
/// `shared_id` is recomputed from the merged component count. A quarantined
/// record shows up with the same malformed-record failure in both engines'
/// output; it is kept once.
pub fn combine_results(lca: &[ElementResult], cost: &[ElementResult]) -> Vec<ElementResult> {
    let mut aggregator = Aggregator::new();
    for result in lca.iter().chain(cost) {
        let entry = aggregator.ensure(&result.element_id);
        for component in &result.components {
            if is_malformed(component) && entry.components.contains(component) {
                continue;
            }
            entry.push(component.clone());
        }
    }
    aggregator.finish()
}

fn is_malformed(component: &ResultComponent) -> bool {
    component
        .as_failure()
        .is_some_and(|failure| failure.error_kind == FailureKind::MalformedRecord)
}

/// Every failed component as a structured error-log entry
pub fn failure_log(results: &[ElementResult]) -> Vec<ErrorLogEntry> {
    results
        .iter()
        .flat_map(|result| result.failures())
        .map(ErrorLogEntry::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use crate::response::{ComponentFailure, CostComponent};

    fn cost(id: &str, total: f64) -> ResultComponent {
        CostComponent {
            element_id: id.to_string(),
            classification_code: "C01".to_string(),
            total_cost: total,
            unit_cost: 10.0,
            unit: "m2".to_string(),
        }
        .into()
    }

    fn failure(id: &str) -> ResultComponent {
        ComponentFailure::new(id, &RecordError::CostDataNotFound("X".to_string()))
            .with_classification_code("X")
            .into()
    }

    #[test]
    fn test_group_preserves_first_seen_order() {
        let results = group_components(vec![
            cost("B", 1.0),
            cost("A", 2.0),
            failure("B"),
            cost("C", 3.0),
        ]);
        let ids: Vec<_> = results.iter().map(|r| r.element_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
        assert!(results[0].shared_id);
        assert!(!results[1].shared_id);
        assert!(results[0].components[1].is_failed());
    }

    #[test]
    fn test_ensure_keeps_empty_elements() {
        let mut aggregator = Aggregator::new();
        aggregator.ensure("EMPTY");
        aggregator.push(cost("A", 1.0));
        let results = aggregator.finish();
        assert_eq!(results.len(), 2);
        assert!(results[0].components.is_empty());
        assert!(!results[0].shared_id);
    }

    #[test]
    fn test_combine_recomputes_shared_flag() {
        let lca = group_components(vec![cost("A", 1.0)]);
        let costs = group_components(vec![cost("A", 2.0), cost("B", 3.0)]);
        let combined = combine_results(&lca, &costs);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[0].components.len(), 2);
        assert!(combined[0].shared_id);
        assert!(!combined[1].shared_id);
    }

    #[test]
    fn test_combine_keeps_quarantine_failure_once() {
        let malformed = || -> ResultComponent {
            ComponentFailure::new("Q1", &RecordError::MalformedRecord("bad volume".to_string())).into()
        };
        let lca = group_components(vec![malformed(), cost("A", 1.0)]);
        let costs = group_components(vec![malformed(), failure("A")]);

        let combined = combine_results(&lca, &costs);
        assert_eq!(combined[0].element_id, "Q1");
        assert_eq!(combined[0].components.len(), 1);
        assert!(!combined[0].shared_id);
        assert_eq!(failure_log(&combined).len(), 2);
        assert_eq!(combined[1].components.len(), 2);
    }

    #[test]
    fn test_failure_log_entries() {
        let results = group_components(vec![cost("A", 1.0), failure("A"), failure("B")]);
        let log = failure_log(&results);
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].element_id, "A");
        assert_eq!(log[0].context.as_deref(), Some("X"));
        assert_eq!(log[1].message, "Cost data not found for code X");
    }
}
