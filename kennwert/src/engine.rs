use crate::aggregate::Aggregator;
use crate::evaluator::{cost, LcaEvaluator};
use crate::reference::ReferenceSnapshot;
use crate::response::{CombinedOutput, RunOutput};
use crate::serializers::parse_document;
use crate::validator::{BatchPurpose, BatchRecord, ValidatedBatch, Validator};
use crate::{EngineConfig, KennwertError, KennwertResult};
use std::thread;

/// Output of the LCA engine
pub type LcaOutput = RunOutput;
/// Output of the cost engine
pub type CostOutput = RunOutput;

/// The kennwert computation engine.
///
/// Holds configuration only. Reference data is passed in per run as a
/// [`ReferenceSnapshot`], so one engine can serve runs against different
/// environmental versions.
#[derive(Debug, Default, Clone)]
pub struct Engine {
    config: EngineConfig,
    validator: Validator,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            validator: Validator::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse and validate an element batch document
    pub fn load_batch(&self, text: &str, source_id: &str, purpose: BatchPurpose) -> KennwertResult<ValidatedBatch> {
        let document = parse_document(text, source_id)?;
        self.validate_document(&document, source_id, purpose)
    }

    /// Validate an already parsed element batch document
    pub fn validate_document(
        &self,
        document: &serde_json::Value,
        source_id: &str,
        purpose: BatchPurpose,
    ) -> KennwertResult<ValidatedBatch> {
        self.validator.validate_batch(document, source_id, purpose)
    }

    /// Run the LCA engine over a batch; quarantined records keep their position
    pub fn run_lca(&self, batch: &ValidatedBatch, snapshot: &ReferenceSnapshot) -> LcaOutput {
        let mut evaluator = LcaEvaluator::new(
            &snapshot.environmental,
            &snapshot.mappings,
            &snapshot.service_life,
            &self.config,
        );
        let mut aggregator = Aggregator::new();
        for record in &batch.records {
            match record {
                BatchRecord::Valid(element) => {
                    evaluator.evaluate_into(std::slice::from_ref(element), &mut aggregator)
                }
                BatchRecord::Quarantined(failure) => aggregator.push(failure.clone().into()),
            }
        }

        let mut warnings = snapshot.warnings.clone();
        warnings.extend(evaluator.into_warnings());
        let results = aggregator.finish();
        tracing::info!(
            source = %batch.source_id,
            version = snapshot.environmental_version(),
            elements = results.len(),
            "LCA run complete"
        );

        RunOutput {
            results,
            warnings,
            environmental_version: Some(snapshot.environmental_version().to_string()),
        }
    }

    /// Run the cost engine over a batch
    pub fn run_cost(&self, batch: &ValidatedBatch, snapshot: &ReferenceSnapshot) -> CostOutput {
        let mut aggregator = Aggregator::new();
        for record in &batch.records {
            match record {
                BatchRecord::Valid(element) => {
                    cost::evaluate_into(std::slice::from_ref(element), &snapshot.cost, &mut aggregator)
                }
                BatchRecord::Quarantined(failure) => aggregator.push(failure.clone().into()),
            }
        }

        let results = aggregator.finish();
        tracing::info!(source = %batch.source_id, elements = results.len(), "cost run complete");

        RunOutput {
            results,
            warnings: Vec::new(),
            environmental_version: None,
        }
    }

    /// Run both engines concurrently and join them.
    ///
    /// Neither engine reads the other's output, so the result is the same
    /// as running them one after the other.
    pub fn run_all(&self, batch: &ValidatedBatch, snapshot: &ReferenceSnapshot) -> KennwertResult<CombinedOutput> {
        thread::scope(|scope| {
            let lca = scope.spawn(|| self.run_lca(batch, snapshot));
            let cost = self.run_cost(batch, snapshot);
            let lca = lca
                .join()
                .map_err(|_| KennwertError::Engine("LCA engine thread panicked".to_string()))?;
            Ok(CombinedOutput { lca, cost })
        })
    }
}
