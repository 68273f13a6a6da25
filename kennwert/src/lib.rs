//! # kennwert
//!
//! **Life-cycle and cost figures for building elements**
//!
//! kennwert matches building elements extracted from IFC models against
//! versioned reference data and computes environmental indicators (GWP,
//! PENRE, UBP, absolute and amortized per year) and construction costs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kennwert::store::{MemoryStore, ReferenceStore};
//! use kennwert::{BatchPurpose, Engine, KennwertResult};
//!
//! fn main() -> KennwertResult<()> {
//!     let store = MemoryStore::new();
//!     // ... import reference tables into the store ...
//!     let snapshot = store.snapshot()?;
//!
//!     let engine = Engine::new();
//!     let batch = engine.load_batch(r#"{"elements": []}"#, "batch.json", BatchPurpose::All)?;
//!     let output = engine.run_all(&batch, &snapshot)?;
//!     let combined = output.combined();
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Components
//! Every computation attempt yields one result component: one per material
//! for LCA, one per element for cost. A component is either a success
//! payload or a failure with a human-readable reason. Bad records never
//! abort a batch.
//!
//! ### Structural errors
//! Missing required fields or columns stop a run before any computation
//! starts and are returned as [`KennwertError`].
//!
//! ### Snapshots
//! A [`ReferenceSnapshot`] fixes the environmental version for a run. The
//! engines never consult a global "active version".

pub mod aggregate;
pub mod config;
pub mod density;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod reference;
pub mod response;
pub mod serializers;
pub mod store;
pub mod summary;
pub mod validator;

pub use aggregate::{combine_results, failure_log, flatten, group_components};
pub use config::{DensitySource, EngineConfig, ServiceLifeMatch, DEFAULT_AMORTIZATION_YEARS};
pub use engine::{CostOutput, Engine, LcaOutput};
pub use error::{FailureKind, KennwertError, RecordError};
pub use evaluator::{compute_cost, compute_lca};
pub use model::{
    BuildingElement, CostReferenceRow, CostUnit, MaterialMapping, MaterialQuantity,
    MaterialReferenceRow, PhysicalQuantities, ServiceLifeEntry,
};
pub use reference::{
    CostReference, EnvironmentalReference, MaterialMappings, ReferenceSnapshot, ServiceLifeTable,
};
pub use response::{
    CombinedOutput, ComponentFailure, ComponentPayload, CostComponent, ElementResult,
    ErrorLogEntry, LcaComponent, ResultComponent, RunOutput,
};
pub use summary::{summarize, RunSummary, Totals};
pub use validator::{BatchPurpose, BatchRecord, ValidatedBatch, Validator};

/// Result type for kennwert operations
pub type KennwertResult<T> = Result<T, KennwertError>;

#[cfg(test)]
mod tests;
