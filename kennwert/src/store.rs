//! Reference-data and result storage seams
//!
//! The engines never talk to storage. Callers resolve a [`ReferenceSnapshot`]
//! through a [`ReferenceStore`] before a run and hand the results to a
//! [`ResultSink`] afterwards. [`MemoryStore`] implements both and backs the
//! CLI, the HTTP server and the tests.

use crate::model::{CostReferenceRow, MaterialMapping, MaterialReferenceRow, ServiceLifeEntry};
use crate::reference::{
    CostReference, EnvironmentalReference, MaterialMappings, ReferenceSnapshot, ServiceLifeTable,
};
use crate::response::{ElementResult, ErrorLogEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("environmental reference version '{0}' not found")]
    VersionNotFound(String),

    #[error("environmental reference version '{0}' already exists")]
    DuplicateVersion(String),

    #[error("no environmental reference version is active")]
    NoActiveVersion,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Metadata of one imported environmental dataset version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub active: bool,
    pub rows: usize,
    pub imported_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Which engine produced a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Lca,
    Cost,
    Combined,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Lca => "lca",
            ResultKind::Cost => "cost",
            ResultKind::Combined => "combined",
        }
    }
}

/// Processing-history entry written after each run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environmental_version: Option<String>,
    pub total_elements: usize,
    pub processed_elements: usize,
    pub failed_elements: usize,
    pub duration_ms: u64,
    pub recorded_at: DateTime<Utc>,
}

impl ProcessingRecord {
    /// Build a record from grouped results; an element counts as processed
    /// when it has a success and as failed when it has a failure
    pub fn from_results(
        project_id: impl Into<String>,
        environmental_version: Option<String>,
        results: &[ElementResult],
        duration_ms: u64,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            environmental_version,
            total_elements: results.len(),
            processed_elements: results.iter().filter(|r| r.has_successes()).count(),
            failed_elements: results.iter().filter(|r| r.has_failures()).count(),
            duration_ms,
            recorded_at: Utc::now(),
        }
    }
}

/// Versioned reference tables with one active environmental version
pub trait ReferenceStore: Send + Sync {
    fn environmental_versions(&self) -> Result<Vec<VersionInfo>, StoreError>;

    fn active_environmental_version(&self) -> Result<String, StoreError>;

    fn set_active_environmental_version(&self, version: &str) -> Result<(), StoreError>;

    fn import_environmental(
        &self,
        version: &str,
        rows: Vec<MaterialReferenceRow>,
        description: Option<String>,
    ) -> Result<(), StoreError>;

    fn environmental(&self, version: &str) -> Result<EnvironmentalReference, StoreError>;

    fn material_mappings(&self) -> Result<MaterialMappings, StoreError>;

    fn service_life(&self) -> Result<ServiceLifeTable, StoreError>;

    fn cost(&self) -> Result<CostReference, StoreError>;

    /// Warnings recorded while the reference tables were loaded
    fn reference_warnings(&self) -> Vec<String> {
        Vec::new()
    }

    /// Snapshot of all tables at the currently active version
    fn snapshot(&self) -> Result<ReferenceSnapshot, StoreError> {
        let version = self.active_environmental_version()?;
        self.snapshot_for(&version)
    }

    /// Snapshot pinned to an explicit environmental version
    fn snapshot_for(&self, version: &str) -> Result<ReferenceSnapshot, StoreError> {
        Ok(ReferenceSnapshot {
            environmental: self.environmental(version)?,
            mappings: self.material_mappings()?,
            service_life: self.service_life()?,
            cost: self.cost()?,
            warnings: self.reference_warnings(),
        })
    }
}

/// Persistence collaborator for results, error logs and processing history
pub trait ResultSink: Send + Sync {
    fn store_results(&self, project_id: &str, kind: ResultKind, results: &[ElementResult]) -> Result<(), StoreError>;

    fn log_processing_error(&self, project_id: &str, entry: ErrorLogEntry) -> Result<(), StoreError>;

    fn record_processing(&self, record: ProcessingRecord) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
struct StoredVersion {
    rows: Vec<MaterialReferenceRow>,
    imported_at: DateTime<Utc>,
    description: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    versions: BTreeMap<String, StoredVersion>,
    active: Option<String>,
    mappings: Vec<MaterialMapping>,
    service_life: Vec<ServiceLifeEntry>,
    cost: Vec<CostReferenceRow>,
    warnings: Vec<String>,
    results: BTreeMap<(String, ResultKind), Vec<ElementResult>>,
    errors: Vec<(String, ErrorLogEntry)>,
    history: Vec<ProcessingRecord>,
}

/// In-memory reference store and result sink
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_material_mappings(&self, mappings: Vec<MaterialMapping>) -> Result<(), StoreError> {
        self.write(|state| state.mappings = mappings)
    }

    pub fn set_service_life(&self, entries: Vec<ServiceLifeEntry>) -> Result<(), StoreError> {
        self.write(|state| state.service_life = entries)
    }

    pub fn set_cost(&self, rows: Vec<CostReferenceRow>) -> Result<(), StoreError> {
        self.write(|state| state.cost = rows)
    }

    pub fn add_warnings(&self, warnings: impl IntoIterator<Item = String>) -> Result<(), StoreError> {
        self.write(|state| state.warnings.extend(warnings))
    }

    /// Results stored for a project and kind
    pub fn results(&self, project_id: &str, kind: ResultKind) -> Result<Vec<ElementResult>, StoreError> {
        self.read(|state| {
            state
                .results
                .get(&(project_id.to_string(), kind))
                .cloned()
                .unwrap_or_default()
        })
    }

    /// Error-log entries stored for a project
    pub fn error_log(&self, project_id: &str) -> Result<Vec<ErrorLogEntry>, StoreError> {
        self.read(|state| {
            state
                .errors
                .iter()
                .filter(|(project, _)| project == project_id)
                .map(|(_, entry)| entry.clone())
                .collect()
        })
    }

    pub fn history(&self) -> Result<Vec<ProcessingRecord>, StoreError> {
        self.read(|state| state.history.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> Result<T, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        Ok(f(&state))
    }

    fn write<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> Result<T, StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        Ok(f(&mut state))
    }
}

impl ReferenceStore for MemoryStore {
    fn environmental_versions(&self) -> Result<Vec<VersionInfo>, StoreError> {
        self.read(|state| {
            state
                .versions
                .iter()
                .map(|(version, stored)| VersionInfo {
                    version: version.clone(),
                    active: state.active.as_deref() == Some(version.as_str()),
                    rows: stored.rows.len(),
                    imported_at: stored.imported_at,
                    description: stored.description.clone(),
                })
                .collect()
        })
    }

    fn active_environmental_version(&self) -> Result<String, StoreError> {
        self.read(|state| state.active.clone())?
            .ok_or(StoreError::NoActiveVersion)
    }

    fn set_active_environmental_version(&self, version: &str) -> Result<(), StoreError> {
        self.write(|state| {
            if !state.versions.contains_key(version) {
                return Err(StoreError::VersionNotFound(version.to_string()));
            }
            tracing::info!(version, "activated environmental reference version");
            state.active = Some(version.to_string());
            Ok(())
        })?
    }

    fn import_environmental(
        &self,
        version: &str,
        rows: Vec<MaterialReferenceRow>,
        description: Option<String>,
    ) -> Result<(), StoreError> {
        self.write(|state| {
            if state.versions.contains_key(version) {
                return Err(StoreError::DuplicateVersion(version.to_string()));
            }
            tracing::debug!(version, rows = rows.len(), "imported environmental reference");
            state.versions.insert(
                version.to_string(),
                StoredVersion {
                    rows,
                    imported_at: Utc::now(),
                    description,
                },
            );
            Ok(())
        })?
    }

    fn environmental(&self, version: &str) -> Result<EnvironmentalReference, StoreError> {
        self.read(|state| {
            state
                .versions
                .get(version)
                .map(|stored| EnvironmentalReference::from_rows(version, stored.rows.clone()))
        })?
        .ok_or_else(|| StoreError::VersionNotFound(version.to_string()))
    }

    fn material_mappings(&self) -> Result<MaterialMappings, StoreError> {
        self.read(|state| MaterialMappings::from_mappings(state.mappings.clone()))
    }

    fn service_life(&self) -> Result<ServiceLifeTable, StoreError> {
        self.read(|state| ServiceLifeTable::from_entries(state.service_life.clone()))
    }

    fn cost(&self) -> Result<CostReference, StoreError> {
        self.read(|state| CostReference::from_rows(state.cost.clone()))
    }

    fn reference_warnings(&self) -> Vec<String> {
        self.read(|state| state.warnings.clone()).unwrap_or_default()
    }
}

impl ResultSink for MemoryStore {
    fn store_results(&self, project_id: &str, kind: ResultKind, results: &[ElementResult]) -> Result<(), StoreError> {
        self.write(|state| {
            state
                .results
                .insert((project_id.to_string(), kind), results.to_vec());
        })
    }

    fn log_processing_error(&self, project_id: &str, entry: ErrorLogEntry) -> Result<(), StoreError> {
        self.write(|state| state.errors.push((project_id.to_string(), entry)))
    }

    fn record_processing(&self, record: ProcessingRecord) -> Result<(), StoreError> {
        tracing::info!(
            project = %record.project_id,
            total = record.total_elements,
            processed = record.processed_elements,
            failed = record.failed_elements,
            duration_ms = record.duration_ms,
            "processing recorded"
        );
        self.write(|state| state.history.push(record))
    }
}
