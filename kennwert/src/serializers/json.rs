use crate::model::{CostReferenceRow, MaterialMapping, MaterialReferenceRow, ServiceLifeEntry};
use crate::response::ElementResult;
use crate::validator::{BatchPurpose, ValidatedBatch, ValidatedRows, Validator};
use crate::{KennwertError, KennwertResult};
use serde_json::Value;
use std::sync::Arc;

/// One version of an environmental dataset document
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentalVersion {
    pub version: String,
    pub rows: Vec<MaterialReferenceRow>,
}

/// Parsed environmental dataset document
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentalDataset {
    /// Version the document marks as active, if any
    pub active_version: Option<String>,
    /// Versions sorted by name
    pub versions: Vec<EnvironmentalVersion>,
    pub warnings: Vec<String>,
}

/// Parse a JSON document, keeping the source text for error rendering
pub fn parse_document(text: &str, source_id: &str) -> KennwertResult<Value> {
    serde_json::from_str(text).map_err(|err| KennwertError::json(&err, source_id, Arc::from(text)))
}

/// Parse and validate an element batch
pub fn batch_from_json(text: &str, source_id: &str, purpose: BatchPurpose) -> KennwertResult<ValidatedBatch> {
    let document = parse_document(text, source_id)?;
    Validator::new().validate_batch(&document, source_id, purpose)
}

fn table_rows<'a>(document: &'a Value, source_id: &str) -> KennwertResult<&'a [Value]> {
    document.as_array().map(Vec::as_slice).ok_or_else(|| {
        KennwertError::structural("reference table must be a JSON array of rows", source_id)
    })
}

/// Parse the environmental dataset: `{"active_version", "versions": {v: [rows]}}`
pub fn environmental_from_json(text: &str, source_id: &str) -> KennwertResult<EnvironmentalDataset> {
    let document = parse_document(text, source_id)?;
    let validator = Validator::new();

    let versions = match document.get("versions") {
        Some(Value::Object(versions)) => versions,
        Some(_) => {
            return Err(KennwertError::structural("'versions' must be an object", source_id));
        }
        None => {
            return Err(KennwertError::structural_with_suggestion(
                "missing required field 'versions'",
                source_id,
                "use {\"versions\": {\"<version>\": [rows]}}",
            ));
        }
    };

    let active_version = match document.get("active_version") {
        None | Some(Value::Null) => None,
        Some(Value::String(version)) => Some(version.trim().to_string()),
        Some(_) => {
            return Err(KennwertError::structural("'active_version' must be a string", source_id));
        }
    };

    let mut dataset = EnvironmentalDataset {
        active_version,
        versions: Vec::with_capacity(versions.len()),
        warnings: Vec::new(),
    };
    let mut errors = Vec::new();
    for (version, rows) in versions {
        let table = format!("{}#{}", source_id, version);
        let validated = table_rows(rows, &table).and_then(|rows| validator.environmental_rows(rows, &table));
        match validated {
            Ok(validated) => {
                dataset.warnings.extend(validated.warnings);
                dataset.versions.push(EnvironmentalVersion {
                    version: version.trim().to_string(),
                    rows: validated.rows,
                });
            }
            Err(err) => errors.push(err),
        }
    }
    if let Some(error) = KennwertError::collect(errors) {
        return Err(error);
    }

    if let Some(active) = &dataset.active_version {
        if !dataset.versions.iter().any(|v| &v.version == active) {
            return Err(KennwertError::Reference(format!(
                "active version '{}' is not present in {}",
                active, source_id
            )));
        }
    }
    Ok(dataset)
}

pub fn mappings_from_json(text: &str, source_id: &str) -> KennwertResult<ValidatedRows<MaterialMapping>> {
    let document = parse_document(text, source_id)?;
    Validator::new().mapping_rows(table_rows(&document, source_id)?, source_id)
}

pub fn service_life_from_json(text: &str, source_id: &str) -> KennwertResult<ValidatedRows<ServiceLifeEntry>> {
    let document = parse_document(text, source_id)?;
    Validator::new().service_life_rows(table_rows(&document, source_id)?, source_id)
}

pub fn cost_from_json(text: &str, source_id: &str) -> KennwertResult<ValidatedRows<CostReferenceRow>> {
    let document = parse_document(text, source_id)?;
    Validator::new().cost_rows(table_rows(&document, source_id)?, source_id)
}

/// Serialize grouped results as pretty-printed JSON
pub fn results_to_json(results: &[ElementResult]) -> KennwertResult<String> {
    serde_json::to_string_pretty(results)
        .map_err(|err| KennwertError::Engine(format!("Failed to serialize results: {}", err)))
}

/// Parse grouped results written by [`results_to_json`]
pub fn results_from_json(text: &str, source_id: &str) -> KennwertResult<Vec<ElementResult>> {
    serde_json::from_str(text).map_err(|err| KennwertError::json(&err, source_id, Arc::from(text)))
}
