use crate::density;
use crate::error::RecordError;
use crate::model::{
    BuildingElement, CostReferenceRow, MaterialMapping, MaterialQuantity, MaterialReferenceRow,
    PhysicalQuantities, ServiceLifeEntry,
};
use crate::response::ComponentFailure;
use crate::{KennwertError, KennwertResult};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Required columns of the environmental reference table
pub const ENVIRONMENTAL_COLUMNS: &[&str] = &["uuid", "name", "gwp", "penre", "ubp"];
/// Required columns of the material mapping table
pub const MAPPING_COLUMNS: &[&str] = &["material"];
/// Required columns of the service-life table
pub const SERVICE_LIFE_COLUMNS: &[&str] = &["code", "years"];
/// Required columns of the cost reference table
pub const COST_COLUMNS: &[&str] = &["code", "unit_rate", "unit"];

/// Which engines a batch will be fed to; decides the required fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPurpose {
    Lca,
    Cost,
    All,
}

impl BatchPurpose {
    /// Fields every element must carry for this purpose
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            BatchPurpose::Cost => &["id", "properties.ebkp"],
            BatchPurpose::Lca | BatchPurpose::All => {
                &["id", "properties.ebkp", "materials", "material_volumes"]
            }
        }
    }
}

/// One element of a validated batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchRecord {
    Valid(BuildingElement),
    /// Structurally complete but malformed; reported as a failed component
    Quarantined(ComponentFailure),
}

/// Element batch that has passed structural validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedBatch {
    pub source_id: String,
    /// Records in input order
    pub records: Vec<BatchRecord>,
}

impl ValidatedBatch {
    /// Wrap already-typed elements, e.g. read back from a store
    pub fn from_elements(source_id: impl Into<String>, elements: Vec<BuildingElement>) -> Self {
        Self {
            source_id: source_id.into(),
            records: elements.into_iter().map(BatchRecord::Valid).collect(),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &BuildingElement> {
        self.records.iter().filter_map(|record| match record {
            BatchRecord::Valid(element) => Some(element),
            BatchRecord::Quarantined(_) => None,
        })
    }

    pub fn quarantined(&self) -> impl Iterator<Item = &ComponentFailure> {
        self.records.iter().filter_map(|record| match record {
            BatchRecord::Quarantined(failure) => Some(failure),
            BatchRecord::Valid(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Typed reference rows plus the warnings raised while converting them
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRows<T> {
    pub rows: Vec<T>,
    pub warnings: Vec<String>,
}

impl<T> ValidatedRows<T> {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn skip(&mut self, table: &str, index: usize, reason: impl std::fmt::Display) {
        tracing::warn!(table, row = index, %reason, "quarantined reference row");
        self.warnings
            .push(format!("Skipped {} row {}: {}", table, index, reason));
    }
}

#[derive(Deserialize)]
struct ElementRecord {
    id: String,
    #[serde(default)]
    ifc_class: Option<String>,
    properties: ElementProperties,
    #[serde(default)]
    materials: Option<Vec<String>>,
    #[serde(default)]
    material_volumes: Option<BTreeMap<String, MaterialQuantity>>,
    #[serde(default)]
    quantities: Option<QuantityRecord>,
}

#[derive(Deserialize)]
struct ElementProperties {
    #[serde(default)]
    ebkp: Option<CodeValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CodeValue {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Deserialize, Default)]
struct QuantityRecord {
    #[serde(default)]
    volume: Option<NetGross>,
    #[serde(default)]
    area: Option<NetGross>,
    #[serde(default)]
    dimensions: Option<Dimensions>,
}

#[derive(Deserialize, Default)]
struct NetGross {
    #[serde(default)]
    net: Option<f64>,
    #[serde(default)]
    gross: Option<f64>,
}

#[derive(Deserialize, Default)]
struct Dimensions {
    #[serde(default)]
    length: Option<f64>,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
}

impl ElementRecord {
    fn into_element(self) -> Result<BuildingElement, RecordError> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(RecordError::MalformedRecord(
                "element id must be a non-empty string".to_string(),
            ));
        }

        let classification_code = match self.properties.ebkp {
            Some(CodeValue::Text(code)) => code.trim().to_string(),
            Some(CodeValue::Number(code)) => code.to_string(),
            None => String::new(),
        };

        let quantities = self.quantities.unwrap_or_default();
        let volume = quantities.volume.unwrap_or_default();
        let area = quantities.area.unwrap_or_default();
        let dimensions = quantities.dimensions.unwrap_or_default();

        Ok(BuildingElement {
            id,
            classification_code,
            ifc_class: self.ifc_class,
            materials: self.materials.unwrap_or_default(),
            material_quantities: self.material_volumes.unwrap_or_default(),
            quantities: PhysicalQuantities {
                volume_net: volume.net,
                volume_gross: volume.gross,
                area_net: area.net,
                area_gross: area.gross,
                length: dimensions.length,
                width: dimensions.width,
                height: dimensions.height,
            },
        })
    }
}

/// Structural and shape validation for element batches and reference tables.
///
/// Validation runs in two phases. The structural phase checks required
/// fields and columns and fails the whole input, reporting every missing
/// field at once. The shape phase converts records one by one; a record
/// with the right fields but the wrong value types is quarantined and the
/// rest of the input goes through.
#[derive(Debug, Default, Clone)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Validate an element batch document
    pub fn validate_batch(
        &self,
        document: &Value,
        source_id: &str,
        purpose: BatchPurpose,
    ) -> KennwertResult<ValidatedBatch> {
        // Phase 1: required structure
        let elements = self.batch_elements(document, source_id)?;
        let mut errors = Vec::new();
        for (index, element) in elements.iter().enumerate() {
            self.check_element_fields(element, index, source_id, purpose, &mut errors);
        }
        if let Some(error) = KennwertError::collect(errors) {
            return Err(error);
        }

        // Phase 2: per-record shape
        let records = elements
            .iter()
            .enumerate()
            .map(|(index, element)| self.convert_element(element, index))
            .collect::<Vec<_>>();

        let quarantined = records
            .iter()
            .filter(|record| matches!(record, BatchRecord::Quarantined(_)))
            .count();
        tracing::debug!(source = source_id, elements = records.len(), quarantined, "validated batch");

        Ok(ValidatedBatch {
            source_id: source_id.to_string(),
            records,
        })
    }

    fn batch_elements<'a>(&self, document: &'a Value, source_id: &str) -> KennwertResult<&'a [Value]> {
        match document.get("elements") {
            Some(Value::Array(elements)) => Ok(elements),
            Some(_) => Err(KennwertError::structural(
                "'elements' must be an array",
                source_id,
            )),
            None => Err(KennwertError::structural_with_suggestion(
                "missing required field 'elements'",
                source_id,
                "wrap the element list as {\"elements\": [...]}",
            )),
        }
    }

    fn check_element_fields(
        &self,
        element: &Value,
        index: usize,
        source_id: &str,
        purpose: BatchPurpose,
        errors: &mut Vec<KennwertError>,
    ) {
        let Some(object) = element.as_object() else {
            errors.push(KennwertError::structural(
                format!("element #{} is not an object", index),
                source_id,
            ));
            return;
        };

        for field in purpose.required_fields() {
            if !has_path(object, field) {
                errors.push(KennwertError::structural(
                    format!(
                        "element #{} ({}) is missing required field '{}'",
                        index,
                        display_id(element, index),
                        field
                    ),
                    source_id,
                ));
            }
        }
    }

    fn convert_element(&self, element: &Value, index: usize) -> BatchRecord {
        let converted = ElementRecord::deserialize(element)
            .map_err(|err| RecordError::MalformedRecord(err.to_string()))
            .and_then(ElementRecord::into_element);

        match converted {
            Ok(element) => BatchRecord::Valid(element),
            Err(err) => {
                let element_id = display_id(element, index);
                tracing::warn!(element = %element_id, error = %err, "quarantined element");
                BatchRecord::Quarantined(ComponentFailure::new(element_id, &err))
            }
        }
    }

    /// Check that every row of a reference table carries the required columns
    pub fn check_columns(&self, rows: &[Value], columns: &[&str], source_id: &str) -> KennwertResult<()> {
        let mut errors = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            let Some(object) = row.as_object() else {
                errors.push(KennwertError::structural(
                    format!("row {} is not an object", index),
                    source_id,
                ));
                continue;
            };
            let missing: Vec<&str> = columns
                .iter()
                .copied()
                .filter(|column| !object.contains_key(*column))
                .collect();
            if !missing.is_empty() {
                errors.push(KennwertError::structural(
                    format!("row {} is missing required column(s): {}", index, missing.join(", ")),
                    source_id,
                ));
            }
        }
        KennwertError::collect(errors).map_or(Ok(()), Err)
    }

    /// Environmental rows; density is resolved here, once per row
    pub fn environmental_rows(
        &self,
        rows: &[Value],
        source_id: &str,
    ) -> KennwertResult<ValidatedRows<MaterialReferenceRow>> {
        self.check_columns(rows, ENVIRONMENTAL_COLUMNS, source_id)?;

        let mut validated = ValidatedRows::new();
        for (index, row) in rows.iter().enumerate() {
            let converted = text_field(row, "uuid").and_then(|key| {
                Ok(MaterialReferenceRow {
                    name: text_field(row, "name").unwrap_or_default(),
                    gwp: indicator(row, "gwp")?,
                    penre: indicator(row, "penre")?,
                    ubp: indicator(row, "ubp")?,
                    density: 0.0,
                    key,
                })
            });
            match converted {
                Ok(mut material) => {
                    let (density, warning) = density::resolve_for_key(&material.key, row.get("density"));
                    material.density = density;
                    validated.warnings.extend(warning);
                    validated.rows.push(material);
                }
                Err(reason) => validated.skip(source_id, index, reason),
            }
        }
        Ok(validated)
    }

    /// Mapping rows; rows without a reference id are left unmapped
    pub fn mapping_rows(&self, rows: &[Value], source_id: &str) -> KennwertResult<ValidatedRows<MaterialMapping>> {
        self.check_columns(rows, MAPPING_COLUMNS, source_id)?;

        let mut validated = ValidatedRows::new();
        for (index, row) in rows.iter().enumerate() {
            let material = match row.get("material").and_then(Value::as_str) {
                Some(material) if !material.trim().is_empty() => material.to_string(),
                _ => {
                    validated.skip(source_id, index, "material must be a non-empty string");
                    continue;
                }
            };
            match text_field(row, "reference_id") {
                Ok(reference_id) => validated.rows.push(MaterialMapping { material, reference_id }),
                Err(_) => {
                    tracing::warn!(material = %material, "mapping row without reference id");
                    validated
                        .warnings
                        .push(format!("Material '{}' has no reference id and stays unmapped", material));
                }
            }
        }
        Ok(validated)
    }

    pub fn service_life_rows(
        &self,
        rows: &[Value],
        source_id: &str,
    ) -> KennwertResult<ValidatedRows<ServiceLifeEntry>> {
        self.check_columns(rows, SERVICE_LIFE_COLUMNS, source_id)?;

        let mut validated = ValidatedRows::new();
        for (index, row) in rows.iter().enumerate() {
            let converted = text_field(row, "code").and_then(|code| {
                let years = number_field(row, "years")
                    .filter(|years| years.fract() == 0.0 && *years >= 1.0 && *years <= f64::from(u32::MAX))
                    .ok_or_else(|| "years must be a positive whole number".to_string())?;
                Ok(ServiceLifeEntry {
                    code,
                    years: years as u32,
                })
            });
            match converted {
                Ok(entry) => validated.rows.push(entry),
                Err(reason) => validated.skip(source_id, index, reason),
            }
        }
        Ok(validated)
    }

    pub fn cost_rows(&self, rows: &[Value], source_id: &str) -> KennwertResult<ValidatedRows<CostReferenceRow>> {
        self.check_columns(rows, COST_COLUMNS, source_id)?;

        let mut validated = ValidatedRows::new();
        for (index, row) in rows.iter().enumerate() {
            let converted = text_field(row, "code").and_then(|code| {
                let unit_rate = indicator(row, "unit_rate")?;
                let unit = row
                    .get("unit")
                    .and_then(Value::as_str)
                    .ok_or_else(|| "unit must be a string".to_string())?;
                Ok(CostReferenceRow {
                    code,
                    unit_rate,
                    unit: unit.to_string(),
                })
            });
            match converted {
                Ok(row) => validated.rows.push(row),
                Err(reason) => validated.skip(source_id, index, reason),
            }
        }
        Ok(validated)
    }
}

fn has_path(object: &Map<String, Value>, path: &str) -> bool {
    let mut parts = path.split('.');
    let Some(first) = parts.next() else {
        return false;
    };
    let mut current = match object.get(first) {
        Some(value) => value,
        None => return false,
    };
    for part in parts {
        current = match current.get(part) {
            Some(value) => value,
            None => return false,
        };
    }
    true
}

fn display_id(element: &Value, index: usize) -> String {
    match element.get("id").and_then(Value::as_str) {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => format!("<element #{}>", index),
    }
}

/// Key-like text: strings are trimmed, numbers are printed
fn text_field(row: &Value, column: &str) -> Result<String, String> {
    let text = match row.get(column) {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    };
    if text.is_empty() {
        return Err(format!("{} must be a non-empty string", column));
    }
    Ok(text)
}

/// Numbers and numeric strings (decimal comma allowed)
fn number_field(row: &Value, column: &str) -> Option<f64> {
    match row.get(column)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
}

fn indicator(row: &Value, column: &str) -> Result<f64, String> {
    number_field(row, column)
        .filter(|value| value.is_finite() && *value >= 0.0)
        .ok_or_else(|| format!("{} must be a non-negative number", column))
}
