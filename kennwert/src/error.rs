use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Source location inside a JSON document (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// Detailed error information for structural failures
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub message: String,
    /// Name of the batch or reference table the error was found in
    pub source_id: String,
    pub location: Option<Location>,
    /// Raw document text, kept so callers can render the offending region
    pub source_text: Option<Arc<str>>,
    pub suggestion: Option<String>,
}

/// Errors that stop a run before any computation starts.
///
/// Per-record problems (unmapped materials, invalid quantities, ...) are
/// never reported through this type; they become failed result components.
#[derive(Debug, Clone)]
pub enum KennwertError {
    /// Required field or column absent on an element batch or reference table
    Structural(Box<ErrorDetails>),

    /// Input document is not valid JSON
    Json(Box<ErrorDetails>),

    /// Requested reference version does not exist or none is active
    Reference(String),

    /// Internal engine error
    Engine(String),

    /// Multiple errors collected together
    MultipleErrors(Vec<KennwertError>),
}

impl KennwertError {
    /// Create a structural error for a batch or table
    pub fn structural(message: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self::Structural(Box::new(ErrorDetails {
            message: message.into(),
            source_id: source_id.into(),
            location: None,
            source_text: None,
            suggestion: None,
        }))
    }

    /// Create a structural error with suggestion
    pub fn structural_with_suggestion(
        message: impl Into<String>,
        source_id: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Structural(Box::new(ErrorDetails {
            message: message.into(),
            source_id: source_id.into(),
            location: None,
            source_text: None,
            suggestion: Some(suggestion.into()),
        }))
    }

    /// Create a JSON syntax error pointing into the source text
    pub fn json(err: &serde_json::Error, source_id: impl Into<String>, source_text: Arc<str>) -> Self {
        let location = (err.line() > 0).then(|| Location {
            line: err.line(),
            column: err.column(),
        });
        Self::Json(Box::new(ErrorDetails {
            message: err.to_string(),
            source_id: source_id.into(),
            location,
            source_text: Some(source_text),
            suggestion: None,
        }))
    }

    /// Collapse a list of errors: none, one, or many
    pub fn collect(mut errors: Vec<KennwertError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(KennwertError::MultipleErrors(errors)),
        }
    }

    /// Details for errors that carry them
    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            KennwertError::Structural(details) | KennwertError::Json(details) => Some(details),
            _ => None,
        }
    }
}

impl fmt::Display for KennwertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KennwertError::Structural(details) => {
                write!(f, "Structural error in {}: {}", details.source_id, details.message)?;
                if let Some(suggestion) = &details.suggestion {
                    write!(f, " (suggestion: {})", suggestion)?;
                }
                Ok(())
            }
            KennwertError::Json(details) => {
                write!(f, "Invalid JSON in {}: {}", details.source_id, details.message)
            }
            KennwertError::Reference(msg) => write!(f, "Reference data error: {}", msg),
            KennwertError::Engine(msg) => write!(f, "Engine error: {}", msg),
            KennwertError::MultipleErrors(errors) => {
                writeln!(f, "Multiple errors:")?;
                for (i, error) in errors.iter().enumerate() {
                    write!(f, "  {}. {}", i + 1, error)?;
                    if i < errors.len() - 1 {
                        writeln!(f)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for KennwertError {}

impl From<crate::store::StoreError> for KennwertError {
    fn from(err: crate::store::StoreError) -> Self {
        KennwertError::Reference(err.to_string())
    }
}

/// Serializable tag for a per-record failure, used for error-log persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MalformedRecord,
    MissingVolumeData,
    InvalidVolume,
    InvalidDensity,
    MaterialMappingNotFound,
    ReferenceNotFound,
    CostDataNotFound,
    UnknownUnit,
    InvalidQuantity,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MalformedRecord => "malformed_record",
            FailureKind::MissingVolumeData => "missing_volume_data",
            FailureKind::InvalidVolume => "invalid_volume",
            FailureKind::InvalidDensity => "invalid_density",
            FailureKind::MaterialMappingNotFound => "material_mapping_not_found",
            FailureKind::ReferenceNotFound => "reference_not_found",
            FailureKind::CostDataNotFound => "cost_data_not_found",
            FailureKind::UnknownUnit => "unknown_unit",
            FailureKind::InvalidQuantity => "invalid_quantity",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data error local to one (element, material) or (element, code) pair.
///
/// The `Display` output is the reason string shown to users.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("Malformed element record: {0}")]
    MalformedRecord(String),

    #[error("Missing volume data for material: {0}")]
    MissingVolumeData(String),

    #[error("Invalid volume: {0}")]
    InvalidVolume(f64),

    #[error("Invalid density: {}", format_density(.0))]
    InvalidDensity(Option<f64>),

    #[error("Material mapping not found: {0}")]
    MaterialMappingNotFound(String),

    #[error("Reference ID not found: {0}")]
    ReferenceNotFound(String),

    #[error("Cost data not found for code {0}")]
    CostDataNotFound(String),

    #[error("Unknown unit type '{0}'")]
    UnknownUnit(String),

    #[error("Missing or invalid quantity for element '{element_id}' and code '{code}'")]
    InvalidQuantity { element_id: String, code: String },
}

fn format_density(density: &Option<f64>) -> String {
    match density {
        Some(value) => value.to_string(),
        None => "missing".to_string(),
    }
}

impl RecordError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RecordError::MalformedRecord(_) => FailureKind::MalformedRecord,
            RecordError::MissingVolumeData(_) => FailureKind::MissingVolumeData,
            RecordError::InvalidVolume(_) => FailureKind::InvalidVolume,
            RecordError::InvalidDensity(_) => FailureKind::InvalidDensity,
            RecordError::MaterialMappingNotFound(_) => FailureKind::MaterialMappingNotFound,
            RecordError::ReferenceNotFound(_) => FailureKind::ReferenceNotFound,
            RecordError::CostDataNotFound(_) => FailureKind::CostDataNotFound,
            RecordError::UnknownUnit(_) => FailureKind::UnknownUnit,
            RecordError::InvalidQuantity { .. } => FailureKind::InvalidQuantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_messages_name_the_subject() {
        let err = RecordError::MaterialMappingNotFound("Beton".to_string());
        assert_eq!(err.to_string(), "Material mapping not found: Beton");
        assert_eq!(err.kind(), FailureKind::MaterialMappingNotFound);

        let err = RecordError::UnknownUnit("kg".to_string());
        assert_eq!(err.to_string(), "Unknown unit type 'kg'");

        let err = RecordError::InvalidDensity(None);
        assert_eq!(err.to_string(), "Invalid density: missing");
    }

    #[test]
    fn test_collect_errors() {
        assert!(KennwertError::collect(vec![]).is_none());

        let single = KennwertError::collect(vec![KennwertError::Engine("x".into())]).unwrap();
        assert!(matches!(single, KennwertError::Engine(_)));

        let many = KennwertError::collect(vec![
            KennwertError::structural("missing id", "elements"),
            KennwertError::structural("missing ebkp", "elements"),
        ])
        .unwrap();
        let rendered = many.to_string();
        assert!(rendered.contains("1. Structural error in elements: missing id"));
        assert!(rendered.contains("2. Structural error in elements: missing ebkp"));
    }
}
