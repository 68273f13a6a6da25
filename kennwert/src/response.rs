use crate::error::{FailureKind, RecordError};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Successful LCA computation for one (element, material) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LcaComponent {
    pub element_id: String,
    pub material: String,
    pub reference_id: String,
    pub reference_name: String,
    pub volume: f64,
    pub density: f64,
    pub amortization_years: u32,
    pub classification_code: String,
    pub gwp_absolute: f64,
    pub gwp_per_year: f64,
    pub penr_absolute: f64,
    pub penr_per_year: f64,
    pub ubp_absolute: f64,
    pub ubp_per_year: f64,
}

/// Successful cost computation for one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostComponent {
    pub element_id: String,
    pub classification_code: String,
    pub total_cost: f64,
    pub unit_cost: f64,
    pub unit: String,
}

/// Success payload of either engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentPayload {
    Lca(LcaComponent),
    Cost(CostComponent),
}

impl ComponentPayload {
    pub fn element_id(&self) -> &str {
        match self {
            ComponentPayload::Lca(component) => &component.element_id,
            ComponentPayload::Cost(component) => &component.element_id,
        }
    }
}

/// A computation attempt that failed on its own record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentFailure {
    pub element_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    pub error_kind: FailureKind,
    pub error: String,
}

impl ComponentFailure {
    pub fn new(element_id: impl Into<String>, error: &RecordError) -> Self {
        Self {
            element_id: element_id.into(),
            material: None,
            classification_code: None,
            reference_id: None,
            error_kind: error.kind(),
            error: error.to_string(),
        }
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    pub fn with_classification_code(mut self, code: impl Into<String>) -> Self {
        self.classification_code = Some(code.into());
        self
    }

    pub fn with_reference_id(mut self, reference_id: Option<String>) -> Self {
        self.reference_id = reference_id;
        self
    }

    /// Material name, else classification code: what the failure is about
    pub fn context(&self) -> Option<&str> {
        self.material
            .as_deref()
            .or(self.classification_code.as_deref())
    }
}

/// One computation attempt: a full success payload or a failure.
///
/// On the wire both shapes are flat objects with a boolean `failed` field.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultComponent {
    Success(ComponentPayload),
    Failure(ComponentFailure),
}

impl ResultComponent {
    pub fn element_id(&self) -> &str {
        match self {
            ResultComponent::Success(payload) => payload.element_id(),
            ResultComponent::Failure(failure) => &failure.element_id,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ResultComponent::Failure(_))
    }

    pub fn as_lca(&self) -> Option<&LcaComponent> {
        match self {
            ResultComponent::Success(ComponentPayload::Lca(component)) => Some(component),
            _ => None,
        }
    }

    pub fn as_cost(&self) -> Option<&CostComponent> {
        match self {
            ResultComponent::Success(ComponentPayload::Cost(component)) => Some(component),
            _ => None,
        }
    }

    pub fn as_failure(&self) -> Option<&ComponentFailure> {
        match self {
            ResultComponent::Failure(failure) => Some(failure),
            ResultComponent::Success(_) => None,
        }
    }
}

impl From<LcaComponent> for ResultComponent {
    fn from(component: LcaComponent) -> Self {
        ResultComponent::Success(ComponentPayload::Lca(component))
    }
}

impl From<CostComponent> for ResultComponent {
    fn from(component: CostComponent) -> Self {
        ResultComponent::Success(ComponentPayload::Cost(component))
    }
}

impl From<ComponentFailure> for ResultComponent {
    fn from(failure: ComponentFailure) -> Self {
        ResultComponent::Failure(failure)
    }
}

#[derive(Serialize)]
struct Tagged<'a, T> {
    #[serde(flatten)]
    inner: &'a T,
    failed: bool,
}

impl Serialize for ResultComponent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResultComponent::Success(payload) => Tagged {
                inner: payload,
                failed: false,
            }
            .serialize(serializer),
            ResultComponent::Failure(failure) => Tagged {
                inner: failure,
                failed: true,
            }
            .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ResultComponent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let failed = value
            .get("failed")
            .and_then(serde_json::Value::as_bool)
            .ok_or_else(|| de::Error::missing_field("failed"))?;

        if failed {
            ComponentFailure::deserialize(value)
                .map(ResultComponent::Failure)
                .map_err(de::Error::custom)
        } else {
            ComponentPayload::deserialize(value)
                .map(ResultComponent::Success)
                .map_err(de::Error::custom)
        }
    }
}

/// All components computed for one element id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementResult {
    pub element_id: String,
    pub components: Vec<ResultComponent>,
    /// True when more than one component is grouped under this id
    pub shared_id: bool,
}

impl ElementResult {
    pub fn new(element_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            components: Vec::new(),
            shared_id: false,
        }
    }

    pub fn push(&mut self, component: ResultComponent) {
        self.components.push(component);
        self.shared_id = self.components.len() > 1;
    }

    pub fn failures(&self) -> impl Iterator<Item = &ComponentFailure> {
        self.components.iter().filter_map(ResultComponent::as_failure)
    }

    pub fn successes(&self) -> impl Iterator<Item = &ComponentPayload> {
        self.components.iter().filter_map(|component| match component {
            ResultComponent::Success(payload) => Some(payload),
            ResultComponent::Failure(_) => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.components.iter().any(ResultComponent::is_failed)
    }

    pub fn has_successes(&self) -> bool {
        self.components.iter().any(|component| !component.is_failed())
    }
}

/// A failure flattened for separate error-log persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub element_id: String,
    /// Material name or classification code the failure concerns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub error_kind: FailureKind,
    pub message: String,
}

impl From<&ComponentFailure> for ErrorLogEntry {
    fn from(failure: &ComponentFailure) -> Self {
        Self {
            element_id: failure.element_id.clone(),
            context: failure.context().map(str::to_string),
            error_kind: failure.error_kind,
            message: failure.error.clone(),
        }
    }
}

/// Output of one engine run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    pub results: Vec<ElementResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environmental_version: Option<String>,
}

impl RunOutput {
    pub fn failure_log(&self) -> Vec<ErrorLogEntry> {
        crate::aggregate::failure_log(&self.results)
    }
}

/// Output of running both engines over one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedOutput {
    pub lca: RunOutput,
    pub cost: RunOutput,
}

impl CombinedOutput {
    /// LCA and cost results merged by element id
    pub fn combined(&self) -> Vec<ElementResult> {
        crate::aggregate::combine_results(&self.lca.results, &self.cost.results)
    }
}
