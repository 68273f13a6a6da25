use serde::{Deserialize, Serialize};

/// Years over which embodied impact is amortized when no service-life entry matches
pub const DEFAULT_AMORTIZATION_YEARS: u32 = 60;

/// How an element's classification code is matched against service-life entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceLifeMatch {
    /// Trimmed codes must be equal
    Exact,
    /// Longest entry code that is a prefix of the element code wins
    #[default]
    LongestPrefix,
}

/// Where the density used for mass-based indicators comes from.
///
/// Both sources share one policy: a density that is absent or not
/// strictly positive fails the component with an invalid-density error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensitySource {
    /// Density on the element's per-material quantity record
    #[default]
    MaterialRecord,
    /// Resolved density of the matched environmental reference row
    Reference,
}

/// Tunables for a computation run
///
/// Defaults reproduce the behaviour expected by downstream consumers;
/// deviate only when the reference data calls for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fallback amortization period in years
    pub default_amortization_years: u32,

    /// Service-life lookup strategy
    pub service_life_match: ServiceLifeMatch,

    /// Density sourcing strategy for the LCA engine
    pub density_source: DensitySource,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_amortization_years: DEFAULT_AMORTIZATION_YEARS,
            service_life_match: ServiceLifeMatch::default(),
            density_source: DensitySource::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new EngineConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_density_source(mut self, density_source: DensitySource) -> Self {
        self.density_source = density_source;
        self
    }

    pub fn with_service_life_match(mut self, service_life_match: ServiceLifeMatch) -> Self {
        self.service_life_match = service_life_match;
        self
    }

    /// Zero years would make per-year indicators meaningless; it is clamped to 1
    pub fn with_default_amortization_years(mut self, years: u32) -> Self {
        self.default_amortization_years = years.max(1);
        self
    }
}
