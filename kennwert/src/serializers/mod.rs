//! JSON input and output formats
//!
//! The engines work on typed records only. This module turns element batch
//! documents and reference tables into those records, and grouped results
//! back into JSON.

mod json;

pub use json::{
    batch_from_json, cost_from_json, environmental_from_json, mappings_from_json, parse_document,
    results_from_json, results_to_json, service_life_from_json, EnvironmentalDataset,
    EnvironmentalVersion,
};
