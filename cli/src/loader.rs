//! Reading reference tables and element batches from disk

use anyhow::{Context, Result};
use kennwert::serializers::{cost_from_json, environmental_from_json, mappings_from_json, service_life_from_json};
use kennwert::store::{MemoryStore, ReferenceStore};
use kennwert::{BatchPurpose, Engine, ValidatedBatch};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const ENVIRONMENTAL_FILE: &str = "environmental.json";
pub const MAPPINGS_FILE: &str = "material_mappings.json";
pub const SERVICE_LIFE_FILE: &str = "service_life.json";
pub const COST_FILE: &str = "cost.json";

fn read(dir: &Path, name: &str) -> Result<(String, String)> {
    let path = dir.join(name);
    let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((text, path.to_string_lossy().to_string()))
}

/// Load every reference table in `dir` into a fresh store.
///
/// `version` overrides the active version named by the environmental
/// document. Without either, the greatest version name is activated.
pub fn load_store(dir: &Path, version: Option<&str>) -> Result<MemoryStore> {
    let store = MemoryStore::new();

    let (text, source_id) = read(dir, ENVIRONMENTAL_FILE)?;
    let dataset = environmental_from_json(&text, &source_id)?;
    store.add_warnings(dataset.warnings)?;
    let latest = dataset.versions.last().map(|v| v.version.clone());
    for env_version in dataset.versions {
        store.import_environmental(&env_version.version, env_version.rows, None)?;
    }

    let active = version
        .map(str::to_string)
        .or(dataset.active_version)
        .or_else(|| {
            if let Some(latest) = &latest {
                tracing::warn!(version = %latest, "no active environmental version set, using latest");
            }
            latest
        });
    if let Some(active) = active {
        store.set_active_environmental_version(&active)?;
    }

    let (text, source_id) = read(dir, MAPPINGS_FILE)?;
    let mappings = mappings_from_json(&text, &source_id)?;
    store.set_material_mappings(mappings.rows)?;
    store.add_warnings(mappings.warnings)?;

    let (text, source_id) = read(dir, SERVICE_LIFE_FILE)?;
    let service_life = service_life_from_json(&text, &source_id)?;
    store.set_service_life(service_life.rows)?;
    store.add_warnings(service_life.warnings)?;

    let (text, source_id) = read(dir, COST_FILE)?;
    let cost = cost_from_json(&text, &source_id)?;
    store.set_cost(cost.rows)?;
    store.add_warnings(cost.warnings)?;

    tracing::debug!(dir = %dir.display(), "loaded reference tables");
    Ok(store)
}

/// Read and validate one element batch file
pub fn read_batch(engine: &Engine, path: &Path, purpose: BatchPurpose) -> Result<ValidatedBatch> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(engine.load_batch(&text, &path.to_string_lossy(), purpose)?)
}

/// A single batch file, or every `.json` file below a directory in path order.
///
/// `skip` (the output directory) is left out of the walk so earlier archives
/// are never read back as batches.
pub fn batch_files(input: &Path, skip: Option<&Path>) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let skip = skip.and_then(|dir| dir.canonicalize().ok());
    let walker = WalkDir::new(input).sort_by_file_name().into_iter().filter_entry(|entry| {
        match &skip {
            Some(skip) if entry.file_type().is_dir() => {
                entry.path().canonicalize().map_or(true, |path| &path != skip)
            }
            _ => true,
        }
    });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && entry.path().extension().and_then(|s| s.to_str()) == Some("json") {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}
