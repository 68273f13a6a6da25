use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ENVIRONMENTAL: &str = r#"{
    "active_version": "2022",
    "versions": {
        "2022": [
            { "uuid": "REF-CONCRETE", "name": "Hochbaubeton", "gwp": 0.01, "penre": 0.5, "ubp": 100, "density": 2300 }
        ],
        "2024": [
            { "uuid": "REF-CONCRETE", "name": "Hochbaubeton", "gwp": 0.02, "penre": 0.5, "ubp": 100, "density": 2300 }
        ]
    }
}"#;

const MAPPINGS: &str = r#"[ { "material": "Concrete", "reference_id": "REF-CONCRETE" } ]"#;

const SERVICE_LIFE: &str = r#"[ { "code": "C01", "years": 50 } ]"#;

const COST: &str = r#"[ { "code": "C01.01", "unit_rate": 100, "unit": "m2" } ]"#;

pub const ELEMENTS: &str = r#"{
    "elements": [
        {
            "id": "E1",
            "properties": { "ebkp": "C01.01" },
            "materials": ["Concrete"],
            "material_volumes": { "Concrete": { "volume": 10.0, "density": 2300.0 } },
            "quantities": { "area": { "net": 2.0 } }
        },
        {
            "id": "E2",
            "properties": { "ebkp": "C01.01" },
            "materials": ["Timber"],
            "material_volumes": { "Timber": { "volume": 1.0, "density": 500.0 } },
            "quantities": { "area": { "net": 1.0 } }
        }
    ]
}"#;

/// Temporary reference directory plus one element batch file
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let refs = dir.path().join("refs");
        fs::create_dir_all(&refs).unwrap();
        fs::write(refs.join("environmental.json"), ENVIRONMENTAL).unwrap();
        fs::write(refs.join("material_mappings.json"), MAPPINGS).unwrap();
        fs::write(refs.join("service_life.json"), SERVICE_LIFE).unwrap();
        fs::write(refs.join("cost.json"), COST).unwrap();

        let batches = dir.path().join("batches");
        fs::create_dir_all(&batches).unwrap();
        fs::write(batches.join("walls.json"), ELEMENTS).unwrap();

        Self { dir }
    }

    pub fn refs(&self) -> PathBuf {
        self.dir.path().join("refs")
    }

    pub fn batches(&self) -> PathBuf {
        self.dir.path().join("batches")
    }

    pub fn batch(&self) -> PathBuf {
        self.batches().join("walls.json")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }
}
