use crate::validator::{BatchPurpose, BatchRecord, Validator};
use crate::{FailureKind, KennwertError};
use serde_json::json;

#[test]
fn test_all_missing_fields_are_reported_together() {
    let document = json!({
        "elements": [
            { "id": "E1", "properties": { "ebkp": "C01" } },
            { "properties": { "ebkp": "C01" }, "materials": [], "material_volumes": {} },
            42
        ]
    });
    let err = Validator::new()
        .validate_batch(&document, "batch", BatchPurpose::Lca)
        .unwrap_err();

    match err {
        KennwertError::MultipleErrors(errors) => {
            assert_eq!(errors.len(), 4);
            assert!(errors[0].to_string().contains("element #0 (E1)"));
            assert!(errors[2].to_string().contains("element #1 (<element #1>)"));
            assert!(errors[3].to_string().contains("not an object"));
        }
        other => panic!("expected multiple errors, got {}", other),
    }
}

#[test]
fn test_missing_elements_array() {
    let err = Validator::new()
        .validate_batch(&json!({ "items": [] }), "batch", BatchPurpose::Cost)
        .unwrap_err();
    let details = err.details().unwrap();
    assert!(details.message.contains("'elements'"));
    assert!(details.suggestion.is_some());
}

#[test]
fn test_malformed_records_are_quarantined_in_place() {
    let document = json!({
        "elements": [
            { "id": "A", "properties": { "ebkp": "C01" }, "quantities": { "area": { "net": 12.5 } } },
            { "id": "B", "properties": { "ebkp": ["C01"] } },
            { "id": "  ", "properties": { "ebkp": "C01" } },
            { "id": "D", "properties": { "ebkp": null } }
        ]
    });
    let batch = Validator::new()
        .validate_batch(&document, "batch", BatchPurpose::Cost)
        .unwrap();

    assert_eq!(batch.len(), 4);
    assert!(matches!(&batch.records[0], BatchRecord::Valid(e) if e.quantities.area_net == Some(12.5)));
    match &batch.records[1] {
        BatchRecord::Quarantined(failure) => {
            assert_eq!(failure.element_id, "B");
            assert_eq!(failure.error_kind, FailureKind::MalformedRecord);
        }
        other => panic!("expected quarantine, got {:?}", other),
    }
    match &batch.records[2] {
        BatchRecord::Quarantined(failure) => assert_eq!(failure.element_id, "<element #2>"),
        other => panic!("expected quarantine, got {:?}", other),
    }
    assert!(matches!(&batch.records[3], BatchRecord::Valid(e) if e.classification_code.is_empty()));
    assert_eq!(batch.quarantined().count(), 2);
}

#[test]
fn test_classification_codes_are_trimmed() {
    let document = json!({ "elements": [ { "id": " E1 ", "properties": { "ebkp": " C02.01 " } } ] });
    let batch = Validator::new()
        .validate_batch(&document, "batch", BatchPurpose::Cost)
        .unwrap();
    let element = batch.elements().next().unwrap();
    assert_eq!(element.id, "E1");
    assert_eq!(element.classification_code, "C02.01");
}

#[test]
fn test_reference_columns_are_structural() {
    let rows = vec![
        json!({ "uuid": "A", "name": "Concrete", "gwp": 0.1, "penre": 1.0, "ubp": 10 }),
        json!({ "uuid": "B", "name": "Steel", "gwp": 1.5 }),
    ];
    let err = Validator::new().environmental_rows(&rows, "kbob").unwrap_err();
    assert!(err.to_string().contains("row 1 is missing required column(s): penre, ubp"));
}

#[test]
fn test_reference_rows_quarantine_and_density() {
    let rows = vec![
        json!({ "uuid": " A ", "name": "Concrete", "gwp": 0.1, "penre": "1.2", "ubp": 10, "density": "2300 - 2500" }),
        json!({ "uuid": "B", "name": "Steel", "gwp": "high", "penre": 1.0, "ubp": 10 }),
        json!({ "uuid": "C", "name": "Gravel", "gwp": 0.0, "penre": 0.0, "ubp": 0, "density": "n/a" }),
    ];
    let validated = Validator::new().environmental_rows(&rows, "kbob").unwrap();

    assert_eq!(validated.rows.len(), 2);
    assert_eq!(validated.rows[0].key, "A");
    assert_eq!(validated.rows[0].density, 2400.0);
    assert_eq!(validated.rows[0].penre, 1.2);
    assert_eq!(validated.rows[1].density, 0.0);
    assert_eq!(validated.warnings.len(), 2);
    assert!(validated.warnings[0].contains("kbob row 1"));
    assert!(validated.warnings[1].contains("reference C"));
}

#[test]
fn test_mapping_rows_without_reference_stay_unmapped() {
    let rows = vec![
        json!({ "material": "Concrete", "reference_id": "A" }),
        json!({ "material": "Timber", "reference_id": "" }),
        json!({ "material": "Glass" }),
    ];
    let validated = Validator::new().mapping_rows(&rows, "mappings").unwrap();
    assert_eq!(validated.rows.len(), 1);
    assert_eq!(validated.warnings.len(), 2);
}

#[test]
fn test_service_life_and_cost_rows() {
    let validator = Validator::new();
    let rows = vec![
        json!({ "code": "C02", "years": 50 }),
        json!({ "code": "C03", "years": 0 }),
        json!({ "code": "C04", "years": 12.5 }),
    ];
    let validated = validator.service_life_rows(&rows, "service_life").unwrap();
    assert_eq!(validated.rows.len(), 1);
    assert_eq!(validated.rows[0].years, 50);

    let rows = vec![
        json!({ "code": "C02.01", "unit_rate": 120, "unit": "m2" }),
        json!({ "code": "C02.02", "unit_rate": 95.5, "unit": "Stk" }),
        json!({ "code": "C02.03", "unit_rate": -1, "unit": "m" }),
    ];
    let validated = validator.cost_rows(&rows, "cost").unwrap();
    assert_eq!(validated.rows.len(), 2);
    assert_eq!(validated.rows[1].unit, "Stk");
    assert_eq!(validated.warnings.len(), 1);
}
