use kennwert::evaluator::round_to;
use kennwert::{
    compute_cost, compute_lca, flatten, group_components, BuildingElement, ComponentFailure,
    CostReference, CostReferenceRow, EngineConfig, EnvironmentalReference, MaterialMappings,
    MaterialQuantity, MaterialReferenceRow, PhysicalQuantities, RecordError, ResultComponent,
    ServiceLifeTable,
};
use proptest::prelude::*;

fn environmental(gwp: f64) -> EnvironmentalReference {
    EnvironmentalReference::from_rows(
        "2022",
        vec![MaterialReferenceRow {
            key: "REF".to_string(),
            name: "Material".to_string(),
            gwp,
            penre: gwp * 10.0,
            ubp: gwp * 1000.0,
            density: 0.0,
        }],
    )
}

fn mappings() -> MaterialMappings {
    let mut mappings = MaterialMappings::new();
    mappings.insert("Concrete", "REF");
    mappings
}

fn component(id: usize, failed: bool) -> ResultComponent {
    let element_id = format!("E{}", id);
    if failed {
        ComponentFailure::new(element_id, &RecordError::InvalidVolume(0.0)).into()
    } else {
        kennwert::CostComponent {
            element_id,
            classification_code: "C01".to_string(),
            total_cost: 1.0,
            unit_cost: 1.0,
            unit: "m".to_string(),
        }
        .into()
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_grouping_is_idempotent(ids in prop::collection::vec((0usize..6, any::<bool>()), 0..40)) {
        let components: Vec<_> = ids.iter().map(|(id, failed)| component(*id, *failed)).collect();
        let grouped = group_components(components.clone());
        let regrouped = group_components(flatten(&grouped));

        prop_assert_eq!(&regrouped, &grouped);
        for result in &grouped {
            prop_assert_eq!(result.shared_id, result.components.len() > 1);
        }
        let total: usize = grouped.iter().map(|r| r.components.len()).sum();
        prop_assert_eq!(total, components.len());
    }

    #[test]
    fn prop_valid_materials_always_succeed(
        volume in 0.001f64..500.0,
        fraction in 0.01f64..1.0,
        density in 1.0f64..8000.0,
        gwp in 0.0f64..20.0,
        years in 1u32..120,
    ) {
        let element = BuildingElement::new("E1", "C01").with_material(
            "Concrete",
            MaterialQuantity { volume: Some(volume), fraction: Some(fraction), density: Some(density) },
        );
        let mut service_life = ServiceLifeTable::new();
        service_life.insert("C01", years);

        let results = compute_lca(&[element], &environmental(gwp), &mappings(), &service_life, &EngineConfig::default());
        prop_assert_eq!(results.len(), 1);
        prop_assert_eq!(results[0].components.len(), 1);

        let lca = results[0].components[0].as_lca().expect("success component");
        prop_assert_eq!(lca.amortization_years, years);

        // Per-year values come from the unrounded absolute, so they may differ
        // from rounding the rounded absolute by at most one unit in the last place.
        let from_rounded = round_to(lca.gwp_absolute / f64::from(years), 3);
        prop_assert!((lca.gwp_per_year - from_rounded).abs() <= 0.001 + 1e-9);
        prop_assert!(lca.gwp_absolute >= 0.0);
    }

    #[test]
    fn prop_non_positive_volume_fails(volume in -100.0f64..=0.0) {
        let element = BuildingElement::new("E1", "C01").with_material(
            "Concrete",
            MaterialQuantity { volume: Some(volume), fraction: None, density: Some(2400.0) },
        );
        let results = compute_lca(&[element], &environmental(0.1), &mappings(), &ServiceLifeTable::new(), &EngineConfig::default());
        let failure = results[0].components[0].as_failure().expect("failure component");
        prop_assert!(failure.error.starts_with("Invalid volume"));
    }

    #[test]
    fn prop_area_cost_is_rate_times_area(area in 0.01f64..10_000.0, rate in 0.0f64..1_000.0) {
        let element = BuildingElement::new("W1", "C02.01").with_quantities(PhysicalQuantities {
            area_net: Some(area),
            ..PhysicalQuantities::default()
        });
        let cost = CostReference::from_rows(vec![CostReferenceRow {
            code: "C02.01".to_string(),
            unit_rate: rate,
            unit: "m2".to_string(),
        }]);

        let results = compute_cost(&[element], &cost);
        let component = results[0].components[0].as_cost().expect("success component");
        prop_assert!((component.total_cost - area * rate).abs() <= 0.005 + 1e-6);
    }
}
