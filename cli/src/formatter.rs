use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Row, Table};
use kennwert::store::VersionInfo;
use kennwert::{ErrorLogEntry, RunSummary};

pub struct Formatter {}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {}
    }

    /// Counts, totals and the failure table
    pub fn format_summary(&self, title: &str, summary: &RunSummary) -> String {
        let mut output = String::new();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new(title).set_alignment(CellAlignment::Left),
            Cell::new("Value").set_alignment(CellAlignment::Right),
        ]));

        let counts = [
            ("Elements", summary.total_elements),
            ("Elements processed", summary.processed_elements),
            ("Elements with failures", summary.failed_elements),
            ("Components", summary.total_components),
            ("Failed components", summary.failed_components),
        ];
        for (label, count) in counts {
            table.add_row(Row::from(vec![
                Cell::new(label),
                Cell::new(count.to_string()).set_alignment(CellAlignment::Right),
            ]));
        }

        let totals = &summary.totals;
        let figures = [
            ("GWP [kg CO2-eq]", totals.gwp_absolute, 3),
            ("GWP per year", totals.gwp_per_year, 3),
            ("PENRE [kWh oil-eq]", totals.penr_absolute, 3),
            ("PENRE per year", totals.penr_per_year, 3),
            ("UBP [points]", totals.ubp_absolute, 0),
            ("UBP per year", totals.ubp_per_year, 0),
            ("Cost [CHF]", totals.total_cost, 2),
        ];
        for (label, value, precision) in figures {
            table.add_row(Row::from(vec![
                Cell::new(label),
                Cell::new(format!("{:.*}", precision, value)).set_alignment(CellAlignment::Right),
            ]));
        }

        output.push_str(&table.to_string());
        output.push('\n');

        if !summary.failures.is_empty() {
            output.push('\n');
            output.push_str(&self.format_failures(&summary.failures));
            output.push('\n');
        }

        output
    }

    pub fn format_failures(&self, failures: &[ErrorLogEntry]) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec!["Element", "Material / code", "Kind", "Reason"]));

        for failure in failures {
            table.add_row(Row::from(vec![
                failure.element_id.as_str(),
                failure.context.as_deref().unwrap_or("-"),
                failure.error_kind.as_str(),
                failure.message.as_str(),
            ]));
        }

        table.to_string()
    }

    pub fn format_versions(&self, versions: &[VersionInfo]) -> String {
        if versions.is_empty() {
            return "No environmental reference versions found.\n".to_string();
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new("Version"),
            Cell::new("Active").set_alignment(CellAlignment::Center),
            Cell::new("Rows").set_alignment(CellAlignment::Right),
            Cell::new("Imported"),
        ]));

        for version in versions {
            table.add_row(Row::from(vec![
                Cell::new(&version.version),
                Cell::new(if version.active { "*" } else { "" }).set_alignment(CellAlignment::Center),
                Cell::new(version.rows.to_string()).set_alignment(CellAlignment::Right),
                Cell::new(version.imported_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            ]));
        }

        format!("{}\n", table)
    }

    pub fn format_warnings(&self, warnings: &[String]) -> String {
        let mut output = String::new();
        for warning in warnings {
            output.push_str("warning: ");
            output.push_str(warning);
            output.push('\n');
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kennwert::{FailureKind, Totals};

    #[test]
    fn test_summary_lists_failures() {
        let summary = RunSummary {
            total_elements: 2,
            processed_elements: 1,
            failed_elements: 1,
            total_components: 2,
            failed_components: 1,
            totals: Totals {
                total_cost: 6000.0,
                ..Totals::default()
            },
            failures: vec![ErrorLogEntry {
                element_id: "E2".to_string(),
                context: Some("Timber".to_string()),
                error_kind: FailureKind::MaterialMappingNotFound,
                message: "Material mapping not found: Timber".to_string(),
            }],
        };

        let output = Formatter::default().format_summary("Cost", &summary);
        assert!(output.contains("6000.00"));
        assert!(output.contains("Timber"));
        assert!(output.contains("material_mapping_not_found"));
    }
}
