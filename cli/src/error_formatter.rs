use ariadne::{Color, Label, Report, ReportKind, Source};
use kennwert::error::ErrorDetails;
use kennwert::KennwertError;

/// Byte offset of a 1-based line/column position
fn offset_of(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

fn render_json_error(details: &ErrorDetails) -> Option<String> {
    let source_text = details.source_text.as_ref()?;
    let location = details.location?;
    let start = offset_of(source_text, location.line, location.column);
    let end = (start + 1).min(source_text.len()).max(start);

    let message = format!(
        "Invalid JSON: {} (file {}:{}:{})",
        details.message, details.source_id, location.line, location.column
    );

    let mut output = Vec::new();
    Report::build(ReportKind::Error, &details.source_id, start)
        .with_message(message)
        .with_label(
            Label::new((&details.source_id, start..end))
                .with_message("")
                .with_color(Color::Red),
        )
        .finish()
        .write((&details.source_id, Source::from(source_text.as_ref())), &mut output)
        .ok()?;
    Some(String::from_utf8_lossy(&output).to_string())
}

/// Format a KennwertError for the terminal, with source excerpts for JSON errors
pub fn format_error(error: &KennwertError) -> String {
    match error {
        KennwertError::Json(details) => {
            render_json_error(details).unwrap_or_else(|| format!("{}", error))
        }
        KennwertError::Structural(details) => {
            let mut output = format!("Structural error in {}: {}", details.source_id, details.message);
            if let Some(suggestion) = &details.suggestion {
                output.push_str(&format!("\n  help: {}", suggestion));
            }
            output
        }
        KennwertError::Reference(msg) => format!("Reference data error: {}", msg),
        KennwertError::Engine(msg) => format!("Engine error: {}", msg),
        KennwertError::MultipleErrors(errors) => {
            let mut result = String::from("Multiple errors occurred:\n\n");
            for error in errors {
                result.push_str(&format_error(error));
                result.push_str("\n\n");
            }
            result
        }
    }
}
