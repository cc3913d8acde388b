//! Human-readable renderings for the terminal

use sfsync_domain::{BatchResult, ObjectSchema, Record};

/// (header, field, width) of the account table
const ACCOUNT_COLUMNS: [(&str, &str, usize); 7] = [
    ("ID", "Id", 18),
    ("Name", "Name", 25),
    ("Type", "Type", 12),
    ("Industry", "Industry", 15),
    ("Phone", "Phone", 15),
    ("Website", "Website", 25),
    ("Domain", "Domain__c", 20),
];

const RULE_WIDTH: usize = 135;

/// Left-aligned cell; values longer than the column are cut one short of it
fn cell(value: &str, width: usize) -> String {
    let cut: String = value.chars().take(width.saturating_sub(1)).collect();
    format!("{cut:<width$}")
}

/// Append `line` without trailing blanks, newline-terminated
fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn text_of(record: &Record, field: &str) -> String {
    record.get(field).map(ToString::to_string).unwrap_or_default()
}

/// Fixed-width account listing with a header and a rule
pub fn account_table(records: &[Record]) -> String {
    let mut table = String::new();
    let header: Vec<String> =
        ACCOUNT_COLUMNS.iter().map(|&(title, _, width)| format!("{title:<width$}")).collect();
    push_line(&mut table, &header.join(" "));
    push_line(&mut table, &"-".repeat(RULE_WIDTH));

    for record in records {
        let row: Vec<String> = ACCOUNT_COLUMNS
            .iter()
            .map(|&(_, field, width)| {
                // the id column is never truncated
                if field == "Id" {
                    format!("{:<width$}", text_of(record, field))
                } else {
                    cell(&text_of(record, field), width)
                }
            })
            .collect();
        push_line(&mut table, &row.join(" "));
    }
    table
}

/// One line per field: name, kind, flags and constraints
pub fn schema_table(schema: &ObjectSchema) -> String {
    let mut table = String::new();
    push_line(&mut table, &format!("{} ({} fields)", schema.object_type, schema.fields().len()));
    push_line(&mut table, &format!("{:<40} {:<15} {:<9} DETAILS", "FIELD", "KIND", "REQUIRED"));

    for field in schema.fields() {
        let mut details = Vec::new();
        if let Some(length) = field.max_length {
            details.push(format!("max {length}"));
        }
        if let (Some(precision), Some(scale)) = (field.precision, field.scale) {
            details.push(format!("digits {precision},{scale}"));
        }
        if let Some(values) = &field.allowed_values {
            details.push(format!("{} values", values.len()));
        }
        if let Some(target) = &field.reference_target {
            details.push(format!("-> {target}"));
        }
        let required = if field.required { "yes" } else { "" };
        let line = format!("{:<40} {:<15} {:<9} {}", field.name, field.kind.to_string(), required, details.join(", "));
        push_line(&mut table, &line);
    }
    table
}

/// Totals followed by one line per failed record
pub fn batch_summary(result: &BatchResult) -> String {
    let mut summary = format!("Processed {} records: {} succeeded, {} failed\n", result.total, result.succeeded, result.failed);
    for outcome in result.outcomes.iter().filter(|outcome| !outcome.success) {
        let reason = outcome.error.as_ref().map(ToString::to_string).unwrap_or_default();
        push_line(&mut summary, &format!("  record {}: {reason}", outcome.index));
    }
    summary
}
