/// Escape a value for use inside a single-quoted SOQL string literal.
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Query for report folders with exactly this name.
pub fn report_folder_query(folder_name: &str) -> String {
    format!(
        "SELECT Id FROM Folder WHERE Name = '{}' AND Type = 'Report'",
        escape_literal(folder_name)
    )
}
