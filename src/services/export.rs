use crate::api::middleware::AppError;
use crate::models::Row;
use serde_json::Value;

/// Render rows as CSV with a header line taken from the first row's columns.
pub fn rows_to_csv(rows: &[Row]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if let Some(first) = rows.first() {
        writer
            .write_record(first.keys())
            .map_err(|e| AppError::Internal(format!("Failed to write CSV header: {}", e)))?;
    }

    for row in rows {
        let record: Vec<String> = row.values().map(cell_text).collect();
        writer
            .write_record(&record)
            .map_err(|e| AppError::Internal(format!("Failed to write CSV row: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))
}

/// Display text of a cell: strings unquoted, NULL as empty.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn export_filename(prefix: &str) -> String {
    format!("{}_{}.csv", prefix, chrono::Local::now().format("%Y%m%d_%H%M%S"))
}
