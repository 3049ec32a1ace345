// Student roster entries used to build the attendance sheet
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct StudentEntry {
    pub id: String,
    pub name: String,
}

impl StudentEntry {
    /// Read one student from a listing row. Rows without an id are skipped.
    pub fn from_json(row: &Value) -> Option<Self> {
        let id = match row.get("id")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        let text = |key: &str| {
            row.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let joined = [text("user__first_name"), text("user__last_name")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        let name = text("full_name")
            .or_else(|| text("student_name"))
            .or_else(|| Some(joined).filter(|s| !s.is_empty()))
            .or_else(|| text("name"))
            .or_else(|| text("student_id"))
            .unwrap_or_else(|| "N/A".to_string());

        Some(Self { id, name })
    }
}

/// The listing endpoint answers either a bare array or `{"students": [...]}`
pub fn students_from_response(body: &Value) -> Vec<StudentEntry> {
    let rows: &[Value] = match body {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(map) => map
            .get("students")
            .or_else(|| map.get("results"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    rows.iter().filter_map(StudentEntry::from_json).collect()
}
