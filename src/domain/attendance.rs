// Attendance domain model
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[serde(rename = "P")]
    Present,
    #[serde(rename = "A")]
    Absent,
    #[serde(rename = "L")]
    Late,
    #[serde(rename = "E")]
    Excused,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
        AttendanceStatus::Excused,
    ];

    /// Parse the one-letter code used by the backend
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "P" => Some(Self::Present),
            "A" => Some(Self::Absent),
            "L" => Some(Self::Late),
            "E" => Some(Self::Excused),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Present => "P",
            Self::Absent => "A",
            Self::Late => "L",
            Self::Excused => "E",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Present => "success",
            Self::Absent => "danger",
            Self::Late => "warning",
            Self::Excused => "info",
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
            Self::Late => "Late",
            Self::Excused => "Excused",
        }
    }
}

/// Badge color for a raw status code; unknown codes render as "secondary"
pub fn status_color(code: &str) -> &'static str {
    AttendanceStatus::from_code(code)
        .map(|s| s.color())
        .unwrap_or("secondary")
}

/// Display text for a raw status code; unknown codes render as "Unknown"
pub fn status_text(code: &str) -> &'static str {
    AttendanceStatus::from_code(code)
        .map(|s| s.text())
        .unwrap_or("Unknown")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub course_id: String,
    pub status: AttendanceStatus,
    pub date: NaiveDate,
}

impl AttendanceRecord {
    pub fn new(
        student_id: impl Into<String>,
        course_id: impl Into<String>,
        status: AttendanceStatus,
        date: NaiveDate,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            course_id: course_id.into(),
            status,
            date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_status_lookups() {
        let expected = [
            ("P", "success", "Present"),
            ("A", "danger", "Absent"),
            ("L", "warning", "Late"),
            ("E", "info", "Excused"),
        ];
        for (code, color, text) in expected {
            assert_eq!(status_color(code), color);
            assert_eq!(status_text(code), text);
        }
    }

    #[test]
    fn test_unknown_status_degrades_to_secondary() {
        for code in ["", "X", "present", "p"] {
            assert_eq!(status_color(code), "secondary");
            assert_eq!(status_text(code), "Unknown");
        }
    }

    #[test]
    fn test_record_serializes_with_status_code() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let record = AttendanceRecord::new("17", "4", AttendanceStatus::Late, date);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "student_id": "17",
                "course_id": "4",
                "status": "L",
                "date": "2024-03-05"
            })
        );
    }
}
