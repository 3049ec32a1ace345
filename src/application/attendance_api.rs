// Backend API seam consumed by the controllers
use crate::domain::attendance::AttendanceRecord;
use crate::domain::dashboard::DashboardSnapshot;
use async_trait::async_trait;
use serde_json::Value;

/// Query parameters, encoded in order
pub type Params<'a> = &'a [(&'a str, &'a str)];

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid header {0}")]
    InvalidHeader(String),

    #[error("invalid backend url {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// One operation per backend endpoint. Each is fixed to a single path and method.
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    /// GET /dashboard/
    async fn get_dashboard(&self) -> Result<DashboardSnapshot, ApiError>;

    /// GET /attendance/
    async fn get_attendance(&self, params: Params<'_>) -> Result<Value, ApiError>;

    /// POST /attendance/
    async fn mark_attendance(&self, record: &AttendanceRecord) -> Result<Value, ApiError>;

    /// POST /attendance/bulk_create/
    async fn bulk_mark_attendance(&self, records: &[AttendanceRecord]) -> Result<Value, ApiError>;

    /// GET /attendance/summary/
    async fn get_attendance_summary(&self) -> Result<Value, ApiError>;

    /// GET /attendance/course_report/?course_id=
    async fn get_course_report(&self, course_id: &str) -> Result<Value, ApiError>;

    /// GET /students/
    async fn get_students(&self, params: Params<'_>) -> Result<Value, ApiError>;

    /// GET /students/{id}/attendance/
    async fn get_student_attendance(
        &self,
        student_id: &str,
        params: Params<'_>,
    ) -> Result<Value, ApiError>;

    /// GET /courses/
    async fn get_courses(&self, params: Params<'_>) -> Result<Value, ApiError>;

    /// GET /class-schedules/today_classes/
    async fn get_today_classes(&self) -> Result<Value, ApiError>;

    /// GET /class-schedules/
    async fn get_class_schedules(&self, params: Params<'_>) -> Result<Value, ApiError>;
}
