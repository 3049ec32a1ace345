// Direct single-mark submission to the legacy endpoint
use crate::application::attendance_api::ApiError;
use crate::application::attendance_handler::AttendanceSubmitter;
use crate::domain::attendance::AttendanceRecord;
use async_trait::async_trait;
use serde_json::Value;

const MARK_ENDPOINT: &str = "/api/mark-attendance/";

/// Posts one record straight to `/api/mark-attendance/`, outside the API client
#[derive(Debug, Clone)]
pub struct DirectSubmitter {
    client: reqwest::Client,
    url: String,
    csrf_token: Option<String>,
}

impl DirectSubmitter {
    /// `client` should be the one the API client uses, so both share a cookie jar
    pub fn new(client: reqwest::Client, origin: &str, csrf_token: Option<String>) -> Self {
        Self {
            client,
            url: format!("{}{}", origin.trim_end_matches('/'), MARK_ENDPOINT),
            csrf_token,
        }
    }
}

#[async_trait]
impl AttendanceSubmitter for DirectSubmitter {
    async fn submit(&self, record: &AttendanceRecord) -> Result<Value, ApiError> {
        let mut request = self.client.post(&self.url).json(record);
        if let Some(token) = &self.csrf_token {
            request = request.header("X-CSRFToken", token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                "Marking {} for student {} rejected with {}",
                record.status.code(),
                record.student_id,
                status
            );
            return Err(ApiError::Http {
                status: status.as_u16(),
            });
        }

        // The legacy view may answer with an empty body
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
