// HTTP client for the attendance backend
use crate::application::attendance_api::{ApiError, AttendanceApi, Params};
use crate::domain::attendance::AttendanceRecord;
use crate::domain::dashboard::DashboardSnapshot;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::cookie::Jar;
use reqwest::{Method, Url};
use serde_json::{json, Value};
use std::sync::Arc;

pub const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            headers: Vec::new(),
        }
    }
}

/// HTTP client shared by every backend adapter, so cookies one of them
/// receives are sent by the others. `cookies` seed the jar for `origin`.
pub fn session_client(origin: &str, cookies: &[String]) -> Result<reqwest::Client, ApiError> {
    let jar = Arc::new(Jar::default());
    if !cookies.is_empty() {
        let url: Url = origin
            .parse()
            .map_err(|_| ApiError::InvalidUrl(origin.to_string()))?;
        for cookie in cookies {
            jar.add_cookie_str(cookie, &url);
        }
        tracing::debug!("Seeded {} cookies for {}", cookies.len(), url);
    }
    Ok(reqwest::Client::builder().cookie_provider(jar).build()?)
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    csrf_token: Option<String>,
}

impl ApiClient {
    /// `csrf_token` is captured once and reused for the client's lifetime
    pub fn new(
        client: reqwest::Client,
        origin: &str,
        api_prefix: &str,
        csrf_token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: format!(
                "{}{}",
                origin.trim_end_matches('/'),
                api_prefix.trim_end_matches('/')
            ),
            csrf_token,
        }
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Issue a request and parse the JSON reply. Failures are logged, then returned.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let result = self.send(endpoint, options).await;
        if let Err(e) = &result {
            tracing::error!("API request to {} failed: {}", endpoint, e);
        }
        result
    }

    async fn send(&self, endpoint: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let url = self.url(endpoint);
        let headers = self.headers(&options.headers)?;
        tracing::debug!("{} {}", options.method, url);

        let mut builder = self.client.request(options.method, &url).headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Defaults first; caller overrides replace headers of the same name
    fn headers(&self, overrides: &[(String, String)]) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.csrf_token {
            let value = HeaderValue::from_str(token)
                .map_err(|_| ApiError::InvalidHeader(CSRF_HEADER.to_string()))?;
            headers.insert(HeaderName::from_static("x-csrftoken"), value);
        }

        for (name, value) in overrides {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidHeader(name.as_str().to_string()))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    async fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(endpoint, RequestOptions::default()).await
    }
}

/// Append url-encoded params; no `?` when there are none
pub fn with_query(path: &str, params: Params<'_>) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", path, query)
}

#[async_trait]
impl AttendanceApi for ApiClient {
    async fn get_dashboard(&self) -> Result<DashboardSnapshot, ApiError> {
        let body = self.get("/dashboard/").await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn get_attendance(&self, params: Params<'_>) -> Result<Value, ApiError> {
        self.get(&with_query("/attendance/", params)).await
    }

    async fn mark_attendance(&self, record: &AttendanceRecord) -> Result<Value, ApiError> {
        let body = serde_json::to_value(record)?;
        self.request("/attendance/", RequestOptions::post(body)).await
    }

    async fn bulk_mark_attendance(&self, records: &[AttendanceRecord]) -> Result<Value, ApiError> {
        let body = json!({ "attendances": records });
        self.request("/attendance/bulk_create/", RequestOptions::post(body))
            .await
    }

    async fn get_attendance_summary(&self) -> Result<Value, ApiError> {
        self.get("/attendance/summary/").await
    }

    async fn get_course_report(&self, course_id: &str) -> Result<Value, ApiError> {
        self.get(&with_query(
            "/attendance/course_report/",
            &[("course_id", course_id)],
        ))
        .await
    }

    async fn get_students(&self, params: Params<'_>) -> Result<Value, ApiError> {
        self.get(&with_query("/students/", params)).await
    }

    async fn get_student_attendance(
        &self,
        student_id: &str,
        params: Params<'_>,
    ) -> Result<Value, ApiError> {
        let path = format!("/students/{}/attendance/", urlencoding::encode(student_id));
        self.get(&with_query(&path, params)).await
    }

    async fn get_courses(&self, params: Params<'_>) -> Result<Value, ApiError> {
        self.get(&with_query("/courses/", params)).await
    }

    async fn get_today_classes(&self) -> Result<Value, ApiError> {
        self.get("/class-schedules/today_classes/").await
    }

    async fn get_class_schedules(&self, params: Params<'_>) -> Result<Value, ApiError> {
        self.get(&with_query("/class-schedules/", params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::attendance::AttendanceStatus;
    use axum::extract::State;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode, Uri};
    use axum::response::IntoResponse;
    use axum::routing::any;
    use axum::{Json, Router};
    use chrono::NaiveDate;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct Seen {
        method: String,
        uri: String,
        csrf: Option<String>,
        content_type: Option<String>,
        body: String,
    }

    type Log = Arc<Mutex<Vec<Seen>>>;

    async fn record(
        State(log): State<Log>,
        method: axum::http::Method,
        uri: Uri,
        headers: AxumHeaders,
        body: String,
    ) -> axum::response::Response {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        log.lock().unwrap().push(Seen {
            method: method.to_string(),
            uri: uri.to_string(),
            csrf: header("x-csrftoken"),
            content_type: header("content-type"),
            body,
        });

        match uri.path() {
            "/api/broken/" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            "/api/dashboard/" => Json(json!({
                "stats": {"total_classes": 12},
                "today_classes": []
            }))
            .into_response(),
            _ => Json(json!({"ok": true})).into_response(),
        }
    }

    async fn serve() -> (String, Log) {
        let log: Log = Arc::default();
        let app = Router::new()
            .route("/*path", any(record))
            .with_state(log.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), log)
    }

    fn api(origin: &str, prefix: &str, csrf: Option<&str>) -> ApiClient {
        let client = session_client(origin, &[]).unwrap();
        ApiClient::new(client, origin, prefix, csrf.map(str::to_string))
    }

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("/students/", &[]), "/students/");
        assert_eq!(
            with_query("/attendance/", &[("date", "2024-03-05"), ("q", "a b&c")]),
            "/attendance/?date=2024-03-05&q=a%20b%26c"
        );
    }

    #[tokio::test]
    async fn test_request_injects_headers_and_parses_json() {
        let (origin, log) = serve().await;
        let client = api(&origin, "/api/", Some("tok123"));

        let snapshot = client.get_dashboard().await.unwrap();
        assert_eq!(snapshot.stats.unwrap().total_classes, Some(12));

        let seen = log.lock().unwrap()[0].clone();
        assert_eq!(seen.method, "GET");
        assert_eq!(seen.uri, "/api/dashboard/");
        assert_eq!(seen.csrf.as_deref(), Some("tok123"));
        assert_eq!(seen.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let (origin, _log) = serve().await;
        let client = api(&origin, "/api", None);

        let err = client.get("/broken/").await.unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500 }));
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_header_overrides_replace_defaults() {
        let (origin, log) = serve().await;
        let client = api(&origin, "/api", Some("tok"));

        let options = RequestOptions {
            headers: vec![("X-CSRFToken".into(), "fresh".into())],
            ..Default::default()
        };
        client.request("/attendance/", options).await.unwrap();
        assert_eq!(log.lock().unwrap()[0].csrf.as_deref(), Some("fresh"));

        let bad = RequestOptions {
            headers: vec![("bad header".into(), "x".into())],
            ..Default::default()
        };
        assert!(matches!(
            client.request("/attendance/", bad).await,
            Err(ApiError::InvalidHeader(_))
        ));
    }

    #[tokio::test]
    async fn test_convenience_operations_hit_fixed_endpoints() {
        let (origin, log) = serve().await;
        let client = api(&origin, "/api", Some("tok"));
        let record = AttendanceRecord::new(
            "7",
            "4",
            AttendanceStatus::Present,
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        );

        client.get_attendance(&[("date", "2024-03-05")]).await.unwrap();
        client.mark_attendance(&record).await.unwrap();
        client.bulk_mark_attendance(&[record.clone()]).await.unwrap();
        client.get_attendance_summary().await.unwrap();
        client.get_course_report("4").await.unwrap();
        client.get_students(&[]).await.unwrap();
        client.get_student_attendance("7", &[("month", "3")]).await.unwrap();
        client.get_courses(&[]).await.unwrap();
        client.get_today_classes().await.unwrap();
        client.get_class_schedules(&[]).await.unwrap();

        let seen = log.lock().unwrap().clone();
        let calls: Vec<(String, String)> = seen
            .iter()
            .map(|s| (s.method.clone(), s.uri.clone()))
            .collect();
        let expected = [
            ("GET", "/api/attendance/?date=2024-03-05"),
            ("POST", "/api/attendance/"),
            ("POST", "/api/attendance/bulk_create/"),
            ("GET", "/api/attendance/summary/"),
            ("GET", "/api/attendance/course_report/?course_id=4"),
            ("GET", "/api/students/"),
            ("GET", "/api/students/7/attendance/?month=3"),
            ("GET", "/api/courses/"),
            ("GET", "/api/class-schedules/today_classes/"),
            ("GET", "/api/class-schedules/"),
        ];
        assert_eq!(calls.len(), expected.len());
        for ((method, uri), (want_method, want_uri)) in calls.iter().zip(expected) {
            assert_eq!(method, want_method);
            assert_eq!(uri, want_uri);
        }

        let posted: Value = serde_json::from_str(&seen[1].body).unwrap();
        assert_eq!(posted["status"], "P");
        let bulk: Value = serde_json::from_str(&seen[2].body).unwrap();
        assert_eq!(bulk["attendances"][0]["student_id"], "7");
    }
}
