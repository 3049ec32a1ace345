// Application state for HTTP handlers
use crate::application::attendance_handler::AttendanceHandler;
use crate::application::dashboard_controller::SharedCharts;
use crate::application::dashboard_source::UpdateSignal;
use crate::presentation::page::SharedPage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub page: SharedPage,
    pub charts: SharedCharts,
    pub attendance: Arc<AttendanceHandler>,
    pub signal: UpdateSignal,
}
