// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    routing::{get, post},
    Router,
};
use chrono::Local;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::attendance_api::AttendanceApi;
use crate::application::attendance_handler::AttendanceHandler;
use crate::application::dashboard_controller::DashboardController;
use crate::domain::student::students_from_response;
use crate::infrastructure::api_client::{session_client, ApiClient};
use crate::infrastructure::config::load_portal_config;
use crate::infrastructure::legacy_submitter::DirectSubmitter;
use crate::infrastructure::polling_source::PollingSource;
use crate::presentation::app_state::AppState;
use crate::presentation::bootstrap;
use crate::presentation::handlers::{
    attendance_updated, bulk_action, change_date, chart_configs, control_status, health_check,
    mark_control, render_page, search, submit,
};
use crate::presentation::page::Page;
use crate::presentation::render::{attendance_sheet_rows, dashboard_page, ATTENDANCE_ROWS};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_portal_config()?;

    // Build the page; the client reuses whatever token it carries
    let mut page = Page::new(
        dashboard_page(config.backend.csrf_token.as_deref()),
        config.ui.alert_dismiss(),
    );
    let csrf_token = page.csrf_token();

    // Create backend adapters (infrastructure layer), sharing one cookie jar
    let client = session_client(&config.backend.base_url, &config.backend.cookies)?;
    let api = Arc::new(ApiClient::new(
        client.clone(),
        &config.backend.base_url,
        &config.backend.api_prefix,
        csrf_token.clone(),
    ));
    let submitter = Arc::new(DirectSubmitter::new(client, &config.backend.base_url, csrf_token));

    if let Some(course_id) = &config.attendance.course_id {
        match api.get_students(&[("course_id", course_id.as_str())]).await {
            Ok(body) => {
                let students = students_from_response(&body);
                tracing::info!(
                    "Attendance sheet for course {}: {} students",
                    course_id,
                    students.len()
                );
                if let Some(rows) = page.document_mut().find_by_id_mut(ATTENDANCE_ROWS) {
                    rows.set_children(attendance_sheet_rows(&students, course_id));
                }
            }
            Err(e) => tracing::warn!("Could not load students for the attendance sheet: {}", e),
        }
    }
    let page = page.into_shared();

    // Create services (application layer)
    let source = Arc::new(PollingSource::new(api.clone(), config.dashboard.poll_interval()));
    let signal = source.signal();
    let poller = source.start();

    // Page behaviors bind before the first dashboard load renders anything
    let page_tasks = bootstrap::start(page.clone(), &config.ui).await;

    let controller = DashboardController::new(source, page.clone());
    let charts = controller.charts();
    tokio::spawn(controller.run());

    let attendance = AttendanceHandler::new(page.clone(), submitter, api, Local::now().date_naive())
        .with_submit_delay(config.attendance.submit_delay())
        .with_signal(signal.clone())
        .with_default_course(config.attendance.course_id.clone());

    // Create application state
    let state = Arc::new(AppState {
        page,
        charts,
        attendance: Arc::new(attendance),
        signal,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/", get(render_page))
        .route("/charts", get(chart_configs))
        .route("/controls/:id", get(control_status))
        .route("/controls/:id/mark", post(mark_control))
        .route("/bulk-action", post(bulk_action))
        .route("/search/:search_id", post(search))
        .route("/events/attendance-updated", post(attendance_updated))
        .route("/forms/:id/submit", post(submit))
        .route("/date", post(change_date))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.listen.parse()?;
    tracing::info!("Starting attendance-portal on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    page_tasks.abort();
    poller.abort();
    tracing::info!("attendance-portal stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
