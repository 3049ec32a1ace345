// Application layer - Services and the seams they depend on
pub mod attendance_api;
pub mod attendance_handler;
pub mod dashboard_controller;
pub mod dashboard_source;
