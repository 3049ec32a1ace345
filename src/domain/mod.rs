// Domain layer - View-models derived from backend JSON
pub mod attendance;
pub mod chart;
pub mod dashboard;
pub mod student;
