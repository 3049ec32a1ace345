// Presentation layer - View tree, renderers and HTTP handlers
pub mod app_state;
pub mod bootstrap;
pub mod dom;
pub mod handlers;
pub mod page;
pub mod render;
