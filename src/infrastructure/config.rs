use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct PortalConfig {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub dashboard: DashboardSettings,
    pub attendance: AttendanceSettings,
    pub ui: UiSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub api_prefix: String,
    #[serde(default)]
    pub csrf_token: Option<String>,
    /// `Set-Cookie` style strings seeded into the shared jar, e.g. a Django `sessionid`
    #[serde(default)]
    pub cookies: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    pub poll_interval_secs: u64,
}

impl DashboardSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AttendanceSettings {
    pub submit_delay_ms: u64,
    #[serde(default)]
    pub course_id: Option<String>,
}

impl AttendanceSettings {
    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiSettings {
    pub alert_dismiss_secs: u64,
    pub clock_tick_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            alert_dismiss_secs: 5,
            clock_tick_ms: 1000,
        }
    }
}

impl UiSettings {
    pub fn alert_dismiss(&self) -> Duration {
        Duration::from_secs(self.alert_dismiss_secs)
    }

    pub fn clock_tick(&self) -> Duration {
        Duration::from_millis(self.clock_tick_ms)
    }
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("server.listen", "0.0.0.0:8080")?
        .set_default("backend.base_url", "http://127.0.0.1:8000")?
        .set_default("backend.api_prefix", "/api")?
        .set_default("dashboard.poll_interval_secs", 30_i64)?
        .set_default("attendance.submit_delay_ms", 1000_i64)?
        .set_default("ui.alert_dismiss_secs", 5_i64)?
        .set_default("ui.clock_tick_ms", 1000_i64)
}

/// `PORTAL__SECTION__KEY` variables. `PORTAL__BACKEND__COOKIES` splits on `|`.
fn portal_environment() -> Environment {
    Environment::with_prefix("PORTAL")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator("|")
        .with_list_parse_key("backend.cookies")
}

fn build(
    builder: ConfigBuilder<DefaultState>,
    environment: Environment,
) -> anyhow::Result<PortalConfig> {
    let settings = builder.add_source(environment).build()?;
    Ok(settings.try_deserialize()?)
}

/// Defaults, then `config/portal.*` if present, then the environment
pub fn load_portal_config() -> anyhow::Result<PortalConfig> {
    let builder = with_defaults(config::Config::builder())?
        .add_source(config::File::with_name("config/portal").required(false));
    build(builder, portal_environment())
}
