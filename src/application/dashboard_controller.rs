// Dashboard controller - Loads snapshots and paints them into the page
use crate::application::attendance_api::ApiError;
use crate::application::dashboard_source::{DashboardSource, RefreshTrigger};
use crate::domain::chart::ChartState;
use crate::domain::dashboard::DashboardSnapshot;
use crate::presentation::page::{Level, SharedPage};
use crate::presentation::render::{
    recent_activity_rows, stats_cards, today_class_cards, RECENT_ACTIVITY, STATS_CONTAINER,
    TODAY_CLASSES,
};
use futures::stream::Stream;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;

pub type SharedCharts = Arc<RwLock<ChartState>>;

#[derive(Clone)]
pub struct DashboardController {
    source: Arc<dyn DashboardSource>,
    page: SharedPage,
    charts: SharedCharts,
}

impl DashboardController {
    pub fn new(source: Arc<dyn DashboardSource>, page: SharedPage) -> Self {
        Self {
            source,
            page,
            charts: Arc::new(RwLock::new(ChartState::default())),
        }
    }

    pub fn charts(&self) -> SharedCharts {
        self.charts.clone()
    }

    /// One load cycle. Failures are logged and surfaced as a single notification.
    pub async fn load(&self) -> Result<(), ApiError> {
        match self.source.refresh().await {
            Ok(snapshot) => {
                self.render(&snapshot).await;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load dashboard data: {}", e);
                self.page
                    .lock()
                    .await
                    .notify("Failed to load dashboard data", Level::Danger);
                Err(e)
            }
        }
    }

    async fn render(&self, snapshot: &DashboardSnapshot) {
        {
            let mut page = self.page.lock().await;
            if let Some(stats) = &snapshot.stats {
                page.reconcile(STATS_CONTAINER, stats_cards(stats));
            }
            if let Some(activity) = snapshot.activity() {
                page.reconcile(RECENT_ACTIVITY, recent_activity_rows(activity));
            }
            if let Some(classes) = &snapshot.today_classes {
                page.reconcile(TODAY_CLASSES, today_class_cards(classes));
            }
        }

        if self.charts.write().await.apply(snapshot) {
            tracing::debug!("Dashboard charts rebound from snapshot");
        }
    }

    /// Load now, then reload on every trigger until the source shuts down.
    /// A failed load never stops the loop.
    pub async fn run(self) {
        let updates = triggers(self.source.on_update());
        futures::pin_mut!(updates);

        if let Err(e) = self.load().await {
            tracing::debug!("Initial dashboard load failed, waiting for a trigger: {}", e);
        }
        while let Some(trigger) = updates.next().await {
            tracing::debug!("Dashboard reload triggered by {:?}", trigger);
            if let Err(e) = self.load().await {
                tracing::debug!("Reload after {:?} failed: {}", trigger, e);
            }
        }
        tracing::info!("Dashboard source closed, stopping updates");
    }
}

fn triggers(mut rx: broadcast::Receiver<RefreshTrigger>) -> impl Stream<Item = RefreshTrigger> {
    async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(trigger) => yield trigger,
                Err(RecvError::Lagged(skipped)) => {
                    // Missed triggers collapse into one reload
                    tracing::warn!("Dashboard lagged behind {} triggers", skipped);
                    yield RefreshTrigger::Poll;
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
