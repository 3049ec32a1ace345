// Polling dashboard source - Fixed-interval reload triggers over the backend API
use crate::application::attendance_api::{ApiError, AttendanceApi};
use crate::application::dashboard_source::{DashboardSource, RefreshTrigger, UpdateSignal};
use crate::domain::dashboard::DashboardSnapshot;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_stream::wrappers::IntervalStream;

const TRIGGER_CAPACITY: usize = 16;

pub struct PollingSource {
    api: Arc<dyn AttendanceApi>,
    sender: broadcast::Sender<RefreshTrigger>,
    interval: Duration,
}

impl PollingSource {
    pub fn new(api: Arc<dyn AttendanceApi>, interval: Duration) -> Self {
        let (sender, _) = broadcast::channel(TRIGGER_CAPACITY);
        Self {
            api,
            sender,
            interval,
        }
    }

    pub fn signal(&self) -> UpdateSignal {
        UpdateSignal::new(self.sender.clone())
    }

    /// Emit `Poll` every interval, starting one interval from now.
    /// No backoff or jitter; the ticker runs until aborted.
    pub fn start(&self) -> JoinHandle<()> {
        let sender = self.sender.clone();
        let period = self.interval;
        tokio::spawn(async move {
            let mut ticks = IntervalStream::new(interval_at(Instant::now() + period, period));
            while ticks.next().await.is_some() {
                if sender.send(RefreshTrigger::Poll).is_err() {
                    tracing::debug!("Dashboard poll with no subscribers");
                }
            }
        })
    }
}

#[async_trait]
impl DashboardSource for PollingSource {
    async fn refresh(&self) -> Result<DashboardSnapshot, ApiError> {
        self.api.get_dashboard().await
    }

    fn on_update(&self) -> broadcast::Receiver<RefreshTrigger> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::attendance_api::Params;
    use crate::domain::attendance::AttendanceRecord;
    use crate::domain::dashboard::DashboardStats;
    use serde_json::Value;
    use tokio::sync::broadcast::error::TryRecvError;

    struct FixedApi;

    #[async_trait]
    impl AttendanceApi for FixedApi {
        async fn get_dashboard(&self) -> Result<DashboardSnapshot, ApiError> {
            Ok(DashboardSnapshot {
                stats: Some(DashboardStats {
                    total_classes: Some(9),
                    ..Default::default()
                }),
                ..Default::default()
            })
        }
        async fn get_attendance(&self, _: Params<'_>) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }
        async fn mark_attendance(&self, _: &AttendanceRecord) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }
        async fn bulk_mark_attendance(&self, _: &[AttendanceRecord]) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }
        async fn get_attendance_summary(&self) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }
        async fn get_course_report(&self, _: &str) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }
        async fn get_students(&self, _: Params<'_>) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }
        async fn get_student_attendance(&self, _: &str, _: Params<'_>) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }
        async fn get_courses(&self, _: Params<'_>) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }
        async fn get_today_classes(&self) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }
        async fn get_class_schedules(&self, _: Params<'_>) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }
    }

    #[tokio::test]
    async fn test_refresh_fetches_dashboard() {
        let source = PollingSource::new(Arc::new(FixedApi), Duration::from_secs(30));
        let snapshot = source.refresh().await.unwrap();
        assert_eq!(snapshot.stats.unwrap().total_classes, Some(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_polls_on_fixed_interval() {
        let source = PollingSource::new(Arc::new(FixedApi), Duration::from_secs(30));
        let mut rx = source.on_update();
        let ticker = source.start();

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        tokio::time::sleep(Duration::from_secs(62)).await;
        assert_eq!(rx.try_recv().unwrap(), RefreshTrigger::Poll);
        assert_eq!(rx.try_recv().unwrap(), RefreshTrigger::Poll);
        assert_eq!(rx.try_recv().unwrap(), RefreshTrigger::Poll);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        ticker.abort();
    }

    #[tokio::test]
    async fn test_signal_emits_attendance_updated() {
        let source = PollingSource::new(Arc::new(FixedApi), Duration::from_secs(30));
        let mut rx = source.on_update();

        assert_eq!(source.signal().dispatch(), 1);
        assert_eq!(rx.recv().await.unwrap(), RefreshTrigger::AttendanceUpdated);
    }
}
