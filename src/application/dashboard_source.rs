// Observer contract between the dashboard controller and whatever feeds it
use crate::application::attendance_api::ApiError;
use crate::domain::dashboard::DashboardSnapshot;
use async_trait::async_trait;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Fixed-interval poll
    Poll,
    /// Some collaborator changed attendance and wants an immediate reload
    AttendanceUpdated,
}

#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// Fetch the latest snapshot
    async fn refresh(&self) -> Result<DashboardSnapshot, ApiError>;

    /// Subscribe to reload triggers. The stream ends when the source shuts down.
    fn on_update(&self) -> broadcast::Receiver<RefreshTrigger>;
}

/// Handle any collaborator can use to announce an attendance change
#[derive(Debug, Clone)]
pub struct UpdateSignal {
    sender: broadcast::Sender<RefreshTrigger>,
}

impl UpdateSignal {
    pub fn new(sender: broadcast::Sender<RefreshTrigger>) -> Self {
        Self { sender }
    }

    /// Returns how many subscribers were notified
    pub fn dispatch(&self) -> usize {
        match self.sender.send(RefreshTrigger::AttendanceUpdated) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!("attendanceUpdated dispatched with no subscribers");
                0
            }
        }
    }
}
