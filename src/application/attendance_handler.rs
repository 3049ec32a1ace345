// Attendance interaction handler - Mark controls and bulk actions
use crate::application::attendance_api::{ApiError, AttendanceApi};
use crate::application::dashboard_source::UpdateSignal;
use crate::domain::attendance::{AttendanceRecord, AttendanceStatus};
use crate::presentation::dom::{Element, Node};
use crate::presentation::page::{Level, SharedPage};
use crate::presentation::render::{MARK_CONTROL_CLASS, STUDENT_CHECKBOX_CLASS};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

const DEFAULT_SUBMIT_DELAY: Duration = Duration::from_millis(1000);
const SUCCESS_GLYPH: &str = "✓";

#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error("Please select at least one student")]
    NoSelection,

    #[error("no attendance control with id {0}")]
    UnknownControl(String),

    #[error("control {0} is busy or already marked")]
    ControlBusy(String),

    #[error("{element} is missing {attribute}")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("unknown attendance status {0:?}")]
    InvalidStatus(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("attendance submission task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Path that delivers a single mark
#[async_trait]
pub trait AttendanceSubmitter: Send + Sync {
    async fn submit(&self, record: &AttendanceRecord) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlState {
    Idle,
    Busy,
    Success,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkFailure {
    pub student_id: String,
    pub error: String,
}

/// Per-student results of one bulk action
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkOutcome {
    pub status: Option<AttendanceStatus>,
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Status applied by a bulk-action selector value
pub fn bulk_status(action: &str) -> Option<AttendanceStatus> {
    match action {
        "mark-present" => Some(AttendanceStatus::Present),
        "mark-absent" => Some(AttendanceStatus::Absent),
        "mark-late" => Some(AttendanceStatus::Late),
        "mark-excused" => Some(AttendanceStatus::Excused),
        _ => None,
    }
}

struct ControlEntry {
    state: ControlState,
    original_label: Vec<Node>,
}

type Controls = Arc<Mutex<HashMap<String, ControlEntry>>>;

pub struct AttendanceHandler {
    page: SharedPage,
    submitter: Arc<dyn AttendanceSubmitter>,
    api: Arc<dyn AttendanceApi>,
    current_date: RwLock<NaiveDate>,
    submit_delay: Duration,
    signal: Option<UpdateSignal>,
    default_course: Option<String>,
    controls: Controls,
}

impl AttendanceHandler {
    pub fn new(
        page: SharedPage,
        submitter: Arc<dyn AttendanceSubmitter>,
        api: Arc<dyn AttendanceApi>,
        current_date: NaiveDate,
    ) -> Self {
        Self {
            page,
            submitter,
            api,
            current_date: RwLock::new(current_date),
            submit_delay: DEFAULT_SUBMIT_DELAY,
            signal: None,
            default_course: None,
            controls: Controls::default(),
        }
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn with_signal(mut self, signal: UpdateSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Course used for bulk rows whose checkbox carries none
    pub fn with_default_course(mut self, course_id: Option<String>) -> Self {
        self.default_course = course_id;
        self
    }

    pub async fn current_date(&self) -> NaiveDate {
        *self.current_date.read().await
    }

    /// Change the working date. Returns the query the page navigates to.
    pub async fn set_date(&self, date: NaiveDate) -> String {
        *self.current_date.write().await = date;
        format!("?date={}", date.format("%Y-%m-%d"))
    }

    pub async fn control_state(&self, control_id: &str) -> ControlState {
        self.controls
            .lock()
            .await
            .get(control_id)
            .map(|c| c.state)
            .unwrap_or(ControlState::Idle)
    }

    /// Mark one student from a `.mark-attendance` control.
    ///
    /// Idle -> Busy (spinner, disabled) -> Success (checkmark, stays disabled),
    /// or back to Idle with the original label restored when submission fails.
    pub async fn mark(&self, control_id: &str) -> Result<ControlState, AttendanceError> {
        let date = self.current_date().await;

        let record = {
            let mut page = self.page.lock().await;
            let mut controls = self.controls.lock().await;

            let control = page
                .document_mut()
                .find_by_id_mut(control_id)
                .filter(|e| e.has_class(MARK_CONTROL_CLASS))
                .ok_or_else(|| AttendanceError::UnknownControl(control_id.to_string()))?;

            if controls.get(control_id).is_some_and(|c| c.state != ControlState::Idle) {
                return Err(AttendanceError::ControlBusy(control_id.to_string()));
            }

            let record = read_record(control, control_id, date)?;
            let original_label = control.children().to_vec();
            control.set_children(vec![Element::new("span").with_class("loading").into()]);
            control.disabled = true;
            controls.insert(
                control_id.to_string(),
                ControlEntry {
                    state: ControlState::Busy,
                    original_label,
                },
            );
            record
        };

        // Settles on its own task; dropping this future leaves it running
        let pending = PendingMark {
            control_id: control_id.to_string(),
            record,
            page: self.page.clone(),
            controls: self.controls.clone(),
            submitter: self.submitter.clone(),
            signal: self.signal.clone(),
            delay: self.submit_delay,
        };
        tokio::spawn(pending.settle()).await?
    }

    /// Check exactly the student checkboxes whose value is in `student_ids`
    pub async fn select_students(&self, student_ids: &[String]) -> usize {
        let wanted: HashSet<&str> = student_ids.iter().map(String::as_str).collect();
        let mut checked = 0;
        self.page.lock().await.document_mut().visit_mut(&mut |e| {
            if !e.has_class(STUDENT_CHECKBOX_CLASS) {
                return;
            }
            if e.attr("value").is_some_and(|v| wanted.contains(v)) {
                e.set_attr("checked", "checked");
                checked += 1;
            } else {
                e.remove_attr("checked");
            }
        });
        checked
    }

    /// Apply the chosen bulk action to every checked student, one after another
    pub async fn handle_bulk_action(&self, action: &str) -> Result<BulkOutcome, AttendanceError> {
        let selected: Vec<(String, Option<String>)> = {
            let page = self.page.lock().await;
            page.document()
                .find_all(&|e| e.has_class(STUDENT_CHECKBOX_CLASS) && e.has_attr("checked"))
                .iter()
                .filter_map(|e| {
                    let student = e.attr("value")?.to_string();
                    Some((student, e.attr("data-course-id").map(str::to_string)))
                })
                .collect()
        };

        if selected.is_empty() {
            self.page
                .lock()
                .await
                .notify("Please select at least one student", Level::Warning);
            return Err(AttendanceError::NoSelection);
        }

        let Some(status) = bulk_status(action) else {
            tracing::debug!("Ignoring bulk action {:?}", action);
            return Ok(BulkOutcome::default());
        };

        let date = self.current_date().await;
        let mut records = Vec::with_capacity(selected.len());
        for (student_id, course_id) in selected {
            let Some(course_id) = course_id.or_else(|| self.default_course.clone()) else {
                return Err(AttendanceError::MissingAttribute {
                    element: format!("checkbox for student {}", student_id),
                    attribute: "data-course-id",
                });
            };
            records.push(AttendanceRecord::new(student_id, course_id, status, date));
        }

        let mut outcome = BulkOutcome {
            status: Some(status),
            ..Default::default()
        };
        for record in &records {
            match self.api.mark_attendance(record).await {
                Ok(_) => outcome.succeeded.push(record.student_id.clone()),
                Err(e) => {
                    tracing::warn!("Bulk mark failed for student {}: {}", record.student_id, e);
                    outcome.failed.push(BulkFailure {
                        student_id: record.student_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let total = outcome.attempted();
        let (message, level) = if outcome.failed.is_empty() {
            (format!("Attendance marked for {} students", total), Level::Success)
        } else if !outcome.succeeded.is_empty() {
            (
                format!(
                    "Attendance marked for {} of {} students",
                    outcome.succeeded.len(),
                    total
                ),
                Level::Warning,
            )
        } else {
            (
                format!("Error marking attendance for {} students", total),
                Level::Danger,
            )
        };
        self.page.lock().await.notify(message, level);

        if !outcome.succeeded.is_empty() {
            if let Some(signal) = &self.signal {
                signal.dispatch();
            }
        }
        Ok(outcome)
    }
}

/// A Busy control waiting for its submission to come back
struct PendingMark {
    control_id: String,
    record: AttendanceRecord,
    page: SharedPage,
    controls: Controls,
    submitter: Arc<dyn AttendanceSubmitter>,
    signal: Option<UpdateSignal>,
    delay: Duration,
}

impl PendingMark {
    async fn settle(self) -> Result<ControlState, AttendanceError> {
        let Self {
            control_id,
            record,
            page,
            controls,
            submitter,
            signal,
            delay,
        } = self;

        tokio::time::sleep(delay).await;
        let result = submitter.submit(&record).await;

        let mut page = page.lock().await;
        let mut controls = controls.lock().await;
        let original_label = controls
            .remove(&control_id)
            .map(|c| c.original_label)
            .unwrap_or_default();
        let control = page.document_mut().find_by_id_mut(&control_id);
        if control.is_none() {
            tracing::warn!("Control {} disappeared during submission", control_id);
        }

        match result {
            Ok(_) => {
                if let Some(control) = control {
                    control.set_children(vec![Node::text(SUCCESS_GLYPH)]);
                    control.remove_class("btn-outline-primary");
                    control.add_class("btn-success");
                }
                controls.insert(
                    control_id,
                    ControlEntry {
                        state: ControlState::Success,
                        original_label,
                    },
                );
                page.notify("Attendance marked successfully!", Level::Success);
                drop(controls);
                drop(page);

                tracing::info!(
                    "Marked student {} {} for course {} on {}",
                    record.student_id,
                    record.status.text(),
                    record.course_id,
                    record.date
                );
                if let Some(signal) = &signal {
                    signal.dispatch();
                }
                Ok(ControlState::Success)
            }
            Err(e) => {
                tracing::error!("Error marking attendance via {}: {}", control_id, e);
                if let Some(control) = control {
                    control.set_children(original_label);
                    control.disabled = false;
                }
                page.notify("Error marking attendance!", Level::Danger);
                Err(e.into())
            }
        }
    }
}

fn read_record(
    control: &Element,
    control_id: &str,
    date: NaiveDate,
) -> Result<AttendanceRecord, AttendanceError> {
    let attr = |attribute: &'static str| {
        control
            .attr(attribute)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AttendanceError::MissingAttribute {
                element: control_id.to_string(),
                attribute,
            })
    };

    let student_id = attr("data-student-id")?;
    let course_id = attr("data-course-id")?;
    let code = attr("data-status")?;
    let status = AttendanceStatus::from_code(code)
        .ok_or_else(|| AttendanceError::InvalidStatus(code.to_string()))?;

    Ok(AttendanceRecord::new(student_id, course_id, status, date))
}
