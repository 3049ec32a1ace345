// Dashboard domain model
use serde::Deserialize;

/// Aggregate payload behind the landing page. Replaced wholesale on every poll.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardSnapshot {
    #[serde(default)]
    pub stats: Option<DashboardStats>,
    #[serde(default)]
    pub recent_attendance: Option<Vec<ActivityEntry>>,
    #[serde(default)]
    pub recent_activity: Option<Vec<ActivityEntry>>,
    #[serde(default)]
    pub today_classes: Option<Vec<ClassSession>>,
    #[serde(default)]
    pub monthly_trend: Option<Vec<TrendPoint>>,
}

impl DashboardSnapshot {
    /// Activity rows to display. `recent_activity` takes precedence when both are sent.
    pub fn activity(&self) -> Option<&[ActivityEntry]> {
        self.recent_activity
            .as_deref()
            .or(self.recent_attendance.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardStats {
    pub total_classes: Option<i64>,
    pub present_classes: Option<i64>,
    pub absent_classes: Option<i64>,
    pub late_classes: Option<i64>,
    pub excused_classes: Option<i64>,
    pub today_attendance: Option<i64>,
    pub present_today: Option<i64>,
    pub absent_today: Option<i64>,
    pub attendance_percentage: Option<f64>,
    pub today_classes_count: Option<i64>,
    pub total_courses: Option<i64>,
}

impl DashboardStats {
    pub fn total_classes(&self) -> i64 {
        first_nonzero(&[self.total_classes])
    }

    pub fn present(&self) -> i64 {
        first_nonzero(&[self.present_classes, self.today_attendance])
    }

    pub fn attendance_percentage(&self) -> f64 {
        self.attendance_percentage.unwrap_or(0.0)
    }

    pub fn classes_today(&self) -> i64 {
        first_nonzero(&[self.today_classes_count, self.total_courses])
    }

    /// Present/absent/late/excused counts, when the payload carries any of them
    pub fn distribution(&self) -> Option<[i64; 4]> {
        let present = self.present_classes.or(self.present_today);
        let absent = self.absent_classes.or(self.absent_today);
        if present.is_none()
            && absent.is_none()
            && self.late_classes.is_none()
            && self.excused_classes.is_none()
        {
            return None;
        }

        Some([
            present.unwrap_or(0),
            absent.unwrap_or(0),
            self.late_classes.unwrap_or(0),
            self.excused_classes.unwrap_or(0),
        ])
    }
}

/// Zero counts fall through to the next candidate, then to 0
fn first_nonzero(candidates: &[Option<i64>]) -> i64 {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|v| *v != 0)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityEntry {
    pub date: Option<String>,
    pub student_name: Option<String>,
    pub course_name: Option<String>,
    pub status: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassSession {
    pub course_name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub teacher_name: Option<String>,
    pub room: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrendPoint {
    pub month: String,
    pub percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_tolerates_missing_fields() {
        let snapshot: DashboardSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.stats.is_none());
        assert!(snapshot.activity().is_none());
        assert!(snapshot.today_classes.is_none());
    }

    #[test]
    fn test_recent_activity_wins_over_recent_attendance() {
        let snapshot: DashboardSnapshot = serde_json::from_value(serde_json::json!({
            "recent_attendance": [{"student_name": "Old"}],
            "recent_activity": [{"student_name": "New"}, {"student_name": "Newer"}]
        }))
        .unwrap();

        let activity = snapshot.activity().unwrap();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].student_name.as_deref(), Some("New"));
    }

    #[test]
    fn test_stats_fallback_chain() {
        let stats = DashboardStats {
            present_classes: Some(0),
            today_attendance: Some(12),
            total_courses: Some(3),
            ..Default::default()
        };

        assert_eq!(stats.present(), 12);
        assert_eq!(stats.classes_today(), 3);
        assert_eq!(stats.total_classes(), 0);
        assert_eq!(stats.attendance_percentage(), 0.0);
    }

    #[test]
    fn test_distribution_requires_some_count() {
        assert_eq!(DashboardStats::default().distribution(), None);

        let stats = DashboardStats {
            present_today: Some(40),
            absent_today: Some(5),
            ..Default::default()
        };
        assert_eq!(stats.distribution(), Some([40, 5, 0, 0]));
    }
}
