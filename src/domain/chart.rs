// Chart domain models bound to dashboard snapshots
use super::attendance::AttendanceStatus;
use super::dashboard::DashboardSnapshot;
use serde::Serialize;
use serde_json::{json, Value};

const DISTRIBUTION_COLORS: [&str; 4] = ["#27ae60", "#e74c3c", "#f39c12", "#3498db"];
const TREND_COLOR: &str = "#3498db";
const TREND_POINTS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionChart {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
}

impl Default for DistributionChart {
    fn default() -> Self {
        Self {
            labels: AttendanceStatus::ALL
                .iter()
                .map(|s| s.text().to_string())
                .collect(),
            values: vec![0; 4],
        }
    }
}

impl DistributionChart {
    pub fn total(&self) -> i64 {
        self.values.iter().sum()
    }

    /// Tooltip text for one slice, e.g. "Present: 75 (75%)"
    pub fn tooltip_label(&self, index: usize) -> Option<String> {
        let label = self.labels.get(index)?;
        let value = *self.values.get(index)?;
        let total = self.total();
        let percentage = if total == 0 {
            0
        } else {
            (value as f64 / total as f64 * 100.0).round() as i64
        };
        Some(format!("{}: {} ({}%)", label, value, percentage))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendChart {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl TrendChart {
    pub const Y_MIN: f64 = 50.0;
    pub const Y_MAX: f64 = 100.0;
    pub const Y_STEP: f64 = 10.0;

    pub fn tick_label(value: f64) -> String {
        format!("{}%", value)
    }

    pub fn tooltip_label(value: f64) -> String {
        format!("Attendance: {}%", value)
    }

    /// Labels for each y-axis tick, bottom to top
    pub fn tick_labels() -> Vec<String> {
        let steps = ((Self::Y_MAX - Self::Y_MIN) / Self::Y_STEP) as usize;
        (0..=steps)
            .map(|i| Self::tick_label(Self::Y_MIN + i as f64 * Self::Y_STEP))
            .collect()
    }
}

/// Both dashboard charts. Updated in place from each snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartState {
    pub distribution: DistributionChart,
    pub trend: TrendChart,
}

impl ChartState {
    /// Bind snapshot data into the charts. Returns true if anything changed.
    /// Charts whose data is absent from the snapshot keep their last values.
    pub fn apply(&mut self, snapshot: &DashboardSnapshot) -> bool {
        let mut changed = false;

        if let Some(counts) = snapshot.stats.as_ref().and_then(|s| s.distribution()) {
            let values = counts.to_vec();
            if self.distribution.values != values {
                self.distribution.values = values;
                changed = true;
            }
        }

        if let Some(points) = snapshot.monthly_trend.as_ref() {
            let start = points.len().saturating_sub(TREND_POINTS);
            let recent = &points[start..];
            let trend = TrendChart {
                labels: recent.iter().map(|p| p.month.clone()).collect(),
                values: recent.iter().map(|p| p.percentage).collect(),
            };
            if self.trend != trend {
                self.trend = trend;
                changed = true;
            }
        }

        changed
    }

    /// Chart.js configuration for the distribution doughnut
    pub fn distribution_config(&self) -> Value {
        json!({
            "type": "doughnut",
            "data": {
                "labels": self.distribution.labels,
                "datasets": [{
                    "data": self.distribution.values,
                    "backgroundColor": DISTRIBUTION_COLORS,
                    "borderWidth": 2,
                    "borderColor": "#fff"
                }]
            },
            "options": {
                "responsive": true,
                "plugins": { "legend": { "position": "bottom" } }
            },
            "tooltips": (0..self.distribution.labels.len())
                .filter_map(|i| self.distribution.tooltip_label(i))
                .collect::<Vec<_>>()
        })
    }

    /// Chart.js configuration for the monthly trend line
    pub fn trend_config(&self) -> Value {
        json!({
            "type": "line",
            "data": {
                "labels": self.trend.labels,
                "datasets": [{
                    "label": "Attendance %",
                    "data": self.trend.values,
                    "borderColor": TREND_COLOR,
                    "backgroundColor": "rgba(52, 152, 219, 0.1)",
                    "tension": 0.4,
                    "fill": true,
                    "pointBackgroundColor": TREND_COLOR,
                    "pointBorderColor": "#fff",
                    "pointBorderWidth": 2,
                    "pointRadius": 5
                }]
            },
            "options": {
                "responsive": true,
                "scales": {
                    "y": {
                        "beginAtZero": false,
                        "min": TrendChart::Y_MIN,
                        "max": TrendChart::Y_MAX,
                        "ticks": {
                            "stepSize": TrendChart::Y_STEP,
                            "labels": TrendChart::tick_labels()
                        }
                    }
                }
            },
            "tooltips": self.trend.values.iter()
                .map(|v| TrendChart::tooltip_label(*v))
                .collect::<Vec<_>>()
        })
    }
}
