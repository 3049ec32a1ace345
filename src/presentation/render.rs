// Pure renderers: snapshot in, view tree out
use crate::domain::attendance::{status_color, status_text, AttendanceStatus};
use crate::domain::dashboard::{ActivityEntry, ClassSession, DashboardStats};
use crate::domain::student::StudentEntry;
use crate::presentation::dom::{Element, Node};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

pub const STATS_CONTAINER: &str = "statsContainer";
pub const RECENT_ACTIVITY: &str = "recentActivity";
pub const TODAY_CLASSES: &str = "todayClasses";
pub const DISTRIBUTION_CANVAS: &str = "attendanceChart";
pub const TREND_CANVAS: &str = "attendanceTrendChart";
pub const CLOCK: &str = "real-time-clock";
pub const ATTENDANCE_TABLE: &str = "attendanceTable";
pub const ATTENDANCE_ROWS: &str = "attendanceRows";
pub const ATTENDANCE_SEARCH: &str = "searchAttendance";
pub const BULK_ACTION: &str = "bulk-action";
pub const ATTENDANCE_DATE: &str = "attendance-date";

pub const MARK_CONTROL_CLASS: &str = "mark-attendance";
pub const STUDENT_CHECKBOX_CLASS: &str = "student-checkbox";
/// `"true"` removes the alert a few seconds after page load. `"false"` keeps it.
pub const AUTO_DISMISS_ATTR: &str = "data-auto-dismiss";

const ACTIVITY_COLUMNS: usize = 5;
const NOT_AVAILABLE: &str = "N/A";

struct StatCard {
    title: &'static str,
    value: String,
    color: &'static str,
    icon: &'static str,
}

pub fn stats_cards(stats: &DashboardStats) -> Vec<Node> {
    let cards = [
        StatCard {
            title: "Total Classes",
            value: stats.total_classes().to_string(),
            color: "primary",
            icon: "fa-calendar-alt",
        },
        StatCard {
            title: "Present",
            value: stats.present().to_string(),
            color: "success",
            icon: "fa-check-circle",
        },
        StatCard {
            title: "Attendance %",
            value: format!("{}%", stats.attendance_percentage()),
            color: "warning",
            icon: "fa-chart-line",
        },
        StatCard {
            title: "Today's Classes",
            value: stats.classes_today().to_string(),
            color: "info",
            icon: "fa-book",
        },
    ];

    cards.into_iter().map(|card| stat_card(card).into()).collect()
}

fn stat_card(card: StatCard) -> Element {
    let figure = Element::new("div")
        .with_child(Element::new("h6").with_class("card-title").with_text(card.title))
        .with_child(
            Element::new("h3")
                .with_class(&format!("text-{}", card.color))
                .with_text(card.value),
        );
    let icon = Element::new("div").with_class("align-self-center").with_child(
        Element::new("i").with_class(&format!("fas {} fa-2x text-{}", card.icon, card.color)),
    );

    Element::new("div").with_class("col-md-3").with_child(
        Element::new("div")
            .with_class(&format!("card dashboard-card card-{}", card.color))
            .with_child(
                Element::new("div").with_class("card-body").with_child(
                    Element::new("div")
                        .with_class("d-flex justify-content-between")
                        .with_child(figure)
                        .with_child(icon),
                ),
            ),
    )
}

pub fn status_badge(code: &str) -> Element {
    Element::new("span")
        .with_class(&format!("badge bg-{}", status_color(code)))
        .with_text(status_text(code))
}

pub fn recent_activity_rows(activities: &[ActivityEntry]) -> Vec<Node> {
    if activities.is_empty() {
        let empty = Element::new("tr").with_child(
            Element::new("td")
                .with_attr("colspan", &ACTIVITY_COLUMNS.to_string())
                .with_class("text-center text-muted")
                .with_text("No recent activity found"),
        );
        return vec![empty.into()];
    }

    activities
        .iter()
        .map(|activity| {
            let cell = |text: String| Node::from(Element::new("td").with_text(text));
            Element::new("tr")
                .with_children(vec![
                    cell(or_not_available(activity.date.as_deref())),
                    cell(or_not_available(activity.student_name.as_deref())),
                    cell(or_not_available(activity.course_name.as_deref())),
                    Element::new("td")
                        .with_child(status_badge(activity.status.as_deref().unwrap_or_default()))
                        .into(),
                    cell(
                        activity
                            .timestamp
                            .as_deref()
                            .map(|ts| format_time_of_day(ts, &Local))
                            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                    ),
                ])
                .into()
        })
        .collect()
}

pub fn today_class_cards(classes: &[ClassSession]) -> Vec<Node> {
    if classes.is_empty() {
        let empty = Element::new("div").with_class("col-12").with_child(
            Element::new("div")
                .with_class("alert alert-info")
                .with_attr(AUTO_DISMISS_ATTR, "false")
                .with_text("No classes scheduled for today"),
        );
        return vec![empty.into()];
    }

    classes
        .iter()
        .map(|class| {
            let line = |icon: &str, text: String, extra: &str| {
                Node::from(
                    Element::new("p")
                        .with_class(&format!("card-text {}", extra))
                        .with_child(Element::new("i").with_class(&format!("fas {} me-2", icon)))
                        .with_text(text),
                )
            };
            let hours = format!(
                "{} - {}",
                or_not_available(class.start_time.as_deref()),
                or_not_available(class.end_time.as_deref())
            );

            Element::new("div")
                .with_class("col-md-6")
                .with_child(
                    Element::new("div").with_class("card mb-3").with_child(
                        Element::new("div").with_class("card-body").with_children(vec![
                            Element::new("h6")
                                .with_class("card-title")
                                .with_text(or_not_available(class.course_name.as_deref()))
                                .into(),
                            line("fa-clock", hours, "mb-1"),
                            line(
                                "fa-user",
                                or_not_available(class.teacher_name.as_deref()),
                                "mb-1",
                            ),
                            line(
                                "fa-door-open",
                                class
                                    .room
                                    .as_deref()
                                    .filter(|r| !r.is_empty())
                                    .unwrap_or("Room TBA")
                                    .to_string(),
                                "",
                            ),
                        ]),
                    ),
                )
                .into()
        })
        .collect()
}

/// Rows of the attendance sheet: selection checkbox, name, one mark control per status
pub fn attendance_sheet_rows(students: &[StudentEntry], course_id: &str) -> Vec<Node> {
    students
        .iter()
        .map(|student| {
            let controls = AttendanceStatus::ALL.iter().map(|status| {
                Node::from(
                    Element::new("button")
                        .with_id(&format!("mark-{}-{}", student.id, status.code()))
                        .with_class(&format!(
                            "btn btn-sm btn-outline-primary {}",
                            MARK_CONTROL_CLASS
                        ))
                        .with_attr("type", "button")
                        .with_attr("data-student-id", &student.id)
                        .with_attr("data-course-id", course_id)
                        .with_attr("data-status", status.code())
                        .with_attr("data-bs-toggle", "tooltip")
                        .with_attr("title", &format!("Mark {}", status.text()))
                        .with_text(status.text()),
                )
            });

            Element::new("tr")
                .with_child(
                    Element::new("td").with_child(
                        Element::new("input")
                            .with_class(&format!("form-check-input {}", STUDENT_CHECKBOX_CLASS))
                            .with_attr("type", "checkbox")
                            .with_attr("value", &student.id)
                            .with_attr("data-course-id", course_id),
                    ),
                )
                .with_child(Element::new("td").with_text(student.name.clone()))
                .with_child(Element::new("td").with_children(controls.collect()))
                .into()
        })
        .collect()
}

/// Skeleton of the dashboard/attendance page with every container the controllers fill
pub fn dashboard_page(csrf_token: Option<&str>) -> Element {
    let mut content = Element::new("div").with_class("container mt-4").with_child(
        Element::new("div")
            .with_class("d-flex justify-content-between align-items-center mb-3")
            .with_child(Element::new("h2").with_text("Attendance Dashboard"))
            .with_child(Element::new("span").with_id(CLOCK).with_class("text-muted")),
    );

    if let Some(token) = csrf_token {
        content = content.with_child(
            Element::new("input")
                .with_attr("type", "hidden")
                .with_attr("name", "csrfmiddlewaretoken")
                .with_attr("value", token),
        );
    }

    let header = |columns: &[&str]| {
        Element::new("thead").with_child(
            Element::new("tr").with_children(
                columns
                    .iter()
                    .map(|c| Element::new("th").with_text(*c).into())
                    .collect(),
            ),
        )
    };

    let bulk_options = [
        ("", "Bulk action..."),
        ("mark-present", "Mark Present"),
        ("mark-absent", "Mark Absent"),
        ("mark-late", "Mark Late"),
        ("mark-excused", "Mark Excused"),
    ];

    let content = content
        .with_child(Element::new("div").with_id(STATS_CONTAINER).with_class("row mb-4"))
        .with_child(
            Element::new("div")
                .with_class("row mb-4")
                .with_child(
                    Element::new("div")
                        .with_class("col-md-6")
                        .with_child(Element::new("canvas").with_id(DISTRIBUTION_CANVAS)),
                )
                .with_child(
                    Element::new("div")
                        .with_class("col-md-6")
                        .with_child(Element::new("canvas").with_id(TREND_CANVAS)),
                ),
        )
        .with_child(
            Element::new("table")
                .with_class("table table-hover")
                .with_child(header(&["Date", "Student", "Course", "Status", "Time"]))
                .with_child(Element::new("tbody").with_id(RECENT_ACTIVITY)),
        )
        .with_child(Element::new("div").with_id(TODAY_CLASSES).with_class("row mb-4"))
        .with_child(
            Element::new("div")
                .with_class("d-flex gap-2 mb-2")
                .with_child(
                    Element::new("input")
                        .with_id(ATTENDANCE_SEARCH)
                        .with_class("form-control")
                        .with_attr("type", "text")
                        .with_attr("placeholder", "Search attendance..."),
                )
                .with_child(
                    Element::new("input")
                        .with_id(ATTENDANCE_DATE)
                        .with_class("form-control")
                        .with_attr("type", "date"),
                )
                .with_child(
                    Element::new("select")
                        .with_id(BULK_ACTION)
                        .with_class("form-select")
                        .with_children(
                            bulk_options
                                .iter()
                                .map(|(value, label)| {
                                    Element::new("option")
                                        .with_attr("value", value)
                                        .with_text(*label)
                                        .into()
                                })
                                .collect(),
                        ),
                ),
        )
        .with_child(
            Element::new("table")
                .with_id(ATTENDANCE_TABLE)
                .with_class("table")
                .with_child(header(&["Select", "Student", "Mark"]))
                .with_child(Element::new("tbody").with_id(ATTENDANCE_ROWS)),
        );

    Element::new("body").with_child(content)
}

fn or_not_available(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// Wall-clock time of a backend timestamp in the given zone, e.g. "2:05:09 PM".
/// Naive timestamps are taken as already local; anything unparseable is shown as sent.
pub fn format_time_of_day<Tz: TimeZone>(timestamp: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    const FORMAT: &str = "%-I:%M:%S %p";

    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return parsed.with_timezone(tz).format(FORMAT).to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format(FORMAT).to_string();
    }
    timestamp.to_string()
}
