// Page-wide affordances that do not depend on attendance data
use crate::infrastructure::config::UiSettings;
use crate::presentation::dom::{Element, Node};
use crate::presentation::page::{Page, SharedPage};
use crate::presentation::render::{ATTENDANCE_SEARCH, ATTENDANCE_TABLE, AUTO_DISMISS_ATTR, CLOCK};
use chrono::{Local, NaiveDateTime};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const ORIGINAL_TITLE_ATTR: &str = "data-bs-original-title";

/// Background tasks started for a page; dropping this does not stop them
pub struct BootstrapHandles {
    pub clock: JoinHandle<()>,
    pub alerts: JoinHandle<()>,
}

impl BootstrapHandles {
    pub fn abort(&self) {
        self.clock.abort();
        self.alerts.abort();
    }
}

/// Run every one-off initialization and start the timers
pub async fn start(page: SharedPage, ui: &UiSettings) -> BootstrapHandles {
    {
        let mut page = page.lock().await;
        let tooltips = activate_tooltips(page.document_mut());
        let alerts = mark_alerts_for_dismissal(page.document_mut());
        let searchable = bind_table_search(&mut page, ATTENDANCE_TABLE, ATTENDANCE_SEARCH);
        tracing::debug!(
            "Page bootstrap: {} tooltips, {} alerts, table search {}",
            tooltips,
            alerts,
            if searchable { "bound" } else { "absent" }
        );
    }

    let alerts = tokio::spawn(dismiss_alerts_after(page.clone(), ui.alert_dismiss()));
    let clock = tokio::spawn(run_clock(page, ui.clock_tick()));

    BootstrapHandles { clock, alerts }
}

/// Activate every `[data-bs-toggle=tooltip]` element. Already-active elements are left alone.
pub fn activate_tooltips(document: &mut Element) -> usize {
    let mut activated = 0;
    document.visit_mut(&mut |e| {
        if e.attr("data-bs-toggle") != Some("tooltip") || e.has_attr(ORIGINAL_TITLE_ATTR) {
            return;
        }
        let title = e.remove_attr("title").unwrap_or_default();
        e.set_attr(ORIGINAL_TITLE_ATTR, &title);
        activated += 1;
    });
    activated
}

/// Tag the alerts present right now; later alerts manage their own lifetime
pub fn mark_alerts_for_dismissal(document: &mut Element) -> usize {
    let mut marked = 0;
    document.visit_mut(&mut |e| {
        if e.has_class("alert") && !e.has_attr(AUTO_DISMISS_ATTR) {
            e.set_attr(AUTO_DISMISS_ATTR, "true");
            marked += 1;
        }
    });
    marked
}

pub fn dismiss_marked_alerts(document: &mut Element) -> usize {
    document.remove_where(&|e| e.attr(AUTO_DISMISS_ATTR) == Some("true"))
}

async fn dismiss_alerts_after(page: SharedPage, delay: Duration) {
    tokio::time::sleep(delay).await;
    let removed = dismiss_marked_alerts(page.lock().await.document_mut());
    tracing::debug!("Dismissed {} alert banners", removed);
}

/// Disable the form's submit button and swap in a spinner. Returns false if there is nothing to disable.
pub fn submit_form(document: &mut Element, form_id: &str) -> bool {
    let Some(form) = document.find_by_id_mut(form_id).filter(|e| e.tag == "form") else {
        return false;
    };
    let Some(button) = form.find_mut(&|e| e.tag == "button" && e.attr("type") == Some("submit"))
    else {
        return false;
    };

    button.set_children(vec![
        Element::new("span").with_class("loading").into(),
        Node::text(" Processing..."),
    ]);
    button.disabled = true;
    true
}

pub fn format_clock(now: NaiveDateTime) -> String {
    now.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

pub fn render_clock(document: &mut Element, now: NaiveDateTime) -> bool {
    match document.find_by_id_mut(CLOCK) {
        Some(clock) => {
            clock.set_children(vec![Node::text(format_clock(now))]);
            true
        }
        None => false,
    }
}

async fn run_clock(page: SharedPage, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    loop {
        interval.tick().await;
        let mut page = page.lock().await;
        render_clock(page.document_mut(), Local::now().naive_local());
        page.prune_notifications(Instant::now());
    }
}

/// Pair a table with its search input. Returns false unless both exist on the page.
pub fn bind_table_search(page: &mut Page, table_id: &str, search_id: &str) -> bool {
    let document = page.document();
    if document.find_by_id(table_id).is_none() || document.find_by_id(search_id).is_none() {
        return false;
    }
    page.bind_search(search_id, table_id);
    true
}

/// Hide every body row with no cell containing `query` (case-insensitive).
/// The first row is the header and is never touched. Returns the number of visible rows.
pub fn filter_table(document: &mut Element, table_id: &str, query: &str) -> Option<usize> {
    let table = document.find_by_id_mut(table_id)?;
    let needle = query.to_lowercase();
    let mut index = 0;
    let mut visible = 0;

    table.visit_mut(&mut |row| {
        if row.tag != "tr" {
            return;
        }
        if index > 0 {
            let found = needle.is_empty()
                || row
                    .child_elements()
                    .filter(|cell| cell.tag == "td")
                    .any(|cell| cell.text_content().to_lowercase().contains(&needle));
            row.hidden = !found;
            if found {
                visible += 1;
            }
        }
        index += 1;
    });

    Some(visible)
}

/// Type into a bound search input and re-filter its table
pub fn type_search(page: &mut Page, search_id: &str, query: &str) -> Option<usize> {
    let table_id = page.bound_table(search_id)?.to_string();
    let document = page.document_mut();
    document.find_by_id_mut(search_id)?.set_attr("value", query);
    filter_table(document, &table_id, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::render::{dashboard_page, today_class_cards, TODAY_CLASSES};
    use chrono::NaiveDate;

    fn table(names: &[&str]) -> Element {
        let mut rows: Vec<Node> = vec![Element::new("tr")
            .with_child(Element::new("th").with_text("Name"))
            .with_child(Element::new("th").with_text("Course"))
            .into()];
        rows.extend(names.iter().map(|name| {
            Node::from(
                Element::new("tr")
                    .with_child(Element::new("td").with_text(*name))
                    .with_child(Element::new("td").with_text("Databases")),
            )
        }));
        Element::new("body")
            .with_child(Element::new("input").with_id("search"))
            .with_child(Element::new("table").with_id("people").with_children(rows))
    }

    fn hidden_rows(document: &Element) -> Vec<String> {
        document
            .find_all(&|e| e.tag == "tr" && e.hidden)
            .iter()
            .map(|r| r.text_content())
            .collect()
    }

    #[test]
    fn test_filter_is_case_insensitive_and_restorable() {
        let mut document = table(&["Ada SMITH", "Alan Turing", "John Smithson"]);

        assert_eq!(filter_table(&mut document, "people", "smith"), Some(2));
        assert_eq!(hidden_rows(&document), vec!["Alan TuringDatabases"]);

        assert_eq!(filter_table(&mut document, "people", ""), Some(3));
        assert!(hidden_rows(&document).is_empty());

        // Rows are hidden, never removed
        filter_table(&mut document, "people", "zzz");
        assert_eq!(document.find_all(&|e| e.tag == "tr").len(), 4);
        assert_eq!(filter_table(&mut document, "missing", "x"), None);
    }

    #[test]
    fn test_type_search_uses_binding() {
        let mut page = Page::new(table(&["Ada Smith", "Alan Turing"]), Duration::from_secs(5));
        assert_eq!(type_search(&mut page, "search", "turing"), None);

        assert!(bind_table_search(&mut page, "people", "search"));
        assert!(!bind_table_search(&mut page, "people", "nope"));
        assert_eq!(type_search(&mut page, "search", "TURING"), Some(1));
        assert_eq!(
            page.document().find_by_id("search").unwrap().attr("value"),
            Some("TURING")
        );
    }

    #[test]
    fn test_tooltips_activate_once() {
        let mut document = Element::new("div")
            .with_child(
                Element::new("button")
                    .with_attr("data-bs-toggle", "tooltip")
                    .with_attr("title", "Mark Present"),
            )
            .with_child(Element::new("button").with_attr("title", "plain"));

        assert_eq!(activate_tooltips(&mut document), 1);
        assert_eq!(activate_tooltips(&mut document), 0);

        let active = document.find(&|e| e.has_attr(ORIGINAL_TITLE_ATTR)).unwrap();
        assert_eq!(active.attr(ORIGINAL_TITLE_ATTR), Some("Mark Present"));
        assert_eq!(active.attr("title"), None);
    }

    #[test]
    fn test_alerts_marked_then_dismissed() {
        let mut document = Element::new("div")
            .with_child(Element::new("div").with_class("alert alert-info"))
            .with_child(Element::new("div").with_class("card"));

        assert_eq!(mark_alerts_for_dismissal(&mut document), 1);
        document = document.with_child(Element::new("div").with_class("alert alert-danger"));

        assert_eq!(dismiss_marked_alerts(&mut document), 1);
        assert_eq!(document.find_all(&|e| e.has_class("alert")).len(), 1);
    }

    #[test]
    fn test_submit_form_spins_and_disables() {
        let mut document = Element::new("body").with_child(
            Element::new("form").with_id("login").with_child(
                Element::new("button")
                    .with_attr("type", "submit")
                    .with_text("Save"),
            ),
        );

        assert!(submit_form(&mut document, "login"));
        let button = document.find(&|e| e.tag == "button").unwrap();
        assert!(button.disabled);
        assert_eq!(button.text_content(), " Processing...");
        assert!(button.find(&|e| e.has_class("loading")).is_some());

        assert!(!submit_form(&mut document, "missing"));
    }

    #[test]
    fn test_clock_format() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap();
        assert_eq!(format_clock(now), "3/5/2024, 2:05:09 PM");

        let mut document = dashboard_page(None);
        assert!(render_clock(&mut document, now));
        assert_eq!(
            document.find_by_id(CLOCK).unwrap().text_content(),
            "3/5/2024, 2:05:09 PM"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_binds_search_and_dismisses_alerts() {
        let document = dashboard_page(None)
            .with_child(Element::new("div").with_class("alert alert-success").with_text("Welcome"));
        let page = Page::new(document, Duration::from_secs(5)).into_shared();
        let ui = UiSettings::default();

        let handles = start(page.clone(), &ui).await;
        assert_eq!(
            page.lock().await.bound_table(ATTENDANCE_SEARCH),
            Some(ATTENDANCE_TABLE)
        );

        tokio::time::sleep(ui.alert_dismiss() + Duration::from_millis(10)).await;
        let guard = page.lock().await;
        assert!(guard.document().find(&|e| e.has_class("alert")).is_none());
        assert!(!guard.document().find_by_id(CLOCK).unwrap().text_content().is_empty());
        drop(guard);
        handles.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_schedule_notice_outlives_dismissal() {
        let mut page = Page::new(dashboard_page(None), Duration::from_secs(5));
        page.reconcile(TODAY_CLASSES, today_class_cards(&[]));
        let page = page.into_shared();
        let ui = UiSettings::default();

        let handles = start(page.clone(), &ui).await;
        tokio::time::sleep(ui.alert_dismiss() * 2).await;

        let guard = page.lock().await;
        let classes = guard.document().find_by_id(TODAY_CLASSES).unwrap();
        assert_eq!(classes.text_content(), "No classes scheduled for today");
        drop(guard);
        handles.abort();
    }
}
