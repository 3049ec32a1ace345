// Page session: the document plus transient notification banners
use crate::presentation::dom::{Element, Node};
use maud::{html, DOCTYPE};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub type SharedPage = Arc<Mutex<Page>>;

const CSRF_FIELD: &str = "csrfmiddlewaretoken";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Danger,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: Level,
    pub shown_at: Instant,
}

impl Notification {
    /// Dismissible alert banner
    pub fn to_element(&self) -> Element {
        Element::new("div")
            .with_class(&format!(
                "alert alert-{} alert-dismissible fade show",
                self.level.as_str()
            ))
            .with_attr("role", "alert")
            .with_text(self.message.clone())
            .with_child(
                Element::new("button")
                    .with_class("btn-close")
                    .with_attr("type", "button")
                    .with_attr("data-bs-dismiss", "alert"),
            )
    }
}

#[derive(Debug)]
pub struct Page {
    document: Element,
    notifications: Vec<Notification>,
    notification_lifetime: Duration,
    search_bindings: HashMap<String, String>,
}

impl Page {
    pub fn new(document: Element, notification_lifetime: Duration) -> Self {
        Self {
            document,
            notifications: Vec::new(),
            notification_lifetime,
            search_bindings: HashMap::new(),
        }
    }

    pub fn into_shared(self) -> SharedPage {
        Arc::new(Mutex::new(self))
    }

    pub fn document(&self) -> &Element {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Element {
        &mut self.document
    }

    /// Anti-forgery token from the hidden form field, if the page carries one
    pub fn csrf_token(&self) -> Option<String> {
        self.document
            .find(&|e| e.tag == "input" && e.attr("name") == Some(CSRF_FIELD))
            .and_then(|e| e.attr("value"))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Replace a container's content wholesale. Returns false if the page has no such container.
    pub fn reconcile(&mut self, container_id: &str, nodes: Vec<Node>) -> bool {
        match self.document.find_by_id_mut(container_id) {
            Some(container) => {
                container.set_children(nodes);
                true
            }
            None => false,
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, level: Level) {
        let notification = Notification {
            message: message.into(),
            level,
            shown_at: Instant::now(),
        };
        tracing::debug!("{} notification: {}", level.as_str(), notification.message);
        self.notifications.insert(0, notification);
    }

    /// Newest first
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drop banners older than the configured lifetime
    pub fn prune_notifications(&mut self, now: Instant) -> usize {
        let lifetime = self.notification_lifetime;
        let before = self.notifications.len();
        self.notifications
            .retain(|n| now.saturating_duration_since(n.shown_at) < lifetime);
        before - self.notifications.len()
    }

    pub fn bind_search(&mut self, search_id: &str, table_id: &str) {
        self.search_bindings
            .insert(search_id.to_string(), table_id.to_string());
    }

    pub fn bound_table(&self, search_id: &str) -> Option<&str> {
        self.search_bindings.get(search_id).map(String::as_str)
    }

    /// Full markup with live notifications prepended into the main content container
    pub fn render_html(&self) -> String {
        let mut document = self.document.clone();
        let banners: Vec<Node> = self
            .notifications
            .iter()
            .map(|n| n.to_element().into())
            .collect();

        let prepend = |container: &mut Element| {
            for banner in banners.into_iter().rev() {
                container.prepend_child(banner);
            }
        };
        match document.find_mut(&|e| e.has_class("container") && e.has_class("mt-4")) {
            Some(container) => prepend(container),
            None => prepend(&mut document),
        }

        html! { (DOCTYPE) (document) }.into_string()
    }
}
