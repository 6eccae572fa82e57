//! Transient, auto-dismissing status message shared by every notifier.

use crate::config::TOAST_DURATION_MS;
use crate::platform::{NodeId, Platform, TimeoutHandle};
use log::{debug, warn};
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastState {
    Hidden,
    Shown,
}

pub struct Toast {
    platform: Platform,
    element: Option<NodeId>,
    visible_class: String,
    // Replacing the handle cancels the previous dismissal
    pending_hide: RefCell<Option<TimeoutHandle>>,
}

impl Toast {
    /// Look up the toast element by id. A missing element makes `show` a no-op.
    pub fn new(platform: Platform, toast_id: &str, visible_class: &str) -> Self {
        let element = platform.dom.element_by_id(toast_id);
        if element.is_none() {
            warn!("Toast element #{} not found; messages will not be shown", toast_id);
        }
        Self {
            platform,
            element,
            visible_class: visible_class.to_string(),
            pending_hide: RefCell::new(None),
        }
    }

    /// Show `message` and hide it again [`TOAST_DURATION_MS`] after the latest call.
    pub fn show(&self, message: &str) {
        let Some(element) = self.element else {
            debug!("Dropping toast message without element: {}", message);
            return;
        };
        let dom = &self.platform.dom;
        dom.set_text(element, message);
        dom.add_class(element, &self.visible_class);

        let hide_dom = dom.clone();
        let class = self.visible_class.clone();
        let handle = self.platform.scheduler.set_timeout(
            TOAST_DURATION_MS,
            Box::new(move || hide_dom.remove_class(element, &class)),
        );
        self.pending_hide.replace(Some(handle));
    }

    pub fn state(&self) -> ToastState {
        match self.element {
            Some(el) if self.platform.dom.has_class(el, &self.visible_class) => ToastState::Shown,
            _ => ToastState::Hidden,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.state() == ToastState::Shown
    }
}
