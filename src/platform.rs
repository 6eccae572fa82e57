//! Seams between the controllers and the browser.
//!
//! Controllers only talk to the page through these traits, so they can run
//! against the real DOM (`browser` module) or an in-memory fake in tests.

use futures::future::LocalBoxFuture;
use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Opaque handle to an element known to a [`Dom`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A form's action and field values captured at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    /// Resolved action URL of the form.
    pub action: String,
    /// Field name/value pairs in form order.
    pub fields: Vec<(String, String)>,
}

/// A request ready for [`Transport::post_form`]; the transport applies it as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Sent as the form data body.
    pub fields: Vec<(String, String)>,
}

/// Submit event handed to submit handlers.
#[derive(Debug)]
pub struct SubmitEvent {
    form: NodeId,
    default_prevented: Cell<bool>,
}

impl SubmitEvent {
    pub fn new(form: NodeId) -> Self {
        Self {
            form,
            default_prevented: Cell::new(false),
        }
    }

    pub fn form(&self) -> NodeId {
        self.form
    }

    /// Suppress the browser's own navigation for this submit.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// One visibility change reported by the viewport observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityEntry {
    pub target: NodeId,
    pub is_intersecting: bool,
    pub ratio: f64,
}

pub type SubmitHandler = Rc<dyn Fn(&SubmitEvent)>;
pub type VisibilityHandler = Rc<dyn Fn(&[VisibilityEntry])>;

pub trait Dom {
    /// All elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<NodeId>;
    /// Descendants of `root` matching `selector`, in document order.
    fn query_within(&self, root: NodeId, selector: &str) -> Vec<NodeId>;
    fn element_by_id(&self, id: &str) -> Option<NodeId>;
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn add_class(&self, node: NodeId, class: &str);
    fn remove_class(&self, node: NodeId, class: &str);
    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn set_text(&self, node: NodeId, text: &str);
    fn text(&self, node: NodeId) -> String;
    /// Snapshot of a form's action and current field values.
    fn capture_form(&self, form: NodeId) -> Option<FormSnapshot>;
    fn on_submit(&self, form: NodeId, handler: SubmitHandler);
    /// Report visibility changes of `targets` crossing `threshold` of their area.
    fn observe_visibility(&self, targets: &[NodeId], threshold: f64, handler: VisibilityHandler);
}

/// Keeps a scheduled timeout alive; dropping it cancels the timeout.
pub struct TimeoutHandle {
    _guard: Box<dyn Any>,
}

impl TimeoutHandle {
    pub fn new<G: Any>(guard: G) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }
}

impl fmt::Debug for TimeoutHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TimeoutHandle")
    }
}

pub trait Scheduler {
    /// Monotonic clock in milliseconds, on the same timeline as frame timestamps.
    fn now_ms(&self) -> f64;
    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimeoutHandle;
    /// Run `task` before the next repaint with the frame timestamp.
    fn request_frame(&self, task: Box<dyn FnOnce(f64)>);
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// The request never produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request failed before a response arrived: {}", self.message)
    }
}

impl std::error::Error for TransportError {}

pub trait Transport {
    /// Send `request` once; resolves to the HTTP status.
    fn post_form(
        &self,
        request: FormRequest,
    ) -> LocalBoxFuture<'static, Result<u16, TransportError>>;
}

/// Everything a controller needs from the outside world.
#[derive(Clone)]
pub struct Platform {
    pub dom: Rc<dyn Dom>,
    pub scheduler: Rc<dyn Scheduler>,
    pub transport: Rc<dyn Transport>,
}
