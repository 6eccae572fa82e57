//! In-memory stand-ins for the browser used by the unit tests.

use crate::platform::{
    Dom, FormRequest, FormSnapshot, NodeId, Platform, Scheduler, SubmitEvent, SubmitHandler,
    TimeoutHandle, Transport, TransportError, VisibilityEntry, VisibilityHandler,
};
use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::{self, LocalBoxFuture};
use futures::task::LocalSpawnExt;
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Once;

/// Frame interval the fake scheduler simulates (~60 Hz).
pub const FRAME_MS: f64 = 16.0;

// ──────────────────────────────────────────────────────────────────────────────
// DOM

#[derive(Default)]
struct FakeElement {
    id: Option<String>,
    classes: Vec<String>,
    attrs: HashMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    fields: Vec<(String, String)>,
}

#[derive(Default)]
pub struct FakeDom {
    elements: RefCell<Vec<FakeElement>>,
    submit_handlers: RefCell<HashMap<NodeId, Vec<SubmitHandler>>>,
    observers: RefCell<Vec<(Vec<NodeId>, f64, VisibilityHandler)>>,
}

impl FakeDom {
    /// Append an element; an `id` attribute also becomes the element id.
    pub fn element(
        &self,
        parent: Option<NodeId>,
        classes: &[&str],
        attrs: &[(&str, &str)],
    ) -> NodeId {
        let mut elements = self.elements.borrow_mut();
        let mut el = FakeElement {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            parent,
            ..Default::default()
        };
        for (name, value) in attrs {
            if *name == "id" {
                el.id = Some(value.to_string());
            }
            el.attrs.insert(name.to_string(), value.to_string());
        }
        elements.push(el);
        NodeId(elements.len() - 1)
    }

    pub fn set_fields(&self, form: NodeId, fields: &[(&str, &str)]) {
        self.elements.borrow_mut()[form.0].fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
    }

    /// Dispatch a submit event; returns whether the browser would navigate.
    pub fn submit(&self, form: NodeId) -> bool {
        let handlers = self
            .submit_handlers
            .borrow()
            .get(&form)
            .cloned()
            .unwrap_or_default();
        let event = SubmitEvent::new(form);
        for handler in handlers {
            handler(&event);
        }
        !event.default_prevented()
    }

    /// Deliver `entries` to every observer watching their targets.
    pub fn report_visibility(&self, entries: &[VisibilityEntry]) {
        let observers: Vec<_> = self
            .observers
            .borrow()
            .iter()
            .map(|(targets, _, handler)| (targets.clone(), handler.clone()))
            .collect();
        for (targets, handler) in observers {
            let batch: Vec<_> = entries
                .iter()
                .copied()
                .filter(|e| targets.contains(&e.target))
                .collect();
            if !batch.is_empty() {
                handler(&batch);
            }
        }
    }

    pub fn enter(&self, slide: NodeId) {
        self.report_visibility(&[VisibilityEntry {
            target: slide,
            is_intersecting: true,
            ratio: 1.0,
        }]);
    }

    pub fn observer_thresholds(&self) -> Vec<f64> {
        self.observers.borrow().iter().map(|(_, t, _)| *t).collect()
    }

    fn matches(el: &FakeElement, selector: &str) -> bool {
        if let Some(class) = selector.strip_prefix('.') {
            el.classes.iter().any(|c| c == class)
        } else if let Some(id) = selector.strip_prefix('#') {
            el.id.as_deref() == Some(id)
        } else {
            false
        }
    }

    fn is_descendant(elements: &[FakeElement], node: usize, root: NodeId) -> bool {
        let mut cursor = elements[node].parent;
        while let Some(parent) = cursor {
            if parent == root {
                return true;
            }
            cursor = elements[parent.0].parent;
        }
        false
    }
}

impl Dom for FakeDom {
    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.elements
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, el)| Self::matches(el, selector))
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    fn query_within(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let elements = self.elements.borrow();
        (0..elements.len())
            .filter(|&i| {
                Self::matches(&elements[i], selector) && Self::is_descendant(&elements, i, root)
            })
            .map(NodeId)
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements
            .borrow()
            .iter()
            .position(|el| el.id.as_deref() == Some(id))
            .map(NodeId)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.elements.borrow()[node.0].attrs.get(name).cloned()
    }

    fn add_class(&self, node: NodeId, class: &str) {
        let mut elements = self.elements.borrow_mut();
        let classes = &mut elements[node.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        self.elements.borrow_mut()[node.0].classes.retain(|c| c != class);
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.elements.borrow()[node.0].classes.iter().any(|c| c == class)
    }

    fn set_text(&self, node: NodeId, text: &str) {
        self.elements.borrow_mut()[node.0].text = text.to_string();
    }

    fn text(&self, node: NodeId) -> String {
        self.elements.borrow()[node.0].text.clone()
    }

    fn capture_form(&self, form: NodeId) -> Option<FormSnapshot> {
        let elements = self.elements.borrow();
        let el = elements.get(form.0)?;
        Some(FormSnapshot {
            action: el.attrs.get("action").cloned().unwrap_or_default(),
            fields: el.fields.clone(),
        })
    }

    fn on_submit(&self, form: NodeId, handler: SubmitHandler) {
        self.submit_handlers
            .borrow_mut()
            .entry(form)
            .or_default()
            .push(handler);
    }

    fn observe_visibility(&self, targets: &[NodeId], threshold: f64, handler: VisibilityHandler) {
        self.observers
            .borrow_mut()
            .push((targets.to_vec(), threshold, handler));
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Scheduler

struct PendingTimeout {
    id: u64,
    due: f64,
    task: Box<dyn FnOnce()>,
    cancelled: Rc<Cell<bool>>,
}

struct CancelOnDrop(Rc<Cell<bool>>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

/// Virtual clock with manually advanced time, timeouts and animation frames.
pub struct FakeScheduler {
    now: Cell<f64>,
    next_id: Cell<u64>,
    timeouts: RefCell<Vec<PendingTimeout>>,
    frames: RefCell<Vec<Box<dyn FnOnce(f64)>>>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl Default for FakeScheduler {
    fn default() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            now: Cell::new(0.0),
            next_id: Cell::new(0),
            timeouts: RefCell::new(Vec::new()),
            frames: RefCell::new(Vec::new()),
            pool: RefCell::new(pool),
            spawner,
        }
    }
}

impl FakeScheduler {
    /// Drive spawned futures until none can make progress.
    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Move the clock forward, firing frames every [`FRAME_MS`] and any timeouts that fall due.
    pub fn advance(&self, delta_ms: f64) {
        let target = self.now.get() + delta_ms;
        loop {
            let step = FRAME_MS.min(target - self.now.get());
            self.now.set(self.now.get() + step.max(0.0));
            self.run_frames();
            self.run_due_timeouts();
            self.run_until_stalled();
            if self.now.get() >= target {
                break;
            }
        }
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn pending_timeouts(&self) -> usize {
        self.timeouts
            .borrow()
            .iter()
            .filter(|t| !t.cancelled.get())
            .count()
    }

    fn run_frames(&self) {
        let frames = std::mem::take(&mut *self.frames.borrow_mut());
        let ts = self.now.get();
        for frame in frames {
            frame(ts);
        }
    }

    fn run_due_timeouts(&self) {
        loop {
            let next = {
                let mut timeouts = self.timeouts.borrow_mut();
                timeouts.retain(|t| !t.cancelled.get());
                let now = self.now.get();
                let due = timeouts
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= now)
                    .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)))
                    .map(|(i, _)| i);
                due.map(|i| timeouts.remove(i))
            };
            match next {
                Some(timeout) => (timeout.task)(),
                None => break,
            }
        }
    }
}

impl Scheduler for FakeScheduler {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }

    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimeoutHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let cancelled = Rc::new(Cell::new(false));
        self.timeouts.borrow_mut().push(PendingTimeout {
            id,
            due: self.now.get() + f64::from(delay_ms),
            task,
            cancelled: cancelled.clone(),
        });
        TimeoutHandle::new(CancelOnDrop(cancelled))
    }

    fn request_frame(&self, task: Box<dyn FnOnce(f64)>) {
        self.frames.borrow_mut().push(task);
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.spawner
            .spawn_local(task)
            .expect("local pool is alive for the scheduler's lifetime");
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Transport

enum ScriptedResponse {
    Ready(Result<u16, TransportError>),
    Pending(oneshot::Receiver<Result<u16, TransportError>>),
}

/// Records requests and answers them from a script; unscripted requests get `200`.
#[derive(Default)]
pub struct FakeTransport {
    script: RefCell<VecDeque<ScriptedResponse>>,
    requests: RefCell<Vec<FormRequest>>,
}

impl FakeTransport {
    pub fn respond(&self, result: Result<u16, TransportError>) {
        self.script
            .borrow_mut()
            .push_back(ScriptedResponse::Ready(result));
    }

    /// Script a response that stays in flight until the returned sender fires.
    pub fn respond_later(&self) -> oneshot::Sender<Result<u16, TransportError>> {
        let (tx, rx) = oneshot::channel();
        self.script
            .borrow_mut()
            .push_back(ScriptedResponse::Pending(rx));
        tx
    }

    pub fn requests(&self) -> Vec<FormRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for FakeTransport {
    fn post_form(
        &self,
        request: FormRequest,
    ) -> LocalBoxFuture<'static, Result<u16, TransportError>> {
        self.requests.borrow_mut().push(request);
        match self.script.borrow_mut().pop_front() {
            Some(ScriptedResponse::Ready(result)) => future::ready(result).boxed_local(),
            Some(ScriptedResponse::Pending(rx)) => rx
                .map(|r| r.unwrap_or_else(|_| Err(TransportError::new("response dropped"))))
                .boxed_local(),
            None => future::ready(Ok(200)).boxed_local(),
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Harness

pub struct Harness {
    pub dom: Rc<FakeDom>,
    pub scheduler: Rc<FakeScheduler>,
    pub transport: Rc<FakeTransport>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            dom: Rc::new(FakeDom::default()),
            scheduler: Rc::new(FakeScheduler::default()),
            transport: Rc::new(FakeTransport::default()),
        }
    }

    pub fn platform(&self) -> Platform {
        Platform {
            dom: self.dom.clone(),
            scheduler: self.scheduler.clone(),
            transport: self.transport.clone(),
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Logging

thread_local! {
    static CAPTURED_LOGS: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        CAPTURED_LOGS.with(|logs| {
            logs.borrow_mut()
                .push((record.level(), record.args().to_string()));
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static LOGGER_INIT: Once = Once::new();

/// Route `log` records into a per-thread buffer readable with [`take_logs`].
pub fn capture_logs() {
    LOGGER_INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);
    });
    CAPTURED_LOGS.with(|logs| logs.borrow_mut().clear());
}

pub fn take_logs() -> Vec<(log::Level, String)> {
    CAPTURED_LOGS.with(|logs| std::mem::take(&mut *logs.borrow_mut()))
}
