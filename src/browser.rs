//! `web-sys` backed implementations of the platform traits.

use crate::platform::{
    Dom, FormRequest, FormSnapshot, NodeId, Platform, Scheduler, SubmitEvent, SubmitHandler,
    TimeoutHandle, Transport, TransportError, VisibilityEntry, VisibilityHandler,
};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use gloo_timers::callback::Timeout;
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Element, FormData, Headers, HtmlFormElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit, NodeList, Request, RequestInit, Response,
};

/// Property stamped on registered elements holding their [`NodeId`].
const NODE_KEY: &str = "__rlistNode";

/// Render a JS exception for logs.
fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

/// Turn a stamped index back into a [`NodeId`] if it can name one of `known` nodes.
fn node_from_stamp(stamp: Option<f64>, known: usize) -> Option<NodeId> {
    let index = stamp?;
    if index < 0.0 || index.fract() != 0.0 || index >= known as f64 {
        return None;
    }
    Some(NodeId(index as usize))
}

/// Keep string form entries; anything else (file inputs yield Blobs) is skipped.
fn text_entry(name: Option<String>, value: Option<String>) -> Option<(String, String)> {
    match (name, value) {
        (Some(name), Some(value)) => Some((name, value)),
        (Some(name), None) => {
            warn!("Skipping non-text form field {:?}", name);
            None
        }
        (None, _) => {
            warn!("Skipping form entry without a name");
            None
        }
    }
}

/// Id of an already registered `element`, found through its stamp.
fn lookup(nodes: &[Element], element: &Element) -> Option<NodeId> {
    let stamp = js_sys::Reflect::get(element, &JsValue::from_str(NODE_KEY))
        .ok()
        .and_then(|v| v.as_f64());
    let id = node_from_stamp(stamp, nodes.len())?;
    // another BrowserDom may have stamped the same element
    (nodes[id.0] == *element).then_some(id)
}

/// Maps live elements to stable [`NodeId`]s.
#[derive(Default)]
pub struct BrowserDom {
    nodes: Rc<RefCell<Vec<Element>>>,
}

impl BrowserDom {
    fn register(&self, element: Element) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(id) = lookup(&nodes, &element) {
            return id;
        }
        let id = NodeId(nodes.len());
        let key = JsValue::from_str(NODE_KEY);
        if let Err(e) = js_sys::Reflect::set(&element, &key, &JsValue::from_f64(id.0 as f64)) {
            warn!("Could not tag element {:?}: {}", id, describe(&e));
        }
        nodes.push(element);
        id
    }

    fn get(&self, node: NodeId) -> Option<Element> {
        self.nodes.borrow().get(node.0).cloned()
    }

    fn register_list(&self, list: Result<NodeList, JsValue>, selector: &str) -> Vec<NodeId> {
        let list = match list {
            Ok(list) => list,
            Err(e) => {
                warn!("querySelectorAll({}) failed: {}", selector, describe(&e));
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|el| self.register(el))
            .collect()
    }

    fn form_fields(form: &HtmlFormElement) -> Result<Vec<(String, String)>, JsValue> {
        let data = FormData::new_with_form(form)?;
        let mut fields = Vec::new();
        let Some(entries) = js_sys::try_iter(&data)? else {
            return Ok(fields);
        };
        for entry in entries {
            let pair = js_sys::Array::from(&entry?);
            fields.extend(text_entry(pair.get(0).as_string(), pair.get(1).as_string()));
        }
        Ok(fields)
    }
}

impl Dom for BrowserDom {
    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.register_list(gloo_utils::document().query_selector_all(selector), selector)
    }

    fn query_within(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        match self.get(root) {
            Some(root) => self.register_list(root.query_selector_all(selector), selector),
            None => Vec::new(),
        }
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        gloo_utils::document()
            .get_element_by_id(id)
            .map(|el| self.register(el))
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.get(node)?.get_attribute(name)
    }

    fn add_class(&self, node: NodeId, class: &str) {
        if let Some(el) = self.get(node) {
            if let Err(e) = el.class_list().add_1(class) {
                warn!("classList.add({}) failed: {}", class, describe(&e));
            }
        }
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        if let Some(el) = self.get(node) {
            if let Err(e) = el.class_list().remove_1(class) {
                warn!("classList.remove({}) failed: {}", class, describe(&e));
            }
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get(node)
            .map(|el| el.class_list().contains(class))
            .unwrap_or(false)
    }

    fn set_text(&self, node: NodeId, text: &str) {
        if let Some(el) = self.get(node) {
            el.set_text_content(Some(text));
        }
    }

    fn text(&self, node: NodeId) -> String {
        self.get(node)
            .and_then(|el| el.text_content())
            .unwrap_or_default()
    }

    fn capture_form(&self, form: NodeId) -> Option<FormSnapshot> {
        let form: HtmlFormElement = self.get(form)?.dyn_into().ok()?;
        match Self::form_fields(&form) {
            Ok(fields) => Some(FormSnapshot {
                action: form.action(),
                fields,
            }),
            Err(e) => {
                warn!("Reading form data failed: {}", describe(&e));
                None
            }
        }
    }

    fn on_submit(&self, form: NodeId, handler: SubmitHandler) {
        let Some(el) = self.get(form) else {
            return;
        };
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |e: web_sys::Event| {
            let event = SubmitEvent::new(form);
            handler(&event);
            if event.default_prevented() {
                e.prevent_default();
            }
        });
        let listener: &js_sys::Function = closure.as_ref().unchecked_ref();
        if let Err(e) = el.add_event_listener_with_callback("submit", listener) {
            warn!("Adding submit listener failed: {}", describe(&e));
        }
        // Listeners live as long as the page
        closure.forget();
    }

    fn observe_visibility(&self, targets: &[NodeId], threshold: f64, handler: VisibilityHandler) {
        let nodes = Rc::clone(&self.nodes);
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                let batch: Vec<VisibilityEntry> = entries
                    .iter()
                    .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                    .filter_map(|entry| {
                        let target = lookup(&nodes.borrow(), &entry.target())?;
                        Some(VisibilityEntry {
                            target,
                            is_intersecting: entry.is_intersecting(),
                            ratio: entry.intersection_ratio(),
                        })
                    })
                    .collect();
                handler(&batch);
            },
        );

        let options = IntersectionObserverInit::new();
        options.set_threshold(&JsValue::from_f64(threshold));
        let on_change: &js_sys::Function = callback.as_ref().unchecked_ref();
        let observer = match IntersectionObserver::new_with_options(on_change, &options) {
            Ok(observer) => observer,
            Err(e) => {
                warn!("IntersectionObserver unavailable: {}", describe(&e));
                return;
            }
        };
        for &target in targets {
            if let Some(el) = self.get(target) {
                observer.observe(&el);
            }
        }
        callback.forget();
    }
}

pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn now_ms(&self) -> f64 {
        gloo_utils::window()
            .performance()
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimeoutHandle {
        TimeoutHandle::new(Timeout::new(delay_ms, task))
    }

    fn request_frame(&self, task: Box<dyn FnOnce(f64)>) {
        let callback = Closure::once_into_js(move |ts: f64| task(ts));
        if let Err(e) = gloo_utils::window().request_animation_frame(callback.unchecked_ref()) {
            warn!("requestAnimationFrame failed: {}", describe(&e));
        }
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

pub struct FetchTransport;

impl FetchTransport {
    async fn post(request: FormRequest) -> Result<u16, JsValue> {
        let body = FormData::new()?;
        for (name, value) in &request.fields {
            body.append_with_str(name, value)?;
        }
        let headers = Headers::new()?;
        for (name, value) in &request.headers {
            headers.set(name, value)?;
        }

        let init = RequestInit::new();
        init.set_method(&request.method);
        init.set_body(&body);
        init.set_headers(&headers);
        let req = Request::new_with_str_and_init(&request.url, &init)?;

        let resp = JsFuture::from(gloo_utils::window().fetch_with_request(&req)).await?;
        let resp: Response = resp.dyn_into()?;
        Ok(resp.status())
    }
}

impl Transport for FetchTransport {
    fn post_form(
        &self,
        request: FormRequest,
    ) -> LocalBoxFuture<'static, Result<u16, TransportError>> {
        Self::post(request)
            .map(|res| res.map_err(|e| TransportError::new(describe(&e))))
            .boxed_local()
    }
}

pub fn platform() -> Platform {
    Platform {
        dom: Rc::new(BrowserDom::default()),
        scheduler: Rc::new(BrowserScheduler),
        transport: Rc::new(FetchTransport),
    }
}
