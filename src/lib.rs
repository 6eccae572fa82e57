//! Client-side behaviors for the movie list pages.
//!
//! Two independent controllers enhance server-rendered markup:
//! - [`notifier::ListAddNotifier`] posts "add to list" forms asynchronously
//!   and reports the outcome in a shared [`toast::Toast`].
//! - [`slideshow::SlideshowController`] tracks the slide in view, its
//!   indicator dot and the run-once count-ups inside it.
//!
//! Both talk to the browser only through [`platform::Platform`], so they run
//! unchanged against the fakes in the test suite.

use log::{info, warn, LevelFilter};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub mod browser;
pub mod config;
pub mod count_up;
pub mod logging;
pub mod notifier;
pub mod platform;
pub mod slideshow;
pub mod toast;
pub mod utils;

#[cfg(test)]
mod testing;

use config::UiConfig;
use notifier::ListAddNotifier;
use platform::Platform;
use slideshow::SlideshowController;
use toast::Toast;

/// Controllers wired to one page.
pub struct App {
    pub toast: Rc<Toast>,
    pub notifier: Rc<ListAddNotifier>,
    pub slideshow: Rc<SlideshowController>,
}

impl App {
    pub fn mount(platform: Platform, config: UiConfig) -> Self {
        let toast = Rc::new(Toast::new(
            platform.clone(),
            &config.toast_id,
            &config.toast_visible_class,
        ));
        let notifier = ListAddNotifier::new(platform.clone(), toast.clone());
        notifier.attach(&config.form_selector);

        let slideshow = SlideshowController::new(platform, config);
        slideshow.start();

        Self {
            toast,
            notifier,
            slideshow,
        }
    }
}

thread_local! {
    /// The mounted app; kept for the lifetime of the page so event handlers stay live.
    static MOUNTED: RefCell<Option<App>> = const { RefCell::new(None) };
}

fn mount_once(config: UiConfig) {
    MOUNTED.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            warn!("UI already mounted; ignoring second mount");
            return;
        }
        *slot = Some(App::mount(browser::platform(), config));
        info!("UI mounted");
    });
}

fn install_diagnostics() {
    console_error_panic_hook::set_once();
    logging::init(if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
}

/// `document.readyState` is `"loading"` until the markup has been parsed.
fn still_loading(ready_state: &str) -> bool {
    ready_state == "loading"
}

/// Mount once the document has been parsed.
pub fn boot_when_ready(config: UiConfig) {
    install_diagnostics();
    let document = gloo_utils::document();
    if !still_loading(&document.ready_state()) {
        mount_once(config);
        return;
    }
    let on_ready = Closure::once_into_js(move || mount_once(config));
    if let Err(e) =
        document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())
    {
        warn!("Could not wait for DOMContentLoaded: {:?}", e);
    }
}

/// JS entry point for pages that load the module themselves.
///
/// `config` may be `undefined` or an object overriding parts of the DOM
/// contract, e.g. `mount({ toastId: "flash" })`.
#[wasm_bindgen]
pub fn mount(config: JsValue) -> Result<(), JsValue> {
    let config = UiConfig::from_js(config)?;
    boot_when_ready(config);
    Ok(())
}
