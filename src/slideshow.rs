//! Keeps the slide in view, its indicator dot and its count-ups in sync.

use crate::config::{UiConfig, SLIDE_VISIBILITY_THRESHOLD};
use crate::count_up::CountUpAnimator;
use crate::platform::{NodeId, Platform, VisibilityEntry};
use crate::utils::dot_position_for_index;
use log::{debug, info};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub struct SlideshowController {
    platform: Platform,
    config: UiConfig,
    slides: RefCell<Vec<NodeId>>,
    dots: RefCell<Vec<NodeId>>,
    active: Cell<Option<NodeId>>,
    count_up: CountUpAnimator,
}

impl SlideshowController {
    pub fn new(platform: Platform, config: UiConfig) -> Rc<Self> {
        let count_up = CountUpAnimator::new(platform.clone(), &config.count_up_target_attr);
        Rc::new(Self {
            platform,
            config,
            slides: RefCell::new(Vec::new()),
            dots: RefCell::new(Vec::new()),
            active: Cell::new(None),
            count_up,
        })
    }

    /// Collect slides and dots, activate the first slide and start watching the viewport.
    pub fn start(self: &Rc<Self>) {
        let dom = &self.platform.dom;
        let slides = dom.query_all(&self.config.slide_selector);
        let dots = dom.query_all(&self.config.dot_selector);
        info!("Slideshow: {} slides, {} dots", slides.len(), dots.len());
        *self.slides.borrow_mut() = slides.clone();
        *self.dots.borrow_mut() = dots;

        let Some(&first) = slides.first() else {
            return;
        };
        self.activate(first);

        let weak: Weak<Self> = Rc::downgrade(self);
        dom.observe_visibility(
            &slides,
            SLIDE_VISIBILITY_THRESHOLD,
            Rc::new(move |entries: &[VisibilityEntry]| {
                if let Some(this) = weak.upgrade() {
                    this.handle_visibility(entries);
                }
            }),
        );
    }

    /// Entries are applied in delivery order; the last entering slide wins.
    pub fn handle_visibility(&self, entries: &[VisibilityEntry]) {
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            debug!("Slide {:?} entered at ratio {:.2}", entry.target, entry.ratio);
            self.activate(entry.target);
        }
    }

    /// Make `slide` the only active slide, sync its dot and run its count-ups.
    pub fn activate(&self, slide: NodeId) {
        let dom = &self.platform.dom;
        let class = &self.config.active_class;

        for &other in self.slides.borrow().iter() {
            if other != slide {
                dom.remove_class(other, class);
            }
        }
        dom.add_class(slide, class);
        self.active.set(Some(slide));

        self.sync_dots(slide);

        for counter in dom.query_within(slide, &self.config.count_up_selector) {
            self.count_up.run(counter);
        }
    }

    fn sync_dots(&self, slide: NodeId) {
        let dom = &self.platform.dom;
        let raw = dom.attribute(slide, &self.config.slide_index_attr);
        let dots = self.dots.borrow();
        let selected = dot_position_for_index(raw.as_deref()).and_then(|i| dots.get(i).copied());
        let Some(selected) = selected else {
            debug!("No dot for slide {:?} (index {:?})", slide, raw);
            return;
        };
        for &dot in dots.iter() {
            if dot == selected {
                dom.add_class(dot, &self.config.active_class);
            } else {
                dom.remove_class(dot, &self.config.active_class);
            }
        }
    }

    pub fn active_slide(&self) -> Option<NodeId> {
        self.active.get()
    }

    pub fn count_up(&self) -> &CountUpAnimator {
        &self.count_up
    }
}
