//! Run-once numeric count-up animation driven by animation frames.

use crate::platform::{NodeId, Platform};
use crate::utils::{count_up_frame, parse_count_target};
use log::debug;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

pub struct CountUpAnimator {
    platform: Platform,
    target_attr: String,
    completed: RefCell<HashSet<NodeId>>,
}

impl CountUpAnimator {
    pub fn new(platform: Platform, target_attr: &str) -> Self {
        Self {
            platform,
            target_attr: target_attr.to_string(),
            completed: RefCell::new(HashSet::new()),
        }
    }

    /// Animate `node` from 0 to its target unless it has already run.
    ///
    /// The element is recorded as completed before the first frame, so
    /// overlapping activations never start a second animation.
    pub fn run(&self, node: NodeId) {
        if !self.completed.borrow_mut().insert(node) {
            return;
        }
        let raw = self.platform.dom.attribute(node, &self.target_attr);
        let target = parse_count_target(raw.as_deref());
        debug!("Count-up {:?} towards {}", node, target);

        let run = Rc::new(CountUpRun {
            platform: self.platform.clone(),
            node,
            target,
            started_at: self.platform.scheduler.now_ms(),
        });
        run.schedule();
    }

    pub fn has_run(&self, node: NodeId) -> bool {
        self.completed.borrow().contains(&node)
    }
}

struct CountUpRun {
    platform: Platform,
    node: NodeId,
    target: u64,
    started_at: f64,
}

impl CountUpRun {
    fn schedule(self: Rc<Self>) {
        let scheduler = self.platform.scheduler.clone();
        scheduler.request_frame(Box::new(move |ts: f64| self.step(ts)));
    }

    fn step(self: Rc<Self>, frame_ts: f64) {
        let (value, finished) = count_up_frame(self.target, frame_ts - self.started_at);
        self.platform.dom.set_text(self.node, &value.to_string());
        if !finished {
            self.schedule();
        }
    }
}
