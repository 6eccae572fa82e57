//! Sends "add to list" forms asynchronously and reports the result in the toast.

use crate::config::{
    MSG_ADDED, MSG_NETWORK_ERROR, MSG_REJECTED, REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE,
};
use crate::platform::{FormRequest, FormSnapshot, Platform, SubmitEvent, TransportError};
use crate::toast::Toast;
use futures::FutureExt;
use log::{debug, error, info, warn};
use std::fmt;
use std::rc::Rc;

/// Result of a single submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Added,
    Rejected(u16),
    NetworkError(TransportError),
}

impl SubmitOutcome {
    pub fn from_response(response: Result<u16, TransportError>) -> Self {
        match response {
            Ok(status) if (200..300).contains(&status) => SubmitOutcome::Added,
            Ok(status) => SubmitOutcome::Rejected(status),
            Err(err) => SubmitOutcome::NetworkError(err),
        }
    }

    /// Text shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            SubmitOutcome::Added => MSG_ADDED,
            SubmitOutcome::Rejected(_) => MSG_REJECTED,
            SubmitOutcome::NetworkError(_) => MSG_NETWORK_ERROR,
        }
    }
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitOutcome::Added => write!(f, "added"),
            SubmitOutcome::Rejected(status) => write!(f, "rejected with HTTP {}", status),
            SubmitOutcome::NetworkError(err) => write!(f, "{}", err),
        }
    }
}

/// The async POST sent for a captured form, whatever method the markup declares.
pub fn list_add_request(form: FormSnapshot) -> FormRequest {
    FormRequest {
        method: "POST".to_string(),
        url: form.action,
        headers: vec![(
            REQUESTED_WITH_HEADER.to_string(),
            REQUESTED_WITH_VALUE.to_string(),
        )],
        fields: form.fields,
    }
}

pub struct ListAddNotifier {
    platform: Platform,
    toast: Rc<Toast>,
}

impl ListAddNotifier {
    pub fn new(platform: Platform, toast: Rc<Toast>) -> Rc<Self> {
        Rc::new(Self { platform, toast })
    }

    /// Register a submit handler on every form matching `selector`.
    /// Returns the number of forms attached.
    pub fn attach(self: &Rc<Self>, selector: &str) -> usize {
        let forms = self.platform.dom.query_all(selector);
        for &form in &forms {
            let this = Rc::clone(self);
            let handler = Rc::new(move |event: &SubmitEvent| this.handle_submit(event));
            self.platform.dom.on_submit(form, handler);
        }
        info!("Attached list-add handler to {} forms", forms.len());
        forms.len()
    }

    /// Suppress navigation and send the form in the background.
    ///
    /// Each submit is a single attempt; repeated submits are not deduplicated.
    pub fn handle_submit(&self, event: &SubmitEvent) {
        event.prevent_default();

        let Some(snapshot) = self.platform.dom.capture_form(event.form()) else {
            warn!("Submitted form {:?} could not be read", event.form());
            return;
        };
        let request = list_add_request(snapshot);
        debug!("Posting {} fields to {}", request.fields.len(), request.url);

        let response = self.platform.transport.post_form(request);
        let toast = Rc::clone(&self.toast);
        self.platform.scheduler.spawn(
            async move {
                let outcome = SubmitOutcome::from_response(response.await);
                match &outcome {
                    SubmitOutcome::NetworkError(err) => error!("Add to list failed: {}", err),
                    other => debug!("Add to list {}", other),
                }
                toast.show(outcome.message());
            }
            .boxed_local(),
        );
    }
}
