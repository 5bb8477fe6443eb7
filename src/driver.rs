//! Runs a [`ZipAutofill`] on a single tokio task.
//!
//! The task owns the widget, so field access and the dedup memory stay on
//! one logical thread even on a multi-threaded runtime. Each keystroke
//! arrives with the zip field's raw value and is written and handled in one
//! step, so no keystroke is folded into a later one. Each triggered lookup
//! runs in its own task and its result is applied back on the widget task
//! in the order lookups settle. Nothing is cancelled: a slow early lookup
//! that settles after a later one overwrites it.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use crate::lookup::ZipLookup;
use crate::page::FormField;
use crate::types::{Fill, LookupResponse};
use crate::widget::ZipAutofill;

/// A lookup that settled and what it wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSettled {
    pub code: String,
    /// `None` when the lookup yielded no data
    pub fill: Option<Fill>,
}

/// Something the autofill task did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutofillEvent {
    /// A keystroke was handled; `zip` is the sanitized value now shown and
    /// `lookup` the code it sent off, if any.
    Echoed { zip: String, lookup: Option<String> },
    Settled(LookupSettled),
}

/// Handle to a running autofill task
pub struct AutofillHandle {
    input: Option<mpsc::UnboundedSender<String>>,
    events: mpsc::UnboundedReceiver<AutofillEvent>,
    task: JoinHandle<()>,
}

impl AutofillHandle {
    /// Deliver a keystroke: `raw` is the zip field's value after it.
    /// Returns `false` once input is closed or the task has stopped.
    pub fn input(&self, raw: impl Into<String>) -> bool {
        self.input
            .as_ref()
            .is_some_and(|tx| tx.send(raw.into()).is_ok())
    }

    /// Next event. `None` once input is closed and every in-flight lookup
    /// has been applied.
    pub async fn next_event(&mut self) -> Option<AutofillEvent> {
        self.events.recv().await
    }

    /// Next settled lookup, skipping echoes
    pub async fn settled(&mut self) -> Option<LookupSettled> {
        loop {
            match self.events.recv().await? {
                AutofillEvent::Settled(settled) => return Some(settled),
                AutofillEvent::Echoed { .. } => continue,
            }
        }
    }

    /// Stop taking keystrokes. Lookups already in flight still settle and
    /// apply.
    pub fn close_input(&mut self) {
        self.input = None;
    }

    /// Tear down immediately, dropping in-flight lookups
    pub fn abort(self) {
        self.task.abort();
    }
}

/// Start the autofill task
pub fn spawn_autofill<F, L>(widget: ZipAutofill<F>, lookup: L) -> AutofillHandle
where
    F: FormField + Send + 'static,
    L: ZipLookup,
{
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(run(widget, Arc::new(lookup), input_rx, events_tx));

    AutofillHandle {
        input: Some(input_tx),
        events: events_rx,
        task,
    }
}

async fn run<F, L>(
    mut widget: ZipAutofill<F>,
    lookup: Arc<L>,
    mut input: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<AutofillEvent>,
) where
    F: FormField,
    L: ZipLookup,
{
    let mut in_flight: JoinSet<(String, Option<LookupResponse>)> = JoinSet::new();

    loop {
        tokio::select! {
            raw = input.recv() => {
                let Some(raw) = raw else { break };
                let triggered = widget.type_value(&raw);
                if let Some(code) = triggered.clone() {
                    let lookup = Arc::clone(&lookup);
                    in_flight.spawn(async move {
                        let response = lookup.lookup(&code).await;
                        (code, response)
                    });
                }
                // Nobody listening is fine.
                let _ = events.send(AutofillEvent::Echoed {
                    zip: widget.zip_value(),
                    lookup: triggered,
                });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                settle(&widget, joined, &events);
            }
        }
    }

    tracing::debug!(pending = in_flight.len(), "zip input closed, draining lookups");
    while let Some(joined) = in_flight.join_next().await {
        settle(&widget, joined, &events);
    }
}

fn settle<F: FormField>(
    widget: &ZipAutofill<F>,
    joined: Result<(String, Option<LookupResponse>), tokio::task::JoinError>,
    events: &mpsc::UnboundedSender<AutofillEvent>,
) {
    let (code, response) = match joined {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!(error = %e, "zip lookup task failed");
            return;
        }
    };

    let fill = widget.apply(response.as_ref());
    let _ = events.send(AutofillEvent::Settled(LookupSettled { code, fill }));
}
