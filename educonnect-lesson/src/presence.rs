//! Lesson presence session
//!
//! Ties one mounted lesson view to the tracking backend:
//! - mount: Enter is queued, then the tab's view events are subscribed
//! - focus gained / became visible: Focus is queued
//! - page unloading: the queue is closed and Exit follows it, keep-alive
//! - unmount (or drop): the subscription ends, then the same close-and-exit
//!
//! Every report goes out in the order the view produced it. One worker task
//! sends queued Enter/Focus reports one at a time; closing the queue lets it
//! finish what is already queued, and Exit is sent only after the worker is
//! done. Worker and Exit run detached, so tearing the view down never cancels
//! a report; a write that completes after unmount just has its result dropped.
//! Exit is sent at most once per mount.

use crate::tracking::TrackingClient;
use educonnect_common::events::{PresenceEvent, ViewEvent, ViewEventBus};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lesson shown by a mounted view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonContext {
    pub user_id: String,
    pub lesson_id: String,
    pub series_id: String,
    pub lesson_title: Option<String>,
}

/// Presence reporting for one mounted lesson view
pub struct LessonPresence {
    outbox: Arc<Outbox>,
    /// Live until unload or unmount; only stops the view-event listener
    scope: CancellationToken,
    listener: Option<JoinHandle<()>>,
}

impl LessonPresence {
    /// Start reporting presence for `lesson` in the tab owning `bus`
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(client: TrackingClient, bus: &ViewEventBus, lesson: LessonContext) -> Self {
        let tab_id = client.tab_ids().get_tab_id();
        let scope = CancellationToken::new();
        let (queue, pending) = mpsc::unbounded_channel();

        // Subscribe before anything is spawned so no event emitted after
        // mount() returns can be missed
        let events = bus.subscribe();

        let _ = queue.send(PresenceEvent::Enter {
            user_id: lesson.user_id.clone(),
            lesson_id: lesson.lesson_id.clone(),
            series_id: lesson.series_id.clone(),
            lesson_title: lesson.lesson_title.clone(),
            tab_id: tab_id.clone(),
        });

        let outbox = Arc::new(Outbox {
            client: client.clone(),
            user_id: lesson.user_id.clone(),
            tab_id: tab_id.clone(),
            queue: Mutex::new(Some(queue)),
            worker: Mutex::new(None),
            exit_claimed: AtomicBool::new(false),
        });
        *lock(&outbox.worker) = Some(tokio::spawn(run_worker(client, pending)));

        let listener = tokio::spawn(run_listener(events, Arc::clone(&outbox), scope.clone()));

        info!(
            user_id = %lesson.user_id,
            lesson_id = %lesson.lesson_id,
            tab_id = %tab_id,
            "Lesson presence mounted"
        );

        Self {
            outbox,
            scope,
            listener: Some(listener),
        }
    }

    pub fn tab_id(&self) -> &str {
        &self.outbox.tab_id
    }

    /// Whether the view is still live (not unloaded or unmounted)
    pub fn is_active(&self) -> bool {
        !self.scope.is_cancelled()
    }

    /// Queue a Focus report outside of view events
    pub fn report_focus(&self) {
        if self.is_active() {
            self.outbox.enqueue(self.outbox.focus());
        }
    }

    /// Tear the view down
    ///
    /// View events already emitted are still reported, then everything
    /// queued, then Exit. Returns the handle of that detached sequence, or
    /// `None` when Exit was already claimed (page unload) or no runtime is
    /// available. Dropping the handle does not cancel it.
    pub fn unmount(mut self) -> Option<JoinHandle<Option<Value>>> {
        self.teardown()
    }

    fn teardown(&mut self) -> Option<JoinHandle<Option<Value>>> {
        self.scope.cancel();
        let listener = self.listener.take();
        self.outbox.close_then_exit(listener)
    }
}

impl Drop for LessonPresence {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}

/// Report queue of one mount, shared by the view and its listener
struct Outbox {
    client: TrackingClient,
    user_id: String,
    tab_id: String,
    /// `None` once closed
    queue: Mutex<Option<mpsc::UnboundedSender<PresenceEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    exit_claimed: AtomicBool,
}

impl Outbox {
    fn focus(&self) -> PresenceEvent {
        PresenceEvent::Focus {
            user_id: self.user_id.clone(),
            tab_id: self.tab_id.clone(),
        }
    }

    fn enqueue(&self, event: PresenceEvent) {
        match lock(&self.queue).as_ref() {
            Some(queue) => {
                let _ = queue.send(event);
            }
            None => debug!(kind = event.kind().as_str(), "Presence queue closed, report dropped"),
        }
    }

    /// Close the queue once `listener` is done, drain it, then send Exit
    fn close_then_exit(
        self: &Arc<Self>,
        listener: Option<JoinHandle<()>>,
    ) -> Option<JoinHandle<Option<Value>>> {
        if self.exit_claimed.swap(true, Ordering::SeqCst) {
            return None;
        }
        if tokio::runtime::Handle::try_current().is_err() {
            warn!(tab_id = %self.tab_id, "No runtime available, lesson exit not reported");
            drop(lock(&self.queue).take());
            return None;
        }

        let outbox = Arc::clone(self);
        Some(tokio::spawn(async move {
            if let Some(listener) = listener {
                let _ = listener.await;
            }
            drop(lock(&outbox.queue).take());
            let worker = lock(&outbox.worker).take();
            if let Some(worker) = worker {
                if let Err(e) = worker.await {
                    warn!(error = %e, "Presence worker ended abnormally");
                }
            }

            debug!(tab_id = %outbox.tab_id, "Dispatching keep-alive lesson exit");
            outbox
                .client
                .report(PresenceEvent::Exit {
                    user_id: outbox.user_id.clone(),
                    tab_id: outbox.tab_id.clone(),
                })
                .await
        }))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Send queued reports one at a time until the queue is closed and empty
async fn run_worker(client: TrackingClient, mut pending: mpsc::UnboundedReceiver<PresenceEvent>) {
    while let Some(event) = pending.recv().await {
        client.report(event).await;
    }
}

/// Translate view events into presence reports until the scope ends
async fn run_listener(
    mut events: broadcast::Receiver<ViewEvent>,
    outbox: Arc<Outbox>,
    scope: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            _ = scope.cancelled() => {
                drain_emitted(&mut events, &outbox);
                break;
            }
            received = events.recv() => received,
        };

        match received {
            Ok(ViewEvent::FocusGained) | Ok(ViewEvent::VisibilityChanged { visible: true }) => {
                outbox.enqueue(outbox.focus());
            }
            Ok(ViewEvent::VisibilityChanged { visible: false }) => {}
            Ok(ViewEvent::Unloading) => {
                info!(tab_id = %outbox.tab_id, "Page unloading, reporting lesson exit");
                drop(outbox.close_then_exit(None));
                scope.cancel();
                break;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "View event subscriber lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Report focus events emitted before teardown but not yet received
fn drain_emitted(events: &mut broadcast::Receiver<ViewEvent>, outbox: &Outbox) {
    loop {
        match events.try_recv() {
            Ok(ViewEvent::FocusGained) | Ok(ViewEvent::VisibilityChanged { visible: true }) => {
                outbox.enqueue(outbox.focus());
            }
            Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
}
