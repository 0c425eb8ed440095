//! Forwards final transcripts from a transcript source to a handler.
//!
//! [`TranscriptAdapter`] owns a tokio task that drains the source's event
//! channel.  Interim events are dropped; each final event is passed to the
//! `on_final` handler.  Calling [`stop`](TranscriptAdapter::stop) (or
//! dropping the adapter) ends forwarding.  A provider call that a handler
//! already started keeps running.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::TranscriptEvent;

// ---------------------------------------------------------------------------
// TranscriptAdapter
// ---------------------------------------------------------------------------

/// Handle to a running transcript forwarding task.
pub struct TranscriptAdapter {
    /// `true` while finals are forwarded.  The task holds this lock while the
    /// handler runs, so once `stop` returns no handler call is in progress
    /// and none will start.
    active: Arc<Mutex<bool>>,
    task: Option<JoinHandle<()>>,
}

impl TranscriptAdapter {
    /// Spawn the forwarding task on the current tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `events`: receiving end of the transcript source's channel.
    /// * `on_final`: called with the text of every final transcript.  It runs
    ///   on the forwarding task and should hand work off quickly (e.g. push
    ///   onto a channel).
    ///
    /// # Blocking
    ///
    /// `on_final` is called while the adapter's `active` lock is held.  A
    /// concurrent [`stop`](Self::stop) therefore blocks its thread until the
    /// handler returns, and a handler that calls `stop` or `is_active` on
    /// this adapter deadlocks.  Keep the handler non-blocking.
    pub fn start<F>(mut events: mpsc::Receiver<TranscriptEvent>, mut on_final: F) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        let active = Arc::new(Mutex::new(true));
        let active_task = Arc::clone(&active);

        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    TranscriptEvent::Interim(text) => {
                        log::trace!("transcript: dropping interim ({} chars)", text.len());
                    }
                    TranscriptEvent::Final(text) => {
                        let forwarded = {
                            let active =
                                active_task.lock().unwrap_or_else(PoisonError::into_inner);
                            if *active {
                                log::debug!("transcript: final ({} chars)", text.len());
                                on_final(text);
                            }
                            *active
                        };
                        if !forwarded {
                            break;
                        }
                    }
                }
            }
            log::debug!("transcript: adapter task finished");
        });

        Self {
            active,
            task: Some(task),
        }
    }

    /// Stop forwarding.  Idempotent.
    ///
    /// If a handler call is in progress this waits for it to return, so no
    /// handler runs after `stop` returns.
    pub fn stop(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if *active {
            *active = false;
            log::info!("transcript: adapter stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for the forwarding task to finish, which happens once the source
    /// closes its channel or a final arrives after `stop`.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("transcript: adapter task panicked: {e}");
            }
        }
    }
}

impl Drop for TranscriptAdapter {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> (Arc<Mutex<Vec<String>>>, impl FnMut(String) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |text| sink.lock().unwrap().push(text))
    }

    #[tokio::test]
    async fn forwards_finals_and_drops_interims() {
        let (tx, rx) = mpsc::channel(8);
        let (seen, handler) = collector();
        let adapter = TranscriptAdapter::start(rx, handler);

        tx.send(TranscriptEvent::Interim("what's".into())).await.unwrap();
        tx.send(TranscriptEvent::Interim("what's the".into())).await.unwrap();
        tx.send(TranscriptEvent::Final("what's the weather".into())).await.unwrap();
        tx.send(TranscriptEvent::Final("thanks".into())).await.unwrap();
        drop(tx);

        adapter.join().await;

        assert_eq!(*seen.lock().unwrap(), vec!["what's the weather", "thanks"]);
    }

    #[tokio::test]
    async fn no_callbacks_after_stop() {
        let (tx, rx) = mpsc::channel(8);
        let (seen, handler) = collector();
        let adapter = TranscriptAdapter::start(rx, handler);

        tx.send(TranscriptEvent::Final("before".into())).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        adapter.stop();
        assert!(!adapter.is_active());

        tx.send(TranscriptEvent::Final("after".into())).await.unwrap();
        drop(tx);
        adapter.join().await;

        assert_eq!(*seen.lock().unwrap(), vec!["before"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_waits_for_a_running_handler() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let entered = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel(1);
        let adapter = {
            let entered = Arc::clone(&entered);
            let finished = Arc::clone(&finished);
            TranscriptAdapter::start(rx, move |_| {
                entered.store(true, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(100));
                finished.store(true, Ordering::SeqCst);
            })
        };

        tx.send(TranscriptEvent::Final("slow".into())).await.unwrap();
        while !entered.load(Ordering::SeqCst) {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }

        adapter.stop();
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let (_tx, rx) = mpsc::channel::<TranscriptEvent>(1);
        let adapter = TranscriptAdapter::start(rx, |_| {});
        adapter.stop();
        adapter.stop();
        assert!(!adapter.is_active());
    }

    #[tokio::test]
    async fn dropping_adapter_stops_forwarding() {
        let (tx, rx) = mpsc::channel(8);
        let (seen, handler) = collector();
        drop(TranscriptAdapter::start(rx, handler));

        // The task may or may not still be draining; either way nothing is
        // forwarded once the handle is gone.
        let _ = tx.send(TranscriptEvent::Final("late".into())).await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert!(seen.lock().unwrap().is_empty());
    }
}
