//! `LogStreamListener` — owns one live log subscription.
//!
//! States: `Stopped` → `start()` → `Subscribed` → `stop()` → `Stopped`.
//! Notifications are processed one at a time in arrival order. A transport
//! failure ends the session; the listener records the error, returns to
//! `Stopped`, and waits for a supervisor to call `start()` again.

use crate::extract::extract_events;
use crate::sink::EventSink;
use crate::source::{LogSource, LogStream};
use futures::StreamExt;
use sss_codec::{EventDecoder, ProgramLogScanner};
use sss_core::{Pubkey, StreamError};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Default)]
struct Status {
    running: AtomicBool,
    starting: AtomicBool,
    cancel_start: Notify,
    last_error: Mutex<Option<String>>,
}

/// Clears the `starting` flag however `start()` returns.
struct StartingGuard<'a>(&'a AtomicBool);

impl Drop for StartingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Status {
    fn set_error(&self, err: &StreamError) {
        *self.last_error.lock().unwrap() = Some(err.to_string());
    }
}

/// Handle to the active session; dropped on `stop()`.
struct Session {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

pub struct LogStreamListener {
    source: Arc<dyn LogSource>,
    scanner: ProgramLogScanner,
    decoder: EventDecoder,
    session: tokio::sync::Mutex<Option<Session>>,
    status: Arc<Status>,
}

impl LogStreamListener {
    pub fn new(source: Arc<dyn LogSource>, program_id: &Pubkey) -> Self {
        Self {
            source,
            scanner: ProgramLogScanner::new(program_id),
            decoder: EventDecoder::new(),
            session: tokio::sync::Mutex::new(None),
            status: Arc::new(Status::default()),
        }
    }

    /// Subscribe and start forwarding decoded events to `sink`.
    ///
    /// Returns once the subscription is confirmed. Fails with
    /// `AlreadyRunning` if a session is live or another `start()` is
    /// subscribing, or with the transport error if subscribing fails.
    ///
    /// The session lock is not held while subscribing, so `stop()` and
    /// status queries never wait on the transport.
    pub async fn start(&self, sink: Arc<dyn EventSink>) -> Result<(), StreamError> {
        {
            let mut session = self.session.lock().await;
            if let Some(live) = session.as_ref() {
                if !live.task.is_finished() {
                    return Err(StreamError::AlreadyRunning);
                }
            }
            // A previous session that ended on its own.
            if let Some(stale) = session.take() {
                if let Err(e) = stale.task.await {
                    error!(error = %e, "previous listener task panicked");
                }
            }
        }
        // Registered before `starting` is visible so a concurrent stop() is never missed.
        let cancelled = self.status.cancel_start.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();
        if self.status.starting.swap(true, Ordering::SeqCst) {
            return Err(StreamError::AlreadyRunning);
        }
        let _starting = StartingGuard(&self.status.starting);

        info!(endpoint = self.source.endpoint(), program = self.scanner.program_id(), "starting log listener");
        let subscribed = tokio::select! {
            result = self.source.subscribe() => result,
            _ = cancelled => {
                info!("listener stopped while subscribing");
                return Err(StreamError::Closed);
            }
        };
        let stream = subscribed.map_err(|e| {
            error!(error = %e, "log subscription failed");
            self.status.set_error(&e);
            e
        })?;

        let mut session = self.session.lock().await;
        if session.as_ref().is_some_and(|live| !live.task.is_finished()) {
            // Lost a race with another start(); dropping `stream` releases it.
            return Err(StreamError::AlreadyRunning);
        }

        *self.status.last_error.lock().unwrap() = None;
        self.status.running.store(true, Ordering::SeqCst);

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_session(
            stream,
            shutdown_rx,
            sink,
            self.scanner.clone(),
            self.decoder,
            Arc::clone(&self.status),
        ));
        *session = Some(Session { shutdown, task });
        Ok(())
    }

    /// Release the subscription and wait for in-flight work to finish.
    /// A `start()` still waiting on the transport is cancelled. Calling it
    /// on a stopped listener does nothing.
    pub async fn stop(&self) {
        if self.status.starting.load(Ordering::SeqCst) {
            self.status.cancel_start.notify_waiters();
        }
        let Some(session) = self.session.lock().await.take() else {
            debug!("stop() on an already stopped listener");
            return;
        };
        let _ = session.shutdown.send(true);
        if let Err(e) = session.task.await {
            error!(error = %e, "listener task panicked");
        }
        self.status.running.store(false, Ordering::SeqCst);
        info!("log listener stopped");
    }

    pub fn is_running(&self) -> bool {
        self.status.running.load(Ordering::SeqCst)
    }

    /// The transport error that ended the last session, if any.
    pub fn last_error(&self) -> Option<String> {
        self.status.last_error.lock().unwrap().clone()
    }
}

async fn run_session(
    mut stream: LogStream,
    mut shutdown: watch::Receiver<bool>,
    sink: Arc<dyn EventSink>,
    scanner: ProgramLogScanner,
    decoder: EventDecoder,
    status: Arc<Status>,
) {
    let _running = RunningGuard(Arc::clone(&status));
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            item = stream.next() => match item {
                Some(Ok(notification)) => {
                    let extraction = extract_events(&notification, &scanner, &decoder);
                    sink.on_notification(&extraction.summary);
                    for event in extraction.events {
                        sink.on_event(event).await;
                    }
                }
                Some(Err(e)) => {
                    error!(error = %e, "log subscription failed, listener stopping");
                    status.set_error(&e);
                    break;
                }
                None => {
                    warn!("log subscription ended, listener stopping");
                    status.set_error(&StreamError::Closed);
                    break;
                }
            },
        }
    }
    // Dropping the stream releases the subscription.
    drop(stream);
}

/// Clears `running` when the session task ends, including by panic.
struct RunningGuard(Arc<Status>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::SeqCst);
    }
}
