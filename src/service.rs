pub mod audit;
pub mod gateway;

pub use self::{audit::*, gateway::*};
use crate::{
    event_log::{self, LogEvent, WithOffset},
    progress,
};
use anyhow::{bail, format_err, Result};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};
use tracing::{error, info};

pub type ServiceId = String;
pub type ServiceIdRef<'a> = &'a str;

/// A service that handles events on the log
pub trait LogFollowerService: Send + Sync {
    fn get_log_progress_id(&self) -> String;

    fn handle_event(&mut self, event: LogEvent) -> Result<()>;
}

/// A service that is a loop that does something
pub trait LoopService: Send + Sync {
    fn run_iteration(&mut self) -> Result<()>;
}

/// Service execution control instance
///
/// All services are basically a loop, and we would like to be able to
/// gracefully terminate them, and handle and top-level error of any
/// of them by gracefully stopping everything else.
#[derive(Clone)]
pub struct ServiceControl {
    stop_all: Arc<AtomicBool>,
    progress_store: progress::SharedProgressTracker,
}

impl ServiceControl {
    pub fn new(progress_store: progress::SharedProgressTracker) -> Self {
        Self {
            stop_all: Default::default(),
            progress_store,
        }
    }

    pub fn stop_all(&self) {
        self.stop_all.store(true, Ordering::SeqCst);
    }

    pub fn spawn_log_follower(
        &self,
        mut service: impl LogFollowerService + 'static,
        event_reader: event_log::SharedReader,
    ) -> JoinHandle {
        self.spawn_event_loop(
            &service.get_log_progress_id(),
            event_reader,
            move |event| service.handle_event(event),
        )
    }

    pub fn spawn_loop(&self, mut service: impl LoopService + 'static) -> JoinHandle {
        self.spawn_loop_raw(move || service.run_iteration())
    }

    /// Start a new service as a loop, with a certain body
    ///
    /// This will take care of checking termination condition and
    /// handling any errors returned by `f`
    fn spawn_loop_raw<F>(&self, mut f: F) -> JoinHandle
    where
        F: FnMut() -> Result<()> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));

        JoinHandle::new(
            stop.clone(),
            thread::spawn({
                let stop_all = self.stop_all.clone();
                move || match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    while !stop.load(Ordering::SeqCst) && !stop_all.load(Ordering::SeqCst) {
                        if let Err(e) = f() {
                            error!(error = %e, "service failed, stopping everything");
                            stop_all.store(true, Ordering::SeqCst);
                            return Err(e);
                        }
                    }
                    Ok(())
                })) {
                    Err(_e) => {
                        stop_all.store(true, Ordering::SeqCst);
                        bail!("service panicked");
                    }
                    Ok(res) => res,
                }
            }),
        )
    }

    fn spawn_event_loop<F>(
        &self,
        service_id: ServiceIdRef,
        event_reader: event_log::SharedReader,
        mut f: F,
    ) -> JoinHandle
    where
        F: FnMut(LogEvent) -> Result<()> + Send + 'static,
    {
        let service_id = service_id.to_owned();

        let mut progress = match self
            .progress_store
            .load(&service_id)
            .and_then(|offset| match offset {
                Some(offset) => Ok(offset),
                None => event_reader.get_start_offset(),
            }) {
            // To avoid returning a `Result` directly from here, spawn a thread that will immediately terminate with an error,
            // just like the initial progress load was done from the spawned thread itself.
            Err(e) => {
                return JoinHandle::new(
                    Arc::new(AtomicBool::new(false)),
                    thread::spawn(move || Err(e)),
                )
            }
            Ok(o) => o,
        };

        info!(service = %service_id, offset = progress, "following event log");

        self.spawn_loop_raw({
            let progress_store = self.progress_store.clone();
            move || {
                let WithOffset {
                    offset: new_offset,
                    data: events,
                } = event_reader.read(progress, 1, Some(Duration::from_secs(1)))?;

                for event in events {
                    f(event)?;
                }

                if new_offset != progress {
                    progress = new_offset;
                    progress_store.store(&service_id, new_offset)?;
                }
                Ok(())
            }
        })
    }
}

/// Simple thread join wrapper that joins the thread on drop
pub struct JoinHandle {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<Result<()>>>,
}

impl JoinHandle {
    fn new(stop: Arc<AtomicBool>, handle: thread::JoinHandle<Result<()>>) -> Self {
        JoinHandle {
            stop,
            thread: Some(handle),
        }
    }

    fn join_mut(&mut self) -> Result<()> {
        if let Some(h) = self.thread.take() {
            h.join().map_err(|e| format_err!("join failed: {:?}", e))?
        } else {
            Ok(())
        }
    }

    pub fn join(mut self) -> Result<()> {
        self.join_mut()
    }
}

impl Drop for JoinHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Err(e) = self.join_mut() {
            error!(error = %e, "service terminated with an error");
        }
    }
}
