//! Bounded waits on a driver that may hang.
//!
//! The SDK blocks until the instrument answers, and a wedged instrument never does. The driver
//! is moved onto a dedicated thread and each call is awaited with a timeout. A call that times
//! out leaves the driver busy; until it returns, queries are refused rather than queued behind
//! it, while teardown (`close` and `destroy`) is still queued so the session is released once
//! the driver frees up. The watchdog accepts calls again when all queued work has run.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, sync_channel, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::{Error, Result, Status};
use super::{Driver, GratingRangeReply, GratingReply, Handle, SystemInfo, WavelengthReply};

type Job<D> = Box<dyn FnOnce(&mut D) + Send>;

#[derive(Debug)]
pub struct Watchdog<D> {
    jobs: Option<Sender<Job<D>>>,
    worker: Option<JoinHandle<()>>,
    timeout: Option<Duration>,
    submitted: usize,
    completed: Arc<AtomicUsize>,
    stalled: bool,
}

impl<D: Driver + Send + 'static> Watchdog<D> {
    /// Moves `driver` onto its own thread. A `timeout` of `None` or zero waits forever.
    pub fn new(driver: D, timeout: Option<Duration>) -> Watchdog<D> {
        let (jobs, job_recv) = channel::<Job<D>>();
        let completed = Arc::new(AtomicUsize::new(0));
        let worker = thread::spawn({
            let completed = completed.clone();
            move || {
                let mut driver = driver;
                for job in job_recv {
                    job(&mut driver);
                    completed.fetch_add(1, Ordering::Release);
                }
                log::trace!("driver thread exiting");
            }
        });
        Watchdog {
            jobs: Some(jobs),
            worker: Some(worker),
            timeout: timeout.filter(|timeout| !timeout.is_zero()),
            submitted: 0,
            completed,
            stalled: false,
        }
    }

    fn pending(&self) -> usize {
        self.submitted.saturating_sub(self.completed.load(Ordering::Acquire))
    }

    /// Whether a call has timed out and the driver has not yet worked through its queue.
    pub fn is_stalled(&self) -> bool {
        self.stalled && self.pending() > 0
    }

    fn submit(&mut self, name: &'static str, job: Job<D>) -> Result<()> {
        let Some(jobs) = self.jobs.as_ref() else {
            return Err(Error::NotFound)
        };
        if jobs.send(job).is_err() {
            log::error!("{}: driver thread has exited", name);
            return Err(Error::NotFound)
        }
        self.submitted += 1;
        Ok(())
    }

    /// Runs `f` on the driver thread and waits for its result. While stalled, a `teardown` call
    /// is queued without waiting and every other call is refused; both report `Timeout`.
    fn call<T, F>(&mut self, name: &'static str, teardown: bool, f: F) -> Result<T>
            where T: Send + 'static, F: FnOnce(&mut D) -> Result<T> + Send + 'static {
        if self.stalled {
            if self.pending() == 0 {
                log::info!("driver recovered");
                self.stalled = false;
            } else if teardown {
                log::debug!("{}: driver stalled, queueing call", name);
                self.submit(name, Box::new(move |driver: &mut D| {
                    let result = f(driver).map(|_| ());
                    log::debug!("{}: deferred call finished: {:?}", name, result);
                }))?;
                return Err(Error::Timeout)
            } else {
                log::debug!("{}: driver stalled, refusing call", name);
                return Err(Error::Timeout)
            }
        }
        let (reply_send, reply_recv) = sync_channel(1);
        self.submit(name, Box::new(move |driver: &mut D| {
            // the caller may have given up waiting
            let _ = reply_send.send(f(driver));
        }))?;
        let reply = match self.timeout {
            Some(timeout) => reply_recv.recv_timeout(timeout),
            None => reply_recv.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match reply {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                log::error!("{}: no reply from driver within {:?}", name, self.timeout);
                self.stalled = true;
                Err(Error::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::error!("{}: driver thread has exited", name);
                Err(Error::NotFound)
            }
        }
    }
}

impl<D: Driver + Send + 'static> Driver for Watchdog<D> {
    fn create(&mut self, conffile: &Path) -> Result<(Handle, Status)> {
        let conffile = conffile.to_owned();
        self.call("create", false, move |driver| driver.create(&conffile))
    }

    fn open(&mut self, handle: Handle, index: u32) -> Result<(SystemInfo, Status)> {
        self.call("open", false, move |driver| driver.open(handle, index))
    }

    fn wavelength(&mut self, handle: Handle) -> Result<WavelengthReply> {
        self.call("wavelength", false, move |driver| driver.wavelength(handle))
    }

    fn calibrate(&mut self, handle: Handle, wavelength: f64) -> Result<(f64, Status)> {
        self.call("calibrate", false, move |driver| driver.calibrate(handle, wavelength))
    }

    fn grating(&mut self, handle: Handle) -> Result<GratingReply> {
        self.call("grating", false, move |driver| driver.grating(handle))
    }

    fn calibrate_grating(&mut self, handle: Handle, index: u32, wavelength: f64)
            -> Result<GratingRangeReply> {
        self.call("calibrate_grating", false,
                  move |driver| driver.calibrate_grating(handle, index, wavelength))
    }

    fn close(&mut self, handle: Handle) -> Result<Status> {
        self.call("close", true, move |driver| driver.close(handle))
    }

    fn destroy(&mut self, handle: Handle) -> Result<Status> {
        self.call("destroy", true, move |driver| driver.destroy(handle))
    }
}

impl<D> Drop for Watchdog<D> {
    fn drop(&mut self) {
        // disconnecting the job queue ends the worker loop once queued jobs have run
        drop(self.jobs.take());
        if let Some(worker) = self.worker.take() {
            let pending = self.submitted.saturating_sub(self.completed.load(Ordering::Acquire));
            if self.stalled && pending > 0 {
                log::warn!("detaching stalled driver thread with {} queued calls", pending);
            } else if worker.join().is_err() {
                log::error!("driver thread panicked");
            }
        }
    }
}
