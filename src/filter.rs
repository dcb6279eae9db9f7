use std::mem;
use std::path::{Path, PathBuf};

use crate::{Configuration, Error, GratingReading, Result, Status, WavelengthReading};
use crate::sys::{Driver, Handle, SystemInfo};
use crate::sys::imp::FilterDriverImpl;
use crate::sys::watchdog::Watchdog;

#[derive(Debug)]
enum State {
    Closed,
    Open {
        handle: Handle,
        info: SystemInfo,
    },
}

/// Owner of the single SDK session for one filter.
///
/// `wavelength`, `set_wavelength`, `grating` and `set_grating_wavelength` open a session if none
/// is held. If such a call fails, the session it opened is closed before the error is returned;
/// a session opened by the caller is left alone. Successful calls keep the session open.
///
/// Not reentrant; wrap in a `Mutex` to share between threads.
#[derive(Debug)]
pub struct Filter<D: Driver> {
    driver: D,
    conffile: PathBuf,
    index: u32,
    state: State,
}

impl Filter<Watchdog<FilterDriverImpl>> {
    pub fn new(config: &Configuration) -> Result<Filter<Watchdog<FilterDriverImpl>>> {
        let driver = Watchdog::new(FilterDriverImpl::new()?, config.timeout);
        Ok(Filter::with_driver(driver, config))
    }

    /// Runs `f` with an open filter, closing it afterwards whether or not `f` succeeds.
    pub fn with<T, F>(config: &Configuration, f: F) -> Result<T>
            where F: FnOnce(&mut Filter<Watchdog<FilterDriverImpl>>) -> Result<T> {
        Self::new(config)?.scope(f)
    }
}

impl<D: Driver> Filter<D> {
    pub(crate) fn with_driver(driver: D, config: &Configuration) -> Filter<D> {
        Filter {
            driver,
            conffile: config.conffile.clone(),
            index: config.index,
            state: State::Closed,
        }
    }

    #[cfg(test)]
    pub(crate) fn driver(&self) -> &D {
        &self.driver
    }

    #[cfg(test)]
    pub(crate) fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn conffile(&self) -> &Path {
        &self.conffile
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Open { .. })
    }

    pub fn handle(&self) -> Option<Handle> {
        match self.state {
            State::Open { handle, .. } => Some(handle),
            State::Closed => None,
        }
    }

    /// Identification of the open system.
    pub fn system_info(&self) -> Option<&SystemInfo> {
        match &self.state {
            State::Open { info, .. } => Some(info),
            State::Closed => None,
        }
    }

    /// Creates a session for the system at `index` and opens it.
    ///
    /// Fails with `Error::AlreadyOpen` without touching the driver if a session is held.
    pub fn open(&mut self, index: u32) -> Result<Handle> {
        if let State::Open { handle, .. } = self.state {
            log::debug!("open({}): already open as {:?}", index, handle);
            return Err(Error::AlreadyOpen)
        }

        let (handle, status) = self.driver.create(&self.conffile)?;
        log::debug!("create({:?}) = {:?}, {:?}", self.conffile, handle, status);
        status.check().map_err(Error::Connection)?;

        let opened = self.driver.open(handle, index)
            .and_then(|(info, status)| {
                log::debug!("open({:?}, {}) = {:?}", handle, index, status);
                status.check().map_err(Error::Connection)?;
                Ok(info)
            });
        match opened {
            Ok(info) => {
                log::debug!("opened {:?} (library version {}, {} system(s)) as {:?}",
                            info.name, info.library_version, info.system_count, handle);
                self.state = State::Open { handle, info };
                Ok(handle)
            }
            Err(error) => {
                // the session was created, so release it before giving up
                match self.driver.destroy(handle) {
                    Ok(Status::Success) => (),
                    Ok(status) => log::warn!("destroy({:?}) after failed open = {}", handle, status),
                    Err(destroy_error) =>
                        log::warn!("destroy({:?}) after failed open: {}", handle, destroy_error),
                }
                Err(error)
            }
        }
    }

    /// Closes and destroys the session, if any.
    ///
    /// The session is forgotten even if the SDK reports a failure, since it cannot be closed
    /// a second time.
    pub fn close(&mut self) -> Result<()> {
        let handle = match mem::replace(&mut self.state, State::Closed) {
            State::Open { handle, .. } => handle,
            State::Closed => return Ok(()),
        };

        let closed = self.driver.close(handle);
        log::debug!("close({:?}) = {:?}", handle, closed);
        let destroyed = self.driver.destroy(handle);
        log::debug!("destroy({:?}) = {:?}", handle, destroyed);

        match Status::first_failure([closed?, destroyed?]) {
            Some(status) => Err(Error::Disconnection(status)),
            None => Ok(()),
        }
    }

    /// Reads the central wavelength and the tunable range.
    pub fn wavelength(&mut self) -> Result<WavelengthReading> {
        self.transparently(|driver, handle| read_wavelength(driver, handle, Error::Query))
    }

    /// Tunes the filter to `wavelength` nanometers and returns the state it settled in.
    pub fn set_wavelength(&mut self, wavelength: f64) -> Result<WavelengthReading> {
        self.transparently(|driver, handle| {
            let previous = read_wavelength(driver, handle, Error::Calibration)?;
            log::debug!("current wavelength {} nm, range {}..{} nm",
                        previous.wavelength, previous.minimum, previous.maximum);
            if wavelength == previous.wavelength {
                return Err(Error::AlreadyCalibrated { wavelength })
            }

            let (achieved, status) = driver.calibrate(handle, wavelength)?;
            log::debug!("calibrate({:?}, {}) = {}, {:?}", handle, wavelength, achieved, status);
            status.check().map_err(Error::Calibration)?;
            if achieved == previous.wavelength {
                return Err(Error::CalibrationIneffective { wavelength: achieved })
            }
            Ok(WavelengthReading { wavelength: achieved, ..previous })
        })
    }

    /// Reads the grating in use and its wavelength ranges.
    pub fn grating(&mut self) -> Result<GratingReading> {
        self.transparently(|driver, handle| read_grating(driver, handle, Error::Query))
    }

    /// Moves the grating in use so that its range is centered on `wavelength` nanometers.
    pub fn set_grating_wavelength(&mut self, wavelength: f64) -> Result<GratingReading> {
        self.transparently(|driver, handle| {
            let previous = read_grating(driver, handle, Error::Calibration)?;
            let previous_central = previous.central();
            log::debug!("grating {} range {}..{} nm, central {} nm",
                        previous.index, previous.minimum, previous.maximum, previous_central);
            if wavelength == previous_central {
                return Err(Error::AlreadyCalibrated { wavelength })
            }

            let reply = driver.calibrate_grating(handle, previous.index, wavelength)?;
            log::debug!("calibrate_grating({:?}, {}, {}) = {:?}",
                        handle, previous.index, wavelength, reply);
            if let Some(status) = Status::first_failure([reply.calibration_status,
                                                         reply.range_status]) {
                return Err(Error::Calibration(status))
            }
            let current = GratingReading {
                minimum: reply.minimum,
                maximum: reply.maximum,
                ..previous
            };
            if current.central() == previous_central {
                return Err(Error::CalibrationIneffective { wavelength: previous_central })
            }
            Ok(current)
        })
    }

    /// Runs `f` with an open filter. If `f` opened the session, it is closed again afterwards.
    pub fn scope<T, F>(&mut self, f: F) -> Result<T>
            where F: FnOnce(&mut Self) -> Result<T> {
        let opened = match self.open(self.index) {
            Ok(_) => true,
            Err(Error::AlreadyOpen) => false,
            Err(error) => return Err(error),
        };
        let result = f(self);
        if !opened {
            return result
        }
        match (result, self.close()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_error)) => Err(close_error),
            (Err(error), Ok(())) => Err(error),
            (Err(error), Err(close_error)) => {
                log::warn!("could not close filter after failure: {}", close_error);
                Err(error)
            }
        }
    }

    fn transparently<T, F>(&mut self, f: F) -> Result<T>
            where F: FnOnce(&mut D, Handle) -> Result<T> {
        let (handle, opened) = match self.state {
            State::Open { handle, .. } => (handle, false),
            State::Closed => (self.open(self.index)?, true),
        };
        let result = f(&mut self.driver, handle);
        if let (Err(error), true) = (&result, opened) {
            log::debug!("closing filter after failure: {}", error);
            if let Err(close_error) = self.close() {
                log::warn!("could not close filter after failure: {}", close_error);
            }
        }
        result
    }
}

impl<D: Driver> Drop for Filter<D> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            log::error!("error closing filter: {}", error);
        }
    }
}

fn read_wavelength<D: Driver>(driver: &mut D, handle: Handle, error: fn(Status) -> Error)
        -> Result<WavelengthReading> {
    let reply = driver.wavelength(handle)?;
    log::trace!("wavelength({:?}) = {:?}", handle, reply);
    if let Some(status) = Status::first_failure([reply.wavelength_status, reply.range_status]) {
        return Err(error(status))
    }
    Ok(WavelengthReading {
        wavelength: reply.wavelength,
        minimum: reply.minimum,
        maximum: reply.maximum,
    })
}

fn read_grating<D: Driver>(driver: &mut D, handle: Handle, error: fn(Status) -> Error)
        -> Result<GratingReading> {
    let reply = driver.grating(handle)?;
    log::trace!("grating({:?}) = {:?}", handle, reply);
    if let Some(status) = Status::first_failure([reply.index_status, reply.range_status,
                                                 reply.extended_range_status]) {
        return Err(error(status))
    }
    Ok(GratingReading {
        index: reply.index,
        minimum: reply.minimum,
        maximum: reply.maximum,
        extended_minimum: reply.extended_minimum,
        extended_maximum: reply.extended_maximum,
    })
}
