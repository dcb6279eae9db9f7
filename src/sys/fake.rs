//! Scriptable in-memory driver for tests.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::sync::mpsc::Receiver;

use crate::{Error, Result, Status};
use super::{Driver, GratingRangeReply, GratingReply, Handle, Sessions, SystemInfo, WavelengthReply};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call {
    Create,
    Open(u32),
    Wavelength,
    Calibrate(f64),
    Grating,
    CalibrateGrating(u32, f64),
    Close,
    Destroy,
}

/// Shared record of driver calls; stays readable after the driver moves into a filter.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count<P: Fn(&Call) -> bool>(&self, predicate: P) -> usize {
        self.0.lock().unwrap().iter().filter(|call| predicate(call)).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear()
    }
}

#[derive(Debug)]
pub struct FakeDriver {
    log: CallLog,
    next_handle: usize,
    sessions: Sessions,
    opened: Option<Handle>,

    pub create_status: Status,
    pub open_status: Status,
    pub close_status: Status,
    pub destroy_status: Status,

    pub wavelength: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub wavelength_status: Status,
    pub range_status: Status,
    pub calibrate_status: Status,
    /// Report success from calibration without actually moving.
    pub stuck: bool,

    pub grating: GratingReply,
    pub calibrate_grating_status: Status,

    /// Every call fails as if the SDK could not be reached.
    pub unreachable: bool,
    /// `wavelength` and `calibrate` block until this receives or disconnects.
    pub stall: Option<Receiver<()>>,
}

impl FakeDriver {
    /// A filter at 550 nm with a 400..1000 nm range that accepts every command.
    pub fn new() -> FakeDriver {
        FakeDriver {
            log: CallLog::default(),
            next_handle: 0x1000,
            sessions: Sessions::default(),
            opened: None,
            create_status: Status::Success,
            open_status: Status::Success,
            close_status: Status::Success,
            destroy_status: Status::Success,
            wavelength: 550.0,
            minimum: 400.0,
            maximum: 1000.0,
            wavelength_status: Status::Success,
            range_status: Status::Success,
            calibrate_status: Status::Success,
            stuck: false,
            grating: GratingReply {
                index: 1,
                minimum: 500.0,
                maximum: 700.0,
                extended_minimum: 480.0,
                extended_maximum: 720.0,
                index_status: Status::Success,
                range_status: Status::Success,
                extended_range_status: Status::Success,
            },
            calibrate_grating_status: Status::Success,
            unreachable: false,
            stall: None,
        }
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Sessions created and not yet destroyed.
    pub fn live_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn enter(&mut self, call: Call) -> Result<()> {
        self.log.push(call);
        if self.unreachable {
            return Err(Error::NotFound)
        }
        if let (Call::Wavelength | Call::Calibrate(_), Some(stall)) = (call, &self.stall) {
            let _ = stall.recv();
        }
        Ok(())
    }

    fn is_opened(&self, handle: Handle) -> bool {
        self.opened == Some(handle)
    }

    fn is_created(&self, handle: Handle) -> bool {
        self.sessions.contains(handle)
    }
}

impl Driver for FakeDriver {
    fn create(&mut self, _conffile: &Path) -> Result<(Handle, Status)> {
        self.enter(Call::Create)?;
        if !self.create_status.is_success() {
            return Ok((Handle::from_raw(0), self.create_status))
        }
        let handle = Handle::from_raw(self.next_handle);
        self.next_handle += 1;
        self.sessions.insert(handle);
        Ok((handle, Status::Success))
    }

    fn open(&mut self, handle: Handle, index: u32) -> Result<(SystemInfo, Status)> {
        self.enter(Call::Open(index))?;
        let info = SystemInfo {
            library_version: 3,
            system_count: 1,
            name: "LLTF Contrast".to_owned(),
        };
        if !self.is_created(handle) {
            return Ok((info, Status::InvalidHandle))
        }
        if self.open_status.is_success() {
            self.opened = Some(handle);
        }
        Ok((info, self.open_status))
    }

    fn wavelength(&mut self, handle: Handle) -> Result<WavelengthReply> {
        self.enter(Call::Wavelength)?;
        let (wavelength_status, range_status) = if self.is_opened(handle) {
            (self.wavelength_status, self.range_status)
        } else {
            (Status::InvalidHandle, Status::InvalidHandle)
        };
        Ok(WavelengthReply {
            wavelength: self.wavelength,
            minimum: self.minimum,
            maximum: self.maximum,
            wavelength_status,
            range_status,
        })
    }

    fn calibrate(&mut self, handle: Handle, wavelength: f64) -> Result<(f64, Status)> {
        self.enter(Call::Calibrate(wavelength))?;
        if !self.is_opened(handle) {
            return Ok((f64::NAN, Status::InvalidHandle))
        }
        if !self.calibrate_status.is_success() {
            return Ok((f64::NAN, self.calibrate_status))
        }
        if !self.stuck {
            self.wavelength = wavelength;
        }
        Ok((self.wavelength, Status::Success))
    }

    fn grating(&mut self, handle: Handle) -> Result<GratingReply> {
        self.enter(Call::Grating)?;
        if !self.is_opened(handle) {
            return Ok(GratingReply { index_status: Status::InvalidHandle, ..self.grating })
        }
        Ok(self.grating)
    }

    fn calibrate_grating(&mut self, handle: Handle, index: u32, wavelength: f64)
            -> Result<GratingRangeReply> {
        self.enter(Call::CalibrateGrating(index, wavelength))?;
        let calibration_status = if !self.is_opened(handle) {
            Status::InvalidHandle
        } else if index != self.grating.index {
            Status::InvalidGrating
        } else {
            self.calibrate_grating_status
        };
        if calibration_status.is_success() && !self.stuck {
            let half_width = (self.grating.maximum - self.grating.minimum) / 2.0;
            self.grating.minimum = wavelength - half_width;
            self.grating.maximum = wavelength + half_width;
        }
        Ok(GratingRangeReply {
            minimum: self.grating.minimum,
            maximum: self.grating.maximum,
            calibration_status,
            range_status: Status::Success,
        })
    }

    fn close(&mut self, handle: Handle) -> Result<Status> {
        self.enter(Call::Close)?;
        if !self.is_opened(handle) {
            return Ok(Status::InvalidHandle)
        }
        self.opened = None;
        Ok(self.close_status)
    }

    fn destroy(&mut self, handle: Handle) -> Result<Status> {
        self.enter(Call::Destroy)?;
        if !self.sessions.remove(handle) {
            return Ok(Status::InvalidHandle)
        }
        if self.opened == Some(handle) {
            self.opened = None;
        }
        Ok(self.destroy_status)
    }
}
