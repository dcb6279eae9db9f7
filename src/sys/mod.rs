use std::path::Path;

use crate::{Result, Status};

/// Opaque reference to an SDK session, issued by `Driver::create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

impl Handle {
    #[cfg(any(test, feature = "hardware"))]
    pub(crate) fn from_raw(raw: usize) -> Handle {
        Handle(raw)
    }

    #[cfg(feature = "hardware")]
    pub(crate) fn into_raw(self) -> usize {
        self.0
    }
}

/// Handles issued by `create` and not yet passed to `destroy`.
///
/// Backends consult this before handing a handle to the SDK, so a stale or foreign handle is
/// reported as `Status::InvalidHandle` instead of reaching native code.
#[cfg(any(test, feature = "hardware"))]
#[derive(Debug, Default)]
pub(crate) struct Sessions {
    live: Vec<Handle>,
}

#[cfg(any(test, feature = "hardware"))]
impl Sessions {
    pub fn insert(&mut self, handle: Handle) {
        if !self.live.contains(&handle) {
            self.live.push(handle);
        }
    }

    /// Returns whether `handle` was live.
    pub fn remove(&mut self, handle: Handle) -> bool {
        let count = self.live.len();
        self.live.retain(|&live| live != handle);
        self.live.len() != count
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.live.contains(&handle)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// `Success` if `handle` is live, `InvalidHandle` otherwise.
    pub fn status(&self, handle: Handle) -> Status {
        if self.contains(handle) { Status::Success } else { Status::InvalidHandle }
    }
}

/// Identification reported by the SDK while a system is being opened.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemInfo {
    pub library_version: i32,
    /// Number of systems described by the configuration file.
    pub system_count: u32,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavelengthReply {
    pub wavelength: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub wavelength_status: Status,
    pub range_status: Status,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GratingReply {
    pub index: u32,
    pub minimum: f64,
    pub maximum: f64,
    pub extended_minimum: f64,
    pub extended_maximum: f64,
    pub index_status: Status,
    pub range_status: Status,
    pub extended_range_status: Status,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GratingRangeReply {
    pub minimum: f64,
    pub maximum: f64,
    pub calibration_status: Status,
    pub range_status: Status,
}

/// Blocking access to the filter SDK. Not exported; `Filter` is the sole holder of the handles a
/// driver issues.
///
/// Statuses reported by the SDK are returned in the `Ok` value and interpreted by the caller.
/// `Err` is reserved for failures to reach the SDK at all.
pub trait Driver {
    fn create(&mut self, conffile: &Path) -> Result<(Handle, Status)>;
    fn open(&mut self, handle: Handle, index: u32) -> Result<(SystemInfo, Status)>;
    fn wavelength(&mut self, handle: Handle) -> Result<WavelengthReply>;
    /// Tunes the filter and returns the wavelength it settled at.
    fn calibrate(&mut self, handle: Handle, wavelength: f64) -> Result<(f64, Status)>;
    fn grating(&mut self, handle: Handle) -> Result<GratingReply>;
    fn calibrate_grating(&mut self, handle: Handle, index: u32, wavelength: f64)
        -> Result<GratingRangeReply>;
    fn close(&mut self, handle: Handle) -> Result<Status>;
    fn destroy(&mut self, handle: Handle) -> Result<Status>;
}

#[cfg(feature = "hardware")]
#[path = "pe_filter.rs"]
pub mod imp;

#[cfg(not(feature = "hardware"))]
#[path = "stub.rs"]
pub mod imp;

pub mod watchdog;

#[cfg(test)]
pub(crate) mod fake;
