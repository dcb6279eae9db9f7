use std::path::Path;

use crate::{Error, Result, Status};
use super::{GratingRangeReply, GratingReply, Handle, SystemInfo, WavelengthReply};

/// Stands in for the SDK when the crate is built without the `hardware` feature.
#[derive(Debug)]
pub struct FilterDriverImpl {
    _private: (),
}

impl FilterDriverImpl {
    pub fn new() -> Result<FilterDriverImpl> {
        log::debug!("built without the `hardware` feature; no filter SDK available");
        Err(Error::NotFound)
    }
}

impl super::Driver for FilterDriverImpl {
    fn create(&mut self, _conffile: &Path) -> Result<(Handle, Status)> {
        Err(Error::NotFound)
    }

    fn open(&mut self, _handle: Handle, _index: u32) -> Result<(SystemInfo, Status)> {
        Err(Error::NotFound)
    }

    fn wavelength(&mut self, _handle: Handle) -> Result<WavelengthReply> {
        Err(Error::NotFound)
    }

    fn calibrate(&mut self, _handle: Handle, _wavelength: f64) -> Result<(f64, Status)> {
        Err(Error::NotFound)
    }

    fn grating(&mut self, _handle: Handle) -> Result<GratingReply> {
        Err(Error::NotFound)
    }

    fn calibrate_grating(&mut self, _handle: Handle, _index: u32, _wavelength: f64)
            -> Result<GratingRangeReply> {
        Err(Error::NotFound)
    }

    fn close(&mut self, _handle: Handle) -> Result<Status> {
        Err(Error::NotFound)
    }

    fn destroy(&mut self, _handle: Handle) -> Result<Status> {
        Err(Error::NotFound)
    }
}
