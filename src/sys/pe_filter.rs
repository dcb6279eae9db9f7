use std::ffi::CString;
use std::path::Path;
use std::ptr;

use libc::{c_char, c_double, c_int, c_void};

use crate::{Error, Result, Status};
use super::{GratingRangeReply, GratingReply, Handle, Sessions, SystemInfo, WavelengthReply};

const NAME_LEN: usize = 256;

type PeHandle = *mut c_void;

#[link(name = "PE_Filter_SDK")]
extern "system" {
    fn PE_GetLibraryVersion() -> c_int;
    fn PE_Create(conffile: *const c_char, handle: *mut PeHandle) -> c_int;
    fn PE_Destroy(handle: PeHandle) -> c_int;
    fn PE_GetSystemCount(handle: PeHandle) -> c_int;
    fn PE_GetSystemName(handle: PeHandle, index: c_int, name: *mut c_char, size: c_int) -> c_int;
    fn PE_Open(handle: PeHandle, name: *const c_char) -> c_int;
    fn PE_Close(handle: PeHandle) -> c_int;
    fn PE_GetWavelength(handle: PeHandle, wavelength: *mut c_double) -> c_int;
    fn PE_SetWavelength(handle: PeHandle, wavelength: c_double) -> c_int;
    fn PE_GetWavelengthRange(handle: PeHandle, minimum: *mut c_double, maximum: *mut c_double)
        -> c_int;
    fn PE_GetGrating(handle: PeHandle, grating: *mut c_int) -> c_int;
    fn PE_GetGratingWavelengthRange(handle: PeHandle, grating: c_int,
        minimum: *mut c_double, maximum: *mut c_double) -> c_int;
    fn PE_GetGratingWavelengthExtendedRange(handle: PeHandle, grating: c_int,
        extended_minimum: *mut c_double, extended_maximum: *mut c_double) -> c_int;
    fn PE_SetWavelengthOnGrating(handle: PeHandle, grating: c_int, wavelength: c_double) -> c_int;
}

fn pe_handle(handle: Handle) -> PeHandle {
    handle.into_raw() as PeHandle
}

fn conffile_cstring(conffile: &Path) -> Result<CString> {
    conffile.to_str()
        .and_then(|conffile| CString::new(conffile).ok())
        .ok_or_else(|| Error::InvalidPath(conffile.to_owned()))
}

fn name_from_buffer(buffer: &[c_char]) -> String {
    let bytes = buffer.iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect::<Vec<_>>();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Binding to `PE_Filter_SDK`. The library keeps all session state behind the handle; this type
/// only remembers which handles it issued, and refuses any other.
#[derive(Debug)]
pub struct FilterDriverImpl {
    sessions: Sessions,
}

impl FilterDriverImpl {
    pub fn new() -> Result<FilterDriverImpl> {
        // SAFETY: Takes no arguments and has no preconditions.
        let version = unsafe { PE_GetLibraryVersion() };
        log::debug!("PE_Filter_SDK version {}", version);
        Ok(FilterDriverImpl { sessions: Sessions::default() })
    }
}

impl super::Driver for FilterDriverImpl {
    fn create(&mut self, conffile: &Path) -> Result<(Handle, Status)> {
        let conffile = conffile_cstring(conffile)?;
        let mut pe_handle: PeHandle = ptr::null_mut();
        // SAFETY: `conffile` is NUL-terminated and outlives the call; `pe_handle` is a valid
        // out pointer.
        let status = Status::from_raw(unsafe { PE_Create(conffile.as_ptr(), &mut pe_handle) });
        let handle = Handle::from_raw(pe_handle as usize);
        if status.is_success() {
            self.sessions.insert(handle);
        }
        Ok((handle, status))
    }

    fn open(&mut self, handle: Handle, index: u32) -> Result<(SystemInfo, Status)> {
        if let Err(status) = self.sessions.status(handle).check() {
            return Ok((SystemInfo::default(), status))
        }
        let mut name = [0 as c_char; NAME_LEN];
        // SAFETY: `handle` is live (checked above); `name` is writable for `NAME_LEN` bytes.
        let (library_version, system_count, name_status) = unsafe {
            let library_version = PE_GetLibraryVersion();
            let system_count = PE_GetSystemCount(pe_handle(handle));
            let name_status = PE_GetSystemName(pe_handle(handle), index as c_int,
                                               name.as_mut_ptr(), NAME_LEN as c_int);
            (library_version, system_count, Status::from_raw(name_status))
        };
        // the SDK may fill the whole buffer without a terminator
        name[NAME_LEN - 1] = 0;
        let info = SystemInfo {
            library_version,
            system_count: system_count.max(0) as u32,
            name: name_from_buffer(&name),
        };
        if !name_status.is_success() {
            return Ok((info, name_status))
        }
        // SAFETY: `name` is NUL-terminated above.
        let status = unsafe { PE_Open(pe_handle(handle), name.as_ptr()) };
        Ok((info, Status::from_raw(status)))
    }

    fn wavelength(&mut self, handle: Handle) -> Result<WavelengthReply> {
        if let Err(status) = self.sessions.status(handle).check() {
            return Ok(WavelengthReply {
                wavelength: f64::NAN,
                minimum: f64::NAN,
                maximum: f64::NAN,
                wavelength_status: status,
                range_status: status,
            })
        }
        let (mut wavelength, mut minimum, mut maximum) = (0.0, 0.0, 0.0);
        // SAFETY: All out pointers refer to live locals.
        let (wavelength_status, range_status) = unsafe {
            (PE_GetWavelength(pe_handle(handle), &mut wavelength),
             PE_GetWavelengthRange(pe_handle(handle), &mut minimum, &mut maximum))
        };
        Ok(WavelengthReply {
            wavelength,
            minimum,
            maximum,
            wavelength_status: Status::from_raw(wavelength_status),
            range_status: Status::from_raw(range_status),
        })
    }

    fn calibrate(&mut self, handle: Handle, wavelength: f64) -> Result<(f64, Status)> {
        if let Err(status) = self.sessions.status(handle).check() {
            return Ok((f64::NAN, status))
        }
        // SAFETY: `handle` is live (checked above).
        let status = Status::from_raw(unsafe { PE_SetWavelength(pe_handle(handle), wavelength) });
        if !status.is_success() {
            return Ok((f64::NAN, status))
        }
        let mut achieved = 0.0;
        // SAFETY: `achieved` is a valid out pointer.
        let status = unsafe { PE_GetWavelength(pe_handle(handle), &mut achieved) };
        Ok((achieved, Status::from_raw(status)))
    }

    fn grating(&mut self, handle: Handle) -> Result<GratingReply> {
        if let Err(status) = self.sessions.status(handle).check() {
            return Ok(GratingReply {
                index: 0,
                minimum: f64::NAN,
                maximum: f64::NAN,
                extended_minimum: f64::NAN,
                extended_maximum: f64::NAN,
                index_status: status,
                range_status: status,
                extended_range_status: status,
            })
        }
        let mut index: c_int = 0;
        let (mut minimum, mut maximum) = (0.0, 0.0);
        let (mut extended_minimum, mut extended_maximum) = (0.0, 0.0);
        // SAFETY: All out pointers refer to live locals.
        let (index_status, range_status, extended_range_status) = unsafe {
            let index_status = PE_GetGrating(pe_handle(handle), &mut index);
            let range_status = PE_GetGratingWavelengthRange(pe_handle(handle), index,
                                                            &mut minimum, &mut maximum);
            let extended_range_status = PE_GetGratingWavelengthExtendedRange(
                pe_handle(handle), index, &mut extended_minimum, &mut extended_maximum);
            (index_status, range_status, extended_range_status)
        };
        Ok(GratingReply {
            index: index.max(0) as u32,
            minimum,
            maximum,
            extended_minimum,
            extended_maximum,
            index_status: Status::from_raw(index_status),
            range_status: Status::from_raw(range_status),
            extended_range_status: Status::from_raw(extended_range_status),
        })
    }

    fn calibrate_grating(&mut self, handle: Handle, index: u32, wavelength: f64)
            -> Result<GratingRangeReply> {
        if let Err(status) = self.sessions.status(handle).check() {
            return Ok(GratingRangeReply {
                minimum: f64::NAN,
                maximum: f64::NAN,
                calibration_status: status,
                range_status: status,
            })
        }
        let (mut minimum, mut maximum) = (0.0, 0.0);
        // SAFETY: `handle` is live (checked above); out pointers refer to live locals.
        let (calibration_status, range_status) = unsafe {
            let calibration_status =
                PE_SetWavelengthOnGrating(pe_handle(handle), index as c_int, wavelength);
            let range_status = PE_GetGratingWavelengthRange(pe_handle(handle), index as c_int,
                                                            &mut minimum, &mut maximum);
            (calibration_status, range_status)
        };
        Ok(GratingRangeReply {
            minimum,
            maximum,
            calibration_status: Status::from_raw(calibration_status),
            range_status: Status::from_raw(range_status),
        })
    }

    fn close(&mut self, handle: Handle) -> Result<Status> {
        if let Err(status) = self.sessions.status(handle).check() {
            return Ok(status)
        }
        // SAFETY: `handle` was issued by `PE_Create` and not yet destroyed.
        Ok(Status::from_raw(unsafe { PE_Close(pe_handle(handle)) }))
    }

    fn destroy(&mut self, handle: Handle) -> Result<Status> {
        if !self.sessions.remove(handle) {
            return Ok(Status::InvalidHandle)
        }
        // SAFETY: `handle` was issued by `PE_Create`; it is forgotten above, so it is never
        // passed to the SDK again.
        Ok(Status::from_raw(unsafe { PE_Destroy(pe_handle(handle)) }))
    }
}
