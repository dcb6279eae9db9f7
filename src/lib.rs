//! Control of the Photon etc. LLTF Contrast tunable bandpass filter through the vendor
//! `PE_Filter_SDK` library.
//!
//! A [`Filter`] owns at most one SDK session. Queries and calibration open a session on demand
//! and tear it down again if they fail; successful calls leave it open for the next one.

mod sys;
mod status;
mod config;
mod reading;
mod filter;

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The SDK is not available in this build or the filter could not be reached.
    NotFound,
    /// The configuration file path cannot be passed to the SDK.
    InvalidPath(PathBuf),
    /// A driver call did not return within the configured timeout.
    Timeout,
    /// Creating or opening the session failed; no session is held.
    Connection(Status),
    /// A session is already held; nothing was done.
    AlreadyOpen,
    /// Closing or destroying the session failed; the session is forgotten regardless.
    Disconnection(Status),
    /// Reading the wavelength or range failed.
    Query(Status),
    /// Reading the pre-calibration state or tuning the filter failed.
    Calibration(Status),
    /// The filter is already tuned to the requested wavelength; nothing was done.
    AlreadyCalibrated { wavelength: f64 },
    /// The SDK reported success but the filter stayed at `wavelength`.
    CalibrationIneffective { wavelength: f64 },
}

impl Error {
    /// Whether the error only reports that no work was needed.
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::AlreadyOpen | Self::AlreadyCalibrated { .. })
    }

    /// The SDK status that caused the error, if any.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Connection(status) |
            Self::Disconnection(status) |
            Self::Query(status) |
            Self::Calibration(status) => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotFound =>
                write!(f, "filter SDK not available"),
            Self::InvalidPath(path) =>
                write!(f, "configuration file path {:?} cannot be passed to the SDK", path),
            Self::Timeout =>
                write!(f, "filter did not respond in time"),
            Self::Connection(status) =>
                write!(f, "could not connect to filter: {}", status),
            Self::AlreadyOpen =>
                write!(f, "filter already open"),
            Self::Disconnection(status) =>
                write!(f, "could not disconnect from filter: {}", status),
            Self::Query(status) =>
                write!(f, "could not retrieve wavelength: {}", status),
            Self::Calibration(status) =>
                write!(f, "could not calibrate wavelength: {}", status),
            Self::AlreadyCalibrated { wavelength } =>
                write!(f, "already calibrated to {} nm", wavelength),
            Self::CalibrationIneffective { wavelength } =>
                write!(f, "calibration did not occur, still at {} nm", wavelength),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use status::Status;

pub use config::{
    Configuration,
    DEFAULT_CONFFILE,
    DEFAULT_TIMEOUT,
};

pub use reading::{
    WavelengthReading,
    GratingReading,
};

pub use sys::{
    Handle,
    SystemInfo,
};

/// Filter bound to the vendor SDK, with each call bounded by `Configuration::timeout`.
pub type Filter =
    filter::Filter<sys::watchdog::Watchdog<sys::imp::FilterDriverImpl>>;
