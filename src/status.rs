use std::fmt;

use libc::c_int;

/// Outcome of a single call into the filter SDK.
///
/// Only `Success` means the call did what was asked; every other value is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Success                 = 0,
    InvalidHandle           = 1,
    Failure                 = 2,
    MissingConfigFile       = 3,
    InvalidConfiguration    = 4,
    InvalidWavelength       = 5,
    MissingHarmonicFilter   = 6,
    InvalidFilter           = 7,
    Unknown                 = 8,
    InvalidGrating          = 9,
    InvalidBuffer           = 10,
    InvalidBufferSize       = 11,
    UnsupportedConfiguration = 12,
    NoFilterConnected       = 13,
}

impl Status {
    pub const ALL: [Status; 14] = [
        Status::Success,
        Status::InvalidHandle,
        Status::Failure,
        Status::MissingConfigFile,
        Status::InvalidConfiguration,
        Status::InvalidWavelength,
        Status::MissingHarmonicFilter,
        Status::InvalidFilter,
        Status::Unknown,
        Status::InvalidGrating,
        Status::InvalidBuffer,
        Status::InvalidBufferSize,
        Status::UnsupportedConfiguration,
        Status::NoFilterConnected,
    ];

    /// Converts a raw `PE_STATUS` value. Codes the SDK is not documented to return map to
    /// `Unknown`.
    pub fn from_raw(code: c_int) -> Status {
        match Status::ALL.iter().find(|status| **status as c_int == code) {
            Some(&status) => status,
            None => {
                log::trace!("unrecognized status code {}", code);
                Status::Unknown
            }
        }
    }

    pub fn as_raw(self) -> c_int {
        self as c_int
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }

    /// Turns a status into a `Result`, keeping the failing status as the error.
    pub fn check(self) -> Result<(), Status> {
        if self.is_success() { Ok(()) } else { Err(self) }
    }

    /// Returns the first failing status, if any.
    pub fn first_failure<I: IntoIterator<Item = Status>>(statuses: I) -> Option<Status> {
        statuses.into_iter().find(|status| !status.is_success())
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Success                  => "success",
            Self::InvalidHandle            => "invalid handle",
            Self::Failure                  => "failure",
            Self::MissingConfigFile        => "configuration file is missing",
            Self::InvalidConfiguration     => "invalid configuration",
            Self::InvalidWavelength        => "wavelength is out of range",
            Self::MissingHarmonicFilter    => "harmonic filter is missing",
            Self::InvalidFilter            => "invalid filter",
            Self::Unknown                  => "unknown status",
            Self::InvalidGrating           => "invalid grating",
            Self::InvalidBuffer            => "invalid buffer",
            Self::InvalidBufferSize        => "invalid buffer size",
            Self::UnsupportedConfiguration => "configuration is not supported",
            Self::NoFilterConnected        => "no filter connected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (PE_STATUS {})", self.description(), self.as_raw())
    }
}
