//! Snapshots of the filter state as reported by the SDK. All values are in nanometers.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavelengthReading {
    /// Central wavelength of the passband.
    pub wavelength: f64,
    /// Lower end of the tunable range.
    pub minimum: f64,
    /// Upper end of the tunable range.
    pub maximum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GratingReading {
    /// Index of the grating currently in use.
    pub index: u32,
    pub minimum: f64,
    pub maximum: f64,
    /// Range reachable by the grating with reduced performance.
    pub extended_minimum: f64,
    pub extended_maximum: f64,
}

impl GratingReading {
    /// Midpoint of the grating's nominal range.
    pub fn central(&self) -> f64 {
        (self.maximum - self.minimum) / 2.0 + self.minimum
    }
}
