//! Connection settings for a filter.

use std::path::PathBuf;
use std::time::Duration;

/// Where PHySpec installs the system description on the control PC.
pub const DEFAULT_CONFFILE: &str = r"C:\Program Files (x86)\Photon etc\PHySpecV2\system.xml";

/// Hardware calls normally complete in well under a second; tuning across the full range is
/// the slowest operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Path to the system description file. Passed to the SDK as-is.
    pub conffile: PathBuf,
    /// Position of the system among those described by `conffile`.
    pub index: u32,
    /// Upper bound on a single driver call. `None` or zero waits forever.
    pub timeout: Option<Duration>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            conffile: PathBuf::from(DEFAULT_CONFFILE),
            index: 0,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl Configuration {
    pub fn with_conffile<P: Into<PathBuf>>(conffile: P) -> Self {
        Self { conffile: conffile.into(), ..Default::default() }
    }
}
