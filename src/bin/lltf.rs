//! Command-line access to the LLTF Contrast filter.
//!
//! The filter is opened for the duration of a single subcommand and always closed on exit.
//! Set `RUST_LOG=debug` to trace the SDK calls.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use lltf::{Configuration, Filter, DEFAULT_CONFFILE, DEFAULT_TIMEOUT};

#[derive(Parser, Debug)]
#[command(name = "lltf")]
#[command(about = "Query and tune the LLTF Contrast tunable filter")]
#[command(version)]
struct Args {
    /// Path to the PHySpec system description
    #[arg(long, global = true, default_value = DEFAULT_CONFFILE)]
    conffile: PathBuf,

    /// Position of the system in the system description
    #[arg(long, global = true, default_value_t = 0)]
    index: u32,

    /// Seconds to wait for each SDK call (0 waits forever)
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the central wavelength and tunable range
    GetWave,

    /// Tune the central wavelength
    SetWave {
        /// Target wavelength in nm
        wavelength: f64,
    },

    /// Print the grating in use and its wavelength ranges
    Grating,

    /// Center the grating in use on a wavelength
    SetGrating {
        /// Target central wavelength in nm
        wavelength: f64,
    },
}

fn main() -> lltf::Result<()> {
    env_logger::init();

    let Args { conffile, index, timeout, command } = Args::parse();
    let config = Configuration {
        conffile,
        index,
        timeout: (timeout > 0).then(|| Duration::from_secs(timeout)),
    };

    let result = Filter::with(&config, |filter| {
        if let Some(info) = filter.system_info() {
            log::info!("connected to {:?} (library version {}, {} system(s))",
                       info.name, info.library_version, info.system_count);
        }
        match command {
            Command::GetWave => {
                let reading = filter.wavelength()?;
                println!("central wavelength: {} nm", reading.wavelength);
                println!("wavelength range:   {} nm to {} nm", reading.minimum, reading.maximum);
            }
            Command::SetWave { wavelength } => {
                let reading = filter.set_wavelength(wavelength)?;
                println!("central wavelength: {} nm", reading.wavelength);
            }
            Command::Grating => {
                let reading = filter.grating()?;
                println!("grating:            {}", reading.index);
                println!("wavelength range:   {} nm to {} nm", reading.minimum, reading.maximum);
                println!("extended range:     {} nm to {} nm",
                         reading.extended_minimum, reading.extended_maximum);
                println!("central wavelength: {} nm", reading.central());
            }
            Command::SetGrating { wavelength } => {
                let reading = filter.set_grating_wavelength(wavelength)?;
                println!("wavelength range:   {} nm to {} nm", reading.minimum, reading.maximum);
                println!("central wavelength: {} nm", reading.central());
            }
        }
        Ok(())
    });

    match result {
        Err(error) if error.is_informational() => {
            println!("{}", error);
            Ok(())
        }
        result => result,
    }
}
