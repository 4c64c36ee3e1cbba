//! NES Desktop - Desktop NES emulator with minifb rendering
//!
//! `nes [ROM]` opens a window and runs the cartridge until Escape is pressed or the
//! window is closed. Without a ROM argument a file picker is shown first.

mod keymap;
mod surface;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nes_core::Nes;
use nes_frontend::rom::{self, RomSource};
use nes_frontend::{Driver, DriverConfig, FrontendError, KeyState, Stop, Tick};

use crate::surface::{WindowError, WindowSurface};

/// NES Emulator Desktop App
#[derive(Parser, Debug)]
#[command(name = "nes")]
#[command(about = "A NES emulator desktop app", long_about = None)]
struct Args {
    /// Path to the iNES ROM file (a file picker opens when omitted)
    rom: Option<PathBuf>,

    /// Screen scale factor (1-4)
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=4))]
    scale: u8,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Frontend(#[from] FrontendError),
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let stop = run(&args).unwrap_or_else(|error| {
        error!("{error}");
        Stop::Fatal
    });
    ExitCode::from(stop.status())
}

fn run(args: &Args) -> Result<Stop, AppError> {
    let mut window = WindowSurface::open(usize::from(args.scale))?;
    let source = match &args.rom {
        Some(path) => RomSource::Path(path.clone()),
        None => RomSource::Picker(&mut window),
    };
    let rom = rom::load(source).map_err(FrontendError::from)?;

    let keys = KeyState::new();
    let mut driver: Driver<Nes, _> = Driver::start(rom, window, DriverConfig::default())?;
    info!("Press ESC or close the window to exit.");

    loop {
        if !driver.surface().is_open() {
            return Ok(driver.terminate());
        }
        driver.surface_mut().pump_keys(&keys);
        match driver.tick(&keys)? {
            Tick::Continue => {}
            Tick::Stopped(stop) => return Ok(stop),
        }
    }
}
