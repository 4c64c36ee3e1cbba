//! NES CLI - Command line interface for NES emulator
//!
//! Runs a cartridge headless through the same driver the windowed front-ends use:
//! the given keys are held for every frame, and the exit key is pressed once the
//! frame count is reached.

use std::convert::Infallible;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nes_core::Nes;
use nes_frontend::rom::{self, RomSource};
use nes_frontend::{
    Driver, DriverConfig, FrontendError, Key, KeyState, PixelBuffer, Stop, Surface, Tick,
    SCREEN_HEIGHT, SCREEN_WIDTH,
};

/// NES Emulator CLI
#[derive(Parser, Debug)]
#[command(name = "nes-cli")]
#[command(about = "A NES emulator CLI", long_about = None)]
struct Args {
    /// Path to the iNES ROM file
    #[arg(short, long)]
    rom: PathBuf,

    /// Number of frames to run
    #[arg(short, long, default_value = "60")]
    frames: u64,

    /// Key to hold for the whole run, by KeyboardEvent.code name (e.g. Enter, KeyZ)
    #[arg(long = "hold", value_name = "KEY", value_parser = parse_key)]
    hold: Vec<Key>,

    /// Write the last frame to this PNG file
    #[arg(short, long, value_name = "PATH")]
    screenshot: Option<PathBuf>,

    /// Dump CPU state after execution
    #[arg(short = 'c', long)]
    dump_cpu: bool,

    /// Dump PPU state after execution
    #[arg(short = 'p', long)]
    dump_ppu: bool,
}

fn parse_key(code: &str) -> Result<Key, String> {
    Key::from_code(code).ok_or_else(|| format!("unknown key code `{code}`"))
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Frontend(#[from] FrontendError),
    #[error("{}: {source}", path.display())]
    Screenshot {
        path: PathBuf,
        source: png::EncodingError,
    },
}

/// Discards frames; the driver keeps the last one for the screenshot.
#[derive(Debug, Default)]
struct Headless {
    submitted: u64,
}

impl Surface for Headless {
    type Error = Infallible;

    fn submit(&mut self, pixels: &[u32]) -> Result<(), Self::Error> {
        debug_assert_eq!(pixels.len(), SCREEN_WIDTH * SCREEN_HEIGHT);
        self.submitted += 1;
        Ok(())
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let outcome = run(&args);
    if let Err(error) = &outcome {
        error!("{error}");
    }
    ExitCode::from(exit_status(&outcome))
}

/// Process exit status: the driver's stop reason, or 1 for any error.
fn exit_status(outcome: &Result<Stop, CliError>) -> u8 {
    match outcome {
        Ok(stop) => stop.status(),
        Err(_) => Stop::Fatal.status(),
    }
}

fn run(args: &Args) -> Result<Stop, CliError> {
    let rom = rom::load(RomSource::Path(args.rom.clone())).map_err(FrontendError::from)?;
    let config = DriverConfig::default();
    let exit_key = config.exit_key;
    let mut driver: Driver<Nes, _> = Driver::start(rom, Headless::default(), config)?;

    let keys = KeyState::new();
    for &key in &args.hold {
        keys.set(key, true);
    }

    println!("Running {} frames...", args.frames);
    let stop = loop {
        if driver.frames() == args.frames {
            keys.set(exit_key, true);
        }
        if let Tick::Stopped(stop) = driver.tick(&keys)? {
            break stop;
        }
    };
    println!(
        "Completed {} frames ({} presented).",
        driver.frames(),
        driver.surface().submitted
    );

    if args.dump_cpu {
        dump_cpu_state(driver.engine());
    }
    if args.dump_ppu {
        dump_ppu_state(driver.engine());
    }
    if let Some(path) = &args.screenshot {
        write_png(path, driver.last_frame()).map_err(|source| CliError::Screenshot {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "screenshot written");
    }

    Ok(stop)
}

fn write_png(path: &Path, frame: &PixelBuffer) -> Result<(), png::EncodingError> {
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        SCREEN_WIDTH as u32,
        SCREEN_HEIGHT as u32,
    );
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&frame.to_rgba_bytes())?;
    Ok(())
}

fn dump_cpu_state(nes: &Nes) {
    let cpu = nes.cpu();
    let registers = cpu.registers();
    println!("\nCPU State:");
    println!("  PC: ${:04X}", registers.pc);
    println!("  A:  ${:02X}", registers.a);
    println!("  X:  ${:02X}", registers.x);
    println!("  Y:  ${:02X}", registers.y);
    println!("  SP: ${:02X}", registers.sp);
    println!("  P:  {}", cpu.status());
    println!("  Cycles: {}", cpu.total_cycles());
}

fn dump_ppu_state(nes: &Nes) {
    let Some(bus) = nes.bus() else {
        return;
    };
    let status = bus.ppu().status();
    println!("\nPPU State:");
    println!("  Frames: {}", nes.frame_count());
    println!("  VBlank: {}", status.vblank());
    println!("  Sprite 0 hit: {}", status.sprite_zero_hit());
    println!("  Sprite overflow: {}", status.sprite_overflow());
}

#[cfg(test)]
mod tests {
    use super::*;
    use nes_core::cartridge::{CHR_BANK_SIZE, HEADER_SIZE, PRG_BANK_SIZE};
    use nes_core::palette;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("nes-cli-{}-{name}", std::process::id()))
    }

    /// NROM image with `program` at $8000, which is also the reset vector.
    fn write_rom(path: &Path, program: &[u8]) {
        let mut rom = vec![0u8; HEADER_SIZE + PRG_BANK_SIZE + CHR_BANK_SIZE];
        rom[..4].copy_from_slice(b"NES\x1A");
        rom[4] = 1;
        rom[5] = 1;
        rom[HEADER_SIZE..HEADER_SIZE + program.len()].copy_from_slice(program);
        rom[HEADER_SIZE + 0x3FFD] = 0x80;
        std::fs::write(path, rom).unwrap();
    }

    /// Sets the backdrop to palette entry $21 and spins.
    const BACKDROP: [u8; 18] = [
        0xA9, 0x3F, 0x8D, 0x06, 0x20, 0xA9, 0x00, 0x8D, 0x06, 0x20, //
        0xA9, 0x21, 0x8D, 0x07, 0x20, 0x4C, 0x0F, 0x80,
    ];

    fn args(rom: PathBuf) -> Args {
        Args {
            rom,
            frames: 3,
            hold: Vec::new(),
            screenshot: None,
            dump_cpu: false,
            dump_ppu: false,
        }
    }

    #[test]
    fn parses_key_codes() {
        assert_eq!(parse_key("KeyZ"), Ok(Key::Z));
        assert!(parse_key("Hyper").is_err());
    }

    #[test]
    fn runs_requested_frames_and_captures() {
        let rom = temp_path("backdrop.nes");
        let shot = temp_path("backdrop.png");
        write_rom(&rom, &BACKDROP);

        let mut args = args(rom.clone());
        args.hold = vec![Key::Enter];
        args.screenshot = Some(shot.clone());
        let outcome = run(&args);
        assert!(matches!(outcome, Ok(Stop::Terminated)));
        assert_eq!(exit_status(&outcome), 0);

        let decoder = png::Decoder::new(File::open(&shot).unwrap());
        let mut reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().width, SCREEN_WIDTH as u32);
        assert_eq!(reader.info().height, SCREEN_HEIGHT as u32);

        let mut image = vec![0; reader.output_buffer_size()];
        reader.next_frame(&mut image).unwrap();
        let backdrop = palette::color(0x21);
        let last = image.len() - 4;
        for offset in [0, last] {
            assert_eq!(
                image[offset..offset + 4],
                [backdrop.r, backdrop.g, backdrop.b, backdrop.a]
            );
        }

        std::fs::remove_file(rom).unwrap();
        std::fs::remove_file(shot).unwrap();
    }

    #[test]
    fn missing_rom_is_an_error() {
        let outcome = run(&args(temp_path("missing.nes")));
        assert_eq!(exit_status(&outcome), 1);
        assert!(outcome.unwrap_err().to_string().contains("missing.nes"));
    }

    #[test]
    fn invalid_opcode_fails_the_first_frame() {
        let rom = temp_path("halt.nes");
        write_rom(&rom, &[0x02]);

        let outcome = run(&args(rom.clone()));
        assert!(matches!(
            outcome,
            Err(CliError::Frontend(FrontendError::Step { frame: 1, .. }))
        ));
        assert_eq!(exit_status(&outcome), 1);

        std::fs::remove_file(rom).unwrap();
    }
}
