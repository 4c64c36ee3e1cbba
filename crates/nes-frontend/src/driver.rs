//! The frame driver
//!
//! A [`Driver`] owns the engine and the host surface. The host calls [`Driver::tick`]
//! once per displayed frame; each tick samples the keys, steps the engine one frame and
//! presents it, until the exit key, [`Driver::terminate`] or a failure stops it. Once
//! stopped the driver stays stopped. The engine is dropped with the driver.

use tracing::{debug, info, warn};

use nes_core::Emulator;

use crate::error::FrontendError;
use crate::input::Bindings;
use crate::key::{Key, KeyState};
use crate::present::{PixelBuffer, Presenter, Surface};
use crate::rom::Rom;

/// Startup-time settings; nothing here changes while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub bindings: Bindings,
    /// Stops the driver; never reaches the controller.
    pub exit_key: Key,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            bindings: Bindings::default(),
            exit_key: Key::Escape,
        }
    }
}

/// Why a driver stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// Exit key or host request
    Terminated,
    /// Engine or surface failure
    Fatal,
}

impl Stop {
    /// Process exit status for this outcome.
    pub fn status(self) -> u8 {
        match self {
            Stop::Terminated => 0,
            Stop::Fatal => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Cartridge loaded, no tick yet
    Loaded,
    Running,
    Stopped(Stop),
}

/// What the host should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Schedule exactly one more tick.
    Continue,
    Stopped(Stop),
}

pub struct Driver<E: Emulator, S: Surface> {
    engine: E,
    surface: S,
    presenter: Presenter,
    config: DriverConfig,
    state: State,
    frames: u64,
    rom_name: String,
}

impl<E: Emulator, S: Surface> Driver<E, S> {
    /// Construct the engine and load `rom` into it. The ROM bytes are released once the
    /// engine has them.
    pub fn start(rom: Rom, surface: S, config: DriverConfig) -> Result<Self, FrontendError> {
        let mut engine = E::new().map_err(|error| FrontendError::Init(Box::new(error)))?;
        engine.load(rom.bytes()).map_err(|error| FrontendError::Load {
            rom: rom.name().to_owned(),
            source: Box::new(error),
        })?;
        info!(rom = rom.name(), bytes = rom.len(), "engine loaded");
        let rom_name = rom.name().to_owned();
        drop(rom);

        Ok(Self {
            engine,
            surface,
            presenter: Presenter::new(),
            config,
            state: State::Loaded,
            frames: 0,
            rom_name,
        })
    }

    /// Run one host frame.
    pub fn tick(&mut self, keys: &KeyState) -> Result<Tick, FrontendError> {
        match self.state {
            State::Stopped(stop) => return Ok(Tick::Stopped(stop)),
            State::Loaded => {
                debug!(rom = %self.rom_name, "driver running");
                self.state = State::Running;
            }
            State::Running => {}
        }

        let snapshot = keys.snapshot();
        if snapshot.is_pressed(self.config.exit_key) {
            return Ok(Tick::Stopped(self.stop(Stop::Terminated)));
        }

        let input = self.config.bindings.map(&snapshot);
        self.engine.set_input(input, None);

        let frame = self.frames + 1;
        if let Err(error) = self.engine.step_frame() {
            self.stop(Stop::Fatal);
            return Err(FrontendError::Step {
                frame,
                source: Box::new(error),
            });
        }

        if let Err(error) = self.presenter.present(&self.engine, &mut self.surface) {
            self.stop(Stop::Fatal);
            return Err(FrontendError::Present {
                frame,
                source: Box::new(error),
            });
        }

        self.frames = frame;
        Ok(Tick::Continue)
    }

    /// Stop as if the exit key had been pressed, e.g. because the window closed.
    pub fn terminate(&mut self) -> Stop {
        match self.state {
            State::Stopped(stop) => stop,
            _ => self.stop(Stop::Terminated),
        }
    }

    fn stop(&mut self, stop: Stop) -> Stop {
        match stop {
            Stop::Terminated => info!(frames = self.frames, "driver terminated"),
            Stop::Fatal => warn!(frames = self.frames, "driver stopped after a failure"),
        }
        self.state = State::Stopped(stop);
        stop
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Frames stepped and presented so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The last frame handed to the surface.
    pub fn last_frame(&self) -> &PixelBuffer {
        self.presenter.buffer()
    }

    pub fn rom_name(&self) -> &str {
        &self.rom_name
    }
}
