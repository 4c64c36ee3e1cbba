//! Driver tests against a scripted engine and a recording surface

use std::cell::{Cell, RefCell};
use std::fmt;

use nes_frontend::{
    Color, ControllerInput, Driver, DriverConfig, Emulator, ErrorKind, FrontendError, Key,
    KeyState, Rom, State, Stop, Surface, Tick, SCREEN_HEIGHT, SCREEN_WIDTH,
};

thread_local! {
    static FAIL_NEW: Cell<bool> = const { Cell::new(false) };
    static FAIL_STEP_AT: Cell<Option<u64>> = const { Cell::new(None) };
    static DROPS: Cell<usize> = const { Cell::new(0) };
    static INPUTS: RefCell<Vec<ControllerInput>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug)]
struct FakeError(&'static str);

impl fmt::Display for FakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for FakeError {}

/// Steps succeed until `FAIL_STEP_AT`; pixels encode the frame number.
struct FakeEngine {
    loaded: bool,
    frames: u64,
}

impl Emulator for FakeEngine {
    type Error = FakeError;

    fn new() -> Result<Self, Self::Error> {
        if FAIL_NEW.get() {
            return Err(FakeError("out of memory"));
        }
        Ok(Self { loaded: false, frames: 0 })
    }

    fn load(&mut self, rom: &[u8]) -> Result<(), Self::Error> {
        if !rom.starts_with(b"NES\x1A") {
            return Err(FakeError("not an iNES image"));
        }
        self.loaded = true;
        Ok(())
    }

    fn set_input(&mut self, one: ControllerInput, two: Option<ControllerInput>) {
        assert!(two.is_none());
        INPUTS.with_borrow_mut(|inputs| inputs.push(one));
    }

    fn step_frame(&mut self) -> Result<(), Self::Error> {
        assert!(self.loaded, "stepped before load");
        if FAIL_STEP_AT.get() == Some(self.frames + 1) {
            return Err(FakeError("invalid opcode"));
        }
        self.frames += 1;
        Ok(())
    }

    fn pixel(&self, x: usize, y: usize) -> Color {
        Color { r: x as u8, g: y as u8, b: self.frames as u8, a: 0xFF }
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        DROPS.set(DROPS.get() + 1);
    }
}

#[derive(Default)]
struct Recording {
    frames: Vec<Vec<u32>>,
    refuse: bool,
}

#[derive(Debug)]
struct SurfaceLost;

impl fmt::Display for SurfaceLost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("window closed")
    }
}

impl std::error::Error for SurfaceLost {}

impl Surface for Recording {
    type Error = SurfaceLost;

    fn submit(&mut self, pixels: &[u32]) -> Result<(), Self::Error> {
        if self.refuse {
            return Err(SurfaceLost);
        }
        self.frames.push(pixels.to_vec());
        Ok(())
    }
}

fn rom() -> Rom {
    Rom::from_bytes("test.nes", b"NES\x1A\x01\x01".to_vec()).unwrap()
}

fn start() -> Driver<FakeEngine, Recording> {
    Driver::start(rom(), Recording::default(), DriverConfig::default()).unwrap()
}

#[test]
fn test_runs_and_presents_every_frame() {
    let keys = KeyState::new();
    let mut driver = start();
    assert_eq!(driver.state(), State::Loaded);

    for _ in 0..3 {
        assert_eq!(driver.tick(&keys).unwrap(), Tick::Continue);
    }
    assert_eq!(driver.state(), State::Running);
    assert_eq!(driver.frames(), 3);

    let frames = &driver.surface().frames;
    assert_eq!(frames.len(), 3);
    assert!(frames.iter().all(|frame| frame.len() == SCREEN_WIDTH * SCREEN_HEIGHT));
    // Blue channel carries the frame number the engine had just finished.
    assert_eq!(frames[2][0] >> 16 & 0xFF, 3);

    keys.set(Key::Escape, true);
    assert_eq!(driver.tick(&keys).unwrap(), Tick::Stopped(Stop::Terminated));
    assert_eq!(driver.surface().frames.len(), 3);
}

#[test]
fn test_exit_before_first_tick() {
    let keys = KeyState::new();
    keys.set(Key::Escape, true);
    let mut driver = start();

    let tick = driver.tick(&keys).unwrap();
    assert_eq!(tick, Tick::Stopped(Stop::Terminated));
    assert_eq!(Stop::Terminated.status(), 0);
    assert_eq!(driver.frames(), 0);
    assert!(driver.surface().frames.is_empty());
}

#[test]
fn test_fatal_step_halts_without_presenting() {
    FAIL_STEP_AT.set(Some(3));
    let keys = KeyState::new();
    let mut driver = start();

    driver.tick(&keys).unwrap();
    driver.tick(&keys).unwrap();
    let error = driver.tick(&keys).unwrap_err();
    assert!(matches!(error, FrontendError::Step { frame: 3, .. }));
    assert_eq!(error.kind(), ErrorKind::Step);
    assert!(error.to_string().starts_with("engine:"));

    assert_eq!(driver.state(), State::Stopped(Stop::Fatal));
    assert_eq!(driver.surface().frames.len(), 2);

    // Stopped is terminal: no retry, no further frames.
    assert_eq!(driver.tick(&keys).unwrap(), Tick::Stopped(Stop::Fatal));
    assert_eq!(driver.surface().frames.len(), 2);
    assert_eq!(Stop::Fatal.status(), 1);
}

#[test]
fn test_refused_frame_is_fatal() {
    let keys = KeyState::new();
    let surface = Recording { refuse: true, ..Default::default() };
    let mut driver: Driver<FakeEngine, _> =
        Driver::start(rom(), surface, DriverConfig::default()).unwrap();

    let error = driver.tick(&keys).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Present);
    assert_eq!(driver.state(), State::Stopped(Stop::Fatal));
    assert_eq!(driver.frames(), 0);
}

#[test]
fn test_input_is_mapped_each_tick() {
    let keys = KeyState::new();
    let mut driver = start();

    keys.set(Key::Z, true);
    driver.tick(&keys).unwrap();
    keys.set(Key::Z, false);
    keys.set(Key::Enter, true);
    driver.tick(&keys).unwrap();

    INPUTS.with_borrow(|inputs| {
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0], ControllerInput { a: true, ..Default::default() });
        assert_eq!(inputs[1], ControllerInput { start: true, ..Default::default() });
    });
}

#[test]
fn test_startup_failures() {
    let error = Driver::<FakeEngine, Recording>::start(
        Rom::from_bytes("junk.bin", vec![0; 16]).unwrap(),
        Recording::default(),
        DriverConfig::default(),
    )
    .err()
    .unwrap();
    assert_eq!(error.kind(), ErrorKind::Load);
    assert!(error.to_string().contains("junk.bin"));

    FAIL_NEW.set(true);
    let error = Driver::<FakeEngine, Recording>::start(rom(), Recording::default(), DriverConfig::default())
        .err()
        .unwrap();
    assert_eq!(error.kind(), ErrorKind::Init);
}

#[test]
fn test_engine_dropped_exactly_once() {
    let keys = KeyState::new();
    {
        let mut driver = start();
        driver.tick(&keys).unwrap();
        assert_eq!(driver.terminate(), Stop::Terminated);
        assert_eq!(driver.terminate(), Stop::Terminated);
        assert_eq!(DROPS.get(), 0);
    }
    assert_eq!(DROPS.get(), 1);

    // A rejected cartridge still releases the engine it was offered to.
    let _ = Driver::<FakeEngine, Recording>::start(
        Rom::from_bytes("junk.bin", vec![0; 16]).unwrap(),
        Recording::default(),
        DriverConfig::default(),
    );
    assert_eq!(DROPS.get(), 2);
}

#[test]
fn test_custom_exit_key() {
    let keys = KeyState::new();
    let config = DriverConfig { exit_key: Key::Q, ..Default::default() };
    let mut driver: Driver<FakeEngine, Recording> =
        Driver::start(rom(), Recording::default(), config).unwrap();

    keys.set(Key::Escape, true);
    assert_eq!(driver.tick(&keys).unwrap(), Tick::Continue);
    keys.set(Key::Q, true);
    assert_eq!(driver.tick(&keys).unwrap(), Tick::Stopped(Stop::Terminated));
}
