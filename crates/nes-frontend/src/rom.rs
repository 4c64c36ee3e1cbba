//! Cartridge loading
//!
//! A cartridge comes either from a path given on the command line or from a file the user
//! picks on the host. Either way the whole image is read up front and an empty or short
//! read is an error; a partial image never reaches the engine.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// File extension the picker filters on
pub const ROM_EXTENSION: &str = "nes";

/// Upper bound on the buffer reserved from file metadata; larger files grow as read
const MAX_PREALLOC: u64 = 1 << 20;

/// Text shown on the host surface while waiting for the user to pick a file
pub const PICK_PROMPT: &str = "Click to browse... (.nes)";

/// A cartridge image read into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    name: String,
    bytes: Vec<u8>,
}

impl Rom {
    /// Wrap bytes the host already has. Empty images are rejected.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, RomError> {
        let name = name.into();
        if bytes.is_empty() {
            return Err(RomError::Empty { name });
        }
        Ok(Self { name, bytes })
    }

    /// File name the image was loaded from
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Cartridge loading error types
#[derive(Debug, Error)]
pub enum RomError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{name}: file is empty")]
    Empty { name: String },
    #[error("{name}: read {read} of {expected} bytes")]
    ShortRead { name: String, read: usize, expected: u64 },
    #[error("no cartridge was selected")]
    Cancelled,
}

/// Host-provided file chooser
pub trait Picker {
    /// Show `message` where the user will see it until a file is picked.
    fn prompt(&mut self, message: &str);

    /// Block until the user picks a file with the given extension.
    /// Returns its name and contents, or `None` if the user cancelled.
    fn pick(&mut self, extension: &str) -> Result<Option<(String, Vec<u8>)>, RomError>;
}

/// Where to get the cartridge from
pub enum RomSource<'a> {
    Path(PathBuf),
    Picker(&'a mut dyn Picker),
}

/// Obtain a cartridge image from `source`.
pub fn load(source: RomSource<'_>) -> Result<Rom, RomError> {
    let rom = match source {
        RomSource::Path(path) => read_file(&path)?,
        RomSource::Picker(picker) => {
            picker.prompt(PICK_PROMPT);
            let (name, bytes) = picker.pick(ROM_EXTENSION)?.ok_or(RomError::Cancelled)?;
            debug!(name = %name, "picked cartridge");
            Rom::from_bytes(name, bytes)?
        }
    };
    info!(name = rom.name(), bytes = rom.len(), "cartridge read");
    Ok(rom)
}

/// Read a whole cartridge file.
pub fn read_file(path: &Path) -> Result<Rom, RomError> {
    let io_error = |source: io::Error| RomError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_error)?;
    let expected = file.metadata().map_err(io_error)?.len();
    let mut bytes = Vec::with_capacity(usize::try_from(expected.min(MAX_PREALLOC)).unwrap_or(0));
    file.read_to_end(&mut bytes).map_err(io_error)?;

    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    if (bytes.len() as u64) < expected {
        return Err(RomError::ShortRead {
            name,
            read: bytes.len(),
            expected,
        });
    }
    Rom::from_bytes(name, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        prompts: Vec<String>,
        file: Option<(String, Vec<u8>)>,
    }

    impl Picker for Scripted {
        fn prompt(&mut self, message: &str) {
            self.prompts.push(message.to_owned());
        }

        fn pick(&mut self, extension: &str) -> Result<Option<(String, Vec<u8>)>, RomError> {
            assert_eq!(extension, ROM_EXTENSION);
            Ok(self.file.take())
        }
    }

    #[test]
    fn picker_prompts_then_loads() {
        let mut picker = Scripted {
            prompts: Vec::new(),
            file: Some(("mario.nes".into(), vec![1, 2, 3])),
        };
        let rom = load(RomSource::Picker(&mut picker)).unwrap();
        assert_eq!(rom.name(), "mario.nes");
        assert_eq!(rom.bytes(), [1, 2, 3]);
        assert_eq!(picker.prompts, [PICK_PROMPT]);
    }

    #[test]
    fn cancelled_pick() {
        let mut picker = Scripted { prompts: Vec::new(), file: None };
        assert!(matches!(load(RomSource::Picker(&mut picker)), Err(RomError::Cancelled)));
    }

    #[test]
    fn empty_pick_is_rejected() {
        let mut picker = Scripted {
            prompts: Vec::new(),
            file: Some(("blank.nes".into(), Vec::new())),
        };
        assert!(matches!(
            load(RomSource::Picker(&mut picker)),
            Err(RomError::Empty { name }) if name == "blank.nes"
        ));
    }
}
