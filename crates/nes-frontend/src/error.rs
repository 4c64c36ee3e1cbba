//! Front-end error types

use thiserror::Error;

use crate::rom::RomError;

/// An engine or surface error, type-erased so the driver does not carry its type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of a [`FrontendError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The cartridge could not be obtained
    Io,
    /// The engine could not be constructed
    Init,
    /// The engine rejected the cartridge
    Load,
    /// The engine failed while producing a frame
    Step,
    /// The host surface refused a frame
    Present,
}

/// Everything that stops a front-end. None of these are retried.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Rom(#[from] RomError),
    #[error("engine: construction failed: {0}")]
    Init(#[source] BoxError),
    #[error("engine: cannot load {rom}: {source}")]
    Load { rom: String, source: BoxError },
    #[error("engine: frame {frame} failed: {source}")]
    Step { frame: u64, source: BoxError },
    #[error("surface: frame {frame} was not presented: {source}")]
    Present { frame: u64, source: BoxError },
}

impl FrontendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrontendError::Rom(_) => ErrorKind::Io,
            FrontendError::Init(_) => ErrorKind::Init,
            FrontendError::Load { .. } => ErrorKind::Load,
            FrontendError::Step { .. } => ErrorKind::Step,
            FrontendError::Present { .. } => ErrorKind::Present,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_resource() {
        let error = FrontendError::Step {
            frame: 3,
            source: "invalid opcode".into(),
        };
        assert_eq!(error.kind(), ErrorKind::Step);
        assert_eq!(error.to_string(), "engine: frame 3 failed: invalid opcode");

        let error = FrontendError::from(RomError::Empty { name: "game.nes".into() });
        assert_eq!(error.kind(), ErrorKind::Io);
        assert!(error.to_string().contains("game.nes"));
    }
}
