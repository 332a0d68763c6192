//! Error types for the surface bridge.

use std::fmt;

/// Errors that can occur while setting up the surface.
#[derive(Debug)]
pub enum SurfaceError {
    /// Reading the config file or the console failed.
    Io(std::io::Error),
    /// Config file is not valid JSON for `Config`.
    ConfigParse(serde_json::Error),
    /// MIDI client could not be created.
    MidiInit(midir::InitError),
    /// Opening a MIDI port failed.
    MidiConnect(String),
    /// No usable port, or an invalid interactive choice.
    PortSelection(String),
    /// OSC socket or encoding failure.
    Osc(String),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {}", err),
            Self::ConfigParse(err) => write!(f, "Config parse error: {}", err),
            Self::MidiInit(err) => write!(f, "MIDI init error: {}", err),
            Self::MidiConnect(msg) => write!(f, "MIDI connect error: {}", msg),
            Self::PortSelection(msg) => write!(f, "Port selection error: {}", msg),
            Self::Osc(msg) => write!(f, "OSC error: {}", msg),
        }
    }
}

impl std::error::Error for SurfaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::ConfigParse(err) => Some(err),
            Self::MidiInit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SurfaceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for SurfaceError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigParse(err)
    }
}

impl From<midir::InitError> for SurfaceError {
    fn from(err: midir::InitError) -> Self {
        Self::MidiInit(err)
    }
}

impl<T> From<midir::ConnectError<T>> for SurfaceError {
    fn from(err: midir::ConnectError<T>) -> Self {
        Self::MidiConnect(err.kind().to_string())
    }
}

/// Result type for surface setup.
pub type SurfaceResult<T> = Result<T, SurfaceError>;
