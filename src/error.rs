use std::fmt;

use khronos_egl as egl;
use thiserror::Error;

use crate::egl::select::SelectError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    LibraryLoad(String),

    #[error("Could not get EGL display")]
    NoDisplay,

    #[error("Could not initialize EGL")]
    Initialize(#[source] egl::Error),

    #[error("{function} is missing ({extension} not supported by the drivers?)")]
    MissingExtension {
        function: &'static str,
        extension: &'static str,
    },

    #[error("Invalid EGL device {index} requested, {available} available")]
    InvalidDevice { index: usize, available: usize },

    #[error("Could not find a valid EGL device to initialize")]
    NoDevice,

    #[error(
        "Couldn't find matching EGL config (call to eglChooseConfig failed, reporting an error of {})",
        .0.code()
    )]
    NoConfig(#[from] SelectError),

    #[error("{0}")]
    Unsupported(&'static str),

    #[error("{message} (call to {call} failed, reporting an error of {code})")]
    Egl {
        message: &'static str,
        call: &'static str,
        code: ErrorCode,
    },
}

impl Error {
    pub fn egl(message: &'static str, call: &'static str, err: egl::Error) -> Self {
        Error::Egl {
            message,
            call,
            code: err.into(),
        }
    }

    /// For entry points called through raw function pointers, which report
    /// a bare code from `eglGetError`.
    pub fn egl_raw(message: &'static str, call: &'static str, code: egl::Int) -> Self {
        Error::Egl {
            message,
            call,
            code: ErrorCode(code),
        }
    }
}

/// Raw EGL error code, displayed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub egl::Int);

impl ErrorCode {
    pub const SUCCESS: ErrorCode = ErrorCode(egl::SUCCESS);

    pub fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            egl::SUCCESS => "EGL_SUCCESS",
            egl::NOT_INITIALIZED => "EGL_NOT_INITIALIZED",
            egl::BAD_ACCESS => "EGL_BAD_ACCESS",
            egl::BAD_ALLOC => "EGL_BAD_ALLOC",
            egl::BAD_ATTRIBUTE => "EGL_BAD_ATTRIBUTE",
            egl::BAD_CONTEXT => "EGL_BAD_CONTEXT",
            egl::BAD_CONFIG => "EGL_BAD_CONFIG",
            egl::BAD_CURRENT_SURFACE => "EGL_BAD_CURRENT_SURFACE",
            egl::BAD_DISPLAY => "EGL_BAD_DISPLAY",
            egl::BAD_SURFACE => "EGL_BAD_SURFACE",
            egl::BAD_MATCH => "EGL_BAD_MATCH",
            egl::BAD_PARAMETER => "EGL_BAD_PARAMETER",
            egl::BAD_NATIVE_PIXMAP => "EGL_BAD_NATIVE_PIXMAP",
            egl::BAD_NATIVE_WINDOW => "EGL_BAD_NATIVE_WINDOW",
            egl::CONTEXT_LOST => "EGL_CONTEXT_LOST",
            _ => return None,
        };
        Some(name)
    }
}

impl From<egl::Error> for ErrorCode {
    fn from(err: egl::Error) -> Self {
        ErrorCode(err.native())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:x}", self.0 as u32),
        }
    }
}
