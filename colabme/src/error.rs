use std::{error, fmt, io, string::FromUtf8Error};

use camino::{FromPathBufError, Utf8PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    NotFound(Utf8PathBuf),
    NotTracked(Utf8PathBuf),
    NotUploaded(Utf8PathBuf),
    Unsupported(Utf8PathBuf),
    Illegal(Utf8PathBuf, Option<String>),
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "No such file or directory: {path}"),
            Self::NotTracked(path) => write!(f, "{path} is not tracked"),
            Self::NotUploaded(path) => write!(f, "{path} is tracked but was never uploaded"),
            Self::Unsupported(path) => write!(f, "{path} is not a directory or file"),
            Self::Illegal(path, None) => write!(f, "Illegal path: {path}"),
            Self::Illegal(path, Some(reason)) => write!(f, "{reason}: {path}"),
        }
    }
}

impl error::Error for PathError {}

#[derive(Debug, Clone)]
pub enum Error {
    Path(PathError),
    Utf8(String),
    Io(String),
    Auth(String),
    Api(String),
    Config(String),
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(err) => err.fmt(f),
            Self::Utf8(msg) => write!(f, "Non UTF-8 string: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Auth(msg) => write!(f, "Authorization error: {msg}"),
            Self::Api(msg) => write!(f, "API error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => f.write_str(msg),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Path(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PathError> for Error {
    fn from(value: PathError) -> Self {
        Self::Path(value)
    }
}

impl From<FromUtf8Error> for Error {
    fn from(value: FromUtf8Error) -> Self {
        Self::Utf8(String::from_utf8_lossy(&value.into_bytes()).to_string())
    }
}

impl From<FromPathBufError> for Error {
    fn from(value: FromPathBufError) -> Self {
        Self::Utf8(value.as_path().as_os_str().to_string_lossy().to_string())
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub fn io<E: error::Error>(err: E) -> Error {
    Error::Io(err.to_string())
}

pub fn api<E: error::Error>(err: E) -> Error {
    Error::Api(err.to_string())
}

pub fn auth<E: error::Error>(err: E) -> Error {
    Error::Auth(err.to_string())
}

#[macro_export]
macro_rules! api_bail {
    ($($t:tt)*) => {
        return ::core::result::Result::Err($crate::Error::Api(format!($($t)*)));
    };
}

#[macro_export]
macro_rules! auth_bail {
    ($($t:tt)*) => {
        return ::core::result::Result::Err($crate::Error::Auth(format!($($t)*)));
    };
}

#[macro_export]
macro_rules! config_bail {
    ($($t:tt)*) => {
        return ::core::result::Result::Err($crate::Error::Config(format!($($t)*)));
    };
}

#[macro_export]
macro_rules! api_error {
    ($($t:tt)*) => {
        $crate::Error::Api(format!($($t)*))
    };
}
